//! Minimal CSV writing and reading for the attendance export and file store.

/// Quotes a field when it contains a delimiter, a quote or a line break.
pub fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Renders one row, terminated by `\n`.
pub fn row<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    let mut line = fields.into_iter().map(escape).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

/// Splits CSV text into rows of fields. Quoted fields may span lines.
///
/// Returns the 1-based line each row starts on alongside its fields, or the line of an
/// unterminated quote.
pub fn parse(input: &str) -> Result<Vec<(usize, Vec<String>)>, usize> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_start = 1;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                rows.push((row_start, std::mem::take(&mut fields)));
                line += 1;
                row_start = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(row_start);
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        rows.push((row_start, fields));
    }

    Ok(rows)
}
