use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::QrCode;

use crate::error::AttendanceError;

/// Smallest edge, in pixels, of a rendered code. Large enough to scan off a projector.
pub const MIN_DIMENSION: u32 = 300;

/// Encodes `payload` as a QR code and returns it as PNG bytes.
pub fn render_png(payload: &str) -> Result<Vec<u8>, AttendanceError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| AttendanceError::Qr(e.to_string()))?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
        .build();

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| AttendanceError::Qr(e.to_string()))?;

    Ok(png.into_inner())
}

/// The page a scanned code opens: `{base_url}/submit/{token}`.
pub fn submission_url(base_url: &str, token: &str) -> String {
    format!("{}/submit/{}", base_url.trim_end_matches('/'), token)
}
