#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body as AxumBody,
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use chrono::{Local, TimeDelta, TimeZone};
    use serde_json::{Value, json};
    use services::{
        AttendanceLedger, AttendanceRecord, AttendanceService, LedgerStore, ManualClock,
        StorageError, SystemClock, TokenRegistry,
    };
    use tower::ServiceExt;

    use crate::helpers::{body_json, make_test_app, make_test_app_with, mark_request};

    fn payload(student_id: &str, token: &str) -> Value {
        json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "student_id": student_id,
            "token": token,
        })
    }

    struct UnwritableStore;

    impl LedgerStore for UnwritableStore {
        fn load(&self) -> Result<Vec<AttendanceRecord>, StorageError> {
            Ok(Vec::new())
        }

        fn append(&self, _record: &AttendanceRecord) -> Result<(), StorageError> {
            Err(std::io::Error::other("disk unavailable").into())
        }

        fn clear(&self) -> Result<(), StorageError> {
            Err(std::io::Error::other("disk unavailable").into())
        }
    }

    fn unwritable_service() -> AttendanceService {
        let ledger =
            AttendanceLedger::with_store(Box::new(UnwritableStore), Arc::new(SystemClock)).unwrap();
        AttendanceService::new(TokenRegistry::default(), ledger)
    }

    // ---------------------------
    // POST /mark_attendance
    // ---------------------------

    #[tokio::test]
    async fn mark_attendance_success_records_once() {
        let (app, state) = make_test_app();
        let token = state.attendance().issue_token().token;

        let resp = app
            .clone()
            .oneshot(mark_request(payload("S1", &token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Attendance marked for Ada Lovelace");
        assert_eq!(state.attendance().ledger().count(), 1);

        // Same token a second time: already consumed.
        let resp = app
            .oneshot(mark_request(payload("S2", &token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Invalid or expired token");
        assert_eq!(state.attendance().ledger().count(), 1);
    }

    #[tokio::test]
    async fn same_day_duplicate_is_conflict_and_burns_token() {
        let (app, state) = make_test_app();
        let b = state.attendance().issue_token().token;
        let c = state.attendance().issue_token().token;

        let resp = app
            .clone()
            .oneshot(mark_request(payload("S1", &b)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .clone()
            .oneshot(mark_request(payload("S1", &c)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "Attendance already recorded today");
        assert_eq!(state.attendance().ledger().count(), 1);

        // C was used up by the rejected attempt.
        let resp = app
            .oneshot(mark_request(payload("S2", &c)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_field_is_rejected_before_token_lookup() {
        let (app, state) = make_test_app();
        let token = state.attendance().issue_token().token;

        let mut body = payload("S1", &token);
        body["first_name"] = json!("   ");
        let resp = app.clone().oneshot(mark_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "error");
        assert_eq!(
            json["message"],
            "Missing required fields: first_name is required"
        );

        // The token survived and can still be redeemed.
        assert_eq!(state.attendance().tokens().len(), 1);
        let resp = app
            .oneshot(mark_request(payload("S1", &token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let (app, state) = make_test_app();
        let token = state.attendance().issue_token().token;

        let resp = app
            .oneshot(mark_request(json!({ "token": token })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        let message = json["message"].as_str().unwrap();
        assert!(message.starts_with("Missing required fields"));
        assert!(message.contains("student_id is required"));
        assert_eq!(state.attendance().tokens().len(), 1);
    }

    #[tokio::test]
    async fn non_json_body_is_a_validation_error() {
        let (app, state) = make_test_app();

        let req = Request::builder()
            .method("POST")
            .uri("/mark_attendance")
            .header(CONTENT_TYPE, "text/plain")
            .body(AxumBody::from("first_name=Ada"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(
            json["message"]
                .as_str()
                .unwrap()
                .starts_with("Missing required fields")
        );
        assert_eq!(state.attendance().ledger().count(), 0);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let (app, state) = make_test_app();

        let resp = app
            .oneshot(mark_request(payload("S1", "not-a-real-token")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "Invalid or expired token");
        assert_eq!(state.attendance().ledger().count(), 0);
    }

    #[tokio::test]
    async fn expired_token_is_rejected_and_nothing_recorded() {
        let clock = Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2025, 9, 4, 10, 0, 0).unwrap(),
        ));
        let (app, state) = make_test_app_with(AttendanceService::with_clock(
            Duration::from_secs(120),
            clock.clone(),
        ));
        let token = state.attendance().issue_token().token;

        clock.advance(TimeDelta::seconds(120));

        let resp = app
            .oneshot(mark_request(payload("S1", &token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], "Invalid or expired token");
        assert_eq!(state.attendance().ledger().count(), 0);
    }

    #[tokio::test]
    async fn next_day_redemption_is_accepted() {
        let clock = Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2025, 9, 4, 23, 59, 0).unwrap(),
        ));
        let (app, state) = make_test_app_with(AttendanceService::with_clock(
            Duration::from_secs(120),
            clock.clone(),
        ));

        let first = state.attendance().issue_token().token;
        let resp = app
            .clone()
            .oneshot(mark_request(payload("S1", &first)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        clock.advance(TimeDelta::minutes(2));
        let second = state.attendance().issue_token().token;
        let resp = app
            .oneshot(mark_request(payload("S1", &second)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.attendance().ledger().count(), 2);
    }

    #[tokio::test]
    async fn storage_failure_is_internal_error_and_nothing_recorded() {
        let (app, state) = make_test_app_with(unwritable_service());
        let token = state.attendance().issue_token().token;

        let resp = app
            .oneshot(mark_request(payload("S1", &token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Internal server error");
        assert_eq!(state.attendance().ledger().count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_for_one_student_record_once() {
        let (app, state) = make_test_app();
        let tokens: Vec<_> = (0..16)
            .map(|_| state.attendance().issue_token().token)
            .collect();

        let handles: Vec<_> = tokens
            .into_iter()
            .map(|token| {
                let app = app.clone();
                tokio::spawn(async move {
                    app.oneshot(mark_request(payload("S1", &token)))
                        .await
                        .unwrap()
                        .status()
                })
            })
            .collect();

        let mut statuses = Vec::new();
        for h in handles {
            statuses.push(h.await.unwrap());
        }

        assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
        assert_eq!(
            statuses
                .iter()
                .filter(|s| **s == StatusCode::CONFLICT)
                .count(),
            15
        );
        assert_eq!(state.attendance().ledger().count(), 1);
    }

    // ---------------------------
    // POST /clear-attendance
    // ---------------------------

    #[tokio::test]
    async fn clear_attendance_empties_ledger() {
        let (app, state) = make_test_app();
        for id in ["S1", "S2"] {
            let token = state.attendance().issue_token().token;
            let resp = app
                .clone()
                .oneshot(mark_request(payload(id, &token)))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = Request::builder()
            .method("POST")
            .uri("/clear-attendance")
            .body(AxumBody::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Attendance cleared (2 records removed)");
        assert_eq!(state.attendance().ledger().count(), 0);

        // S1 may attend again once the ledger is cleared.
        let token = state.attendance().issue_token().token;
        let resp = app
            .oneshot(mark_request(payload("S1", &token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn clear_attendance_storage_failure_is_internal_error() {
        let (app, _) = make_test_app_with(unwritable_service());
        let req = Request::builder()
            .method("POST")
            .uri("/clear-attendance")
            .body(AxumBody::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["message"], "Internal server error");
    }

    #[tokio::test]
    async fn clear_attendance_rejects_get() {
        let (app, _) = make_test_app();
        let req = Request::builder()
            .method("GET")
            .uri("/clear-attendance")
            .body(AxumBody::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
