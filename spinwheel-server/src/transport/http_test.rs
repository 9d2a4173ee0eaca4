#[cfg(test)]
mod tests {
    use super::super::http::{AppState, router};
    use crate::error::StoreError;
    use crate::metrics::{Metrics, Operation, Outcome};
    use crate::service::{Rules, WheelService};
    use crate::store::{LedgerActor, LedgerHandle, Store};
    use crate::types::{ClaimResponse, ErrorResponse, RegisterResponse, SpinResponse, StatusResponse};
    use async_trait::async_trait;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::{DateTime, Utc};
    use serde::de::DeserializeOwned;
    use spinwheel::{ClaimRecord, Contact, EventKind, Identity, MemoryLedger, SpinRecord};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app_with_store(store: Arc<dyn Store>) -> (Router, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new());
        let service = WheelService::new(store, Rules::default());
        let app = router(Arc::new(AppState::new(service, metrics.clone())));
        (app, metrics)
    }

    fn app() -> (Router, Arc<Metrics>) {
        app_with_store(Arc::new(LedgerActor::spawn(64, MemoryLedger::new())))
    }

    async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_register_then_register_again() {
        let (app, metrics) = app();

        let (status, body) = post(
            &app,
            "/register",
            r#"{"name": "Ana Paula", "whatsapp": "(21) 99999-8888"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let response: RegisterResponse = parse(&body);
        assert!(response.success);
        assert!(response.is_new_identity);

        let (_, body) = post(
            &app,
            "/register",
            r#"{"name": "Ana", "phone": "5521999998888"}"#,
        )
        .await;
        let response: RegisterResponse = parse(&body);
        assert!(!response.is_new_identity);

        assert_eq!(metrics.count(Operation::Register, Outcome::Granted), 2);
    }

    #[tokio::test]
    async fn test_register_invalid_name() {
        let (app, metrics) = app();
        let (status, body) =
            post(&app, "/register", r#"{"name": " A ", "phone": "21999998888"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorResponse = parse(&body);
        assert_eq!(error.error, "invalid_argument");
        assert_eq!(error.retry_at, None);
        assert_eq!(metrics.count(Operation::Register, Outcome::Invalid), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_argument() {
        let (app, _) = app();
        let (status, body) = post(&app, "/spin", "{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorResponse = parse(&body);
        assert_eq!(error.error, "invalid_argument");
    }

    #[tokio::test]
    async fn test_spin_limit_returns_429_with_retry_at() {
        let (app, metrics) = app();

        for _ in 0..3 {
            let (status, body) = post(&app, "/spin", r#"{"identity": "21999998888"}"#).await;
            assert_eq!(status, StatusCode::OK);
            let spin: SpinResponse = parse(&body);
            assert!(["COMBO", "XTUDO", "HOTDOG"].contains(&spin.prize.as_str()));
            assert!(spin.target_angle >= 1080.0);
            assert_eq!(spin.claimed_today, 0);
        }

        let (status, body) = post(&app, "/spin", r#"{"phone": "21999998888"}"#).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        let error: ErrorResponse = parse(&body);
        assert_eq!(error.error, "spin_limit_reached");
        let retry_at = error.retry_at.unwrap();
        assert!(retry_at > Utc::now() + chrono::TimeDelta::hours(11));

        assert_eq!(metrics.count(Operation::Spin, Outcome::Granted), 3);
        assert_eq!(metrics.count(Operation::Spin, Outcome::Denied), 1);
    }

    #[tokio::test]
    async fn test_claim_issues_coupon_codes() {
        let (app, metrics) = app();

        let (status, body) = post(
            &app,
            "/claim",
            r#"{"identity": "21999998888", "prize": "XTUDO"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let claim: ClaimResponse = parse(&body);
        assert_eq!(claim.coupon_number, 1);
        assert_eq!(claim.coupon_code, "TOP-001");
        assert_eq!(claim.prize, "XTUDO");

        let (status, body) = post(
            &app,
            "/claim",
            r#"{"identity": "21999998888", "prize": "PIZZA"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorResponse = parse(&body);
        assert_eq!(error.error, "invalid_argument");

        assert!(
            metrics
                .export_prometheus()
                .contains("spinwheel_last_coupon_serial 1")
        );
    }

    #[tokio::test]
    async fn test_daily_claim_limit() {
        let (app, _) = app();
        let body = r#"{"whatsapp": "11988887777", "prize": "COMBO"}"#;

        for _ in 0..3 {
            let (status, _) = post(&app, "/claim", body).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, bytes) = post(&app, "/claim", body).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        let error: ErrorResponse = parse(&bytes);
        assert_eq!(error.error, "daily_limit_reached");
        assert!(error.retry_at.is_some());
    }

    #[tokio::test]
    async fn test_status_view() {
        let (app, _) = app();
        post(&app, "/spin", r#"{"identity": "21999998888"}"#).await;
        post(
            &app,
            "/claim",
            r#"{"identity": "21999998888", "prize": "HOTDOG"}"#,
        )
        .await;

        let (status, body) = post(&app, "/status", r#"{"identity": "21999998888"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let view: StatusResponse = parse(&body);
        assert_eq!(view.identity, "5521999998888");
        assert_eq!(view.spins_used, 1);
        assert_eq!(view.spins_remaining, 2);
        assert_eq!(view.next_spin_at, None);
        assert_eq!(view.claims_today, 1);
        assert_eq!(view.claims_remaining, 2);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (app, _) = app();
        post(&app, "/spin", r#"{"identity": "21999998888"}"#).await;

        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("spinwheel_operations_total{operation=\"spin\",outcome=\"granted\"} 1"));
    }

    /// Store whose every call fails
    struct DownStore;

    fn down() -> StoreError {
        StoreError::Unavailable("connection refused".into())
    }

    #[async_trait]
    impl Store for DownStore {
        async fn count_events(
            &self,
            _: &Identity,
            _: EventKind,
            _: DateTime<Utc>,
        ) -> Result<u64, StoreError> {
            Err(down())
        }

        async fn earliest_event(
            &self,
            _: &Identity,
            _: EventKind,
            _: DateTime<Utc>,
        ) -> Result<Option<DateTime<Utc>>, StoreError> {
            Err(down())
        }

        async fn insert_spin_within(
            &self,
            _: SpinRecord,
            _: DateTime<Utc>,
            _: u32,
        ) -> Result<bool, StoreError> {
            Err(down())
        }

        async fn insert_claim_within(
            &self,
            _: ClaimRecord,
            _: DateTime<Utc>,
            _: u32,
        ) -> Result<bool, StoreError> {
            Err(down())
        }

        async fn next_coupon_serial(&self) -> Result<u64, StoreError> {
            Err(down())
        }

        async fn last_coupon_serial(&self) -> Result<u64, StoreError> {
            Err(down())
        }

        async fn upsert_contact(
            &self,
            _: &Identity,
            _: &str,
            _: DateTime<Utc>,
        ) -> Result<bool, StoreError> {
            Err(down())
        }

        async fn find_contact(&self, _: &Identity) -> Result<Option<Contact>, StoreError> {
            Err(down())
        }
    }

    #[tokio::test]
    async fn test_store_failure_hides_details() {
        let (app, metrics) = app_with_store(Arc::new(DownStore));

        let (status, body) = post(&app, "/spin", r#"{"identity": "21999998888"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorResponse = parse(&body);
        assert_eq!(error.error, "store_unavailable");
        assert!(!error.message.contains("connection refused"));

        let (status, _) = post(
            &app,
            "/claim",
            r#"{"identity": "21999998888", "prize": "COMBO"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(metrics.count(Operation::Spin, Outcome::Failed), 1);
        assert_eq!(metrics.count(Operation::Claim, Outcome::Failed), 1);
    }

    /// Memory store whose claim insert takes a while to land
    struct SlowClaimStore {
        inner: LedgerHandle,
        delay: Duration,
    }

    #[async_trait]
    impl Store for SlowClaimStore {
        async fn count_events(
            &self,
            identity: &Identity,
            kind: EventKind,
            since: DateTime<Utc>,
        ) -> Result<u64, StoreError> {
            self.inner.count_events(identity, kind, since).await
        }

        async fn earliest_event(
            &self,
            identity: &Identity,
            kind: EventKind,
            since: DateTime<Utc>,
        ) -> Result<Option<DateTime<Utc>>, StoreError> {
            self.inner.earliest_event(identity, kind, since).await
        }

        async fn insert_spin_within(
            &self,
            record: SpinRecord,
            since: DateTime<Utc>,
            cap: u32,
        ) -> Result<bool, StoreError> {
            self.inner.insert_spin_within(record, since, cap).await
        }

        async fn insert_claim_within(
            &self,
            record: ClaimRecord,
            since: DateTime<Utc>,
            limit: u32,
        ) -> Result<bool, StoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.insert_claim_within(record, since, limit).await
        }

        async fn next_coupon_serial(&self) -> Result<u64, StoreError> {
            self.inner.next_coupon_serial().await
        }

        async fn last_coupon_serial(&self) -> Result<u64, StoreError> {
            self.inner.last_coupon_serial().await
        }

        async fn upsert_contact(
            &self,
            identity: &Identity,
            name: &str,
            now: DateTime<Utc>,
        ) -> Result<bool, StoreError> {
            self.inner.upsert_contact(identity, name, now).await
        }

        async fn find_contact(&self, identity: &Identity) -> Result<Option<Contact>, StoreError> {
            self.inner.find_contact(identity).await
        }
    }

    #[tokio::test]
    async fn test_claim_completes_after_client_disconnects() {
        let inner = LedgerActor::spawn(64, MemoryLedger::new());
        let store = SlowClaimStore {
            inner: inner.clone(),
            delay: Duration::from_millis(200),
        };
        let (app, metrics) = app_with_store(Arc::new(store));

        let request = Request::builder()
            .method("POST")
            .uri("/claim")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"identity": "21999998888", "prize": "COMBO"}"#))
            .unwrap();

        // The client gives up while the claim insert is still pending
        let response = tokio::time::timeout(Duration::from_millis(50), app.oneshot(request)).await;
        assert!(response.is_err());
        assert_eq!(inner.last_coupon_serial().await.unwrap(), 1);

        tokio::time::sleep(Duration::from_millis(400)).await;

        let who = Identity::parse("21999998888").unwrap();
        let since = Utc::now() - chrono::TimeDelta::hours(1);
        assert_eq!(
            inner.count_events(&who, EventKind::Claim, since).await.unwrap(),
            1
        );
        assert_eq!(metrics.count(Operation::Claim, Outcome::Granted), 1);
    }
}
