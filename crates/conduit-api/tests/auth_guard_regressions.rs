use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use conduit_core::{AppConfig, AppState};
use tower::ServiceExt;

struct TestHarness {
    app: Router,
}

impl TestHarness {
    async fn new_without_migrations() -> anyhow::Result<Self> {
        let db = conduit_db::create_pool("sqlite::memory:", 1).await?;
        let state = AppState::new(
            db,
            AppConfig {
                jwt_secret: "integration-test-secret".to_string(),
                jwt_expiry_secs: 3600,
                registration_enabled: true,
                worker_id: 1,
            },
        );
        let app = conduit_api::build_router().with_state(state);
        Ok(Self { app })
    }
}

// Token checks run before any storage access, so a broken or empty
// database must not turn auth failures into 500s.
#[tokio::test]
async fn protected_routes_without_migrations_still_reject_up_front() -> anyhow::Result<()> {
    let harness = TestHarness::new_without_migrations().await?;

    let request = Request::builder()
        .method("GET")
        .uri("/user")
        .body(Body::empty())?;
    let response = harness.app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/articles")
        .body(Body::empty())?;
    let response = harness.app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
