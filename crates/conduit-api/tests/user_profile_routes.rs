use anyhow::Context;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use conduit_core::{AppConfig, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

struct TestContext {
    app: Router,
    address: String,
}

impl TestContext {
    async fn new() -> anyhow::Result<Self> {
        Self::with_config(AppConfig {
            jwt_secret: "integration-test-secret".to_string(),
            jwt_expiry_secs: 3600,
            registration_enabled: true,
            worker_id: 1,
        })
        .await
    }

    async fn with_config(config: AppConfig) -> anyhow::Result<Self> {
        let db = conduit_db::create_pool("sqlite::memory:", 1).await?;
        conduit_db::run_migrations(&db).await?;

        let app = conduit_api::build_router().with_state(AppState::new(db, config));
        // Unique client address per context so the per-address rate
        // limiter never couples parallel tests.
        let address = format!("client-{}", Uuid::new_v4().simple());
        Ok(Self { app, address })
    }

    async fn request_json(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("x-forwarded-for", &self.address);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }

        let request = if let Some(payload) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder.body(Body::from(payload.to_string()))?
        } else {
            builder.body(Body::empty())?
        };

        let response = self.app.clone().oneshot(request).await?;
        let status = response.status();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let payload = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| json!({ "raw": String::from_utf8_lossy(&body_bytes) }))
        };

        Ok((status, payload))
    }
}

async fn register_user(ctx: &TestContext, username: &str) -> anyhow::Result<String> {
    let (status, payload) = ctx
        .request_json(
            Method::POST,
            "/users",
            None,
            Some(json!({
                "user": {
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "IntegrationPass123!",
                }
            })),
        )
        .await?;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "unexpected register payload: {payload}"
    );
    Ok(payload["user"]["token"]
        .as_str()
        .context("registration should return a token")?
        .to_string())
}

#[tokio::test]
async fn register_login_and_current_user_flow_works() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;

    let (status, registered) = ctx
        .request_json(
            Method::POST,
            "/users",
            None,
            Some(json!({
                "user": {
                    "username": "jake",
                    "email": "jake@example.com",
                    "password": "IntegrationPass123!",
                }
            })),
        )
        .await?;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "unexpected register payload: {registered}"
    );
    assert_eq!(registered["user"]["username"], "jake");
    assert_eq!(registered["user"]["email"], "jake@example.com");
    assert!(registered["user"]["bio"].is_null());
    assert!(registered["user"]["image"].is_null());
    assert!(registered["user"]["token"].is_string());

    let (status, logged_in) = ctx
        .request_json(
            Method::POST,
            "/users/login",
            None,
            Some(json!({
                "user": { "email": "jake@example.com", "password": "IntegrationPass123!" }
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "unexpected login payload: {logged_in}");
    let token = logged_in["user"]["token"]
        .as_str()
        .context("login should return a token")?
        .to_string();

    let (status, me) = ctx
        .request_json(Method::GET, "/user", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["username"], "jake");
    assert_eq!(me["user"]["email"], "jake@example.com");

    Ok(())
}

#[tokio::test]
async fn login_failures_never_say_which_half_was_wrong() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    register_user(&ctx, "selma").await?;

    let (status, wrong_password) = ctx
        .request_json(
            Method::POST,
            "/users/login",
            None,
            Some(json!({
                "user": { "email": "selma@example.com", "password": "not-the-password" }
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(wrong_password["errors"]["email or password"][0], "is invalid");

    let (status, unknown_email) = ctx
        .request_json(
            Method::POST,
            "/users/login",
            None,
            Some(json!({
                "user": { "email": "nobody@example.com", "password": "not-the-password" }
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(unknown_email["errors"]["email or password"][0], "is invalid");

    Ok(())
}

#[tokio::test]
async fn duplicate_registration_reports_the_taken_field() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    register_user(&ctx, "claimed").await?;

    let (status, same_email) = ctx
        .request_json(
            Method::POST,
            "/users",
            None,
            Some(json!({
                "user": {
                    "username": "someone-else",
                    "email": "claimed@example.com",
                    "password": "IntegrationPass123!",
                }
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(same_email["errors"]["email"][0], "has already been taken");

    let (status, same_username) = ctx
        .request_json(
            Method::POST,
            "/users",
            None,
            Some(json!({
                "user": {
                    "username": "claimed",
                    "email": "fresh@example.com",
                    "password": "IntegrationPass123!",
                }
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(same_username["errors"]["username"][0], "has already been taken");

    Ok(())
}

#[tokio::test]
async fn malformed_registration_fields_are_unprocessable() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;

    let (status, bad_email) = ctx
        .request_json(
            Method::POST,
            "/users",
            None,
            Some(json!({
                "user": {
                    "username": "okname",
                    "email": "not-an-email",
                    "password": "IntegrationPass123!",
                }
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(bad_email["errors"]["email"][0], "invalid format");

    let (status, short_password) = ctx
        .request_json(
            Method::POST,
            "/users",
            None,
            Some(json!({
                "user": {
                    "username": "okname",
                    "email": "ok@example.com",
                    "password": "short",
                }
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        short_password["errors"]["password"][0],
        "value is too short (min 8, got 5)"
    );

    Ok(())
}

#[tokio::test]
async fn registration_can_be_disabled() -> anyhow::Result<()> {
    let ctx = TestContext::with_config(AppConfig {
        jwt_secret: "integration-test-secret".to_string(),
        jwt_expiry_secs: 3600,
        registration_enabled: false,
        worker_id: 1,
    })
    .await?;

    let (status, _) = ctx
        .request_json(
            Method::POST,
            "/users",
            None,
            Some(json!({
                "user": {
                    "username": "latecomer",
                    "email": "latecomer@example.com",
                    "password": "IntegrationPass123!",
                }
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn update_user_changes_only_the_sent_fields() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    let token = register_user(&ctx, "editor").await?;

    let (status, updated) = ctx
        .request_json(
            Method::PUT,
            "/user",
            Some(&token),
            Some(json!({
                "user": {
                    "bio": "Ship early, ship often",
                    "image": "https://example.com/editor.png",
                }
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "unexpected update payload: {updated}");
    assert_eq!(updated["user"]["bio"], "Ship early, ship often");
    assert_eq!(updated["user"]["image"], "https://example.com/editor.png");
    assert_eq!(updated["user"]["username"], "editor");
    assert_eq!(updated["user"]["email"], "editor@example.com");

    register_user(&ctx, "occupied").await?;
    let (status, clash) = ctx
        .request_json(
            Method::PUT,
            "/user",
            Some(&token),
            Some(json!({ "user": { "username": "occupied" } })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(clash["errors"]["username"][0], "has already been taken");

    Ok(())
}

#[tokio::test]
async fn current_user_requires_a_valid_token() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;

    let (status, _) = ctx.request_json(Method::GET, "/user", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .request_json(Method::GET, "/user", Some("not-a-real-jwt"), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn follow_and_unfollow_are_reflected_in_the_profile() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    let follower = register_user(&ctx, "follower").await?;
    register_user(&ctx, "celeb").await?;

    let (status, anonymous) = ctx
        .request_json(Method::GET, "/profiles/celeb", None, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(anonymous["profile"]["username"], "celeb");
    assert_eq!(anonymous["profile"]["following"], false);

    let (status, followed) = ctx
        .request_json(Method::POST, "/profiles/celeb/follow", Some(&follower), None)
        .await?;
    assert_eq!(status, StatusCode::OK, "unexpected follow payload: {followed}");
    assert_eq!(followed["profile"]["following"], true);

    let (status, viewed) = ctx
        .request_json(Method::GET, "/profiles/celeb", Some(&follower), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(viewed["profile"]["following"], true);

    let (status, unfollowed) = ctx
        .request_json(
            Method::DELETE,
            "/profiles/celeb/follow",
            Some(&follower),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unfollowed["profile"]["following"], false);

    Ok(())
}

#[tokio::test]
async fn following_yourself_is_rejected() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    let token = register_user(&ctx, "narcissus").await?;

    let (status, _) = ctx
        .request_json(
            Method::POST,
            "/profiles/narcissus/follow",
            Some(&token),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn missing_profiles_are_not_found() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;
    let token = register_user(&ctx, "prober").await?;

    let (status, _) = ctx
        .request_json(Method::GET, "/profiles/ghost", None, None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .request_json(Method::POST, "/profiles/ghost/follow", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn health_and_metrics_endpoints_respond() -> anyhow::Result<()> {
    let ctx = TestContext::new().await?;

    let (status, health) = ctx.request_json(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");

    let (status, metrics) = ctx
        .request_json(Method::GET, "/metrics", None, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let text = metrics["raw"]
        .as_str()
        .context("metrics should be plain text")?;
    assert!(text.contains("conduit_up 1"));
    assert!(text.contains("conduit_http_requests_total"));

    Ok(())
}
