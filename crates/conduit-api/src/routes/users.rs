use axum::{extract::State, http::StatusCode, Json};
use conduit_core::AppState;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub user: RegisterFields,
}

#[derive(Deserialize)]
pub struct RegisterFields {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !state.config.registration_enabled {
        return Err(ApiError::Forbidden);
    }
    let row = conduit_core::user::register(
        &state.db,
        state.config.worker_id,
        &body.user.email,
        &body.user.username,
        &body.user.password,
    )
    .await?;
    let token = issue_token(&state, row.id)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": conduit_core::user::user_payload(&row, token) })),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub user: LoginFields,
}

#[derive(Deserialize)]
pub struct LoginFields {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let row = conduit_core::user::login(&state.db, &body.user.email, &body.user.password).await?;
    let token = issue_token(&state, row.id)?;
    Ok(Json(
        json!({ "user": conduit_core::user::user_payload(&row, token) }),
    ))
}

pub async fn current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let row = conduit_core::user::get_user(&state.db, auth.user_id)
        .await
        .map_err(|_| ApiError::Unauthorized)?;
    let token = issue_token(&state, row.id)?;
    Ok(Json(
        json!({ "user": conduit_core::user::user_payload(&row, token) }),
    ))
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub user: UpdateUserFields,
}

#[derive(Deserialize)]
pub struct UpdateUserFields {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let row = conduit_core::user::update_user(
        &state.db,
        auth.user_id,
        body.user.email.as_deref(),
        body.user.username.as_deref(),
        body.user.password.as_deref(),
        body.user.bio.as_deref(),
        body.user.image.as_deref(),
    )
    .await?;
    let token = issue_token(&state, row.id)?;
    Ok(Json(
        json!({ "user": conduit_core::user::user_payload(&row, token) }),
    ))
}

fn issue_token(state: &AppState, user_id: i64) -> Result<String, ApiError> {
    conduit_core::auth::create_token(
        user_id,
        &state.config.jwt_secret,
        state.config.jwt_expiry_secs,
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!(e.to_string())))
}
