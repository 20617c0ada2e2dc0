use axum::{
    extract::{Path, State},
    Json,
};
use conduit_core::AppState;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{AuthUser, MaybeAuthUser};

pub async fn get_profile(
    State(state): State<AppState>,
    auth: MaybeAuthUser,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let profile = conduit_core::profile::get_profile(&state.db, auth.user_id, &username).await?;
    Ok(Json(json!({ "profile": profile })))
}

pub async fn follow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let profile = conduit_core::profile::follow(&state.db, auth.user_id, &username).await?;
    Ok(Json(json!({ "profile": profile })))
}

pub async fn unfollow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let profile = conduit_core::profile::unfollow(&state.db, auth.user_id, &username).await?;
    Ok(Json(json!({ "profile": profile })))
}
