use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use conduit_core::AppState;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{AuthUser, MaybeAuthUser};

pub async fn get_comments(
    State(state): State<AppState>,
    auth: MaybeAuthUser,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let comments = conduit_core::comment::get_comments(&state.db, auth.user_id, &slug).await?;
    Ok(Json(json!({ "comments": comments })))
}

#[derive(Deserialize)]
pub struct AddCommentRequest {
    pub comment: AddCommentFields,
}

#[derive(Deserialize)]
pub struct AddCommentFields {
    pub body: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
    Json(body): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let comment = conduit_core::comment::add_comment(
        &state.db,
        state.config.worker_id,
        auth.user_id,
        &slug,
        &body.comment.body,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(json!({ "comment": comment }))))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((slug, comment_id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    conduit_core::comment::delete_comment(&state.db, auth.user_id, &slug, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
