use axum::{extract::State, Json};
use conduit_core::AppState;
use serde_json::{json, Value};

use crate::error::ApiError;

pub async fn get_tags(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let tags = conduit_core::tag::list_tags(&state.db).await?;
    Ok(Json(json!({ "tags": tags })))
}
