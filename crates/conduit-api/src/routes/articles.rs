use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use conduit_core::AppState;
use conduit_models::article::Article;
use conduit_util::pagination::{Direction, Page, PageRequest};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{AuthUser, MaybeAuthUser};

#[derive(Deserialize)]
pub struct ListArticlesQuery {
    pub tag: Option<String>,
    pub author: Option<String>,
    pub favorited: Option<String>,
    pub limit: Option<i32>,
    pub cursor: Option<String>,
    pub direction: Option<String>,
}

#[derive(Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i32>,
    pub cursor: Option<String>,
    pub direction: Option<String>,
}

/// Raw paging params straight into the normalizing constructor. An
/// absent or unrecognized direction walks backward from the newest row.
fn page_request(cursor: Option<String>, limit: Option<i32>, direction: Option<&str>) -> PageRequest {
    PageRequest::new(cursor, limit.unwrap_or(0), direction.and_then(Direction::parse))
}

fn page_payload(page: &Page<Article>) -> Value {
    json!({
        "articles": page.items(),
        "hasNext": page.has_next(),
        "hasPrevious": page.has_previous(),
        "startCursor": page.start_cursor(),
        "endCursor": page.end_cursor(),
    })
}

pub async fn list_articles(
    State(state): State<AppState>,
    auth: MaybeAuthUser,
    Query(query): Query<ListArticlesQuery>,
) -> Result<Json<Value>, ApiError> {
    let request = page_request(query.cursor, query.limit, query.direction.as_deref());
    let page = conduit_core::article::list_articles(
        &state.db,
        auth.user_id,
        query.tag.as_deref(),
        query.author.as_deref(),
        query.favorited.as_deref(),
        &request,
    )
    .await?;
    Ok(Json(page_payload(&page)))
}

pub async fn feed(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Value>, ApiError> {
    let request = page_request(query.cursor, query.limit, query.direction.as_deref());
    let page = conduit_core::article::feed(&state.db, auth.user_id, &request).await?;
    Ok(Json(page_payload(&page)))
}

pub async fn get_article(
    State(state): State<AppState>,
    auth: MaybeAuthUser,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let article = conduit_core::article::get_article(&state.db, auth.user_id, &slug).await?;
    Ok(Json(json!({ "article": article })))
}

#[derive(Deserialize)]
pub struct CreateArticleRequest {
    pub article: CreateArticleFields,
}

#[derive(Deserialize)]
pub struct CreateArticleFields {
    pub title: String,
    pub description: String,
    pub body: String,
    #[serde(rename = "tagList", default)]
    pub tag_list: Vec<String>,
}

pub async fn create_article(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateArticleRequest>,
) -> Result<Json<Value>, ApiError> {
    let article = conduit_core::article::create_article(
        &state.db,
        state.config.worker_id,
        auth.user_id,
        &body.article.title,
        &body.article.description,
        &body.article.body,
        &body.article.tag_list,
    )
    .await?;
    Ok(Json(json!({ "article": article })))
}

#[derive(Deserialize)]
pub struct UpdateArticleRequest {
    pub article: UpdateArticleFields,
}

#[derive(Deserialize)]
pub struct UpdateArticleFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
}

pub async fn update_article(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
    Json(body): Json<UpdateArticleRequest>,
) -> Result<Json<Value>, ApiError> {
    let article = conduit_core::article::update_article(
        &state.db,
        auth.user_id,
        &slug,
        body.article.title.as_deref(),
        body.article.description.as_deref(),
        body.article.body.as_deref(),
    )
    .await?;
    Ok(Json(json!({ "article": article })))
}

pub async fn delete_article(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    conduit_core::article::delete_article(&state.db, auth.user_id, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn favorite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let article = conduit_core::article::favorite(&state.db, auth.user_id, &slug).await?;
    Ok(Json(json!({ "article": article })))
}

pub async fn unfavorite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let article = conduit_core::article::unfavorite(&state.db, auth.user_id, &slug).await?;
    Ok(Json(json!({ "article": article })))
}
