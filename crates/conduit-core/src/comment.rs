use std::collections::{HashMap, HashSet};

use conduit_db::comments::CommentRow;
use conduit_db::users::UserRow;
use conduit_db::DbPool;
use conduit_models::comment::Comment;
use conduit_util::pagination::{Page, PageRequest};

use crate::article::decode_cursor;
use crate::error::CoreError;
use crate::profile::profile_payload;

pub async fn add_comment(
    pool: &DbPool,
    worker_id: u16,
    user_id: i64,
    slug: &str,
    body: &str,
) -> Result<Comment, CoreError> {
    if body.trim().is_empty() {
        return Err(CoreError::validation("body", "can't be empty"));
    }
    conduit_util::validation::validate_comment_body(body)
        .map_err(|e| CoreError::validation("body", e.to_string()))?;

    let article = conduit_db::articles::get_article_by_slug(pool, slug)
        .await?
        .ok_or(CoreError::NotFound)?;
    let comment_id = conduit_util::snowflake::generate(worker_id);
    let row = conduit_db::comments::create_comment(pool, comment_id, article.id, user_id, body)
        .await?;
    let author = conduit_db::users::get_user_by_id(pool, user_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    Ok(comment_payload(row, &author, false))
}

/// Every comment on an article, oldest first.
pub async fn get_comments(
    pool: &DbPool,
    viewer: Option<i64>,
    slug: &str,
) -> Result<Vec<Comment>, CoreError> {
    let article = conduit_db::articles::get_article_by_slug(pool, slug)
        .await?
        .ok_or(CoreError::NotFound)?;
    let rows = conduit_db::comments::get_article_comments(pool, article.id).await?;
    let (authors, following) = comment_context(pool, viewer, &rows).await?;
    rows.into_iter()
        .map(|row| {
            let author_id = row.user_id;
            let author = authors.get(&author_id).ok_or_else(|| {
                CoreError::Internal(format!("author {author_id} missing for comment {}", row.id))
            })?;
            Ok(comment_payload(row, author, following.contains(&author_id)))
        })
        .collect()
}

/// Cursor window over an article's comments.
pub async fn list_comments(
    pool: &DbPool,
    viewer: Option<i64>,
    slug: &str,
    request: &PageRequest,
) -> Result<Page<Comment>, CoreError> {
    let article = conduit_db::articles::get_article_by_slug(pool, slug)
        .await?
        .ok_or(CoreError::NotFound)?;
    let cursor = decode_cursor(request.cursor())?;
    let rows = conduit_db::comments::list_article_comments(
        pool,
        article.id,
        cursor,
        request.query_limit() as i64,
        request.is_forward(),
    )
    .await?;
    let page = Page::paginate(request, rows, |row| row.id.to_string());
    let (authors, following) = comment_context(pool, viewer, page.items()).await?;
    page.try_map(|row| {
        let author_id = row.user_id;
        let author = authors.get(&author_id).ok_or_else(|| {
            CoreError::Internal(format!("author {author_id} missing for comment {}", row.id))
        })?;
        Ok(comment_payload(row, author, following.contains(&author_id)))
    })
}

/// Delete a comment. The comment author and the article author can.
pub async fn delete_comment(
    pool: &DbPool,
    user_id: i64,
    slug: &str,
    comment_id: i64,
) -> Result<(), CoreError> {
    let article = conduit_db::articles::get_article_by_slug(pool, slug)
        .await?
        .ok_or(CoreError::NotFound)?;
    let comment = conduit_db::comments::get_comment(pool, comment_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    if comment.article_id != article.id {
        return Err(CoreError::NotFound);
    }
    if comment.user_id != user_id && article.user_id != user_id {
        return Err(CoreError::Forbidden);
    }
    conduit_db::comments::delete_comment(pool, comment_id).await?;
    Ok(())
}

async fn comment_context(
    pool: &DbPool,
    viewer: Option<i64>,
    rows: &[CommentRow],
) -> Result<(HashMap<i64, UserRow>, HashSet<i64>), CoreError> {
    let mut author_ids: Vec<i64> = rows.iter().map(|row| row.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<i64, UserRow> = conduit_db::users::get_users_by_ids(pool, &author_ids)
        .await?
        .into_iter()
        .map(|row| (row.id, row))
        .collect();
    let following: HashSet<i64> = match viewer {
        Some(viewer_id) => conduit_db::follows::following_ids(pool, viewer_id, &author_ids)
            .await?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };
    Ok((authors, following))
}

fn comment_payload(row: CommentRow, author: &UserRow, following: bool) -> Comment {
    Comment {
        id: row.id.to_string(),
        body: row.body,
        created_at: row.created_at,
        updated_at: row.updated_at,
        author: profile_payload(author, following),
    }
}
