use crate::{datetime_from_db_text, datetime_to_db_text, DbError, DbPool};
use chrono::{DateTime, Utc};
use sqlx::Row;

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: i64,
    pub article_id: i64,
    pub user_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::any::AnyRow> for CommentRow {
    fn from_row(row: &'r sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        let created_at_raw: String = row.try_get("created_at")?;
        let updated_at_raw: String = row.try_get("updated_at")?;
        Ok(Self {
            id: row.try_get("id")?,
            article_id: row.try_get("article_id")?,
            user_id: row.try_get("user_id")?,
            body: row.try_get("body")?,
            created_at: datetime_from_db_text(&created_at_raw)?,
            updated_at: datetime_from_db_text(&updated_at_raw)?,
        })
    }
}

pub async fn create_comment(
    pool: &DbPool,
    id: i64,
    article_id: i64,
    user_id: i64,
    body: &str,
) -> Result<CommentRow, DbError> {
    let now = datetime_to_db_text(Utc::now());
    let row = sqlx::query_as::<_, CommentRow>(
        "INSERT INTO comments (id, article_id, user_id, body, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, article_id, user_id, body, created_at, updated_at",
    )
    .bind(id)
    .bind(article_id)
    .bind(user_id)
    .bind(body)
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_comment(pool: &DbPool, id: i64) -> Result<Option<CommentRow>, DbError> {
    let row = sqlx::query_as::<_, CommentRow>(
        "SELECT id, article_id, user_id, body, created_at, updated_at
         FROM comments WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Every comment on an article, oldest first.
pub async fn get_article_comments(
    pool: &DbPool,
    article_id: i64,
) -> Result<Vec<CommentRow>, DbError> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT id, article_id, user_id, body, created_at, updated_at
         FROM comments WHERE article_id = $1 ORDER BY id ASC",
    )
    .bind(article_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Keyset page of an article's comments ordered by ID.
pub async fn list_article_comments(
    pool: &DbPool,
    article_id: i64,
    cursor: Option<i64>,
    limit: i64,
    forward: bool,
) -> Result<Vec<CommentRow>, DbError> {
    let mut sql = String::from(
        "SELECT id, article_id, user_id, body, created_at, updated_at
         FROM comments WHERE article_id = $1",
    );
    let mut bind_n = 1;
    if cursor.is_some() {
        bind_n += 1;
        if forward {
            sql.push_str(&format!(" AND id > ${bind_n}"));
        } else {
            sql.push_str(&format!(" AND id < ${bind_n}"));
        }
    }
    if forward {
        sql.push_str(" ORDER BY id ASC");
    } else {
        sql.push_str(" ORDER BY id DESC");
    }
    bind_n += 1;
    sql.push_str(&format!(" LIMIT ${bind_n}"));

    let mut query = sqlx::query_as::<_, CommentRow>(&sql).bind(article_id);
    if let Some(cursor) = cursor {
        query = query.bind(cursor);
    }
    let rows = query.bind(limit).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn delete_comment(pool: &DbPool, id: i64) -> Result<(), DbError> {
    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
