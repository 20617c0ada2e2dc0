use crate::{datetime_to_db_text, DbError, DbPool};
use chrono::Utc;
use sqlx::Row;

pub async fn favorite(pool: &DbPool, article_id: i64, user_id: i64) -> Result<(), DbError> {
    let now = datetime_to_db_text(Utc::now());
    sqlx::query(
        "INSERT INTO article_favorites (article_id, user_id, created_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (article_id, user_id) DO NOTHING",
    )
    .bind(article_id)
    .bind(user_id)
    .bind(&now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn unfavorite(pool: &DbPool, article_id: i64, user_id: i64) -> Result<(), DbError> {
    sqlx::query("DELETE FROM article_favorites WHERE article_id = $1 AND user_id = $2")
        .bind(article_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn is_favorited(pool: &DbPool, article_id: i64, user_id: i64) -> Result<bool, DbError> {
    let row =
        sqlx::query("SELECT 1 AS one FROM article_favorites WHERE article_id = $1 AND user_id = $2")
            .bind(article_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

pub async fn count_favorites(pool: &DbPool, article_id: i64) -> Result<i64, DbError> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM article_favorites WHERE article_id = $1")
        .bind(article_id)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("n")?)
}

/// IDs of the articles that `user_id` favorited, out of `article_ids`.
pub async fn favorited_ids(
    pool: &DbPool,
    user_id: i64,
    article_ids: &[i64],
) -> Result<Vec<i64>, DbError> {
    if article_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT article_id FROM article_favorites WHERE user_id = $1 AND article_id IN ({})",
        crate::id_placeholders(2, article_ids.len())
    );
    let mut query = sqlx::query(&sql).bind(user_id);
    for id in article_ids {
        query = query.bind(*id);
    }
    let rows = query.fetch_all(pool).await?;
    rows.iter()
        .map(|row| row.try_get::<i64, _>("article_id").map_err(DbError::from))
        .collect()
}

/// Favorite counts per article; articles with no favorites are absent.
pub async fn favorite_counts(
    pool: &DbPool,
    article_ids: &[i64],
) -> Result<Vec<(i64, i64)>, DbError> {
    if article_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT article_id, COUNT(*) AS n FROM article_favorites WHERE article_id IN ({})
         GROUP BY article_id",
        crate::id_placeholders(1, article_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in article_ids {
        query = query.bind(*id);
    }
    let rows = query.fetch_all(pool).await?;
    rows.iter()
        .map(|row| {
            let article_id: i64 = row.try_get("article_id")?;
            let n: i64 = row.try_get("n")?;
            Ok((article_id, n))
        })
        .collect()
}
