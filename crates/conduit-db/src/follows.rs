use crate::{datetime_to_db_text, DbError, DbPool};
use chrono::Utc;
use sqlx::Row;

pub async fn follow(pool: &DbPool, user_id: i64, target_id: i64) -> Result<(), DbError> {
    let now = datetime_to_db_text(Utc::now());
    sqlx::query(
        "INSERT INTO follows (user_id, target_id, created_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (user_id, target_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(target_id)
    .bind(&now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn unfollow(pool: &DbPool, user_id: i64, target_id: i64) -> Result<(), DbError> {
    sqlx::query("DELETE FROM follows WHERE user_id = $1 AND target_id = $2")
        .bind(user_id)
        .bind(target_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn is_following(pool: &DbPool, user_id: i64, target_id: i64) -> Result<bool, DbError> {
    let row = sqlx::query("SELECT 1 AS one FROM follows WHERE user_id = $1 AND target_id = $2")
        .bind(user_id)
        .bind(target_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// IDs of the users that `user_id` follows, out of `target_ids`.
pub async fn following_ids(
    pool: &DbPool,
    user_id: i64,
    target_ids: &[i64],
) -> Result<Vec<i64>, DbError> {
    if target_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT target_id FROM follows WHERE user_id = $1 AND target_id IN ({})",
        crate::id_placeholders(2, target_ids.len())
    );
    let mut query = sqlx::query(&sql).bind(user_id);
    for id in target_ids {
        query = query.bind(*id);
    }
    let rows = query.fetch_all(pool).await?;
    rows.iter()
        .map(|row| row.try_get::<i64, _>("target_id").map_err(DbError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DbPool {
        let pool = crate::create_pool("sqlite::memory:", 1).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn seed_users(pool: &DbPool, count: i64) {
        for n in 1..=count {
            crate::users::create_user(
                pool,
                n,
                &format!("user{n}@example.com"),
                &format!("user{n}"),
                "hash",
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_follow_unfollow_round_trip() {
        let pool = test_pool().await;
        seed_users(&pool, 2).await;

        assert!(!is_following(&pool, 1, 2).await.unwrap());
        follow(&pool, 1, 2).await.unwrap();
        assert!(is_following(&pool, 1, 2).await.unwrap());
        assert!(!is_following(&pool, 2, 1).await.unwrap());

        unfollow(&pool, 1, 2).await.unwrap();
        assert!(!is_following(&pool, 1, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let pool = test_pool().await;
        seed_users(&pool, 2).await;

        follow(&pool, 1, 2).await.unwrap();
        follow(&pool, 1, 2).await.unwrap();
        assert!(is_following(&pool, 1, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_following_ids_filters_to_requested_targets() {
        let pool = test_pool().await;
        seed_users(&pool, 4).await;

        follow(&pool, 1, 2).await.unwrap();
        follow(&pool, 1, 3).await.unwrap();

        let ids = following_ids(&pool, 1, &[2, 4]).await.unwrap();
        assert_eq!(ids, vec![2]);
        assert!(following_ids(&pool, 1, &[]).await.unwrap().is_empty());
    }
}
