use crate::{datetime_from_db_text, datetime_to_db_text, DbError, DbPool};
use chrono::{DateTime, Utc};
use sqlx::Row;

#[derive(Debug, Clone)]
pub struct ArticleRow {
    pub id: i64,
    pub user_id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::any::AnyRow> for ArticleRow {
    fn from_row(row: &'r sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        let created_at_raw: String = row.try_get("created_at")?;
        let updated_at_raw: String = row.try_get("updated_at")?;
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            slug: row.try_get("slug")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            body: row.try_get("body")?,
            created_at: datetime_from_db_text(&created_at_raw)?,
            updated_at: datetime_from_db_text(&updated_at_raw)?,
        })
    }
}

/// Filters for the article listing. All of them AND together; ID
/// resolution from names happens a layer up.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleFilter {
    pub author_id: Option<i64>,
    pub tag_id: Option<i64>,
    pub favorited_by: Option<i64>,
    pub followed_by: Option<i64>,
}

pub async fn create_article(
    pool: &DbPool,
    id: i64,
    user_id: i64,
    slug: &str,
    title: &str,
    description: &str,
    body: &str,
) -> Result<ArticleRow, DbError> {
    let now = datetime_to_db_text(Utc::now());
    let row = sqlx::query_as::<_, ArticleRow>(
        "INSERT INTO articles (id, user_id, slug, title, description, body, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING id, user_id, slug, title, description, body, created_at, updated_at",
    )
    .bind(id)
    .bind(user_id)
    .bind(slug)
    .bind(title)
    .bind(description)
    .bind(body)
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await
    .map_err(crate::map_insert_error)?;
    Ok(row)
}

pub async fn get_article_by_id(pool: &DbPool, id: i64) -> Result<Option<ArticleRow>, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(
        "SELECT id, user_id, slug, title, description, body, created_at, updated_at
         FROM articles WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_article_by_slug(pool: &DbPool, slug: &str) -> Result<Option<ArticleRow>, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(
        "SELECT id, user_id, slug, title, description, body, created_at, updated_at
         FROM articles WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Partial update; absent fields keep their stored value.
pub async fn update_article(
    pool: &DbPool,
    id: i64,
    slug: Option<&str>,
    title: Option<&str>,
    description: Option<&str>,
    body: Option<&str>,
) -> Result<ArticleRow, DbError> {
    let now = datetime_to_db_text(Utc::now());
    let row = sqlx::query_as::<_, ArticleRow>(
        "UPDATE articles SET slug = COALESCE($2, slug), title = COALESCE($3, title), description = COALESCE($4, description), body = COALESCE($5, body), updated_at = $6
         WHERE id = $1
         RETURNING id, user_id, slug, title, description, body, created_at, updated_at",
    )
    .bind(id)
    .bind(slug)
    .bind(title)
    .bind(description)
    .bind(body)
    .bind(&now)
    .fetch_one(pool)
    .await
    .map_err(crate::map_insert_error)?;
    Ok(row)
}

pub async fn delete_article(pool: &DbPool, id: i64) -> Result<(), DbError> {
    sqlx::query("DELETE FROM articles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Keyset page of articles ordered by ID. Forward reads ascending past the
/// cursor, backward reads descending before it; callers re-order for
/// presentation.
pub async fn list_articles(
    pool: &DbPool,
    filter: &ArticleFilter,
    cursor: Option<i64>,
    limit: i64,
    forward: bool,
) -> Result<Vec<ArticleRow>, DbError> {
    let mut sql = String::from(
        "SELECT a.id, a.user_id, a.slug, a.title, a.description, a.body, a.created_at, a.updated_at
         FROM articles a",
    );
    if filter.tag_id.is_some() {
        sql.push_str(" JOIN article_tags t ON t.article_id = a.id");
    }
    if filter.favorited_by.is_some() {
        sql.push_str(" JOIN article_favorites fav ON fav.article_id = a.id");
    }
    if filter.followed_by.is_some() {
        sql.push_str(" JOIN follows fol ON fol.target_id = a.user_id");
    }

    let mut binds: Vec<i64> = Vec::new();
    let mut clauses: Vec<String> = Vec::new();
    if let Some(author_id) = filter.author_id {
        binds.push(author_id);
        clauses.push(format!("a.user_id = ${}", binds.len()));
    }
    if let Some(tag_id) = filter.tag_id {
        binds.push(tag_id);
        clauses.push(format!("t.tag_id = ${}", binds.len()));
    }
    if let Some(favorited_by) = filter.favorited_by {
        binds.push(favorited_by);
        clauses.push(format!("fav.user_id = ${}", binds.len()));
    }
    if let Some(followed_by) = filter.followed_by {
        binds.push(followed_by);
        clauses.push(format!("fol.user_id = ${}", binds.len()));
    }
    if let Some(cursor) = cursor {
        binds.push(cursor);
        if forward {
            clauses.push(format!("a.id > ${}", binds.len()));
        } else {
            clauses.push(format!("a.id < ${}", binds.len()));
        }
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    if forward {
        sql.push_str(" ORDER BY a.id ASC");
    } else {
        sql.push_str(" ORDER BY a.id DESC");
    }
    binds.push(limit);
    sql.push_str(&format!(" LIMIT ${}", binds.len()));

    let mut query = sqlx::query_as::<_, ArticleRow>(&sql);
    for bind in &binds {
        query = query.bind(*bind);
    }
    Ok(query.fetch_all(pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DbPool {
        let pool = crate::create_pool("sqlite::memory:", 1).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn seed_author(pool: &DbPool, id: i64) {
        crate::users::create_user(
            pool,
            id,
            &format!("user{id}@example.com"),
            &format!("user{id}"),
            "hash",
        )
        .await
        .unwrap();
    }

    async fn seed_articles(pool: &DbPool, user_id: i64, ids: &[i64]) {
        for id in ids {
            create_article(
                pool,
                *id,
                user_id,
                &format!("article-{id}"),
                &format!("Article {id}"),
                "about",
                "body",
            )
            .await
            .unwrap();
        }
    }

    fn ids(rows: &[ArticleRow]) -> Vec<i64> {
        rows.iter().map(|row| row.id).collect()
    }

    #[tokio::test]
    async fn test_create_and_get_article() {
        let pool = test_pool().await;
        seed_author(&pool, 1).await;
        let article = create_article(&pool, 10, 1, "hello-world", "Hello World", "greeting", "hi")
            .await
            .unwrap();
        assert_eq!(article.slug, "hello-world");

        let by_slug = get_article_by_slug(&pool, "hello-world")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_slug.id, 10);
        assert!(get_article_by_slug(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_a_unique_violation() {
        let pool = test_pool().await;
        seed_author(&pool, 1).await;
        create_article(&pool, 10, 1, "hello", "Hello", "d", "b")
            .await
            .unwrap();
        let err = create_article(&pool, 11, 1, "hello", "Hello again", "d", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation));
    }

    #[tokio::test]
    async fn test_update_article_keeps_absent_fields() {
        let pool = test_pool().await;
        seed_author(&pool, 1).await;
        create_article(&pool, 10, 1, "hello", "Hello", "d", "b")
            .await
            .unwrap();
        let updated = update_article(&pool, 10, None, Some("Hello again"), None, None)
            .await
            .unwrap();
        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.slug, "hello");
        assert_eq!(updated.body, "b");
    }

    #[tokio::test]
    async fn test_list_articles_forward_reads_ascending_past_the_cursor() {
        let pool = test_pool().await;
        seed_author(&pool, 1).await;
        seed_articles(&pool, 1, &[1, 2, 3, 4, 5]).await;

        let rows = list_articles(&pool, &ArticleFilter::default(), Some(2), 10, true)
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_list_articles_backward_reads_descending_before_the_cursor() {
        let pool = test_pool().await;
        seed_author(&pool, 1).await;
        seed_articles(&pool, 1, &[1, 2, 3, 4, 5]).await;

        let rows = list_articles(&pool, &ArticleFilter::default(), Some(4), 2, false)
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec![3, 2]);

        let rows = list_articles(&pool, &ArticleFilter::default(), None, 3, false)
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec![5, 4, 3]);
    }

    #[tokio::test]
    async fn test_list_articles_filters_by_author_and_tag() {
        let pool = test_pool().await;
        seed_author(&pool, 1).await;
        seed_author(&pool, 2).await;
        seed_articles(&pool, 1, &[1, 2]).await;
        seed_articles(&pool, 2, &[3]).await;

        let tag = crate::tags::get_or_create_tag(&pool, 100, "rust").await.unwrap();
        crate::tags::add_article_tag(&pool, 1, tag.id).await.unwrap();
        crate::tags::add_article_tag(&pool, 3, tag.id).await.unwrap();

        let filter = ArticleFilter {
            author_id: Some(1),
            ..Default::default()
        };
        let rows = list_articles(&pool, &filter, None, 10, true).await.unwrap();
        assert_eq!(ids(&rows), vec![1, 2]);

        let filter = ArticleFilter {
            tag_id: Some(tag.id),
            ..Default::default()
        };
        let rows = list_articles(&pool, &filter, None, 10, true).await.unwrap();
        assert_eq!(ids(&rows), vec![1, 3]);

        let filter = ArticleFilter {
            author_id: Some(1),
            tag_id: Some(tag.id),
            ..Default::default()
        };
        let rows = list_articles(&pool, &filter, None, 10, true).await.unwrap();
        assert_eq!(ids(&rows), vec![1]);
    }

    #[tokio::test]
    async fn test_list_articles_filters_by_favoriting_user() {
        let pool = test_pool().await;
        seed_author(&pool, 1).await;
        seed_author(&pool, 2).await;
        seed_articles(&pool, 1, &[1, 2, 3]).await;

        crate::favorites::favorite(&pool, 2, 2).await.unwrap();

        let filter = ArticleFilter {
            favorited_by: Some(2),
            ..Default::default()
        };
        let rows = list_articles(&pool, &filter, None, 10, true).await.unwrap();
        assert_eq!(ids(&rows), vec![2]);
    }

    #[tokio::test]
    async fn test_list_articles_feed_follows_only() {
        let pool = test_pool().await;
        seed_author(&pool, 1).await;
        seed_author(&pool, 2).await;
        seed_author(&pool, 3).await;
        seed_articles(&pool, 1, &[1]).await;
        seed_articles(&pool, 2, &[2]).await;
        seed_articles(&pool, 3, &[3]).await;

        crate::follows::follow(&pool, 1, 2).await.unwrap();
        crate::follows::follow(&pool, 1, 3).await.unwrap();

        let filter = ArticleFilter {
            followed_by: Some(1),
            ..Default::default()
        };
        let rows = list_articles(&pool, &filter, None, 10, true).await.unwrap();
        assert_eq!(ids(&rows), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_delete_article_removes_the_row() {
        let pool = test_pool().await;
        seed_author(&pool, 1).await;
        seed_articles(&pool, 1, &[1]).await;

        delete_article(&pool, 1).await.unwrap();
        assert!(get_article_by_id(&pool, 1).await.unwrap().is_none());
    }
}
