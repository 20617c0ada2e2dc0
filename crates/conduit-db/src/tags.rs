use crate::{DbError, DbPool};
use sqlx::Row;

#[derive(Debug, Clone)]
pub struct TagRow {
    pub id: i64,
    pub name: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::any::AnyRow> for TagRow {
    fn from_row(row: &'r sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }
}

/// Upsert by name. `id_candidate` is only used when the name is new.
pub async fn get_or_create_tag(
    pool: &DbPool,
    id_candidate: i64,
    name: &str,
) -> Result<TagRow, DbError> {
    sqlx::query("INSERT INTO tags (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
        .bind(id_candidate)
        .bind(name)
        .execute(pool)
        .await?;
    let row = sqlx::query_as::<_, TagRow>("SELECT id, name FROM tags WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn get_tag_by_name(pool: &DbPool, name: &str) -> Result<Option<TagRow>, DbError> {
    let row = sqlx::query_as::<_, TagRow>("SELECT id, name FROM tags WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_tag_names(pool: &DbPool) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query("SELECT name FROM tags ORDER BY name ASC")
        .fetch_all(pool)
        .await?;
    rows.iter()
        .map(|row| row.try_get::<String, _>("name").map_err(DbError::from))
        .collect()
}

pub async fn add_article_tag(pool: &DbPool, article_id: i64, tag_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO article_tags (article_id, tag_id) VALUES ($1, $2)
         ON CONFLICT (article_id, tag_id) DO NOTHING",
    )
    .bind(article_id)
    .bind(tag_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn tags_for_article(pool: &DbPool, article_id: i64) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query(
        "SELECT t.name FROM tags t
         JOIN article_tags at ON at.tag_id = t.id
         WHERE at.article_id = $1 ORDER BY t.name ASC",
    )
    .bind(article_id)
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| row.try_get::<String, _>("name").map_err(DbError::from))
        .collect()
}

/// Tag names per article for a batch of articles.
pub async fn tags_for_articles(
    pool: &DbPool,
    article_ids: &[i64],
) -> Result<Vec<(i64, String)>, DbError> {
    if article_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT at.article_id, t.name FROM tags t
         JOIN article_tags at ON at.tag_id = t.id
         WHERE at.article_id IN ({}) ORDER BY t.name ASC",
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
            let name: String = row.try_get("name")?;
            Ok((article_id, name))
        })
        .collect()
}
