use std::collections::{HashMap, HashSet};

use conduit_db::articles::{ArticleFilter, ArticleRow};
use conduit_db::users::UserRow;
use conduit_db::{DbError, DbPool};
use conduit_models::article::Article;
use conduit_util::pagination::{Page, PageRequest};

use crate::error::CoreError;
use crate::profile::profile_payload;

/// Suffix retries before giving up on a colliding slug.
const SLUG_ATTEMPTS: usize = 3;

/// Position tokens are article IDs in decimal. Empty means unset.
pub(crate) fn decode_cursor(cursor: &str) -> Result<Option<i64>, CoreError> {
    if cursor.is_empty() {
        return Ok(None);
    }
    cursor
        .parse::<i64>()
        .map(Some)
        .map_err(|_| CoreError::BadRequest("cursor is not a valid position token".into()))
}

fn validate_fields(
    title: Option<&str>,
    description: Option<&str>,
    body: Option<&str>,
) -> Result<(), CoreError> {
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err(CoreError::validation("title", "can't be empty"));
        }
        conduit_util::validation::validate_article_title(title)
            .map_err(|e| CoreError::validation("title", e.to_string()))?;
    }
    if let Some(description) = description {
        if description.trim().is_empty() {
            return Err(CoreError::validation("description", "can't be empty"));
        }
        conduit_util::validation::validate_article_description(description)
            .map_err(|e| CoreError::validation("description", e.to_string()))?;
    }
    if let Some(body) = body {
        if body.trim().is_empty() {
            return Err(CoreError::validation("body", "can't be empty"));
        }
        conduit_util::validation::validate_article_body(body)
            .map_err(|e| CoreError::validation("body", e.to_string()))?;
    }
    Ok(())
}

fn slug_candidate(base: &str) -> String {
    if base.is_empty() {
        conduit_util::slug::random_suffix()
    } else {
        format!("{base}-{}", conduit_util::slug::random_suffix())
    }
}

/// Create an article with its tags. The slug derives from the title and
/// picks up a random suffix when taken.
pub async fn create_article(
    pool: &DbPool,
    worker_id: u16,
    author_id: i64,
    title: &str,
    description: &str,
    body: &str,
    tag_list: &[String],
) -> Result<Article, CoreError> {
    validate_fields(Some(title), Some(description), Some(body))?;
    for tag in tag_list {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        conduit_util::validation::validate_tag_name(tag)
            .map_err(|e| CoreError::validation("tagList", e.to_string()))?;
    }

    let article_id = conduit_util::snowflake::generate(worker_id);
    let base = conduit_util::slug::slugify(title);
    let mut candidate = if base.is_empty() {
        conduit_util::slug::random_suffix()
    } else {
        base.clone()
    };
    let mut attempt = 0;
    let row = loop {
        match conduit_db::articles::create_article(
            pool,
            article_id,
            author_id,
            &candidate,
            title,
            description,
            body,
        )
        .await
        {
            Ok(row) => break row,
            Err(DbError::UniqueViolation) if attempt < SLUG_ATTEMPTS => {
                attempt += 1;
                candidate = slug_candidate(&base);
            }
            Err(DbError::UniqueViolation) => {
                return Err(CoreError::validation("title", "produces a duplicate slug"))
            }
            Err(e) => return Err(e.into()),
        }
    };

    for tag in tag_list {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        let tag_row = conduit_db::tags::get_or_create_tag(
            pool,
            conduit_util::snowflake::generate(worker_id),
            tag,
        )
        .await?;
        conduit_db::tags::add_article_tag(pool, row.id, tag_row.id).await?;
    }

    tracing::info!("article created: {}", row.slug);
    assemble_article(pool, Some(author_id), row).await
}

pub async fn get_article(
    pool: &DbPool,
    viewer: Option<i64>,
    slug: &str,
) -> Result<Article, CoreError> {
    let row = conduit_db::articles::get_article_by_slug(pool, slug)
        .await?
        .ok_or(CoreError::NotFound)?;
    assemble_article(pool, viewer, row).await
}

/// Edit an article. Only the author can; a new title re-derives the slug.
pub async fn update_article(
    pool: &DbPool,
    user_id: i64,
    slug: &str,
    title: Option<&str>,
    description: Option<&str>,
    body: Option<&str>,
) -> Result<Article, CoreError> {
    let row = conduit_db::articles::get_article_by_slug(pool, slug)
        .await?
        .ok_or(CoreError::NotFound)?;
    if row.user_id != user_id {
        return Err(CoreError::Forbidden);
    }
    validate_fields(title, description, body)?;

    let rebased = title.map(conduit_util::slug::slugify);
    let mut new_slug = match &rebased {
        Some(base) => {
            let candidate = if base.is_empty() {
                conduit_util::slug::random_suffix()
            } else {
                base.clone()
            };
            (candidate != row.slug).then_some(candidate)
        }
        None => None,
    };

    let mut attempt = 0;
    let updated = loop {
        match conduit_db::articles::update_article(
            pool,
            row.id,
            new_slug.as_deref(),
            title,
            description,
            body,
        )
        .await
        {
            Ok(updated) => break updated,
            Err(DbError::UniqueViolation) if attempt < SLUG_ATTEMPTS => {
                attempt += 1;
                new_slug = Some(slug_candidate(rebased.as_deref().unwrap_or("")));
            }
            Err(DbError::UniqueViolation) => {
                return Err(CoreError::validation("title", "produces a duplicate slug"))
            }
            Err(e) => return Err(e.into()),
        }
    };

    assemble_article(pool, Some(user_id), updated).await
}

/// Delete an article. Only the author can.
pub async fn delete_article(pool: &DbPool, user_id: i64, slug: &str) -> Result<(), CoreError> {
    let row = conduit_db::articles::get_article_by_slug(pool, slug)
        .await?
        .ok_or(CoreError::NotFound)?;
    if row.user_id != user_id {
        return Err(CoreError::Forbidden);
    }
    conduit_db::articles::delete_article(pool, row.id).await?;
    Ok(())
}

pub async fn favorite(pool: &DbPool, user_id: i64, slug: &str) -> Result<Article, CoreError> {
    let row = conduit_db::articles::get_article_by_slug(pool, slug)
        .await?
        .ok_or(CoreError::NotFound)?;
    conduit_db::favorites::favorite(pool, row.id, user_id).await?;
    assemble_article(pool, Some(user_id), row).await
}

pub async fn unfavorite(pool: &DbPool, user_id: i64, slug: &str) -> Result<Article, CoreError> {
    let row = conduit_db::articles::get_article_by_slug(pool, slug)
        .await?
        .ok_or(CoreError::NotFound)?;
    conduit_db::favorites::unfavorite(pool, row.id, user_id).await?;
    assemble_article(pool, Some(user_id), row).await
}

/// Global article window, optionally filtered by tag, author, or the
/// user who favorited. An unknown filter name yields an empty page.
pub async fn list_articles(
    pool: &DbPool,
    viewer: Option<i64>,
    tag: Option<&str>,
    author: Option<&str>,
    favorited: Option<&str>,
    request: &PageRequest,
) -> Result<Page<Article>, CoreError> {
    let mut filter = ArticleFilter::default();
    if let Some(tag) = tag {
        match conduit_db::tags::get_tag_by_name(pool, tag).await? {
            Some(row) => filter.tag_id = Some(row.id),
            None => return Ok(empty_page(request)),
        }
    }
    if let Some(author) = author {
        match conduit_db::users::get_user_by_username(pool, author).await? {
            Some(row) => filter.author_id = Some(row.id),
            None => return Ok(empty_page(request)),
        }
    }
    if let Some(favorited) = favorited {
        match conduit_db::users::get_user_by_username(pool, favorited).await? {
            Some(row) => filter.favorited_by = Some(row.id),
            None => return Ok(empty_page(request)),
        }
    }
    fetch_page(pool, viewer, &filter, request).await
}

/// Articles by the users `user_id` follows.
pub async fn feed(
    pool: &DbPool,
    user_id: i64,
    request: &PageRequest,
) -> Result<Page<Article>, CoreError> {
    let filter = ArticleFilter {
        followed_by: Some(user_id),
        ..Default::default()
    };
    fetch_page(pool, Some(user_id), &filter, request).await
}

fn empty_page(request: &PageRequest) -> Page<Article> {
    Page::paginate(request, Vec::new(), |article: &Article| article.id.clone())
}

async fn fetch_page(
    pool: &DbPool,
    viewer: Option<i64>,
    filter: &ArticleFilter,
    request: &PageRequest,
) -> Result<Page<Article>, CoreError> {
    let cursor = decode_cursor(request.cursor())?;
    let rows = conduit_db::articles::list_articles(
        pool,
        filter,
        cursor,
        request.query_limit() as i64,
        request.is_forward(),
    )
    .await?;
    let page = Page::paginate(request, rows, |row| row.id.to_string());
    assemble_page(pool, viewer, page).await
}

/// Resolve authors, tags, favorites, and follow state for a window of
/// article rows with one batched query per concern.
async fn assemble_page(
    pool: &DbPool,
    viewer: Option<i64>,
    page: Page<ArticleRow>,
) -> Result<Page<Article>, CoreError> {
    let article_ids: Vec<i64> = page.items().iter().map(|row| row.id).collect();
    let mut author_ids: Vec<i64> = page.items().iter().map(|row| row.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<i64, UserRow> = conduit_db::users::get_users_by_ids(pool, &author_ids)
        .await?
        .into_iter()
        .map(|row| (row.id, row))
        .collect();
    let mut tags_by_article: HashMap<i64, Vec<String>> = HashMap::new();
    for (article_id, name) in conduit_db::tags::tags_for_articles(pool, &article_ids).await? {
        tags_by_article.entry(article_id).or_default().push(name);
    }
    let counts: HashMap<i64, i64> = conduit_db::favorites::favorite_counts(pool, &article_ids)
        .await?
        .into_iter()
        .collect();
    let (favorited, following): (HashSet<i64>, HashSet<i64>) = match viewer {
        Some(viewer_id) => (
            conduit_db::favorites::favorited_ids(pool, viewer_id, &article_ids)
                .await?
                .into_iter()
                .collect(),
            conduit_db::follows::following_ids(pool, viewer_id, &author_ids)
                .await?
                .into_iter()
                .collect(),
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    page.try_map(|row| {
        let article_id = row.id;
        let author_id = row.user_id;
        let author = authors.get(&author_id).ok_or_else(|| {
            CoreError::Internal(format!("author {author_id} missing for article {article_id}"))
        })?;
        let tags = tags_by_article.remove(&article_id).unwrap_or_default();
        let starred = favorited.contains(&article_id);
        let count = counts.get(&article_id).copied().unwrap_or(0);
        let follows_author = following.contains(&author_id);
        Ok(article_payload(row, author, tags, starred, count, follows_author))
    })
}

async fn assemble_article(
    pool: &DbPool,
    viewer: Option<i64>,
    row: ArticleRow,
) -> Result<Article, CoreError> {
    let author = conduit_db::users::get_user_by_id(pool, row.user_id)
        .await?
        .ok_or_else(|| {
            CoreError::Internal(format!(
                "author {} missing for article {}",
                row.user_id, row.id
            ))
        })?;
    let tags = conduit_db::tags::tags_for_article(pool, row.id).await?;
    let favorites_count = conduit_db::favorites::count_favorites(pool, row.id).await?;
    let (favorited, following) = match viewer {
        Some(viewer_id) => (
            conduit_db::favorites::is_favorited(pool, row.id, viewer_id).await?,
            conduit_db::follows::is_following(pool, viewer_id, row.user_id).await?,
        ),
        None => (false, false),
    };
    Ok(article_payload(
        row,
        &author,
        tags,
        favorited,
        favorites_count,
        following,
    ))
}

fn article_payload(
    row: ArticleRow,
    author: &UserRow,
    tags: Vec<String>,
    favorited: bool,
    favorites_count: i64,
    following: bool,
) -> Article {
    Article {
        id: row.id.to_string(),
        slug: row.slug,
        title: row.title,
        description: row.description,
        body: row.body,
        tag_list: tags,
        created_at: row.created_at,
        updated_at: row.updated_at,
        favorited,
        favorites_count,
        author: profile_payload(author, following),
    }
}
