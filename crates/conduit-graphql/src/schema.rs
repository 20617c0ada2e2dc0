use async_graphql::{
    ComplexObject, Context, EmptySubscription, Error, InputObject, Object, Result, Schema,
};
use conduit_core::AppState;
use conduit_util::pagination::{Direction, PageRequest};

use crate::types::{Article, ArticleConnection, Comment, CommentConnection, Profile, User};

/// Maximum query depth. Introspection alone needs about 13 levels.
pub const MAX_QUERY_DEPTH: usize = 15;

/// Maximum query complexity score; every field counts 1 by default.
pub const MAX_QUERY_COMPLEXITY: usize = 500;

pub type ConduitSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Caller identity, resolved from the transport layer once per request
/// and injected into the request data.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<i64>);

/// Build the schema with depth and complexity limits applied.
pub fn build_schema(state: AppState) -> ConduitSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(state)
        .limit_depth(MAX_QUERY_DEPTH)
        .limit_complexity(MAX_QUERY_COMPLEXITY)
        .finish()
}

fn state<'ctx>(ctx: &Context<'ctx>) -> Result<&'ctx AppState> {
    ctx.data::<AppState>()
}

fn viewer(ctx: &Context<'_>) -> Result<Option<i64>> {
    Ok(ctx.data::<Viewer>()?.0)
}

fn require_viewer(ctx: &Context<'_>) -> Result<i64> {
    viewer(ctx)?.ok_or_else(|| Error::new("unauthorized"))
}

/// `first`/`after` walk forward, `last`/`before` walk backward. With
/// neither pair the window runs forward from the start.
fn page_request(
    first: Option<i32>,
    after: Option<String>,
    last: Option<i32>,
    before: Option<String>,
) -> PageRequest {
    if last.is_some() || before.is_some() {
        PageRequest::new(before, last.unwrap_or(0), Some(Direction::Prev))
    } else {
        PageRequest::new(after, first.unwrap_or(0), Some(Direction::Next))
    }
}

fn issue_token(state: &AppState, user_id: i64) -> Result<String> {
    Ok(conduit_core::auth::create_token(
        user_id,
        &state.config.jwt_secret,
        state.config.jwt_expiry_secs,
    )?)
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The signed-in account, or null for anonymous callers.
    async fn me<'ctx>(&self, ctx: &Context<'ctx>) -> Result<Option<User>> {
        let state = state(ctx)?;
        let Some(user_id) = viewer(ctx)? else {
            return Ok(None);
        };
        let row = conduit_core::user::get_user(&state.db, user_id).await?;
        let token = issue_token(state, row.id)?;
        Ok(Some(conduit_core::user::user_payload(&row, token).into()))
    }

    /// A user's public profile, with follow state relative to the caller.
    async fn profile<'ctx>(&self, ctx: &Context<'ctx>, username: String) -> Result<Profile> {
        let state = state(ctx)?;
        let viewer = viewer(ctx)?;
        Ok(conduit_core::profile::get_profile(&state.db, viewer, &username)
            .await?
            .into())
    }

    /// A single article by slug.
    async fn article<'ctx>(&self, ctx: &Context<'ctx>, slug: String) -> Result<Article> {
        let state = state(ctx)?;
        let viewer = viewer(ctx)?;
        Ok(conduit_core::article::get_article(&state.db, viewer, &slug)
            .await?
            .into())
    }

    /// Window over all articles, optionally filtered by tag, author, or
    /// the user who favorited them.
    #[allow(clippy::too_many_arguments)]
    async fn articles<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
        tag: Option<String>,
        author_name: Option<String>,
        favorited_by: Option<String>,
    ) -> Result<ArticleConnection> {
        let state = state(ctx)?;
        let viewer = viewer(ctx)?;
        let request = page_request(first, after, last, before);
        let page = conduit_core::article::list_articles(
            &state.db,
            viewer,
            tag.as_deref(),
            author_name.as_deref(),
            favorited_by.as_deref(),
            &request,
        )
        .await?;
        Ok(page.into())
    }

    /// Articles by the authors the caller follows.
    async fn feed<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
    ) -> Result<ArticleConnection> {
        let state = state(ctx)?;
        let user_id = require_viewer(ctx)?;
        let request = page_request(first, after, last, before);
        let page = conduit_core::article::feed(&state.db, user_id, &request).await?;
        Ok(page.into())
    }

    /// Every tag in use, sorted by name.
    async fn tags<'ctx>(&self, ctx: &Context<'ctx>) -> Result<Vec<String>> {
        let state = state(ctx)?;
        Ok(conduit_core::tag::list_tags(&state.db).await?)
    }
}

#[ComplexObject]
impl Article {
    /// Window over this article's comments, oldest first.
    async fn comments<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
    ) -> Result<CommentConnection> {
        let state = state(ctx)?;
        let viewer = viewer(ctx)?;
        let request = page_request(first, after, last, before);
        let page =
            conduit_core::comment::list_comments(&state.db, viewer, &self.slug, &request).await?;
        Ok(page.into())
    }
}

#[derive(InputObject)]
pub struct CreateUserInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(InputObject)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

#[derive(InputObject)]
pub struct CreateArticleInput {
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Option<Vec<String>>,
}

#[derive(InputObject)]
pub struct UpdateArticleInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Register a new account and sign it in.
    async fn create_user<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        input: CreateUserInput,
    ) -> Result<User> {
        let state = state(ctx)?;
        if !state.config.registration_enabled {
            return Err(Error::new("registration is disabled"));
        }
        let row = conduit_core::user::register(
            &state.db,
            state.config.worker_id,
            &input.email,
            &input.username,
            &input.password,
        )
        .await?;
        let token = issue_token(state, row.id)?;
        Ok(conduit_core::user::user_payload(&row, token).into())
    }

    /// Exchange credentials for a session token.
    async fn login<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        email: String,
        password: String,
    ) -> Result<User> {
        let state = state(ctx)?;
        let row = conduit_core::user::login(&state.db, &email, &password).await?;
        let token = issue_token(state, row.id)?;
        Ok(conduit_core::user::user_payload(&row, token).into())
    }

    /// Update the signed-in account. Absent fields keep their value.
    async fn update_user<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        changes: UpdateUserInput,
    ) -> Result<User> {
        let state = state(ctx)?;
        let user_id = require_viewer(ctx)?;
        let row = conduit_core::user::update_user(
            &state.db,
            user_id,
            changes.email.as_deref(),
            changes.username.as_deref(),
            changes.password.as_deref(),
            changes.bio.as_deref(),
            changes.image.as_deref(),
        )
        .await?;
        let token = issue_token(state, row.id)?;
        Ok(conduit_core::user::user_payload(&row, token).into())
    }

    /// Follow a user.
    async fn follow<'ctx>(&self, ctx: &Context<'ctx>, username: String) -> Result<Profile> {
        let state = state(ctx)?;
        let user_id = require_viewer(ctx)?;
        Ok(conduit_core::profile::follow(&state.db, user_id, &username)
            .await?
            .into())
    }

    /// Stop following a user.
    async fn unfollow<'ctx>(&self, ctx: &Context<'ctx>, username: String) -> Result<Profile> {
        let state = state(ctx)?;
        let user_id = require_viewer(ctx)?;
        Ok(conduit_core::profile::unfollow(&state.db, user_id, &username)
            .await?
            .into())
    }

    /// Publish an article.
    async fn create_article<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        input: CreateArticleInput,
    ) -> Result<Article> {
        let state = state(ctx)?;
        let user_id = require_viewer(ctx)?;
        let article = conduit_core::article::create_article(
            &state.db,
            state.config.worker_id,
            user_id,
            &input.title,
            &input.description,
            &input.body,
            &input.tag_list.unwrap_or_default(),
        )
        .await?;
        Ok(article.into())
    }

    /// Edit an article. Only the author can.
    async fn update_article<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        slug: String,
        changes: UpdateArticleInput,
    ) -> Result<Article> {
        let state = state(ctx)?;
        let user_id = require_viewer(ctx)?;
        let article = conduit_core::article::update_article(
            &state.db,
            user_id,
            &slug,
            changes.title.as_deref(),
            changes.description.as_deref(),
            changes.body.as_deref(),
        )
        .await?;
        Ok(article.into())
    }

    /// Delete an article. Only the author can.
    async fn delete_article<'ctx>(&self, ctx: &Context<'ctx>, slug: String) -> Result<bool> {
        let state = state(ctx)?;
        let user_id = require_viewer(ctx)?;
        conduit_core::article::delete_article(&state.db, user_id, &slug).await?;
        Ok(true)
    }

    /// Mark an article as a favorite.
    async fn favorite_article<'ctx>(&self, ctx: &Context<'ctx>, slug: String) -> Result<Article> {
        let state = state(ctx)?;
        let user_id = require_viewer(ctx)?;
        Ok(conduit_core::article::favorite(&state.db, user_id, &slug)
            .await?
            .into())
    }

    /// Remove an article from favorites.
    async fn unfavorite_article<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        slug: String,
    ) -> Result<Article> {
        let state = state(ctx)?;
        let user_id = require_viewer(ctx)?;
        Ok(conduit_core::article::unfavorite(&state.db, user_id, &slug)
            .await?
            .into())
    }

    /// Comment on an article.
    async fn add_comment<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        slug: String,
        body: String,
    ) -> Result<Comment> {
        let state = state(ctx)?;
        let user_id = require_viewer(ctx)?;
        let comment = conduit_core::comment::add_comment(
            &state.db,
            state.config.worker_id,
            user_id,
            &slug,
            &body,
        )
        .await?;
        Ok(comment.into())
    }

    /// Delete a comment. The comment author and the article author can.
    async fn delete_comment<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        slug: String,
        id: String,
    ) -> Result<bool> {
        let state = state(ctx)?;
        let user_id = require_viewer(ctx)?;
        let comment_id = id
            .parse::<i64>()
            .map_err(|_| Error::new("invalid comment id"))?;
        conduit_core::comment::delete_comment(&state.db, user_id, &slug, comment_id).await?;
        Ok(true)
    }
}
