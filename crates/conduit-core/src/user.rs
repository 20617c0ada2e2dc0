use conduit_db::users::UserRow;
use conduit_db::{DbError, DbPool};
use conduit_models::user::User;
use conduit_util::{snowflake, validation};

use crate::auth;
use crate::error::CoreError;

/// Create an account. The caller issues the session token afterwards.
pub async fn register(
    pool: &DbPool,
    worker_id: u16,
    email: &str,
    username: &str,
    password: &str,
) -> Result<UserRow, CoreError> {
    validation::validate_email(email).map_err(|e| CoreError::validation("email", e.to_string()))?;
    validation::validate_username(username)
        .map_err(|e| CoreError::validation("username", e.to_string()))?;
    validation::validate_password(password)
        .map_err(|e| CoreError::validation("password", e.to_string()))?;

    if conduit_db::users::get_user_by_email(pool, email)
        .await?
        .is_some()
    {
        return Err(CoreError::validation("email", "has already been taken"));
    }
    if conduit_db::users::get_user_by_username(pool, username)
        .await?
        .is_some()
    {
        return Err(CoreError::validation("username", "has already been taken"));
    }

    let password_hash = auth::hash_password(password)?;
    let user_id = snowflake::generate(worker_id);
    match conduit_db::users::create_user(pool, user_id, email, username, &password_hash).await {
        Ok(row) => {
            tracing::info!("user registered: {}", row.username);
            Ok(row)
        }
        // Lost a race with a concurrent signup for the same name.
        Err(DbError::UniqueViolation) => Err(CoreError::validation(
            "email or username",
            "has already been taken",
        )),
        Err(e) => Err(e.into()),
    }
}

/// Check credentials. Failures never say which half was wrong.
pub async fn login(pool: &DbPool, email: &str, password: &str) -> Result<UserRow, CoreError> {
    let Some(row) = conduit_db::users::get_user_by_email(pool, email).await? else {
        return Err(CoreError::validation("email or password", "is invalid"));
    };
    if !auth::verify_password(password, &row.password_hash)? {
        return Err(CoreError::validation("email or password", "is invalid"));
    }
    Ok(row)
}

pub async fn get_user(pool: &DbPool, user_id: i64) -> Result<UserRow, CoreError> {
    conduit_db::users::get_user_by_id(pool, user_id)
        .await?
        .ok_or(CoreError::NotFound)
}

/// Update account fields. Absent fields keep their stored value; a new
/// password is re-hashed before it lands.
pub async fn update_user(
    pool: &DbPool,
    user_id: i64,
    email: Option<&str>,
    username: Option<&str>,
    password: Option<&str>,
    bio: Option<&str>,
    image: Option<&str>,
) -> Result<UserRow, CoreError> {
    if let Some(email) = email {
        validation::validate_email(email)
            .map_err(|e| CoreError::validation("email", e.to_string()))?;
        if let Some(existing) = conduit_db::users::get_user_by_email(pool, email).await? {
            if existing.id != user_id {
                return Err(CoreError::validation("email", "has already been taken"));
            }
        }
    }
    if let Some(username) = username {
        validation::validate_username(username)
            .map_err(|e| CoreError::validation("username", e.to_string()))?;
        if let Some(existing) = conduit_db::users::get_user_by_username(pool, username).await? {
            if existing.id != user_id {
                return Err(CoreError::validation("username", "has already been taken"));
            }
        }
    }
    if let Some(password) = password {
        validation::validate_password(password)
            .map_err(|e| CoreError::validation("password", e.to_string()))?;
    }

    let password_hash = match password {
        Some(password) => Some(auth::hash_password(password)?),
        None => None,
    };
    match conduit_db::users::update_user(
        pool,
        user_id,
        email,
        username,
        password_hash.as_deref(),
        bio,
        image,
    )
    .await
    {
        Ok(row) => Ok(row),
        Err(DbError::UniqueViolation) => Err(CoreError::validation(
            "email or username",
            "has already been taken",
        )),
        Err(e) => Err(e.into()),
    }
}

/// Wire shape for the account owner, token attached.
pub fn user_payload(row: &UserRow, token: String) -> User {
    User {
        email: row.email.clone(),
        username: row.username.clone(),
        bio: row.bio.clone(),
        image: row.image.clone(),
        token,
    }
}
