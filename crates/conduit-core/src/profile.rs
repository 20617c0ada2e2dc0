use conduit_db::users::UserRow;
use conduit_db::DbPool;
use conduit_models::user::Profile;

use crate::error::CoreError;

pub fn profile_payload(row: &UserRow, following: bool) -> Profile {
    Profile {
        username: row.username.clone(),
        bio: row.bio.clone(),
        image: row.image.clone(),
        following,
    }
}

pub async fn get_profile(
    pool: &DbPool,
    viewer: Option<i64>,
    username: &str,
) -> Result<Profile, CoreError> {
    let row = conduit_db::users::get_user_by_username(pool, username)
        .await?
        .ok_or(CoreError::NotFound)?;
    let following = match viewer {
        Some(viewer_id) => conduit_db::follows::is_following(pool, viewer_id, row.id).await?,
        None => false,
    };
    Ok(profile_payload(&row, following))
}

/// Follow a user. Following yourself is rejected.
pub async fn follow(pool: &DbPool, user_id: i64, username: &str) -> Result<Profile, CoreError> {
    let target = conduit_db::users::get_user_by_username(pool, username)
        .await?
        .ok_or(CoreError::NotFound)?;
    if target.id == user_id {
        return Err(CoreError::BadRequest("you cannot follow yourself".into()));
    }
    conduit_db::follows::follow(pool, user_id, target.id).await?;
    Ok(profile_payload(&target, true))
}

pub async fn unfollow(pool: &DbPool, user_id: i64, username: &str) -> Result<Profile, CoreError> {
    let target = conduit_db::users::get_user_by_username(pool, username)
        .await?
        .ok_or(CoreError::NotFound)?;
    conduit_db::follows::unfollow(pool, user_id, target.id).await?;
    Ok(profile_payload(&target, false))
}
