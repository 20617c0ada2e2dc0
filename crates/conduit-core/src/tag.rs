use conduit_db::DbPool;

use crate::error::CoreError;

pub async fn list_tags(pool: &DbPool) -> Result<Vec<String>, CoreError> {
    Ok(conduit_db::tags::list_tag_names(pool).await?)
}
