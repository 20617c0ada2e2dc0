use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::Profile;

/// Article as rendered on the wire. `id` is the stringified snowflake and
/// doubles as the pagination cursor for this article.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorited: bool,
    pub favorites_count: i64,
    pub author: Profile,
}
