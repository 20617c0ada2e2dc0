pub mod pagination;
pub mod slug;
pub mod snowflake;
pub mod validation;
