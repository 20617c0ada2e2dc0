//! GraphQL surface over the domain services.
//!
//! The schema exposes the same operations as the REST API and calls the
//! same services underneath, so both surfaces agree on validation,
//! authorization, and paging. Window queries come back as Relay-style
//! connections whose cursors are the snowflake ids of the rows.

mod schema;
mod server;
mod types;

pub use schema::{
    build_schema, ConduitSchema, MutationRoot, QueryRoot, Viewer, MAX_QUERY_COMPLEXITY,
    MAX_QUERY_DEPTH,
};
pub use server::routes;
