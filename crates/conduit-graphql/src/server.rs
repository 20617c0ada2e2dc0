use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::{header, HeaderMap, Method},
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use conduit_core::AppState;
use tower_http::cors::{Any, CorsLayer};

use crate::schema::{build_schema, ConduitSchema, Viewer};

#[derive(Clone)]
struct GraphQLState {
    schema: ConduitSchema,
    app: AppState,
}

/// Router serving `/graphql`, with GraphiQL on GET when the playground
/// is enabled. Depth and complexity limits in the schema stand in for
/// the per-address throttling the REST surface applies.
pub fn routes(state: AppState, enable_playground: bool) -> Router {
    let endpoint = if enable_playground {
        get(graphiql).post(graphql_handler)
    } else {
        post(graphql_handler)
    };
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    Router::new()
        .route("/graphql", endpoint)
        .layer(cors)
        .with_state(GraphQLState {
            schema: build_schema(state.clone()),
            app: state,
        })
}

async fn graphql_handler(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let viewer = viewer_from_headers(&headers, &state.app);
    state
        .schema
        .execute(req.into_inner().data(viewer))
        .await
        .into()
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

/// Accepts the same `Token` and `Bearer` schemes as the REST
/// middleware. A missing or invalid token reads as anonymous; the
/// resolvers decide which operations need an identity.
fn viewer_from_headers(headers: &HeaderMap, state: &AppState) -> Viewer {
    let user_id = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Token ")
                .or_else(|| value.strip_prefix("Bearer "))
        })
        .and_then(|token| {
            conduit_core::auth::validate_token(token, &state.config.jwt_secret).ok()
        })
        .map(|claims| claims.sub);
    Viewer(user_id)
}
