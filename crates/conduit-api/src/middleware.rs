use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use conduit_core::AppState;

/// Accepts both the classic `Token <jwt>` scheme and `Bearer <jwt>`.
fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
}

pub struct AuthUser {
    pub user_id: i64,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing authorization header"))?;

        let token = bearer_token(auth_header)
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid authorization format"))?;

        let claims = conduit_core::auth::validate_token(token, &state.config.jwt_secret)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid or expired token"))?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}

/// Like [`AuthUser`] but never rejects; bad or missing credentials just
/// read as anonymous.
pub struct MaybeAuthUser {
    pub user_id: Option<i64>,
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .and_then(|token| {
                conduit_core::auth::validate_token(token, &state.config.jwt_secret).ok()
            })
            .map(|claims| claims.sub);

        Ok(MaybeAuthUser { user_id })
    }
}
