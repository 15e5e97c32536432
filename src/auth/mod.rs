pub mod jwt;
pub mod password;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::Role, state::AppState};

use self::jwt::TokenError;

/// Identity decoded from a bearer token; handlers take this as an extractor
/// argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: Role,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized("authorization header missing or malformed"))?;

        let claims = state.jwt.verify_token(bearer.token()).map_err(|err| {
            tracing::warn!(path = %parts.uri.path(), error = %err, "rejected bearer token");
            match err {
                TokenError::Expired => AppError::unauthorized("token has expired"),
                TokenError::Invalid => AppError::unauthorized("invalid token"),
            }
        })?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            role: claims.role,
            email: claims.email,
        })
    }
}
