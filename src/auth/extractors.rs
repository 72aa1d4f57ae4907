use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{
    auth::{
        claims::{Claims, Role},
        jwt::JwtKeys,
    },
    error::ApiError,
};

/// Authentication gate: parses the `Authorization` header, verifies the
/// bearer token and carries the decoded claims into the handler. No store
/// lookup happens here; the signed claims are trusted as of issuance.
#[derive(Debug)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::MissingCredential)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::MissingCredential)?;

        match keys.verify(token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(_) => {
                warn!("invalid or expired token");
                Err(ApiError::InvalidCredential)
            }
        }
    }
}

/// Authorization gate for admin-only operations; composes the authentication
/// gate and then checks the asserted role.
#[derive(Debug)]
pub struct AdminUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.role != Role::Admin {
            warn!(user_id = claims.sub, "admin gate rejected");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(claims))
    }
}
