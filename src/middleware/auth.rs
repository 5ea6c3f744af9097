use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Actor, Role},
};

/// Caller id header set by the identity provider in front of this service
pub const USER_ID_HEADER: &str = "x-user-id";
/// Caller role header; absent means `user`
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Marker left in the request extensions when a caller presented a role we do not know
#[derive(Clone, Debug)]
struct RejectedRole(String);

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Resolves the caller's identity from the trusted headers into request extensions.
///
/// Requests without a usable identity pass through anonymously; routes that need
/// one reject them through the [`Actor`] extractor.
pub async fn resolve_identity(mut request: Request, next: Next) -> Response {
    let headers = request.headers();
    let user_id = header_str(headers, USER_ID_HEADER).and_then(|s| Uuid::parse_str(s).ok());
    let role = header_str(headers, USER_ROLE_HEADER).map(str::parse::<Role>);

    if let Some(user_id) = user_id {
        match role.unwrap_or(Ok(Role::User)) {
            Ok(role) => {
                tracing::Span::current().record("user_id", tracing::field::display(user_id));
                request.extensions_mut().insert(Actor::new(user_id, role));
            }
            Err(_) => {
                let raw = header_str(request.headers(), USER_ROLE_HEADER)
                    .unwrap_or_default()
                    .to_string();
                tracing::debug!(user_id = %user_id, role = %raw, "Unknown caller role");
                request.extensions_mut().insert(RejectedRole(raw));
            }
        }
    }

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(actor) = parts.extensions.get::<Actor>() {
            return Ok(*actor);
        }

        if let Some(RejectedRole(role)) = parts.extensions.get::<RejectedRole>() {
            return Err(AppError::Forbidden(format!(
                "User role {} is not authorized to access this route",
                role
            )));
        }

        Err(AppError::Unauthorized(
            "Not authorized to access this route".to_string(),
        ))
    }
}
