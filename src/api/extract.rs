use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query},
    http::request::Parts,
};
use uuid::Uuid;

use crate::error::AppError;

/// `Json` whose rejections use the API error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejections use the API error envelope
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// The `:id` path segment of a recipe route
///
/// Anything that is not a recipe id cannot name a recipe, so it is reported as
/// not found rather than as a malformed request.
#[derive(Debug, Clone, Copy)]
pub struct RecipeId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for RecipeId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state).await?;
        Uuid::parse_str(&raw)
            .map(RecipeId)
            .map_err(|_| AppError::recipe_not_found(raw))
    }
}
