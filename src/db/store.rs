use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Recipe, RecipePage, RecipeQuery},
};

/// Document store for recipes
///
/// Every call is atomic for the single document it touches. Nothing here spans
/// calls, so a find followed by a save can interleave with other writers; the
/// later save wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Recipe>>;

    async fn insert(&self, recipe: &Recipe) -> AppResult<()>;

    /// Replaces the stored document with the same id
    ///
    /// Fails with `NotFound` if the recipe was deleted in the meantime.
    async fn save(&self, recipe: &Recipe) -> AppResult<()>;

    /// Returns false if there was nothing to delete
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Recomputes and stores `averageRating` from the stored ratings
    ///
    /// Returns the new average, or `None` if the recipe does not exist.
    async fn refresh_average_rating(&self, id: Uuid) -> AppResult<Option<f64>>;

    async fn list(&self, query: &RecipeQuery) -> AppResult<RecipePage>;

    /// Recipes rated at least `min_rating`, best first
    async fn top_rated(&self, min_rating: f64, limit: usize) -> AppResult<Vec<Recipe>>;

    async fn find_by_owner(&self, user: Uuid) -> AppResult<Vec<Recipe>>;

    async fn find_favorited_by(&self, user: Uuid) -> AppResult<Vec<Recipe>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
