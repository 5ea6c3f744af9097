//! Rating, favoriting and view tracking on a single recipe document.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Actor, FavoriteStatus, RatingInput, Recipe},
};

use super::RecipeService;

impl RecipeService {
    /// Fetches a recipe for display, counting the view
    pub async fn record_view(&self, id: Uuid) -> AppResult<Recipe> {
        let mut recipe = self.load(id).await?;
        recipe.record_view();
        self.persist(&mut recipe).await?;

        tracing::debug!(recipe_id = %id, views = recipe.views, "Recipe viewed");
        Ok(recipe)
    }

    /// Adds or replaces the actor's rating, then refreshes the stored average
    pub async fn rate(&self, actor: &Actor, id: Uuid, input: &RatingInput) -> AppResult<Recipe> {
        let mut recipe = self.load(id).await?;
        input.validate()?;

        let created = recipe.upsert_rating(
            actor.user_id,
            input.rating,
            input.non_empty_comment(),
            Utc::now(),
        );
        self.persist(&mut recipe).await?;

        recipe.average_rating = self
            .store
            .refresh_average_rating(id)
            .await?
            .ok_or_else(|| AppError::recipe_not_found(id))?;
        self.invalidate_top_rated();

        tracing::info!(
            recipe_id = %id,
            user_id = %actor.user_id,
            rating = input.rating,
            created,
            average = recipe.average_rating,
            "Recipe rated"
        );

        Ok(recipe)
    }

    /// Adds the actor to the recipe's favorites, or removes them if already there
    pub async fn toggle_favorite(&self, actor: &Actor, id: Uuid) -> AppResult<FavoriteStatus> {
        let mut recipe = self.load(id).await?;
        let is_favorited = recipe.toggle_favorite(actor.user_id);
        self.persist(&mut recipe).await?;

        tracing::info!(
            recipe_id = %id,
            user_id = %actor.user_id,
            is_favorited,
            favorite_count = recipe.favorite_count,
            "Favorite toggled"
        );

        Ok(FavoriteStatus {
            is_favorited,
            favorite_count: recipe.favorite_count,
        })
    }
}
