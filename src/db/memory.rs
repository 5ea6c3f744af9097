use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::RecipeStore,
    error::{AppError, AppResult},
    models::{average_rating, Recipe, RecipePage, RecipeQuery},
};

/// In-process recipe store, used when no database is configured and in tests
#[derive(Clone, Default)]
pub struct MemoryRecipeStore {
    recipes: Arc<RwLock<HashMap<Uuid, Recipe>>>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect_where<F>(&self, predicate: F) -> Vec<Recipe>
    where
        F: Fn(&Recipe) -> bool,
    {
        let recipes = self.recipes.read().await;
        let mut found: Vec<Recipe> = recipes.values().filter(|r| predicate(r)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Recipe>> {
        Ok(self.recipes.read().await.get(&id).cloned())
    }

    async fn insert(&self, recipe: &Recipe) -> AppResult<()> {
        let mut recipes = self.recipes.write().await;
        if recipes.contains_key(&recipe.id) {
            return Err(AppError::Internal(format!("Duplicate recipe id {}", recipe.id)));
        }
        recipes.insert(recipe.id, recipe.clone());
        Ok(())
    }

    async fn save(&self, recipe: &Recipe) -> AppResult<()> {
        let mut recipes = self.recipes.write().await;
        match recipes.get_mut(&recipe.id) {
            Some(stored) => {
                *stored = recipe.clone();
                Ok(())
            }
            None => Err(AppError::recipe_not_found(recipe.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.recipes.write().await.remove(&id).is_some())
    }

    async fn refresh_average_rating(&self, id: Uuid) -> AppResult<Option<f64>> {
        let mut recipes = self.recipes.write().await;
        Ok(recipes.get_mut(&id).map(|recipe| {
            recipe.average_rating = average_rating(&recipe.ratings);
            recipe.average_rating
        }))
    }

    async fn list(&self, query: &RecipeQuery) -> AppResult<RecipePage> {
        let recipes = self.recipes.read().await;
        let mut matching: Vec<&Recipe> = recipes.values().filter(|r| query.matches(r)).collect();
        matching.sort_by(|a, b| query.compare(a, b));

        let total = matching.len() as u64;
        let recipes = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(RecipePage { recipes, total })
    }

    async fn top_rated(&self, min_rating: f64, limit: usize) -> AppResult<Vec<Recipe>> {
        let mut rated = self.collect_where(|r| r.average_rating >= min_rating).await;
        rated.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
        rated.truncate(limit);
        Ok(rated)
    }

    async fn find_by_owner(&self, user: Uuid) -> AppResult<Vec<Recipe>> {
        Ok(self.collect_where(|r| r.user == user).await)
    }

    async fn find_favorited_by(&self, user: Uuid) -> AppResult<Vec<Recipe>> {
        Ok(self.collect_where(|r| r.is_favorited_by(user)).await)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
