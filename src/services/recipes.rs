use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    cached,
    db::{Cache, CacheKey, RecipeStore},
    error::{AppError, AppResult},
    models::{Actor, Recipe, RecipeAction, RecipeContent, RecipePage, RecipeQuery},
    services::uploads::{PhotoStorage, UploadedFile},
};

/// Recipes at or above this average make the top-rated listing
pub const TOP_RATED_MIN_RATING: f64 = 4.0;
pub const TOP_RATED_LIMIT: usize = 5;
const DEFAULT_TOP_RATED_TTL: u64 = 300;

/// Recipe operations over a pluggable store
///
/// Every mutation is a read-modify-write over separate store calls with no
/// locking, so two concurrent writers to one recipe can lose an update.
#[derive(Clone)]
pub struct RecipeService {
    pub(super) store: Arc<dyn RecipeStore>,
    pub(super) cache: Option<Cache>,
    photos: PhotoStorage,
    top_rated_ttl: u64,
}

impl RecipeService {
    pub fn new(store: Arc<dyn RecipeStore>, photos: PhotoStorage) -> Self {
        tracing::info!(store = store.name(), "Recipe service initialized");
        Self {
            store,
            cache: None,
            photos,
            top_rated_ttl: DEFAULT_TOP_RATED_TTL,
        }
    }

    /// Serves the top-rated listing through Redis, kept for `ttl` seconds
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.top_rated_ttl = ttl;
        self
    }

    pub fn photos(&self) -> &PhotoStorage {
        &self.photos
    }

    /// Loads a recipe or fails with `NotFound`
    pub(super) async fn load(&self, id: Uuid) -> AppResult<Recipe> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::recipe_not_found(id))
    }

    /// Stamps `updated_at` and replaces the stored document
    pub(super) async fn persist(&self, recipe: &mut Recipe) -> AppResult<()> {
        recipe.updated_at = Utc::now();
        self.store.save(recipe).await
    }

    /// Drops the cached top-rated listing after anything that can change it
    pub(super) fn invalidate_top_rated(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&CacheKey::TopRated);
        }
    }

    pub async fn list(&self, query: &RecipeQuery) -> AppResult<RecipePage> {
        self.store.list(query).await
    }

    pub async fn create(&self, actor: &Actor, mut content: RecipeContent) -> AppResult<Recipe> {
        content.normalize();
        content.validate()?;

        let recipe = Recipe::new(actor.user_id, content, Utc::now());
        self.store.insert(&recipe).await?;

        tracing::info!(recipe_id = %recipe.id, user_id = %actor.user_id, "Recipe created");
        Ok(recipe)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: &Map<String, Value>,
    ) -> AppResult<Recipe> {
        let mut recipe = self.load(id).await?;
        actor.ensure_can_modify(&recipe, RecipeAction::Update)?;

        recipe.apply_patch(patch, Utc::now())?;
        self.persist(&mut recipe).await?;
        self.invalidate_top_rated();

        tracing::info!(recipe_id = %id, user_id = %actor.user_id, "Recipe updated");
        Ok(recipe)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        let recipe = self.load(id).await?;
        actor.ensure_can_modify(&recipe, RecipeAction::Delete)?;

        if !self.store.delete(id).await? {
            return Err(AppError::recipe_not_found(id));
        }
        self.invalidate_top_rated();

        tracing::info!(recipe_id = %id, user_id = %actor.user_id, "Recipe deleted");
        Ok(())
    }

    /// Loads a recipe whose photo the actor may replace
    ///
    /// Runs before the upload body is read, so a missing recipe or a foreign
    /// owner is reported regardless of what the client sent.
    pub async fn authorize_photo(&self, actor: &Actor, id: Uuid) -> AppResult<Recipe> {
        let recipe = self.load(id).await?;
        actor.ensure_can_modify(&recipe, RecipeAction::Update)?;
        Ok(recipe)
    }

    /// Validates and stores a photo for a recipe cleared by `authorize_photo`
    pub async fn attach_photo(
        &self,
        mut recipe: Recipe,
        file: Option<&UploadedFile>,
    ) -> AppResult<String> {
        let file = self.photos.validate(file)?;
        let name = self.photos.save(recipe.id, file).await?;

        recipe.photo = Some(name.clone());
        if let Err(err) = self.persist(&mut recipe).await {
            self.photos.remove(&name).await;
            return Err(err);
        }
        self.invalidate_top_rated();

        Ok(name)
    }

    /// Stores a new photo for the recipe and returns its file name
    pub async fn upload_photo(
        &self,
        actor: &Actor,
        id: Uuid,
        file: Option<&UploadedFile>,
    ) -> AppResult<String> {
        let recipe = self.authorize_photo(actor, id).await?;
        self.attach_photo(recipe, file).await
    }

    pub async fn top_rated(&self) -> AppResult<Vec<Recipe>> {
        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::TopRated,
                self.top_rated_ttl,
                self.store.top_rated(TOP_RATED_MIN_RATING, TOP_RATED_LIMIT)
            ),
            None => {
                self.store
                    .top_rated(TOP_RATED_MIN_RATING, TOP_RATED_LIMIT)
                    .await
            }
        }
    }

    pub async fn by_owner(&self, user: Uuid) -> AppResult<Vec<Recipe>> {
        self.store.find_by_owner(user).await
    }

    pub async fn favorites(&self, actor: &Actor) -> AppResult<Vec<Recipe>> {
        self.store.find_favorited_by(actor.user_id).await
    }
}
