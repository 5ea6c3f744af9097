use std::sync::Arc;

use crate::{
    db::MemoryRecipeStore,
    services::{PhotoStorage, RecipeService},
};

/// Multipart framing allowance on top of the photo size limit
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;
const DEFAULT_UPLOAD_DIR: &str = "./public/uploads";
const DEFAULT_MAX_UPLOAD: u64 = 1_000_000;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recipes: Arc<RecipeService>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Creates state over an empty in-memory store
    pub fn new() -> Self {
        Self::with_service(RecipeService::new(
            Arc::new(MemoryRecipeStore::new()),
            PhotoStorage::new(DEFAULT_UPLOAD_DIR, DEFAULT_MAX_UPLOAD),
        ))
    }

    pub fn with_service(service: RecipeService) -> Self {
        Self {
            recipes: Arc::new(service),
        }
    }

    /// Request body limit for the photo upload route
    pub fn upload_body_limit(&self) -> usize {
        usize::try_from(self.recipes.photos().max_bytes())
            .unwrap_or(usize::MAX)
            .saturating_add(UPLOAD_OVERHEAD_BYTES)
    }
}
