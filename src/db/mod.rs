pub mod memory;
pub mod postgres;
pub mod redis;
pub mod store;

pub use memory::MemoryRecipeStore;
pub use postgres::{create_pool, PgRecipeStore};
pub use self::redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use store::RecipeStore;

#[cfg(test)]
pub use store::MockRecipeStore;
