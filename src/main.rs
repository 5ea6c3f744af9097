use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recipe_box::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, create_redis_client, Cache, MemoryRecipeStore, PgRecipeStore, RecipeStore},
    services::{PhotoStorage, RecipeService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recipe_box=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn RecipeStore> = match &config.database_url {
        Some(url) => {
            let store = PgRecipeStore::new(create_pool(url).await?);
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, recipes will be kept in memory");
            Arc::new(MemoryRecipeStore::new())
        }
    };

    let mut service = RecipeService::new(store, PhotoStorage::from_config(&config));

    let cache_writer = match &config.redis_url {
        Some(url) => {
            let (cache, handle) = Cache::new(create_redis_client(url)?).await;
            service = service.with_cache(cache, config.top_rated_cache_ttl);
            Some(handle)
        }
        None => None,
    };

    let app = create_router(AppState::with_service(service));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
