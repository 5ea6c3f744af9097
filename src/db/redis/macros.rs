/// Read-through caching over a [`Cache`](crate::db::Cache).
///
/// Returns the cached value for `$key` if present. Otherwise awaits `$block`,
/// queues the result for a background write with `$ttl` seconds to live, and
/// returns it. Must be used inside a function returning `AppResult`.
///
/// # Example
/// ```rust,ignore
/// let recipes: AppResult<Vec<Recipe>> = cached!(cache, CacheKey::TopRated, 300, async {
///     store.top_rated(4.0, 5).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            tracing::debug!(key = %$key, "Cache hit");
            Ok(cached)
        } else {
            tracing::debug!(key = %$key, "Cache miss");
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
