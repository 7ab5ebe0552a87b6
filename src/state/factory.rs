use crate::config::{StoreBackend, StoreConfig};
use crate::error::{AppError, Result};
use crate::state::{InMemoryStore, RedisStore, SortedSetStore};
use std::sync::Arc;

/// Create a store based on configuration
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn SortedSetStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(create_in_memory_store()),

        StoreBackend::Redis => {
            let redis_url = config.redis_url.as_ref().ok_or_else(|| {
                AppError::Configuration("Redis backend requires 'redis_url' configuration".to_string())
            })?;

            tracing::info!(url = %redis_url, "Initializing Redis store backend");

            let store = RedisStore::new(redis_url).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Create an in-memory store (for testing and development)
pub fn create_in_memory_store() -> Arc<dyn SortedSetStore> {
    tracing::info!("Initializing in-memory store backend");
    Arc::new(InMemoryStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_in_memory_store() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            redis_url: None,
        };

        let store = create_store(&config).await.unwrap();
        assert_eq!(store.backend(), "memory");
        assert_eq!(store.cardinality("nothing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_redis_requires_url() {
        let config = StoreConfig {
            backend: StoreBackend::Redis,
            redis_url: None,
        };

        let result = create_store(&config).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
