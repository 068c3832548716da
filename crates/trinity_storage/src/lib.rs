use async_trait::async_trait;
use std::sync::Arc;
use trinity_core::{ArticleStore, Error, Result};

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn name() -> &'static str
    where
        Self: Sized;

    async fn connect(config: &BackendConfig) -> Result<Self>
    where
        Self: Sized;
}

#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    pub url: Option<String>,
}

impl BackendConfig {
    pub fn new(url: Option<&str>) -> Self {
        Self {
            url: url.map(str::to_string),
        }
    }
}

async fn connect<T>(config: &BackendConfig) -> Result<Arc<dyn ArticleStore>>
where
    T: StorageBackend + ArticleStore + 'static,
{
    let storage = T::connect(config).await?;
    tracing::info!("💾 Storage backend ready (using {})", T::name());
    Ok(Arc::new(storage) as Arc<dyn ArticleStore>)
}

/// Build a store from its CLI name (`memory` or `sqlite`).
pub async fn create_storage(kind: &str, url: Option<&str>) -> Result<Arc<dyn ArticleStore>> {
    let config = BackendConfig::new(url);
    match kind.to_ascii_lowercase().as_str() {
        "memory" => connect::<InMemoryStorage>(&config).await,
        #[cfg(feature = "sqlite")]
        "sqlite" => connect::<SQLiteStorage>(&config).await,
        other => Err(Error::InvalidInput(format!("unsupported storage backend: {}", other))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, BackendConfig, StorageBackend};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage("memory", None).await.unwrap();
        let listed = storage
            .list_articles(&trinity_core::ArticleFilter::default())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_backend_rejected() {
        let result = create_storage("qdrant", None).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
