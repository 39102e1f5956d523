use async_trait::async_trait;
use co_core::{ArticleStore, Error, Result};
use std::sync::Arc;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: ArticleStore + Sized {
    fn get_error_message() -> &'static str;

    async fn new() -> Result<Self>;
}

/// Build the store named on the command line. `url` is only meaningful for
/// backends that persist to disk.
pub async fn create_storage(kind: &str, url: Option<&str>) -> Result<Arc<dyn ArticleStore>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStorage::new().await?)),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let storage = match url {
                Some(url) => SQLiteStorage::connect(url).await?,
                None => <SQLiteStorage as StorageBackend>::new().await?,
            };
            Ok(Arc::new(storage))
        }
        other => {
            let _ = url;
            Err(Error::Config(format!("Unsupported storage backend: {}", other)))
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}
