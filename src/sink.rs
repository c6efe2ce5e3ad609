use std::sync::Arc;

use bytes::Bytes;
use camino::Utf8Path;
use object_store::ObjectStore;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use tokio::runtime::{Builder, Runtime};

use crate::config::{CONTAINER, StorageCredential};
use crate::error::EurostatError;

pub trait BlobSink: Send + Sync {
    /// Stores `bytes` at `path`, replacing whatever was there.
    fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), EurostatError>;
}

/// Blocking adapter over an [`ObjectStore`]; owns the runtime its puts run on.
///
/// `upload` blocks on that runtime, so it must be called from a thread that
/// is not driving another runtime (e.g. inside `web::block`). Dropping the
/// sink is fine anywhere: the runtime is shut down in the background.
pub struct ObjectStoreSink {
    store: Arc<dyn ObjectStore>,
    runtime: Option<Runtime>,
}

impl ObjectStoreSink {
    pub fn new(store: Arc<dyn ObjectStore>) -> Result<Self, EurostatError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| EurostatError::StorageSetup(err.to_string()))?;
        Ok(Self {
            store,
            runtime: Some(runtime),
        })
    }

    pub fn azure(credential: &StorageCredential) -> Result<Self, EurostatError> {
        let builder = MicrosoftAzureBuilder::new().with_container_name(CONTAINER);
        let builder = match credential {
            StorageCredential::AccessKey { account, key } => {
                builder.with_account(account).with_access_key(key)
            }
            StorageCredential::Emulator => builder.with_use_emulator(true),
        };
        let store = builder
            .build()
            .map_err(|err| EurostatError::StorageSetup(err.to_string()))?;
        Self::new(Arc::new(store))
    }

    /// Writes under `root` instead of the blob container.
    pub fn local(root: &Utf8Path) -> Result<Self, EurostatError> {
        std::fs::create_dir_all(root.as_std_path())
            .map_err(|err| EurostatError::StorageSetup(format!("create {root}: {err}")))?;
        let store = LocalFileSystem::new_with_prefix(root.as_std_path())
            .map_err(|err| EurostatError::StorageSetup(err.to_string()))?;
        Self::new(Arc::new(store))
    }

    pub fn in_memory() -> Result<Self, EurostatError> {
        Self::new(Arc::new(InMemory::new()))
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }
}

impl BlobSink for ObjectStoreSink {
    fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), EurostatError> {
        let location = Path::parse(path).map_err(|err| EurostatError::Storage {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| EurostatError::StorageSetup("storage runtime is gone".to_string()))?;
        runtime
            .block_on(self.store.put(&location, Bytes::from(bytes).into()))
            .map_err(|err| EurostatError::Storage {
                path: path.to_string(),
                message: err.to_string(),
            })?;
        Ok(())
    }
}

impl Drop for ObjectStoreSink {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
