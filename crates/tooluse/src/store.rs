//! Blob storage behind the code-persistence tool.
//!
//! An [`ObjectStore`] writes a byte payload under a key and reports where
//! it went. Two backends ship with the crate:
//!
//! - [`FsObjectStore`] writes below `<root>/<bucket>/` on the local disk
//! - [`MemoryObjectStore`] keeps everything in a map, for tests and
//!   local development

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::sync::RwLock;
use tracing::debug;

/// Boxed future returned by [`ObjectStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Storage failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key cannot be used as an object name.
    #[error("invalid object key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The underlying write or read failed.
    #[error("i/o error on {location}: {source}")]
    Io {
        /// Where the operation was attempted.
        location: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A named-blob store.
///
/// Object-safe so tools can hold an `Arc<dyn ObjectStore>`.
pub trait ObjectStore: Send + Sync {
    /// Writes `body` under `key`, replacing any previous object, and
    /// returns a URI describing where it was stored.
    fn put<'a>(&'a self, key: &'a str, body: &'a [u8]) -> StoreFuture<'a, String>;

    /// Reads the object stored under `key`, if any.
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>>;
}

/// Rejects keys that are empty, absolute, or could escape the bucket.
fn validate_key(key: &str) -> Result<(), StoreError> {
    let reason = if key.is_empty() {
        "key cannot be empty"
    } else if key.starts_with('/') || key.contains('\\') {
        "key must be a relative, slash-separated path"
    } else if key.split('/').any(|segment| segment.is_empty() || segment == "..") {
        "key contains an empty or parent segment"
    } else if key.chars().any(char::is_control) {
        "key contains control characters"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidKey {
        key: key.to_string(),
        reason,
    })
}

// ── Filesystem ──────────────────────────────────────────────────

/// Stores objects as files under `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    bucket: String,
}

impl FsObjectStore {
    /// Creates a store rooted at `root`, writing into `bucket`.
    ///
    /// Directories are created lazily on the first write.
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
        }
    }

    /// The bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Directory holding this store's objects.
    pub fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.bucket_dir().join(key))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        location: path.display().to_string(),
        source,
    }
}

impl ObjectStore for FsObjectStore {
    fn put<'a>(&'a self, key: &'a str, body: &'a [u8]) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let path = self.object_path(key)?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| io_error(parent, e))?;
            }
            tokio::fs::write(&path, body)
                .await
                .map_err(|e| io_error(&path, e))?;
            debug!(path = %path.display(), bytes = body.len(), "object written");
            Ok(format!("file://{}", path.display()))
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            let path = self.object_path(key)?;
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(io_error(&path, e)),
            }
        })
    }
}

// ── Memory ──────────────────────────────────────────────────────

/// In-memory store for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    /// Creates an empty store with the given bucket name.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::default(),
        }
    }

    /// Keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put<'a>(&'a self, key: &'a str, body: &'a [u8]) -> StoreFuture<'a, String> {
        Box::pin(async move {
            validate_key(key)?;
            self.objects
                .write()
                .await
                .insert(key.to_string(), body.to_vec());
            Ok(format!("mem://{}/{key}", self.bucket))
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            validate_key(key)?;
            Ok(self.objects.read().await.get(key).cloned())
        })
    }
}
