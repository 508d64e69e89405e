//! Media reference resolver with a bounded LRU cache.
//!
//! # Responsibility
//! - Turn stored media references into fetchable URLs.
//! - Remember resolutions so repeated renders make no collaborator calls.
//!
//! # Invariants
//! - Cache keys are the original, unresolved reference strings.
//! - `resolve` never returns an error; failed lookups resolve to a
//!   placeholder that is cached like any other resolution.
//! - The cache never exceeds its configured capacity.

use super::reference::{filename_stem, public_download_url, MediaRef};
use crate::config::CoreConfig;
use log::{debug, warn};
use lru::LruCache;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Blob storage failure reported by a [`BlobStorage`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobError {
    NotFound(String),
    PermissionDenied(String),
    Network(String),
}

impl Display for BlobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "object not found: {path}"),
            Self::PermissionDenied(path) => write!(f, "permission denied for object: {path}"),
            Self::Network(message) => write!(f, "blob storage unreachable: {message}"),
        }
    }
}

impl Error for BlobError {}

/// Hosted blob storage: bucket-relative path to a download URL.
pub trait BlobStorage {
    fn download_url(&self, path: &str) -> Result<String, BlobError>;
}

impl<T: BlobStorage + ?Sized> BlobStorage for &T {
    fn download_url(&self, path: &str) -> Result<String, BlobError> {
        (**self).download_url(path)
    }
}

/// Blob storage for publicly readable buckets: builds URLs without a network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrlStorage {
    bucket: String,
}

impl PublicUrlStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
        }
    }
}

impl BlobStorage for PublicUrlStorage {
    fn download_url(&self, path: &str) -> Result<String, BlobError> {
        if path.trim().is_empty() {
            return Err(BlobError::NotFound(path.to_string()));
        }
        Ok(public_download_url(&self.bucket, path))
    }
}

/// Resolves media references, owning its cache.
pub struct ImageResolver<B: BlobStorage> {
    storage: B,
    cache: Mutex<LruCache<String, String>>,
    placeholder_base: String,
}

impl<B: BlobStorage> ImageResolver<B> {
    pub fn new(storage: B, capacity: NonZeroUsize, placeholder_base: impl Into<String>) -> Self {
        Self {
            storage,
            cache: Mutex::new(LruCache::new(capacity)),
            placeholder_base: placeholder_base.into(),
        }
    }

    /// Builds a resolver from validated core configuration.
    pub fn from_config(storage: B, config: &CoreConfig) -> Self {
        let capacity = NonZeroUsize::new(config.url_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self::new(storage, capacity, config.placeholder_base.clone())
    }

    /// Resolves `reference` to a fetchable URL.
    ///
    /// - Empty input: `None`, nothing cached.
    /// - Public URL: cached as its own resolution.
    /// - Bucket handle: storage lookup cached under `reference`; on failure a
    ///   placeholder derived from the file name is cached instead.
    /// - Anything else: returned unchanged and not cached.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let parsed = MediaRef::parse(reference)?;

        if let Some(hit) = self.lock_cache().get(reference) {
            return Some(hit.clone());
        }

        let resolved = match parsed {
            MediaRef::Public(url) => url.to_string(),
            MediaRef::Bucket { path, .. } => self.resolve_bucket_path(reference, path),
            MediaRef::Opaque(raw) => return Some(raw.to_string()),
        };

        self.lock_cache().put(reference.to_string(), resolved.clone());
        Some(resolved)
    }

    /// Resolves every reference independently; one failure never affects another.
    pub fn preload_all<I, S>(&self, references: I) -> Vec<Option<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        references
            .into_iter()
            .map(|reference| self.resolve(reference.as_ref()))
            .collect()
    }

    /// Placeholder URL shown for `reference` when it cannot be resolved.
    pub fn placeholder_for(&self, reference: &str) -> String {
        format!(
            "{}{}",
            self.placeholder_base,
            urlencoding::encode(filename_stem(reference))
        )
    }

    pub fn is_cached(&self, reference: &str) -> bool {
        self.lock_cache().contains(reference)
    }

    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    pub fn cache_capacity(&self) -> usize {
        self.lock_cache().cap().get()
    }

    fn resolve_bucket_path(&self, reference: &str, path: &str) -> String {
        if path.is_empty() {
            warn!("event=media_resolve module=media status=error error_code=empty_bucket_path");
            return self.placeholder_for(reference);
        }

        match self.storage.download_url(path) {
            Ok(url) => {
                debug!("event=media_resolve module=media status=ok source=blob");
                url
            }
            Err(err) => {
                warn!(
                    "event=media_resolve module=media status=error error_code=blob_lookup_failed error={}",
                    err
                );
                self.placeholder_for(reference)
            }
        }
    }

    fn lock_cache(&self) -> MutexGuard<'_, LruCache<String, String>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
