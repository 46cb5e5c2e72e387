//! Recognition cache seam.
//!
//! Keyed by content hash plus declared MIME type, so re-uploading the same
//! bytes skips rasterization and the providers unless reprocessing is forced.
//! Only document-derived output is stored; the record is rebuilt per request
//! from the caller's file name and quality score.

use std::collections::HashMap;
use std::sync::Mutex;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::extraction::{Document, RecognitionOutput};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_document(document: &Document) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&document.bytes);
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        Self(format!("{hex}:{}", document.mime_type.trim().to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct CachedRecognition {
    /// Id of the run that produced the recognition.
    pub document_id: Uuid,
    pub output: RecognitionOutput,
}

/// Storage is the caller's concern; this trait is the only contract.
pub trait RecognitionCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<CachedRecognition>;

    fn put(&self, key: CacheKey, entry: CachedRecognition);
}

/// Process-local cache for long-lived callers and tests.
#[derive(Default)]
pub struct InMemoryRecognitionCache {
    entries: Mutex<HashMap<CacheKey, CachedRecognition>>,
}

impl InMemoryRecognitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecognitionCache for InMemoryRecognitionCache {
    fn get(&self, key: &CacheKey) -> Option<CachedRecognition> {
        let entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Recognition cache lock poisoned");
                return None;
            }
        };
        entries.get(key).cloned()
    }

    fn put(&self, key: CacheKey, entry: CachedRecognition) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(key, entry);
            }
            Err(e) => tracing::warn!(error = %e, "Recognition cache lock poisoned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_and_mime_share_a_key() {
        let a = CacheKey::for_document(&Document::new(b"lease".to_vec(), "application/pdf"));
        let b = CacheKey::for_document(&Document::new(b"lease".to_vec(), "Application/PDF "));
        assert_eq!(a, b);
        assert!(a.as_str().ends_with(":application/pdf"));
        // 64 hex chars + ':' + mime
        assert_eq!(a.as_str().find(':'), Some(64));
    }

    #[test]
    fn mime_or_bytes_change_the_key() {
        let base = CacheKey::for_document(&Document::new(b"lease".to_vec(), "image/png"));
        let other_mime = CacheKey::for_document(&Document::new(b"lease".to_vec(), "image/jpeg"));
        let other_bytes = CacheKey::for_document(&Document::new(b"lease2".to_vec(), "image/png"));
        assert_ne!(base, other_mime);
        assert_ne!(base, other_bytes);
    }

    #[test]
    fn empty_cache_misses() {
        let cache = InMemoryRecognitionCache::new();
        let key = CacheKey::for_document(&Document::new(b"x".to_vec(), "image/png"));
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }
}
