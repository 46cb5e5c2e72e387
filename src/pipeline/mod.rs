pub mod extraction;
pub mod structuring;
pub mod cache;
pub mod processor;
pub mod diagnostic; // Intermediate artifact dump (LEASE_INGEST_DUMP_DIR)

pub use cache::{CacheKey, CachedRecognition, InMemoryRecognitionCache, RecognitionCache};
pub use processor::*;
