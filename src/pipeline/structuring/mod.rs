pub mod types;
pub mod catalog;
pub mod sections;
pub mod citations;
pub mod details;
pub mod financial;
pub mod summary;
pub mod confidence;
pub mod parser;

pub use types::*;
pub use catalog::*;
pub use citations::*;
pub use confidence::*;
pub use parser::*;

use thiserror::Error;

/// Invalid section catalog configuration.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog topic is missing an id")]
    MissingId,

    #[error("Catalog topic '{0}' is defined twice")]
    DuplicateTopic(String),

    #[error("Catalog topic '{0}' has no keywords")]
    EmptyKeywords(String),

    #[error("Catalog topic '{topic}' keywords do not compile: {reason}")]
    Pattern { topic: String, reason: String },

    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog file error: {0}")]
    Io(#[from] std::io::Error),
}
