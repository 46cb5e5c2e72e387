pub mod types;
pub mod preprocess;
pub mod pdfium;
pub mod rasterizer;
mod http;
pub mod cloud_vision;
pub mod vision_llm;
pub mod orchestrator;
pub mod quality;

pub use types::*;
pub use rasterizer::*;
pub use orchestrator::*;
pub use quality::*;

use thiserror::Error;

/// Fatal failure to turn the source bytes into page images.
///
/// Raised before any provider is contacted.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Unsupported document type: {0}")]
    UnsupportedMime(String),

    #[error("Document is empty")]
    EmptyDocument,

    #[error("Document exceeds {limit_mb}MB limit")]
    TooLarge { limit_mb: usize },

    #[error("Image decoding failed: {0}")]
    ImageDecode(String),

    #[error("Image encoding failed: {0}")]
    ImageEncode(String),

    #[error("PDF page {page} rendering failed: {reason}")]
    PdfRendering { page: usize, reason: String },

    #[error("PDF is password-protected")]
    PdfEncrypted,

    #[error("No PDF renderer is available: {0}")]
    RendererUnavailable(String),

    #[error("Temporary page storage failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single recognition provider.
///
/// Never fatal on its own: the orchestrator records it and moves down the chain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    Unavailable(String),

    #[error("Provider call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Provider call failed: {0}")]
    Call(String),

    #[error("Provider returned an unreadable response: {0}")]
    InvalidResponse(String),
}

/// Every provider in the chain was skipped, failed or produced blank text.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("No recognition provider is configured")]
    NoProviderAvailable { diagnostics: RecognitionDiagnostics },

    #[error("Failed to extract text from document ({})", .diagnostics.summary())]
    NoTextExtracted { diagnostics: RecognitionDiagnostics },
}

impl ExtractionError {
    pub fn diagnostics(&self) -> &RecognitionDiagnostics {
        match self {
            Self::NoProviderAvailable { diagnostics } | Self::NoTextExtracted { diagnostics } => {
                diagnostics
            }
        }
    }
}
