use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::{ConversionError, ProviderError};

/// Raw document handed over by the caller. Lives for one pipeline invocation.
#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Document {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn kind(&self) -> Result<DocumentKind, ConversionError> {
        DocumentKind::from_mime(&self.mime_type)
    }
}

/// How the rasterizer treats a declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Multi-page document rendered page by page.
    Pdf,
    /// Single raster image, one page.
    Raster,
}

impl DocumentKind {
    pub fn from_mime(mime_type: &str) -> Result<Self, ConversionError> {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/pdf" | "application/x-pdf" => Ok(Self::Pdf),
            "image/png" | "image/jpeg" | "image/jpg" | "image/pjpeg" | "image/tiff" => {
                Ok(Self::Raster)
            }
            _ => Err(ConversionError::UnsupportedMime(mime_type.to_string())),
        }
    }
}

/// One normalized page, stored as a PNG inside the invocation's scratch directory.
///
/// The file only lives as long as the owning `RasterizedDocument`.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Zero-based page index in source order.
    pub index: usize,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl PageImage {
    pub fn read_png(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// PDF page rendering abstraction (allows mocking without the PDFium binary).
pub trait PdfPageRenderer: Send + Sync {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ConversionError>;

    /// Render one zero-based page at the given density.
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        dpi: u32,
    ) -> Result<DynamicImage, ConversionError>;
}

/// Stable identifier of a recognition provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    GoogleVision,
    OpenAiVision,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleVision => "google_vision",
            Self::OpenAiVision => "openai_vision",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pages a provider is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCoverage {
    /// Every page, concurrently, texts joined in page order.
    AllPages,
    /// A single call with the first page only.
    FirstPage,
}

/// Output of one provider call on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecognition {
    pub text: String,
    /// Page confidence on a 0.0-1.0 scale.
    pub confidence: f32,
    pub words_detected: usize,
    pub tokens_used: Option<u32>,
    pub model: Option<String>,
}

/// Text-recognition backend (allows fakes in tests).
pub trait RecognitionProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn coverage(&self) -> PageCoverage;

    fn recognize_page(&self, png_bytes: &[u8]) -> Result<PageRecognition, ProviderError>;
}

/// Entry of the provider chain. Availability is settled when the chain is built.
pub enum ProviderSlot {
    Available(Box<dyn RecognitionProvider>),
    Unavailable { kind: ProviderKind, reason: String },
}

impl ProviderSlot {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Available(provider) => provider.kind(),
            Self::Unavailable { kind, .. } => *kind,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl std::fmt::Debug for ProviderSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(provider) => write!(f, "Available({})", provider.kind()),
            Self::Unavailable { kind, reason } => write!(f, "Unavailable({kind}: {reason})"),
        }
    }
}

/// Outcome of one provider in the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptStatus {
    Skipped { reason: String },
    Failed { error: String },
    Empty,
    Succeeded,
    NotAttempted,
}

/// Per-page detail recorded for a provider attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDiagnostics {
    /// One-based page number.
    pub page: usize,
    pub text_length: usize,
    /// 0-100.
    pub confidence: u8,
    pub words_detected: usize,
}

/// Diagnostics of one provider, including ones that were skipped or never reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionAttempt {
    pub provider: ProviderKind,
    #[serde(flatten)]
    pub status: AttemptStatus,
    /// Extracted text (possibly empty). Not serialized; the selected text is reported once.
    #[serde(skip)]
    pub text: String,
    /// 0-100.
    pub confidence: u8,
    pub pages_converted: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageDiagnostics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub elapsed_ms: u64,
}

impl RecognitionAttempt {
    pub fn skipped(provider: ProviderKind, reason: &str) -> Self {
        Self::without_call(provider, AttemptStatus::Skipped {
            reason: reason.to_string(),
        })
    }

    pub fn not_attempted(provider: ProviderKind) -> Self {
        Self::without_call(provider, AttemptStatus::NotAttempted)
    }

    fn without_call(provider: ProviderKind, status: AttemptStatus) -> Self {
        Self {
            provider,
            status,
            text: String::new(),
            confidence: 0,
            pages_converted: 0,
            pages: vec![],
            tokens_used: None,
            model: None,
            elapsed_ms: 0,
        }
    }

    pub fn was_called(&self) -> bool {
        matches!(
            self.status,
            AttemptStatus::Failed { .. } | AttemptStatus::Empty | AttemptStatus::Succeeded
        )
    }

    /// Only a successful attempt with non-blank text may become authoritative.
    pub fn is_authoritative(&self) -> bool {
        self.status == AttemptStatus::Succeeded && !self.text.trim().is_empty()
    }
}

/// Diagnostics bundle for a whole orchestrator run, in chain order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionDiagnostics {
    pub attempts: Vec<RecognitionAttempt>,
}

impl RecognitionDiagnostics {
    pub fn attempt(&self, provider: ProviderKind) -> Option<&RecognitionAttempt> {
        self.attempts.iter().find(|a| a.provider == provider)
    }

    /// One-line `provider=status` listing for error messages.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| {
                let status = match &a.status {
                    AttemptStatus::Skipped { .. } => "skipped",
                    AttemptStatus::Failed { .. } => "failed",
                    AttemptStatus::Empty => "empty",
                    AttemptStatus::Succeeded => "succeeded",
                    AttemptStatus::NotAttempted => "not_attempted",
                };
                format!("{}={status}", a.provider)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Authoritative output of the Recognition Orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionOutput {
    pub text: String,
    /// Attempted providers joined with `+`, e.g. `google_vision+openai_vision`.
    pub provider: String,
    pub selected_provider: ProviderKind,
    /// 0-100.
    pub confidence: u8,
    pub diagnostics: RecognitionDiagnostics,
}

/// Convert a 0.0-1.0 confidence to a clamped 0-100 percentage.
pub fn to_percent(confidence: f32) -> u8 {
    if confidence.is_nan() {
        return 0;
    }
    (confidence * 100.0).round().clamp(0.0, 100.0) as u8
}
