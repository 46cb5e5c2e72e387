//! Lease document processing: the single pipeline entry point.
//!
//! Rasterizer → Recognition Orchestrator → Quality Assessor → Parser →
//! Confidence Aggregator. Holds no durable state; persisting the record is
//! the caller's job.
//!
//! Every stage is injected, so the processor is testable with fakes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::config::{ConfigError, PipelineConfig};
use crate::pipeline::cache::{CacheKey, CachedRecognition, RecognitionCache};
use crate::pipeline::diagnostic;
use crate::pipeline::extraction::pdfium::PdfiumRenderer;
use crate::pipeline::extraction::quality::{assess_text_quality, QualityReport};
use crate::pipeline::extraction::types::{
    Document, PdfPageRenderer, ProviderKind, RecognitionDiagnostics, RecognitionOutput,
};
use crate::pipeline::extraction::{
    ConversionError, ExtractionError, PageRasterizer, RecognitionOrchestrator,
};
use crate::pipeline::structuring::{CatalogError, LeaseParser, SectionCatalog, StructuredLeaseRecord};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Section catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration: {0}")]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    pub document: Document,
    /// Display name copied into the record.
    pub file_name: String,
    /// Pre-computed 0.0-1.0 quality score; skips the Quality Assessor.
    pub quality_score: Option<f32>,
    /// Ignore any cached recognition for the same bytes.
    pub force_reprocess: bool,
}

impl ProcessingRequest {
    pub fn new(document: Document, file_name: impl Into<String>) -> Self {
        Self {
            document,
            file_name: file_name.into(),
            quality_score: None,
            force_reprocess: false,
        }
    }

    pub fn with_quality_score(mut self, score: f32) -> Self {
        self.quality_score = Some(score);
        self
    }

    pub fn force_reprocess(mut self, force: bool) -> Self {
        self.force_reprocess = force;
        self
    }
}

/// Recognition-stage output: `{ text, provider, confidence, quality, diagnostics }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionReport {
    pub text: String,
    pub provider: String,
    pub selected_provider: ProviderKind,
    /// 0-100, from the selected provider.
    pub confidence: u8,
    /// `None` when the caller supplied a quality score.
    pub quality: Option<QualityReport>,
    pub diagnostics: RecognitionDiagnostics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    pub document_id: Uuid,
    pub recognition: RecognitionReport,
    pub record: StructuredLeaseRecord,
    /// Recognition was served from the cache.
    pub cached: bool,
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

pub struct LeaseProcessor {
    rasterizer: PageRasterizer,
    orchestrator: RecognitionOrchestrator,
    parser: LeaseParser,
    cache: Option<Box<dyn RecognitionCache>>,
    dump_root: Option<PathBuf>,
}

impl LeaseProcessor {
    pub fn new(
        rasterizer: PageRasterizer,
        orchestrator: RecognitionOrchestrator,
        parser: LeaseParser,
    ) -> Self {
        Self {
            rasterizer,
            orchestrator,
            parser,
            cache: None,
            dump_root: None,
        }
    }

    /// Wire every stage from configuration.
    ///
    /// A missing PDFium library is not fatal: images still work and PDFs
    /// fail with a conversion error.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ProcessingError> {
        let renderer: Option<Box<dyn PdfPageRenderer>> = match PdfiumRenderer::new() {
            Ok(renderer) => Some(Box::new(renderer)),
            Err(e) => {
                warn!(error = %e, "PDF rendering unavailable");
                None
            }
        };
        let rasterizer = PageRasterizer::new(renderer).with_dpi(config.render_dpi);

        let catalog = match &config.section_catalog_path {
            Some(path) => SectionCatalog::from_file(path)?,
            None => SectionCatalog::builtin(),
        };

        let mut processor = Self::new(
            rasterizer,
            RecognitionOrchestrator::from_config(config),
            LeaseParser::new(catalog),
        );
        processor.dump_root = config.dump_dir.clone();
        Ok(processor)
    }

    pub fn with_cache(mut self, cache: Box<dyn RecognitionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_root = Some(dir.into());
        self
    }

    pub fn parser(&self) -> &LeaseParser {
        &self.parser
    }

    /// Run the full pipeline on one document.
    ///
    /// A cache hit skips rasterization and recognition; the record is always
    /// rebuilt from this request's file name and quality score.
    pub fn process(&self, request: &ProcessingRequest) -> Result<ProcessingOutcome, ProcessingError> {
        let cache_key = self
            .cache
            .as_ref()
            .map(|_| CacheKey::for_document(&request.document));
        let hit = match (&self.cache, &cache_key) {
            (Some(cache), Some(key)) if !request.force_reprocess => cache.get(key),
            _ => None,
        };
        let cached = hit.is_some();
        let document_id = hit.as_ref().map_or_else(Uuid::new_v4, |h| h.document_id);

        let span = info_span!("process_document", document_id = %document_id);
        let _guard = span.enter();

        info!(
            file_name = %request.file_name,
            mime_type = %request.document.mime_type,
            bytes = request.document.bytes.len(),
            cached,
            "Processing lease document"
        );

        let dump_dir = if cached {
            None
        } else {
            diagnostic::dump_dir_for(self.dump_root.as_deref(), &document_id)
        };

        let recognition = match hit {
            Some(hit) => hit.output,
            None => {
                let output = self.recognize_document(request, dump_dir.as_deref())?;
                if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
                    cache.put(
                        key,
                        CachedRecognition {
                            document_id,
                            output: output.clone(),
                        },
                    );
                }
                output
            }
        };

        let (quality, record) =
            self.structure_text(&recognition.text, &request.file_name, request.quality_score);

        let outcome = ProcessingOutcome {
            document_id,
            recognition: RecognitionReport {
                text: recognition.text,
                provider: recognition.provider,
                selected_provider: recognition.selected_provider,
                confidence: recognition.confidence,
                quality,
                diagnostics: recognition.diagnostics,
            },
            record,
            cached,
        };

        if let Some(dir) = &dump_dir {
            diagnostic::dump_json(dir, "03-quality.json", &outcome.recognition.quality);
            diagnostic::dump_json(dir, "04-record.json", &outcome.record);
        }

        info!(
            provider = %outcome.recognition.provider,
            recognition_confidence = outcome.recognition.confidence,
            record_confidence = outcome.record.confidence,
            sections = outcome.record.sections.len(),
            "Lease document processed"
        );
        Ok(outcome)
    }

    /// Rasterizer + Recognition Orchestrator. Page artifacts are gone when this returns.
    fn recognize_document(
        &self,
        request: &ProcessingRequest,
        dump_dir: Option<&Path>,
    ) -> Result<RecognitionOutput, ProcessingError> {
        if let Some(dir) = dump_dir {
            diagnostic::dump_json(
                dir,
                "00-source-info.json",
                &serde_json::json!({
                    "file_name": request.file_name,
                    "mime_type": request.document.mime_type,
                    "bytes": request.document.bytes.len(),
                }),
            );
        }

        let rasterized = self.rasterizer.rasterize(&request.document)?;
        if let Some(dir) = dump_dir {
            for page in rasterized.pages() {
                if let Ok(png) = page.read_png() {
                    diagnostic::dump_binary(dir, &format!("01-page-{}.png", page.index + 1), &png);
                }
            }
        }

        let result = self.orchestrator.recognize(rasterized.pages());
        if let Some(dir) = dump_dir {
            let diagnostics = match &result {
                Ok(output) => &output.diagnostics,
                Err(e) => e.diagnostics(),
            };
            diagnostic::dump_json(dir, "02-recognition.json", diagnostics);
        }
        Ok(result?)
    }

    /// Quality Assessor + Parser + Confidence Aggregator on already recognized text.
    ///
    /// A caller-supplied score wins and the assessor is skipped.
    pub fn structure_text(
        &self,
        text: &str,
        file_name: &str,
        quality_score: Option<f32>,
    ) -> (Option<QualityReport>, StructuredLeaseRecord) {
        let quality = match quality_score {
            Some(_) => None,
            None => Some(assess_text_quality(text)),
        };
        let score = quality_score.or_else(|| quality.as_ref().map(QualityReport::fraction));
        let record = self.parser.parse(text, file_name, score);
        (quality, record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
