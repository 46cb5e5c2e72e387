//! Recognition Orchestrator: ordered provider chain with fallback.
//!
//! Providers are tried strictly in chain order. The first attempt yielding
//! non-blank text wins and later providers are never called. Every chain
//! entry, called or not, shows up in the diagnostics.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};

use super::cloud_vision::GoogleVisionProvider;
use super::types::{
    to_percent, AttemptStatus, PageCoverage, PageDiagnostics, PageImage, PageRecognition,
    ProviderKind, ProviderSlot, RecognitionAttempt, RecognitionDiagnostics, RecognitionOutput,
    RecognitionProvider,
};
use super::vision_llm::OpenAiVisionProvider;
use super::{ExtractionError, ProviderError};
use crate::config::PipelineConfig;

/// Inserted between page texts. A form feed keeps page breaks out of sentence splitting.
pub const PAGE_SEPARATOR: &str = "\n\u{c}\n";

/// Pages recognized at once by one provider.
pub const DEFAULT_PAGE_WORKERS: usize = 4;

pub struct RecognitionOrchestrator {
    chain: Vec<ProviderSlot>,
    page_workers: usize,
}

impl RecognitionOrchestrator {
    pub fn new(chain: Vec<ProviderSlot>) -> Self {
        Self {
            chain,
            page_workers: DEFAULT_PAGE_WORKERS,
        }
    }

    /// Cap concurrent page calls. Zero is treated as one.
    pub fn with_page_workers(mut self, workers: usize) -> Self {
        self.page_workers = workers.max(1);
        self
    }

    /// Cloud vision first, vision model second. Missing credentials make a slot unavailable.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let primary = GoogleVisionProvider::new(
            config.google_vision_api_key.as_deref().unwrap_or_default(),
            &config.google_vision_endpoint,
            config.provider_timeout_secs,
        );
        let fallback = OpenAiVisionProvider::new(
            config.openai_api_key.as_deref().unwrap_or_default(),
            &config.openai_base_url,
            &config.openai_vision_model,
            config.provider_timeout_secs,
        );

        let chain = vec![
            into_slot(ProviderKind::GoogleVision, primary),
            into_slot(ProviderKind::OpenAiVision, fallback),
        ];
        for slot in &chain {
            debug!(slot = ?slot, "Recognition provider configured");
        }
        Self::new(chain).with_page_workers(config.page_workers)
    }

    pub fn chain(&self) -> &[ProviderSlot] {
        &self.chain
    }

    pub fn has_available_provider(&self) -> bool {
        self.chain.iter().any(ProviderSlot::is_available)
    }

    /// Run the chain over the page sequence.
    pub fn recognize(&self, pages: &[PageImage]) -> Result<RecognitionOutput, ExtractionError> {
        let mut attempts = Vec::with_capacity(self.chain.len());
        let mut selected: Option<usize> = None;

        for slot in &self.chain {
            let attempt = match (slot, selected) {
                (ProviderSlot::Unavailable { kind, reason }, _) => {
                    debug!(provider = %kind, reason = %reason, "Provider skipped");
                    RecognitionAttempt::skipped(*kind, reason)
                }
                (ProviderSlot::Available(provider), Some(_)) => {
                    RecognitionAttempt::not_attempted(provider.kind())
                }
                (ProviderSlot::Available(provider), None) => {
                    let attempt = run_attempt(provider.as_ref(), pages, self.page_workers);
                    log_attempt(&attempt);
                    if attempt.is_authoritative() {
                        selected = Some(attempts.len());
                    }
                    attempt
                }
            };
            attempts.push(attempt);
        }

        let provider_tag = attempts
            .iter()
            .filter(|a| a.was_called())
            .map(|a| a.provider.as_str())
            .collect::<Vec<_>>()
            .join("+");
        let diagnostics = RecognitionDiagnostics { attempts };

        let Some(index) = selected else {
            warn!(attempts = %diagnostics.summary(), "Recognition exhausted every provider");
            return Err(if self.has_available_provider() {
                ExtractionError::NoTextExtracted { diagnostics }
            } else {
                ExtractionError::NoProviderAvailable { diagnostics }
            });
        };

        let winner = &diagnostics.attempts[index];
        let output = RecognitionOutput {
            text: winner.text.clone(),
            provider: provider_tag,
            selected_provider: winner.provider,
            confidence: winner.confidence,
            diagnostics: diagnostics.clone(),
        };

        info!(
            provider = %output.provider,
            confidence = output.confidence,
            text_length = output.text.len(),
            "Recognition complete"
        );
        Ok(output)
    }
}

fn into_slot<P: RecognitionProvider + 'static>(
    kind: ProviderKind,
    built: Result<P, ProviderError>,
) -> ProviderSlot {
    match built {
        Ok(provider) => ProviderSlot::Available(Box::new(provider)),
        Err(e) => ProviderSlot::Unavailable {
            kind,
            reason: e.to_string(),
        },
    }
}

fn log_attempt(attempt: &RecognitionAttempt) {
    match &attempt.status {
        AttemptStatus::Failed { error } => warn!(
            provider = %attempt.provider,
            error = %error,
            elapsed_ms = attempt.elapsed_ms,
            "Provider failed, falling back"
        ),
        AttemptStatus::Empty => warn!(
            provider = %attempt.provider,
            elapsed_ms = attempt.elapsed_ms,
            "Provider returned no text, falling back"
        ),
        _ => debug!(
            provider = %attempt.provider,
            confidence = attempt.confidence,
            elapsed_ms = attempt.elapsed_ms,
            "Provider succeeded"
        ),
    }
}

/// Call one provider over the pages its coverage asks for.
///
/// Any page failure fails the whole attempt. Blank pages contribute
/// neither text nor confidence.
fn run_attempt(
    provider: &dyn RecognitionProvider,
    pages: &[PageImage],
    workers: usize,
) -> RecognitionAttempt {
    let kind = provider.kind();
    let span = info_span!("recognition", provider = %kind);
    let _guard = span.enter();
    let started = Instant::now();

    let targets = match provider.coverage() {
        PageCoverage::AllPages => pages,
        PageCoverage::FirstPage => &pages[..pages.len().min(1)],
    };

    let results = recognize_pages(provider, targets, workers);

    let mut attempt = RecognitionAttempt::not_attempted(kind);
    attempt.pages_converted = targets.len();

    let mut recognized = Vec::with_capacity(results.len());
    for (page, result) in targets.iter().zip(results) {
        match result {
            Ok(r) => recognized.push((page.index, r)),
            Err(e) => {
                attempt.status = AttemptStatus::Failed {
                    error: format!("page {}: {e}", page.index + 1),
                };
                attempt.elapsed_ms = started.elapsed().as_millis() as u64;
                return attempt;
            }
        }
    }

    let mut texts = Vec::new();
    let mut confidences = Vec::new();
    for (index, page) in &recognized {
        attempt.pages.push(PageDiagnostics {
            page: index + 1,
            text_length: page.text.chars().count(),
            confidence: to_percent(page.confidence),
            words_detected: page.words_detected,
        });
        if let Some(tokens) = page.tokens_used {
            *attempt.tokens_used.get_or_insert(0) += tokens;
        }
        if attempt.model.is_none() {
            attempt.model = page.model.clone();
        }
        if !page.text.trim().is_empty() {
            texts.push(page.text.as_str());
            confidences.push(page.confidence);
        }
    }

    attempt.text = texts.join(PAGE_SEPARATOR);
    attempt.confidence = if confidences.is_empty() {
        0
    } else {
        to_percent(confidences.iter().sum::<f32>() / confidences.len() as f32)
    };
    attempt.status = if attempt.text.trim().is_empty() {
        AttemptStatus::Empty
    } else {
        AttemptStatus::Succeeded
    };
    attempt.elapsed_ms = started.elapsed().as_millis() as u64;
    attempt
}

/// At most `workers` pages in flight; results come back in page order.
fn recognize_pages(
    provider: &dyn RecognitionProvider,
    pages: &[PageImage],
    workers: usize,
) -> Vec<Result<PageRecognition, ProviderError>> {
    let workers = workers.min(pages.len());
    if workers <= 1 {
        return pages.iter().map(|p| recognize_one(provider, p)).collect();
    }

    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(|| {
            pages
                .par_iter()
                .map(|page| recognize_one(provider, page))
                .collect()
        }),
        Err(e) => {
            warn!(error = %e, "Page worker pool unavailable, recognizing sequentially");
            pages.iter().map(|p| recognize_one(provider, p)).collect()
        }
    }
}

fn recognize_one(
    provider: &dyn RecognitionProvider,
    page: &PageImage,
) -> Result<PageRecognition, ProviderError> {
    let png = page
        .read_png()
        .map_err(|e| ProviderError::Call(format!("Cannot read page image: {e}")))?;
    let result = provider.recognize_page(&png);
    debug!(
        page = page.index + 1,
        ok = result.is_ok(),
        "Page recognition finished"
    );
    result
}
