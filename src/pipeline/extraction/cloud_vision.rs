//! Primary recognition provider: Google Cloud Vision `TEXT_DETECTION`.
//!
//! One annotate request per page image. The first text annotation carries
//! the whole page text; the remaining ones are individual words.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http;
use super::types::{PageCoverage, PageRecognition, ProviderKind, RecognitionProvider};
use super::ProviderError;

pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Word confidence assumed when the service omits one.
pub const DEFAULT_WORD_CONFIDENCE: f32 = 0.8;

pub struct GoogleVisionProvider {
    api_key: String,
    endpoint: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GoogleVisionProvider {
    /// Fails with `Unavailable` when the key is blank.
    pub fn new(api_key: &str, endpoint: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::Unavailable(
                "GOOGLE_VISION_API_KEY is not set".into(),
            ));
        }
        Ok(Self {
            api_key: api_key.trim().to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: http::build_client(timeout_secs)?,
            timeout_secs,
        })
    }
}

// ── Wire format ───────────────────────────────────────────

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: [ImageRequest<'a>; 1],
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    image: ImageContent,
    features: [Feature<'a>; 1],
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<StatusMessage>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct StatusMessage {
    #[serde(default)]
    message: String,
}

fn annotate_request(png_bytes: &[u8]) -> AnnotateRequest<'static> {
    AnnotateRequest {
        requests: [ImageRequest {
            image: ImageContent {
                content: base64::engine::general_purpose::STANDARD.encode(png_bytes),
            },
            features: [Feature {
                kind: "TEXT_DETECTION",
            }],
        }],
    }
}

/// Turn an annotate response body into a page result.
///
/// A page without annotations is a successful, blank page.
pub fn parse_annotate_response(body: &serde_json::Value) -> Result<PageRecognition, ProviderError> {
    let parsed: AnnotateResponse = serde_json::from_value(body.clone())
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    let Some(page) = parsed.responses.into_iter().next() else {
        return Ok(blank_page());
    };
    if let Some(error) = page.error {
        return Err(ProviderError::Call(error.message));
    }

    let mut annotations = page.text_annotations.into_iter();
    let Some(full_text) = annotations.next() else {
        return Ok(blank_page());
    };
    let words: Vec<TextAnnotation> = annotations.collect();

    Ok(PageRecognition {
        text: full_text.description,
        confidence: mean_word_confidence(words.iter().map(|w| w.confidence)),
        words_detected: words.len(),
        tokens_used: None,
        model: None,
    })
}

/// Average word confidence, substituting the default for missing values.
/// A page with no words scores 0.
pub fn mean_word_confidence(confidences: impl Iterator<Item = Option<f32>>) -> f32 {
    let (sum, count) = confidences.fold((0.0f32, 0usize), |(sum, count), c| {
        (sum + c.unwrap_or(DEFAULT_WORD_CONFIDENCE), count + 1)
    });
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

fn blank_page() -> PageRecognition {
    PageRecognition {
        text: String::new(),
        confidence: 0.0,
        words_detected: 0,
        tokens_used: None,
        model: None,
    }
}

impl RecognitionProvider for GoogleVisionProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GoogleVision
    }

    fn coverage(&self) -> PageCoverage {
        PageCoverage::AllPages
    }

    fn recognize_page(&self, png_bytes: &[u8]) -> Result<PageRecognition, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&annotate_request(png_bytes))
            .send()
            .map_err(|e| http::map_send_error(e, &self.endpoint, self.timeout_secs))?;

        let body: serde_json::Value = http::read_json(response, self.timeout_secs)?;
        let page = parse_annotate_response(&body)?;

        debug!(
            text_length = page.text.len(),
            words = page.words_detected,
            "Cloud vision page recognized"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_key_is_unavailable() {
        let err = GoogleVisionProvider::new("  ", DEFAULT_ENDPOINT, 30)
            .err()
            .unwrap();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(annotate_request(b"abc")).unwrap();
        assert_eq!(body["requests"][0]["image"]["content"], "YWJj");
        assert_eq!(body["requests"][0]["features"][0]["type"], "TEXT_DETECTION");
    }

    #[test]
    fn full_text_from_first_annotation() {
        let body = json!({
            "responses": [{
                "textAnnotations": [
                    {"description": "THIS LEASE\nis made"},
                    {"description": "THIS", "confidence": 0.9},
                    {"description": "LEASE", "confidence": 0.7},
                    {"description": "is"},
                    {"description": "made"}
                ]
            }]
        });
        let page = parse_annotate_response(&body).unwrap();
        assert_eq!(page.text, "THIS LEASE\nis made");
        assert_eq!(page.words_detected, 4);
        // (0.9 + 0.7 + 0.8 + 0.8) / 4
        assert!((page.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn words_without_confidence_use_default() {
        let c = mean_word_confidence([None, None].into_iter());
        assert!((c - DEFAULT_WORD_CONFIDENCE).abs() < 1e-6);
    }

    #[test]
    fn no_words_scores_zero() {
        assert_eq!(mean_word_confidence(std::iter::empty()), 0.0);
    }

    #[test]
    fn empty_response_is_blank_page() {
        let page = parse_annotate_response(&json!({"responses": [{}]})).unwrap();
        assert!(page.text.is_empty());
        assert_eq!(page.confidence, 0.0);

        let page = parse_annotate_response(&json!({})).unwrap();
        assert!(page.text.is_empty());
    }

    #[test]
    fn per_image_error_is_call_error() {
        let body = json!({"responses": [{"error": {"code": 3, "message": "Bad image data."}}]});
        let err = parse_annotate_response(&body).unwrap_err();
        assert_eq!(err, ProviderError::Call("Bad image data.".into()));
    }

    #[test]
    fn malformed_response_is_invalid() {
        let err = parse_annotate_response(&json!({"responses": "nope"})).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
