//! Fallback recognition provider: a vision-capable chat model.
//!
//! Called once, with the first page only, and asked for a verbatim
//! transcription. The model reports no confidence, so a fixed one is used.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http;
use super::types::{PageCoverage, PageRecognition, ProviderKind, RecognitionProvider};
use super::ProviderError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Confidence attached to every transcription (accurate in practice, never verified).
pub const TRANSCRIPTION_CONFIDENCE: f32 = 0.85;

const MAX_TOKENS: u32 = 4000;

const TRANSCRIBE_PROMPT: &str = "\
Extract all text from this image. Return only the extracted text, no additional \
commentary or formatting. If the image contains a document, transcribe it exactly as written.";

pub struct OpenAiVisionProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiVisionProvider {
    /// Fails with `Unavailable` when the key is blank.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::Unavailable("OPENAI_API_KEY is not set".into()));
        }
        Ok(Self {
            api_key: api_key.trim().to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: http::build_client(timeout_secs)?,
            timeout_secs,
        })
    }
}

// ── Wire format ───────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: [ContentPart<'a>; 2],
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}

fn chat_request<'a>(model: &'a str, png_bytes: &[u8]) -> ChatRequest<'a> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes);
    ChatRequest {
        model,
        messages: [ChatMessage {
            role: "user",
            content: [
                ContentPart::Text {
                    text: TRANSCRIBE_PROMPT,
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/png;base64,{encoded}"),
                    },
                },
            ],
        }],
        max_tokens: MAX_TOKENS,
    }
}

/// Turn a chat-completions body into a page result.
///
/// Missing content is a blank transcription, not an error.
pub fn parse_chat_response(
    body: &serde_json::Value,
    requested_model: &str,
) -> Result<PageRecognition, ProviderError> {
    let parsed: ChatResponse = serde_json::from_value(body.clone())
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    Ok(PageRecognition {
        words_detected: text.split_whitespace().count(),
        text,
        confidence: TRANSCRIPTION_CONFIDENCE,
        tokens_used: Some(parsed.usage.map(|u| u.total_tokens).unwrap_or(0)),
        model: Some(parsed.model.unwrap_or_else(|| requested_model.to_string())),
    })
}

impl RecognitionProvider for OpenAiVisionProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAiVision
    }

    fn coverage(&self) -> PageCoverage {
        PageCoverage::FirstPage
    }

    fn recognize_page(&self, png_bytes: &[u8]) -> Result<PageRecognition, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&chat_request(&self.model, png_bytes))
            .send()
            .map_err(|e| http::map_send_error(e, &url, self.timeout_secs))?;

        let body: serde_json::Value = http::read_json(response, self.timeout_secs)?;
        let page = parse_chat_response(&body, &self.model)?;

        debug!(
            text_length = page.text.len(),
            tokens = page.tokens_used.unwrap_or(0),
            "Vision model transcription received"
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
        let err = OpenAiVisionProvider::new("", DEFAULT_BASE_URL, DEFAULT_MODEL, 30)
            .err()
            .unwrap();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[test]
    fn request_carries_prompt_and_data_url() {
        let body = serde_json::to_value(chat_request("gpt-4o", b"abc")).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 4000);
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert!(content[0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Extract all text from this image."));
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,YWJj");
    }

    #[test]
    fn parses_text_and_usage() {
        let body = json!({
            "model": "gpt-4o-2024-08-06",
            "choices": [{"message": {"role": "assistant", "content": "Lease of Flat 4"}}],
            "usage": {"prompt_tokens": 900, "completion_tokens": 6, "total_tokens": 906}
        });
        let page = parse_chat_response(&body, "gpt-4o").unwrap();
        assert_eq!(page.text, "Lease of Flat 4");
        assert_eq!(page.words_detected, 4);
        assert_eq!(page.tokens_used, Some(906));
        assert_eq!(page.model.as_deref(), Some("gpt-4o-2024-08-06"));
        assert!((page.confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn missing_content_is_blank() {
        let body = json!({"choices": [{"message": {"content": null}}]});
        let page = parse_chat_response(&body, "gpt-4o").unwrap();
        assert!(page.text.is_empty());
        assert_eq!(page.tokens_used, Some(0));
        assert_eq!(page.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn malformed_choices_are_invalid() {
        let err = parse_chat_response(&json!({"choices": 7}), "gpt-4o").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
