//! Blocking HTTP plumbing shared by the remote recognition providers.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::ProviderError;

/// Longest response body excerpt kept in an error message.
const ERROR_BODY_LIMIT: usize = 512;

pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, ProviderError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ProviderError::Unavailable(format!("HTTP client: {e}")))
}

/// Map a transport failure. Timeouts stay distinguishable from other call errors.
pub(crate) fn map_send_error(e: reqwest::Error, endpoint: &str, timeout_secs: u64) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout { secs: timeout_secs }
    } else if e.is_connect() {
        ProviderError::Call(format!("Cannot connect to {endpoint}"))
    } else {
        ProviderError::Call(e.to_string())
    }
}

/// Check the status, then decode the JSON body.
pub(crate) fn read_json<T: DeserializeOwned>(
    response: reqwest::blocking::Response,
    timeout_secs: u64,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(ProviderError::Call(format!(
            "HTTP {}: {}",
            status.as_u16(),
            truncate(&body, ERROR_BODY_LIMIT)
        )));
    }

    let body = response.text().map_err(|e| {
        if e.is_timeout() {
            ProviderError::Timeout { secs: timeout_secs }
        } else {
            ProviderError::Call(e.to_string())
        }
    })?;
    serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

/// Cut at a char boundary no later than `max` bytes.
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "££££";
        // '£' is two bytes; cutting at 3 must back off to 2.
        assert_eq!(truncate(text, 3), "£");
        assert_eq!(truncate("short", 100), "short");
    }

    #[test]
    fn client_builds_with_timeout() {
        assert!(build_client(5).is_ok());
    }
}
