//! Environment-derived pipeline configuration.
//!
//! Read once at startup. Provider availability is decided from these
//! values when the recognition chain is built, never per call.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::pipeline::extraction::cloud_vision;
use crate::pipeline::extraction::orchestrator::DEFAULT_PAGE_WORKERS;
use crate::pipeline::extraction::pdfium::DEFAULT_RENDER_DPI;
use crate::pipeline::extraction::vision_llm;

/// Application-level constants
pub const APP_NAME: &str = "lease-ingest";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;

/// Renders above this density only cost memory; pages are capped at 4096 px anyway.
const MAX_RENDER_DPI: u32 = 600;

const MAX_PAGE_WORKERS: u64 = 16;

// Environment variables
pub const ENV_GOOGLE_VISION_API_KEY: &str = "GOOGLE_VISION_API_KEY";
pub const ENV_GOOGLE_VISION_ENDPOINT: &str = "GOOGLE_VISION_ENDPOINT";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OPENAI_VISION_MODEL: &str = "OPENAI_VISION_MODEL";
pub const ENV_PROVIDER_TIMEOUT_SECS: &str = "LEASE_INGEST_PROVIDER_TIMEOUT_SECS";
pub const ENV_RENDER_DPI: &str = "LEASE_INGEST_RENDER_DPI";
pub const ENV_PAGE_WORKERS: &str = "LEASE_INGEST_PAGE_WORKERS";
pub const ENV_SECTION_CATALOG: &str = "LEASE_INGEST_SECTION_CATALOG";
pub const ENV_DUMP_DIR: &str = "LEASE_INGEST_DUMP_DIR";

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "lease_ingest=info"
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    #[serde(skip)]
    pub google_vision_api_key: Option<String>,
    pub google_vision_endpoint: String,
    #[serde(skip)]
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_vision_model: String,
    pub provider_timeout_secs: u64,
    pub render_dpi: u32,
    /// Pages sent to one provider concurrently.
    pub page_workers: usize,
    pub section_catalog_path: Option<PathBuf>,
    pub dump_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            google_vision_api_key: None,
            google_vision_endpoint: cloud_vision::DEFAULT_ENDPOINT.to_string(),
            openai_api_key: None,
            openai_base_url: vision_llm::DEFAULT_BASE_URL.to_string(),
            openai_vision_model: vision_llm::DEFAULT_MODEL.to_string(),
            provider_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
            render_dpi: DEFAULT_RENDER_DPI,
            page_workers: DEFAULT_PAGE_WORKERS,
            section_catalog_path: None,
            dump_dir: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Ok(Self {
            google_vision_api_key: get(ENV_GOOGLE_VISION_API_KEY),
            google_vision_endpoint: get(ENV_GOOGLE_VISION_ENDPOINT)
                .unwrap_or(defaults.google_vision_endpoint),
            openai_api_key: get(ENV_OPENAI_API_KEY),
            openai_base_url: get(ENV_OPENAI_BASE_URL).unwrap_or(defaults.openai_base_url),
            openai_vision_model: get(ENV_OPENAI_VISION_MODEL)
                .unwrap_or(defaults.openai_vision_model),
            provider_timeout_secs: match get(ENV_PROVIDER_TIMEOUT_SECS) {
                Some(v) => parse_bounded(ENV_PROVIDER_TIMEOUT_SECS, &v, 1, 600)?,
                None => defaults.provider_timeout_secs,
            },
            render_dpi: match get(ENV_RENDER_DPI) {
                Some(v) => parse_bounded(ENV_RENDER_DPI, &v, 72, MAX_RENDER_DPI as u64)? as u32,
                None => defaults.render_dpi,
            },
            page_workers: match get(ENV_PAGE_WORKERS) {
                Some(v) => parse_bounded(ENV_PAGE_WORKERS, &v, 1, MAX_PAGE_WORKERS)? as usize,
                None => defaults.page_workers,
            },
            section_catalog_path: get(ENV_SECTION_CATALOG).map(PathBuf::from),
            dump_dir: get(ENV_DUMP_DIR).map(PathBuf::from),
        })
    }
}

fn parse_bounded(var: &'static str, value: &str, min: u64, max: u64) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason,
    };
    let parsed: u64 = value.parse().map_err(|e| invalid(format!("{e}")))?;
    if !(min..=max).contains(&parsed) {
        return Err(invalid(format!("expected {min}..={max}")));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.google_vision_api_key.is_none());
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.openai_vision_model, "gpt-4o");
        assert_eq!(config.provider_timeout_secs, 60);
        assert_eq!(config.render_dpi, 300);
        assert_eq!(config.page_workers, 4);
        assert!(config.dump_dir.is_none());
    }

    #[test]
    fn reads_every_variable() {
        let config = PipelineConfig::from_lookup(lookup(&[
            (ENV_GOOGLE_VISION_API_KEY, "g-key"),
            (ENV_OPENAI_API_KEY, " sk-test "),
            (ENV_OPENAI_BASE_URL, "http://localhost:8080/v1"),
            (ENV_OPENAI_VISION_MODEL, "gpt-4.1-mini"),
            (ENV_PROVIDER_TIMEOUT_SECS, "15"),
            (ENV_RENDER_DPI, "200"),
            (ENV_PAGE_WORKERS, "8"),
            (ENV_SECTION_CATALOG, "/etc/lease/catalog.json"),
            (ENV_DUMP_DIR, "/tmp/dumps"),
        ]))
        .unwrap();
        assert_eq!(config.google_vision_api_key.as_deref(), Some("g-key"));
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai_base_url, "http://localhost:8080/v1");
        assert_eq!(config.openai_vision_model, "gpt-4.1-mini");
        assert_eq!(config.provider_timeout_secs, 15);
        assert_eq!(config.render_dpi, 200);
        assert_eq!(config.page_workers, 8);
        assert_eq!(
            config.section_catalog_path,
            Some(PathBuf::from("/etc/lease/catalog.json"))
        );
        assert_eq!(config.dump_dir, Some(PathBuf::from("/tmp/dumps")));
    }

    #[test]
    fn blank_key_counts_as_unset() {
        let config =
            PipelineConfig::from_lookup(lookup(&[(ENV_GOOGLE_VISION_API_KEY, "   ")])).unwrap();
        assert!(config.google_vision_api_key.is_none());
    }

    #[test]
    fn invalid_numbers_rejected() {
        let err = PipelineConfig::from_lookup(lookup(&[(ENV_PROVIDER_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == ENV_PROVIDER_TIMEOUT_SECS));

        assert!(PipelineConfig::from_lookup(lookup(&[(ENV_RENDER_DPI, "5000")])).is_err());
        assert!(PipelineConfig::from_lookup(lookup(&[(ENV_PAGE_WORKERS, "0")])).is_err());
        assert!(PipelineConfig::from_lookup(lookup(&[(ENV_PROVIDER_TIMEOUT_SECS, "0")])).is_err());
    }

    #[test]
    fn keys_never_serialized() {
        let config = PipelineConfig {
            openai_api_key: Some("sk-secret".into()),
            ..PipelineConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn app_name_and_version() {
        assert_eq!(APP_NAME, "lease-ingest");
        assert_eq!(APP_VERSION, "0.3.0");
    }
}
