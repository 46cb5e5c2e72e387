use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use lease_ingest::config::{self, PipelineConfig};
use lease_ingest::pipeline::extraction::Document;
use lease_ingest::pipeline::{LeaseProcessor, ProcessingRequest};

#[derive(Parser, Debug)]
#[command(name = "lease-ingest", author, version, about)]
struct Cli {
    /// Lease document: PDF or image (JPEG, PNG, TIFF, ...)
    file: PathBuf,

    /// Declared MIME type; guessed from the file extension when omitted
    #[arg(long)]
    mime: Option<String>,

    /// Pre-computed text quality score (0.0-1.0); skips the quality assessor
    #[arg(long)]
    quality_score: Option<f32>,

    /// Treat FILE as already recognized plain text and only run the parser
    #[arg(long)]
    text: bool,

    /// Single-line JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    lease_ingest::init_tracing();
    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    if let Some(score) = cli.quality_score {
        if !(0.0..=1.0).contains(&score) {
            bail!("--quality-score must be between 0.0 and 1.0, got {score}");
        }
    }

    let config = PipelineConfig::from_env()?;
    let processor = LeaseProcessor::from_config(&config)?;

    let file_name = cli
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.display().to_string());

    let json = if cli.text {
        let text = std::fs::read_to_string(&cli.file)
            .with_context(|| format!("reading {}", cli.file.display()))?;
        let (quality, record) = processor.structure_text(&text, &file_name, cli.quality_score);
        render(&serde_json::json!({ "quality": quality, "record": record }), cli.compact)?
    } else {
        let bytes = std::fs::read(&cli.file)
            .with_context(|| format!("reading {}", cli.file.display()))?;
        let mime = cli.mime.clone().unwrap_or_else(|| {
            mime_guess::from_path(&cli.file)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

        let mut request = ProcessingRequest::new(Document::new(bytes, mime), file_name);
        if let Some(score) = cli.quality_score {
            request = request.with_quality_score(score);
        }

        let outcome = processor
            .process(&request)
            .with_context(|| format!("processing {}", cli.file.display()))?;
        render(&outcome, cli.compact)?
    };

    println!("{json}");
    Ok(())
}

fn render<T: serde::Serialize>(value: &T, compact: bool) -> Result<String> {
    Ok(if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "lease-ingest",
            "lease.pdf",
            "--mime",
            "application/pdf",
            "--quality-score",
            "0.7",
            "--compact",
        ])
        .unwrap();
        assert_eq!(cli.file, PathBuf::from("lease.pdf"));
        assert_eq!(cli.mime.as_deref(), Some("application/pdf"));
        assert_eq!(cli.quality_score, Some(0.7));
        assert!(cli.compact && !cli.text);
    }

    #[test]
    fn one_shot_cli_has_no_cache_flag() {
        assert!(Cli::try_parse_from(["lease-ingest", "lease.pdf", "--force"]).is_err());
    }

    #[test]
    fn file_is_required() {
        assert!(Cli::try_parse_from(["lease-ingest"]).is_err());
    }
}
