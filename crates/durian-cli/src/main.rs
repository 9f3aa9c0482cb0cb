//! `durian` command-line interface.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use durian_core::{
    classification_from_ssense, AnalysisRecord, CampaignFallbackPolicy, CampaignResult,
    FallbackReason, RawClassification,
};
use durian_runtime::{AnalysisPipeline, GeminiProvider, RuntimeConfig, SsenseClient};

#[derive(Parser)]
#[command(name = "durian", author, version, about = "Sentiment fusion and campaign copy for Thai durian reviews")]
struct Cli {
    /// Configuration file (.yaml, .yml or .json)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one review
    Analyze {
        /// Review text; read from stdin when omitted
        text: Option<String>,

        /// Primary classification as JSON (classification or raw SSense
        /// response); fetched from SSense when omitted
        #[arg(long, value_name = "FILE")]
        primary: Option<PathBuf>,

        /// Skip the generative judge
        #[arg(long)]
        no_judge: bool,

        /// Print the full record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print fallback campaign content
    Fallback {
        #[arg(long, value_enum, default_value_t = FallbackKind::Unavailable)]
        reason: FallbackKind,

        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as YAML
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum FallbackKind {
    Unparseable,
    Unavailable,
}

impl From<FallbackKind> for FallbackReason {
    fn from(kind: FallbackKind) -> Self {
        match kind {
            FallbackKind::Unparseable => FallbackReason::Unparseable,
            FallbackKind::Unavailable => FallbackReason::Unavailable,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(path = ?cli.config, threshold = config.confidence_threshold, "Configuration loaded");

    match cli.command {
        Command::Analyze {
            text,
            primary,
            no_judge,
            json,
        } => analyze(&config, text, primary.as_deref(), no_judge, json).await,
        Command::Fallback { reason, json } => {
            let content = CampaignFallbackPolicy::content(reason.into());
            if json {
                println!("{}", serde_json::to_string_pretty(&content)?);
            } else {
                print_campaign(&content);
            }
            Ok(())
        }
        Command::Config => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

async fn analyze(
    config: &RuntimeConfig,
    text: Option<String>,
    primary: Option<&Path>,
    no_judge: bool,
    json: bool,
) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read review text from stdin")?;
            buf
        }
    };
    if text.trim().is_empty() {
        bail!("No review text given");
    }

    let provider = Arc::new(GeminiProvider::from_settings(&config.gemini));
    let mut builder = AnalysisPipeline::builder(provider).config(config.clone());
    if no_judge {
        builder = builder.judge_enabled(false);
    }
    let pipeline = builder.build();

    let record = match primary {
        Some(path) => {
            let classification = read_primary(path)?;
            pipeline.analyze(&text, classification).await?
        }
        None => {
            let classifier = SsenseClient::from_settings(&config.ssense)
                .context("No --primary file given and SSense is not configured")?;
            pipeline.analyze_with_classifier(&text, &classifier).await?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }
    Ok(())
}

/// Accepts either a serialized classification or a raw SSense response.
fn read_primary(path: &Path) -> Result<RawClassification> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    match serde_json::from_value::<RawClassification>(value.clone()) {
        Ok(raw) => Ok(RawClassification::new(raw.polarity, raw.score, raw.keywords)),
        Err(_) => Ok(classification_from_ssense(&value)),
    }
}

fn print_record(record: &AnalysisRecord) {
    println!("Sentiment: {} ({})", record.sentiment_label, record.sentiment.polarity);
    println!("Score:     {:.0}", record.sentiment.score);
    if let Some(judge) = &record.judge {
        println!(
            "Judge:     {} @ {:.2}{}",
            judge.label,
            judge.confidence,
            if record.overridden() { " (override)" } else { "" }
        );
        if !judge.reason.is_empty() {
            println!("Reason:    {}", judge.reason);
        }
    }

    let keywords = record.sentiment.keywords.truncated(10);
    for (name, bucket) in [("pos", &keywords.pos), ("neg", &keywords.neg), ("keyword", &keywords.keyword)] {
        if !bucket.is_empty() {
            println!("{:<10} {}", format!("{}:", name), bucket.join(", "));
        }
    }

    println!();
    print_campaign(&record.campaign);
}

fn print_campaign(campaign: &CampaignResult) {
    println!("Campaign:");
    for tagline in &campaign.taglines {
        println!("  - {}", tagline);
    }
    println!("  {}", campaign.idea);
}
