//! Newsroom 命令行入口
//!
//! 加载配置 -> 命令行覆盖 -> 组装请求 -> 运行流水线 -> 文档写到 stdout。
//! 任何错误写到 stderr 并以状态码 1 退出。

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use serde_json::json;

use newsroom::config::{load_config, AppConfig};
use newsroom::core::{run_newspaper, ShutdownManager};
use newsroom::newspaper::Depth;
use newsroom::{observability, ContentRequest, Document};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// Generate a multi-section news report with an LLM assistant.
#[derive(Debug, Parser)]
#[command(name = "newsroom", version, about)]
struct Cli {
    /// Extra config file layered over config/default.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Assistant provider: deepseek, openai or mock
    #[arg(long)]
    provider: Option<String>,

    /// Number of days back from today to cover
    #[arg(long, conflicts_with = "date_range")]
    days_back: Option<u32>,

    /// Explicit inclusive date range, e.g. 2025-01-02..2025-01-05
    #[arg(long, value_parser = parse_date_range)]
    date_range: Option<(NaiveDate, NaiveDate)>,

    /// Location used for the local news section
    #[arg(long)]
    location: Option<String>,

    /// Research depth and article count: short, medium or long
    #[arg(long = "length")]
    depth: Option<Depth>,

    /// Byte budget for the whole document
    #[arg(long)]
    max_length: Option<usize>,

    /// Seed for the editor's random fallback
    #[arg(long)]
    seed: Option<u64>,

    /// Generate a single section with this title
    #[arg(long, requires = "section_description")]
    section_title: Option<String>,

    /// Description of the single section
    #[arg(long, requires = "section_title")]
    section_description: Option<String>,

    /// Run the per-article neutral edit stage
    #[arg(long)]
    polish: bool,

    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

fn parse_date_range(raw: &str) -> Result<(NaiveDate, NaiveDate), String> {
    let (start, end) = raw
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got '{}'", raw))?;
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("'{}': {}", s, e))
    };
    Ok((parse(start)?, parse(end)?))
}

impl Cli {
    /// 命令行参数覆盖配置
    fn apply(&self, cfg: &mut AppConfig) {
        if let Some(provider) = &self.provider {
            cfg.llm.provider = provider.clone();
        }
        if let Some(days) = self.days_back {
            cfg.newspaper.days_back = days;
        }
        if let Some(location) = &self.location {
            cfg.newspaper.location = location.clone();
        }
        if let Some(depth) = self.depth {
            cfg.newspaper.depth = depth;
        }
        if let Some(max_length) = self.max_length {
            cfg.newspaper.max_length = max_length;
        }
        if self.seed.is_some() {
            cfg.newspaper.seed = self.seed;
        }
        if self.polish {
            cfg.pipeline.polish = true;
        }
    }

    fn request(&self, cfg: &AppConfig) -> ContentRequest {
        let mut request = ContentRequest::default()
            .with("location", cfg.newspaper.location.clone())
            .with("max_length", cfg.newspaper.max_length)
            .with("depth", cfg.newspaper.depth.as_str());

        request = match self.date_range {
            Some((start, end)) => request.with(
                "date_range",
                json!({ "start": start.to_string(), "end": end.to_string() }),
            ),
            None => request.with("days_back", cfg.newspaper.days_back),
        };

        if let (Some(title), Some(description)) = (&self.section_title, &self.section_description) {
            request = request
                .with("section_title", title.clone())
                .with("section_description", description.clone());
        }
        request
    }
}

fn render(doc: &Document, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(doc).context("Failed to serialize document"),
        OutputFormat::Text => Ok(doc.render_text()),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut cfg = load_config(cli.config.clone()).context("Failed to load config")?;
    cli.apply(&mut cfg);

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    let request = cli.request(&cfg);
    let doc = match run_newspaper(&cfg, &request, shutdown.token()).await {
        Ok(doc) => doc,
        Err(err) => {
            if let Some(reason) = shutdown.reason() {
                tracing::warn!(%reason, "run stopped by shutdown signal");
            }
            return Err(err);
        }
    };
    println!("{}", render(&doc, cli.format)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    observability::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
