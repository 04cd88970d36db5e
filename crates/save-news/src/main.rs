use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use shared::config::GLOBAL_GUIDANCE;
use shared::{
    ClaudeClient, Config, GNewsClient, LlmJudge, OutputPaths, PipelineRunner, PipelineSettings,
    RunMode, TracingSink,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Collect each configured category with its own quota
    PerCategory,
    /// Rank one pool of top headlines
    Global,
}

impl From<Mode> for RunMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::PerCategory => RunMode::PerCategory,
            Mode::Global => RunMode::Global,
        }
    }
}

#[derive(Parser)]
#[command(name = "save-news")]
#[command(about = "Fetch, filter, deduplicate and rank today's headlines into a cached selection")]
struct Args {
    /// Where to write the selected articles
    #[arg(short, long, default_value = "cached_articles.json")]
    output: PathBuf,

    /// Also write every fetched candidate, before filtering, to this file
    #[arg(long)]
    raw_log: Option<PathBuf>,

    /// Selection strategy
    #[arg(short, long, value_enum, default_value_t = Mode::PerCategory)]
    mode: Mode,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = Config::from_env()?;
    let settings = PipelineSettings::default();
    let mode = RunMode::from(args.mode);

    let source = GNewsClient::new(config.gnews_api_key, &settings.language, &settings.country)?;
    let model = ClaudeClient::new(config.anthropic_api_key, config.model)?;
    let judge = match mode {
        RunMode::Global => LlmJudge::new(model).with_guidance(GLOBAL_GUIDANCE),
        RunMode::PerCategory => LlmJudge::new(model),
    };
    let events = TracingSink;

    let paths = OutputPaths {
        selection: args.output,
        raw_log: args.raw_log,
    };

    match mode {
        RunMode::PerCategory => println!(
            "📡 Collecting {} categories from GNews...",
            settings.categories.len()
        ),
        RunMode::Global => println!(
            "📡 Fetching {} top headlines from GNews...",
            settings.global_fetch_size
        ),
    }

    let runner = PipelineRunner::new(&source, &judge, &events, &settings);
    let report = runner
        .run(mode, &paths)
        .await
        .context("News pipeline failed")?;

    for category in &report.categories {
        println!(
            "  {:<12} {} selected ({} attempt{})",
            category.name,
            category.selected,
            category.attempts,
            if category.attempts == 1 { "" } else { "s" }
        );
    }

    if let Some(raw) = &report.raw_log {
        println!("✓ Raw candidates ({}) saved to: {}", report.raw_candidates, raw.display());
    }

    match &report.written {
        Some(path) => {
            if report.selected.is_empty() {
                println!("\n⚠ No articles survived filtering and ranking");
            }
            println!(
                "\n✅ Saved {} articles to {}",
                report.selected.len(),
                path.display()
            );
        }
        None if report.raw_candidates == 0 => {
            println!(
                "\n⚠ No articles could be fetched; {} left unchanged",
                paths.selection.display()
            );
        }
        None => {
            println!(
                "\n⚠ None of the {} headlines came from a trusted source; {} left unchanged",
                report.raw_candidates,
                paths.selection.display()
            );
        }
    }

    Ok(())
}
