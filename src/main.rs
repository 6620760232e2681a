use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use lingobatch::config::{Config, Provider};
use lingobatch::interactive::{run_language_switcher, settle, SAMPLE_LABELS};
use lingobatch::language::{Language, LanguagePair};
use lingobatch::translate::create_translator;
use lingobatch::{EngineOptions, TranslationEngine};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "lingobatch")]
#[command(version, about = "Batch-translate UI labels through a debounced cache")]
struct Cli {
    /// Texts to translate (defaults to a couple of sample labels)
    texts: Vec<String>,

    /// Source language code (e.g., en, ja, es)
    #[arg(short, long)]
    source: Option<String>,

    /// Target language code (e.g., es, fr, de)
    #[arg(short, long)]
    target: Option<String>,

    /// Translation provider: deepl, gemini
    #[arg(short, long)]
    provider: Option<String>,

    /// Quiet period before a batch is sent, in milliseconds
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Show the labels on a screen with a language switch
    #[arg(short, long)]
    interactive: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn parse_language(code: &str) -> Result<Language> {
    code.parse().map_err(|e: String| anyhow::anyhow!(e))
}

/// Command-line flags take precedence over the config file and environment.
fn apply_cli(config: &mut Config, cli: &Cli) -> Result<()> {
    if let Some(ref source) = cli.source {
        config.source_language = parse_language(source)?;
    }
    if let Some(ref target) = cli.target {
        config.target_language = parse_language(target)?;
    }
    if let Some(ref provider) = cli.provider {
        config.provider = provider
            .parse::<Provider>()
            .map_err(|e: String| anyhow::anyhow!(e))?;
    }
    if let Some(ms) = cli.debounce_ms {
        config.debounce_ms = ms;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    apply_cli(&mut config, &cli)?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let translator = create_translator(&config).context("Failed to create translator")?;
    let pair = config.language_pair();
    let engine = TranslationEngine::with_options(
        Arc::from(translator),
        pair,
        EngineOptions::from(&config),
    )?;

    let labels: Vec<String> = if cli.texts.is_empty() {
        SAMPLE_LABELS.iter().map(|s| s.to_string()).collect()
    } else {
        cli.texts.clone()
    };

    info!("Provider: {}", config.provider);
    info!("Languages: {}", pair);

    if cli.interactive {
        // Start on the source language, like an app that has not been switched yet.
        engine.set_language_pair(LanguagePair::new(pair.source, pair.source));
        return run_language_switcher(&engine, &labels, pair.source, pair.target).await;
    }

    for label in &labels {
        engine.request(label);
    }
    settle(&engine, true).await;

    for label in &labels {
        let translated = engine.lookup(label);
        if translated == *label && !pair.is_identity() {
            println!("{} {} (untranslated)", style("!").yellow(), label);
        } else {
            println!("{} → {}", label, style(translated).green());
        }
    }

    let stats = engine.stats();
    info!(
        "{} batch(es) sent, {} failed, {} text(s) cached",
        stats.dispatches, stats.failed_dispatches, stats.cached
    );

    Ok(())
}
