use crate::engine::{EngineState, TranslationEngine};
use crate::language::{Language, LanguagePair};
use console::style;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Labels rendered by the demo screen when none are given on the command line.
pub const SAMPLE_LABELS: &[&str] = &[
    "Open up the app to start working on it!",
    "Some other text",
];

/// Wait until nothing is queued and no batch is in flight.
///
/// Shows a spinner while waiting when `show_progress` is set.
pub async fn settle(engine: &TranslationEngine, show_progress: bool) {
    let spinner = show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Translating...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let mut busy = engine.subscribe_busy();
    loop {
        match engine.state() {
            EngineState::Idle => break,
            EngineState::Queued => {
                let wait = engine.time_until_flush().unwrap_or_default();
                tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
            }
            EngineState::Dispatching => {
                if busy.wait_for(|b| !*b).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
}

/// Language the "switch" button moves to from `current`.
pub fn next_target(current: Language, source: Language, target: Language) -> Language {
    if current == target {
        source
    } else {
        target
    }
}

/// Demo screen: renders `labels` through the engine and lets the user flip
/// the target language back and forth between `source` and `target`.
pub async fn run_language_switcher(
    engine: &TranslationEngine,
    labels: &[String],
    source: Language,
    target: Language,
) -> anyhow::Result<()> {
    print_header();

    loop {
        for label in labels {
            engine.request(label);
        }
        settle(engine, true).await;
        print_labels(engine, labels);

        let next = next_target(engine.language_pair().target, source, target);
        let choices = vec![
            format!("Switch to {}", next.name()),
            "Refresh".to_string(),
            "Quit".to_string(),
        ];

        let selection = tokio::task::spawn_blocking(move || {
            Select::new()
                .with_prompt("What next?")
                .items(&choices)
                .default(0)
                .interact()
        })
        .await??;

        match selection {
            0 => engine.set_language_pair(LanguagePair::new(source, next)),
            1 => continue,
            _ => break,
        }
    }

    Ok(())
}

fn print_header() {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║        lingobatch - live UI translation demo      ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
}

fn print_labels(engine: &TranslationEngine, labels: &[String]) {
    let pair = engine.language_pair();
    println!();
    println!(
        "{} {}",
        style("Showing:").bold(),
        style(pair.target.name()).cyan()
    );

    for label in labels {
        let shown = engine.lookup(label);
        let marker = if pair.is_identity() || shown != *label {
            style("✓").green()
        } else {
            style("·").yellow()
        };
        println!("  {} {}", marker, shown);
    }
    println!();
}
