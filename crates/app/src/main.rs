use anyhow::Context;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use summa_import::CanonicalNameMap;
use summa_queue::{spawn_drain_loop, SubmissionQueue, SubmitterId};
use summa_report::{breakdown, ChromiumRenderer, ReportPipeline};

mod config;
mod intake;
mod outbox;

use config::AppConfig;
use outbox::OutboxNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config_path = std::env::var("SUMMA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("summa.toml"));
    let config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    for dir in [
        &config.dirs.intake,
        &config.dirs.downloads,
        &config.dirs.reports,
        &config.dirs.outbox,
    ] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    // A missing browser is an environment misconfiguration, checked before
    // any work is accepted.
    let executable = resolve_browser(config.report.chromium_executable.clone())
        .context("rendering engine unavailable")?;
    tracing::info!(browser = %executable.display(), "rendering engine resolved");

    if !config.report.title_page.exists() {
        tracing::warn!(
            title_page = %config.report.title_page.display(),
            "title page asset missing, report assembly will fail until it exists"
        );
    }

    let names = CanonicalNameMap::from_rules(config.canonical.rules.clone())
        .context("invalid canonicalization rules")?;
    let threshold = Decimal::from_f64(config.report.share_threshold)
        .unwrap_or_else(breakdown::default_threshold);

    let renderer =
        ChromiumRenderer::new(executable, Duration::from_secs(config.report.settle_secs));
    let pipeline = ReportPipeline::new(
        renderer,
        names,
        threshold,
        &config.report.title_page,
        &config.dirs.reports,
    );

    let allowed: HashSet<SubmitterId> = config
        .submitters
        .allowed
        .iter()
        .copied()
        .map(SubmitterId)
        .collect();
    if allowed.is_empty() {
        tracing::warn!("allowed submitter list is empty — every upload will be rejected");
    }

    let notifier = OutboxNotifier::new(&config.dirs.outbox);
    let queue = Arc::new(SubmissionQueue::new(pipeline, notifier, allowed));

    // ── Intake front door ─────────────────────────────────────────────────────
    // The channel bridges the notify watcher thread and the async submitter.
    let (intake_tx, intake_rx) = mpsc::channel::<PathBuf>(64);
    let _watcher = intake::spawn_intake_watcher(&config.dirs.intake, intake_tx)
        .context("failed to start intake watcher")?;
    tokio::spawn(intake::run_intake(
        queue.clone(),
        intake_rx,
        config.dirs.downloads.clone(),
    ));
    tracing::info!(intake = %config.dirs.intake.display(), "watching intake folder");

    // ── Drain loop ────────────────────────────────────────────────────────────
    let drain = spawn_drain_loop(
        queue,
        Duration::from_secs(config.queue.poll_interval_secs),
    );
    tracing::info!(
        interval_secs = config.queue.poll_interval_secs,
        "submission queue running"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    drain.abort();
    Ok(())
}

fn resolve_browser(configured: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match configured {
        Some(path) => {
            if path.exists() {
                Ok(path)
            } else {
                anyhow::bail!("configured browser executable not found: {}", path.display())
            }
        }
        None => Ok(ChromiumRenderer::default_executable()?),
    }
}
