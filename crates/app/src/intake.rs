use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use summa_queue::{ReportGenerator, SubmissionQueue, SubmitterId, SubmitterNotifier};

/// Spawn a notify watcher on `watch_dir` that sends new file paths to `tx`.
/// Returns the watcher — it must be kept alive for watching to continue.
pub fn spawn_intake_watcher(
    watch_dir: &Path,
    tx: mpsc::Sender<PathBuf>,
) -> notify::Result<impl notify::Watcher> {
    use notify::{EventKind, RecursiveMode, Watcher};

    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        if let Ok(ev) = event {
            if matches!(ev.kind, EventKind::Create(_)) {
                for path in ev.paths {
                    let _ = tx.try_send(path);
                }
            }
        }
    })?;

    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Parses the intake naming convention `{submitter_id}_{original_name}`.
pub fn parse_submission(path: &Path) -> Option<(SubmitterId, String)> {
    let name = path.file_name()?.to_str()?;
    let (id, rest) = name.split_once('_')?;
    let id: i64 = id.parse().ok()?;
    if rest.is_empty() {
        return None;
    }
    Some((SubmitterId(id), name.to_string()))
}

fn is_spreadsheet(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()).as_deref(),
        Some("xlsx") | Some("xls") | Some("csv")
    )
}

/// Drains the watcher channel: each intake file is copied into the
/// downloads directory (the job's local source) and submitted. Rejected
/// uploads are logged and their working copy removed.
pub async fn run_intake<G, N>(
    queue: Arc<SubmissionQueue<G, N>>,
    mut rx: mpsc::Receiver<PathBuf>,
    downloads: PathBuf,
) where
    G: ReportGenerator,
    N: SubmitterNotifier,
{
    while let Some(path) = rx.recv().await {
        if !is_spreadsheet(&path) {
            tracing::info!(file = %path.display(), "ignoring non-spreadsheet intake file");
            continue;
        }
        let Some((submitter, name)) = parse_submission(&path) else {
            tracing::warn!(file = %path.display(), "intake file has no submitter prefix");
            continue;
        };

        let source = downloads.join(&name);
        if let Err(err) = tokio::fs::copy(&path, &source).await {
            tracing::error!(file = %path.display(), %err, "failed to copy intake file");
            continue;
        }
        let _ = tokio::fs::remove_file(&path).await;

        match queue.submit(source.clone(), submitter).await {
            Ok(position) => {
                tracing::info!(%submitter, file = name, position, "upload accepted");
            }
            Err(err) => {
                tracing::warn!(%submitter, file = name, %err, "upload rejected");
                let _ = tokio::fs::remove_file(&source).await;
            }
        }
    }
}
