//! Download handler.
//!
//! Submits every URL to a download manager, renders one progress bar per
//! job, and waits until all of them finish. Ctrl+C cancels everything.

use std::sync::Arc;

use anyhow::{Result, bail};
use indicatif::MultiProgress;
use tokio::sync::broadcast::error::RecvError;

use ytdlm_core::paths::ensure_directory;
use ytdlm_core::utils::url::is_valid_url;
use ytdlm_download::{
    BroadcastDownloadEmitter, DownloadEvent, DownloadManagerDeps, DownloadManagerImpl, DownloadManagerPort,
    DownloadRequest, DownloadStatus, JobId, build_download_manager,
};
use ytdlm_runtime::YtDlp;

use crate::bootstrap::CliContext;
use crate::commands::DownloadArgs;
use crate::presentation::JobBars;

/// Final tally of a download run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl DownloadSummary {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

/// Execute the download command.
pub async fn execute(
    ctx: &CliContext,
    args: &DownloadArgs,
    progress: &MultiProgress,
) -> Result<DownloadSummary> {
    if let Some(bad) = args.urls.iter().find(|url| !is_valid_url(url)) {
        bail!("Not a valid http(s) URL: {bad}");
    }

    let mut config = ctx.manager_config()?;
    if let Some(output) = &args.output {
        config = config.with_output_dir(output);
    }
    if let Some(jobs) = args.jobs {
        config = config.with_max_concurrent(jobs);
    }
    ensure_directory(&config.default_output_dir)?;
    let options = args.apply_to(config.default_options.clone());
    let probe = (!args.no_probe && !options.is_playlist).then(|| YtDlp::new(&config.downloader_path));

    let emitter = BroadcastDownloadEmitter::with_defaults();
    let mut events = emitter.subscribe();
    let manager = Arc::new(build_download_manager(DownloadManagerDeps {
        event_emitter: Arc::new(emitter),
        config,
    }));
    let mut bars = JobBars::new(progress.clone());

    let mut ids = Vec::with_capacity(args.urls.len());
    for url in &args.urls {
        let mut request = DownloadRequest::new(url.as_str()).with_options(options.clone());
        if let Some(ytdlp) = &probe {
            match ytdlp.probe(url).await {
                Ok(info) => {
                    request = request.with_title(info.title.clone());
                    if let Some(thumb) = info.thumbnail_url() {
                        request = request.with_thumbnail(thumb);
                    }
                }
                Err(e) => tracing::warn!(url = %url, error = %e, "Could not fetch title"),
            }
        }
        ids.push(Arc::clone(&manager).submit(request).await?);
    }

    let mut interrupted = false;
    while !all_finished(&manager, &ids) {
        tokio::select! {
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                if signal.is_ok() {
                    interrupted = true;
                    let count = manager.cancel_all().await;
                    tracing::warn!(count, "Interrupted, cancelling downloads");
                }
            }
            event = events.recv() => match event {
                Ok(event) => bars.on_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Progress display fell behind");
                    for job in manager.jobs() {
                        bars.on_event(&DownloadEvent::for_transition(job));
                    }
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    // Late events for jobs that finished between the check and the last recv.
    while let Ok(event) = events.try_recv() {
        bars.on_event(&event);
    }

    let summary = summarize(&manager, &ids);
    println!(
        "{} completed, {} failed, {} cancelled",
        summary.completed, summary.failed, summary.cancelled
    );
    for job in manager.jobs() {
        if let Some(error) = job.error.as_deref() {
            println!("  ✗ {} ({}): {error}", job.title, job.url);
        }
    }
    Ok(summary)
}

fn all_finished(manager: &DownloadManagerImpl, ids: &[JobId]) -> bool {
    ids.iter()
        .all(|id| manager.get(*id).is_none_or(|job| job.is_terminal()))
}

fn summarize(manager: &DownloadManagerImpl, ids: &[JobId]) -> DownloadSummary {
    let mut summary = DownloadSummary::default();
    for job in ids.iter().filter_map(|id| manager.get(*id)) {
        match job.status() {
            DownloadStatus::Completed => summary.completed += 1,
            DownloadStatus::Failed => summary.failed += 1,
            DownloadStatus::Cancelled => summary.cancelled += 1,
            DownloadStatus::Pending | DownloadStatus::Downloading => {}
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_success() {
        assert!(DownloadSummary { completed: 3, ..Default::default() }.is_success());
        assert!(!DownloadSummary { completed: 2, failed: 1, cancelled: 0 }.is_success());
        assert!(!DownloadSummary { cancelled: 1, ..Default::default() }.is_success());
    }
}
