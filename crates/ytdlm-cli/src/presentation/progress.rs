//! Per-job progress bars driven by download events.

use std::collections::HashMap;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use ytdlm_core::{DownloadEvent, DownloadStatus, Job, JobId};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos:>3}% {msg}";

/// One bar per job, created on `JobAdded` and finished on the terminal event.
pub struct JobBars {
    multi: MultiProgress,
    bars: HashMap<JobId, ProgressBar>,
}

impl JobBars {
    #[must_use]
    pub fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            bars: HashMap::new(),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }

    fn bar_for(&mut self, job: &Job) -> ProgressBar {
        self.bars
            .entry(job.id)
            .or_insert_with(|| {
                let bar = self.multi.add(ProgressBar::new(100));
                bar.set_style(Self::style());
                bar
            })
            .clone()
    }

    /// Reflect one event in the bars.
    pub fn on_event(&mut self, event: &DownloadEvent) {
        let job = event.job();
        let bar = self.bar_for(job);
        if bar.is_finished() {
            return;
        }

        match event {
            DownloadEvent::JobAdded { .. } => bar.set_message(format!("{} (queued)", job.title)),
            DownloadEvent::JobUpdated { .. } => match job.status() {
                DownloadStatus::Cancelled => {
                    bar.abandon_with_message(format!("{} (cancelled)", job.title));
                }
                _ => {
                    bar.set_position(percent_position(job.progress()));
                    bar.set_message(status_line(job));
                }
            },
            DownloadEvent::JobCompleted { .. } => {
                bar.set_position(100);
                bar.finish_with_message(format!("✓ {}", job.title));
            }
            DownloadEvent::JobFailed { .. } => {
                let error = job.error.as_deref().unwrap_or("unknown error");
                bar.abandon_with_message(format!("✗ {}: {error}", job.title));
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent_position(progress: f64) -> u64 {
    progress.clamp(0.0, 100.0).round() as u64
}

/// Title plus speed and ETA when known.
#[must_use]
pub fn status_line(job: &Job) -> String {
    let mut line = job.title.clone();
    if let Some(speed) = job.speed_bps {
        line.push_str(&format!("  {}", format_speed(speed)));
    }
    if let Some(eta) = job.eta_seconds {
        line.push_str(&format!("  ETA {}", format_duration(eta)));
    }
    line
}

/// Human rate such as `1.2 MiB/s`.
#[must_use]
pub fn format_speed(bytes_per_sec: f64) -> String {
    const UNITS: [&str; 4] = ["B/s", "KiB/s", "MiB/s", "GiB/s"];
    let mut value = bytes_per_sec.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value:.0} {}", UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// `m:ss`, or `h:mm:ss` from one hour up.
#[must_use]
pub fn format_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
