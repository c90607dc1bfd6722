//! Download manager implementation.
//!
//! Concrete implementation of `DownloadManagerPort`: a job registry, an
//! admission gate, and one tokio task per submitted job.
//!
//! # Architecture
//!
//! - **Manager**: owns the registry and the active-process table, emits events
//! - **Gate**: resizable FIFO semaphore bounding running downloads
//! - **Worker**: runs one downloader process and reports through an observer
//!
//! # Concurrency Model
//!
//! - `submit` registers the job and queues an admission ticket before it
//!   returns; a single dispatcher takes tickets in order, waits for a slot,
//!   then spawns the job task, so slots are granted in submission order
//! - Both tables sit behind `std::sync::Mutex`, never held across `.await`
//!   and never held together
//! - An `ActiveJob` owns its admission permit, so removing the entry is what
//!   frees the slot
//! - Events are emitted after the lock that produced them is released

mod gate;
mod worker;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Instant;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use ytdlm_core::{
    DownloadError, DownloadEvent, DownloadEventEmitterPort, DownloadManagerConfig,
    DownloadManagerPort, DownloadRequest, DownloadStatus, Job, JobId, ProgressSample,
};
use ytdlm_runtime::OutputLine;

use crate::args::ArgumentBuilder;
use crate::progress::{ProgressThrottle, parse_destination, title_from_path};

pub use gate::{AdmissionGate, AdmissionPermit};
pub use worker::{JobRunner, RunObserver, RunOutcome};

/// Registry entry: the job record plus the token its task listens to.
struct JobEntry {
    job: Job,
    cancel: CancellationToken,
}

/// A submitted job waiting its turn at the gate.
///
/// Carries its own copy of the job so it still runs after `remove`.
struct Ticket {
    job: Job,
    cancel: CancellationToken,
}

/// State for a job whose runner is active.
struct ActiveJob {
    cancel: CancellationToken,
    /// OS process id, once spawned.
    pid: Option<u32>,
    /// Set once the runner has returned; cancelling is then too late.
    finished: bool,
    /// Released when this entry is dropped.
    _permit: AdmissionPermit,
}

/// How a job left the admission queue.
enum Admission {
    Run(Job),
    Cancelled(Job),
    Stale,
}

/// Dependencies for creating a download manager.
pub struct DownloadManagerDeps<E>
where
    E: DownloadEventEmitterPort + 'static,
{
    /// Port for emitting download events.
    pub event_emitter: Arc<E>,
    /// Configuration for the download manager.
    pub config: DownloadManagerConfig,
}

/// Build a download manager from its dependencies.
///
/// Returns an implementation of `DownloadManagerPort` that can be
/// stored as `Arc<dyn DownloadManagerPort>` in adapters.
pub fn build_download_manager<E>(deps: DownloadManagerDeps<E>) -> DownloadManagerImpl
where
    E: DownloadEventEmitterPort + 'static,
{
    DownloadManagerImpl::new(deps.event_emitter, deps.config)
}

/// Concrete implementation of the download manager.
///
/// Adapters should typically hold `Arc<dyn DownloadManagerPort>` rather than
/// this type.
pub struct DownloadManagerImpl {
    config: DownloadManagerConfig,
    args: ArgumentBuilder,
    runner: JobRunner,
    gate: AdmissionGate,
    /// Every known job, in submission order.
    registry: Mutex<IndexMap<JobId, JobEntry>>,
    /// Jobs with a live runner, reachable even after `remove`.
    active: Mutex<HashMap<JobId, ActiveJob>>,
    /// Admission queue, in submission order.
    tickets: mpsc::UnboundedSender<Ticket>,
    /// Taken by the dispatcher on first submit.
    ticket_rx: Mutex<Option<mpsc::UnboundedReceiver<Ticket>>>,
    event_emitter: Arc<dyn DownloadEventEmitterPort>,
}

impl DownloadManagerImpl {
    fn new<E>(event_emitter: Arc<E>, config: DownloadManagerConfig) -> Self
    where
        E: DownloadEventEmitterPort + 'static,
    {
        let (tickets, ticket_rx) = mpsc::unbounded_channel();
        Self {
            args: ArgumentBuilder::new(config.ffmpeg_location.clone()),
            runner: JobRunner::new(config.downloader_path.clone(), config.termination_grace),
            gate: AdmissionGate::new(config.max_concurrent),
            registry: Mutex::new(IndexMap::new()),
            active: Mutex::new(HashMap::new()),
            tickets,
            ticket_rx: Mutex::new(Some(ticket_rx)),
            event_emitter: event_emitter as Arc<dyn DownloadEventEmitterPort>,
            config,
        }
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, IndexMap<JobId, JobEntry>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn active(&self) -> std::sync::MutexGuard<'_, HashMap<JobId, ActiveJob>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: DownloadEvent) {
        tracing::trace!(
            target: "ytdlm.download",
            id = %event.id(),
            event = event.event_type(),
            "Emitting download event"
        );
        self.event_emitter.emit(event);
    }

    /// Copy the runner's working copy into the registry, if still registered.
    fn mirror(&self, job: &Job) {
        if let Some(entry) = self.registry().get_mut(&job.id) {
            entry.job = job.clone();
        }
    }

    /// Start the dispatcher if it isn't running yet.
    fn ensure_dispatcher(self: &Arc<Self>) {
        let rx = self
            .ticket_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(rx) = rx {
            tokio::spawn(dispatch(self.gate.clone(), rx, Arc::downgrade(self)));
        }
    }

    /// Claim the job for its runner, or settle it if it was cancelled in
    /// the queue.
    ///
    /// The active entry goes in first, so while the registry says
    /// Downloading, `cancel` can always find the runner.
    fn admit(&self, ticket: Ticket, permit: AdmissionPermit) -> Admission {
        let Ticket { job: mut detached, cancel } = ticket;
        let id = detached.id;
        self.active().insert(
            id,
            ActiveJob {
                cancel: cancel.clone(),
                pid: None,
                finished: false,
                _permit: permit,
            },
        );

        let admission = {
            let mut registry = self.registry();
            // A removed job still runs, from its own copy.
            let job = match registry.get_mut(&id) {
                Some(entry) => &mut entry.job,
                None => &mut detached,
            };
            if cancel.is_cancelled() {
                if job.transition(DownloadStatus::Cancelled) {
                    Admission::Cancelled(job.clone())
                } else {
                    Admission::Stale
                }
            } else if job.transition(DownloadStatus::Downloading) {
                Admission::Run(job.clone())
            } else {
                Admission::Stale
            }
        };

        if !matches!(admission, Admission::Run(_)) {
            self.active().remove(&id);
        }
        admission
    }

    /// Body of the per-job task, entered holding a slot.
    async fn run_job(self: Arc<Self>, ticket: Ticket, permit: AdmissionPermit) {
        let id = ticket.job.id;
        let cancel = ticket.cancel.clone();
        let job = match self.admit(ticket, permit) {
            Admission::Run(job) => job,
            Admission::Cancelled(job) => {
                tracing::info!(target: "ytdlm.download", id = %id, "Download cancelled before start");
                self.emit(DownloadEvent::for_transition(job));
                return;
            }
            Admission::Stale => {
                tracing::debug!(target: "ytdlm.download", id = %id, "Job no longer pending, releasing slot");
                return;
            }
        };

        tracing::info!(target: "ytdlm.download", id = %id, url = %job.url, "Download started");
        self.emit(DownloadEvent::JobUpdated { job: job.clone() });

        let args = self.args.build(&job);
        let snapshot = job.clone();
        let mut observer = JobObserver {
            manager: self.as_ref(),
            job,
            throttle: ProgressThrottle::default(),
        };
        let outcome = self.runner.run(&snapshot, &args, &cancel, &mut observer).await;
        if let Some(active) = self.active().get_mut(&id) {
            active.finished = true;
        }

        let mut job = observer.job;
        match outcome {
            RunOutcome::Completed => {
                job.transition(DownloadStatus::Completed);
                tracing::info!(target: "ytdlm.download", id = %id, title = %job.title, "Download completed");
            }
            RunOutcome::Failed(e) if e.is_cancellation() => {
                job.transition(DownloadStatus::Cancelled);
                tracing::info!(target: "ytdlm.download", id = %id, "Download cancelled");
            }
            RunOutcome::Failed(e) => {
                job.fail(e.to_string());
                tracing::warn!(target: "ytdlm.download", id = %id, error = %e, "Download failed");
            }
            RunOutcome::Cancelled => {
                job.transition(DownloadStatus::Cancelled);
                tracing::info!(target: "ytdlm.download", id = %id, "Download cancelled");
            }
        }

        self.mirror(&job);
        self.active().remove(&id);
        self.emit(DownloadEvent::for_transition(job));
    }
}

/// Hand out slots strictly in submission order.
///
/// Exits once the manager is gone and the queue has drained.
async fn dispatch(
    gate: AdmissionGate,
    mut tickets: mpsc::UnboundedReceiver<Ticket>,
    manager: Weak<DownloadManagerImpl>,
) {
    while let Some(ticket) = tickets.recv().await {
        let permit = match gate.acquire(&ticket.cancel).await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::debug!(target: "ytdlm.download", id = %ticket.job.id, error = %e, "Left admission queue");
                continue;
            }
        };
        let Some(manager) = manager.upgrade() else {
            break;
        };
        tokio::spawn(manager.run_job(ticket, permit));
    }
}

/// Folds runner callbacks into the working copy of one job.
struct JobObserver<'a> {
    manager: &'a DownloadManagerImpl,
    job: Job,
    throttle: ProgressThrottle,
}

impl RunObserver for JobObserver<'_> {
    fn on_spawn(&mut self, pid: Option<u32>) {
        if let Some(active) = self.manager.active().get_mut(&self.job.id) {
            active.pid = pid;
        }
    }

    fn on_line(&mut self, line: &OutputLine) {
        if !self.job.has_placeholder_title() {
            return;
        }
        let Some(title) = parse_destination(&line.text).and_then(title_from_path) else {
            return;
        };
        if self.job.refine_title(&title) {
            tracing::debug!(target: "ytdlm.download", id = %self.job.id, title = %self.job.title, "Title learned from output");
            self.manager.mirror(&self.job);
            self.manager.emit(DownloadEvent::JobUpdated {
                job: self.job.clone(),
            });
        }
    }

    fn on_progress(&mut self, sample: ProgressSample) {
        if !self.job.apply_progress(&sample) {
            return;
        }
        self.manager.mirror(&self.job);
        if self.throttle.should_emit(Instant::now(), self.job.progress()) {
            self.manager.emit(DownloadEvent::JobUpdated {
                job: self.job.clone(),
            });
        }
    }
}

#[async_trait]
impl DownloadManagerPort for DownloadManagerImpl {
    async fn submit(self: Arc<Self>, request: DownloadRequest) -> Result<JobId, DownloadError> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(DownloadError::invalid_request("URL cannot be empty"));
        }

        let output_dir = request
            .output_dir
            .unwrap_or_else(|| self.config.default_output_dir.clone());
        let options = request
            .options
            .unwrap_or_else(|| self.config.default_options.clone());
        let mut job = Job::new(url, output_dir, options).with_thumbnail(request.thumbnail);
        if let Some(title) = request.title {
            job = job.with_title(title);
        }

        let id = job.id;
        let cancel = CancellationToken::new();
        self.registry().insert(
            id,
            JobEntry {
                job: job.clone(),
                cancel: cancel.clone(),
            },
        );
        tracing::info!(target: "ytdlm.download", id = %id, url = %job.url, "Download queued");
        self.emit(DownloadEvent::JobAdded { job: job.clone() });

        self.ensure_dispatcher();
        if self.tickets.send(Ticket { job, cancel }).is_err() {
            tracing::error!(target: "ytdlm.download", id = %id, "Admission dispatcher stopped");
        }
        Ok(id)
    }

    async fn cancel(&self, id: JobId) -> bool {
        {
            let active = self.active();
            if let Some(job) = active.get(&id) {
                if job.finished {
                    return false;
                }
                job.cancel.cancel();
                tracing::info!(target: "ytdlm.download", id = %id, pid = job.pid, "Cancelling active download");
                return true;
            }
        }

        let cancelled = {
            let mut registry = self.registry();
            let Some(entry) = registry.get_mut(&id) else {
                return false;
            };
            match entry.job.status() {
                DownloadStatus::Pending => {
                    entry.job.transition(DownloadStatus::Cancelled);
                    entry.cancel.cancel();
                    Some(entry.job.clone())
                }
                DownloadStatus::Downloading => {
                    // Admitted between the two lookups; the runner checks the
                    // token before spawning.
                    entry.cancel.cancel();
                    None
                }
                _ => return false,
            }
        };

        if let Some(job) = cancelled {
            tracing::info!(target: "ytdlm.download", id = %id, "Cancelled pending download");
            self.emit(DownloadEvent::JobUpdated { job });
        }
        true
    }

    async fn cancel_all(&self) -> usize {
        let mut ids: Vec<JobId> = self
            .registry()
            .iter()
            .filter(|(_, entry)| !entry.job.is_terminal())
            .map(|(id, _)| *id)
            .collect();
        let active_ids: Vec<JobId> = self.active().keys().copied().collect();
        for id in active_ids {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut count = 0;
        for id in ids {
            if self.cancel(id).await {
                count += 1;
            }
        }
        tracing::info!(target: "ytdlm.download", count, "Cancelled all downloads");
        count
    }

    fn remove(&self, id: JobId) -> Option<Job> {
        let entry = self.registry().shift_remove(&id)?;
        tracing::info!(target: "ytdlm.download", id = %id, status = %entry.job.status(), "Removed download");
        Some(entry.job)
    }

    fn clear_completed(&self) -> usize {
        let removed = {
            let mut registry = self.registry();
            let before = registry.len();
            registry.retain(|_, entry| !entry.job.is_terminal());
            before - registry.len()
        };
        tracing::info!(target: "ytdlm.download", removed, "Cleared finished downloads");
        removed
    }

    fn set_max_concurrent(&self, max: u32) {
        let max = max.max(1);
        self.gate.set_capacity(max);
        tracing::info!(target: "ytdlm.download", max, "Set max concurrent downloads");
    }

    fn max_concurrent(&self) -> u32 {
        self.gate.capacity()
    }

    fn jobs(&self) -> Vec<Job> {
        self.registry().values().map(|entry| entry.job.clone()).collect()
    }

    fn get(&self, id: JobId) -> Option<Job> {
        self.registry().get(&id).map(|entry| entry.job.clone())
    }

    fn active_count(&self) -> usize {
        self.active().len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ytdlm_core::{DownloadOptions, NoopDownloadEmitter};

    use super::*;

    fn manager(max: u32) -> Arc<DownloadManagerImpl> {
        let config = DownloadManagerConfig::default()
            .with_downloader_path("/nonexistent/yt-dlp")
            .with_max_concurrent(max);
        Arc::new(build_download_manager(DownloadManagerDeps {
            event_emitter: Arc::new(NoopDownloadEmitter::new()),
            config,
        }))
    }

    #[tokio::test]
    async fn test_blank_url_rejected() {
        let m = manager(1);
        let err = Arc::clone(&m)
            .submit(DownloadRequest::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidRequest { .. }));
        assert!(m.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_submit_uses_defaults_and_title() {
        let m = manager(1);
        let id = Arc::clone(&m)
            .submit(DownloadRequest::new(" https://example.com/v ").with_title("Known"))
            .await
            .unwrap();
        let job = m.get(id).unwrap();
        assert_eq!(job.url, "https://example.com/v");
        assert_eq!(job.title, "Known");
        assert_eq!(job.output_dir, std::path::PathBuf::from("."));
    }

    #[tokio::test]
    async fn test_missing_downloader_fails_job() {
        let m = manager(1);
        let id = Arc::clone(&m)
            .submit(DownloadRequest::new("https://example.com/v"))
            .await
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !m.get(id).unwrap().is_terminal() || m.active_count() > 0 {
            assert!(Instant::now() < deadline, "job never finished");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let job = m.get(id).unwrap();
        assert_eq!(job.status(), DownloadStatus::Failed);
        assert!(job.error.unwrap().starts_with("Failed to start downloader"));
    }

    #[tokio::test]
    async fn test_cap_clamped_to_one() {
        let m = manager(2);
        m.set_max_concurrent(0);
        assert_eq!(m.max_concurrent(), 1);
        m.set_max_concurrent(4);
        assert_eq!(m.max_concurrent(), 4);
    }

    #[tokio::test]
    async fn test_unknown_id_is_noop() {
        let m = manager(1);
        assert!(!m.cancel(JobId::new()).await);
        assert!(m.remove(JobId::new()).is_none());
        assert_eq!(m.clear_completed(), 0);
    }

    #[tokio::test]
    async fn test_cancel_is_refused_once_runner_returned() {
        let m = manager(1);
        let mut job = Job::new("https://example.com/v", "/tmp", DownloadOptions::default());
        job.transition(DownloadStatus::Downloading);
        let id = job.id;
        let cancel = CancellationToken::new();
        let permit = m.gate.acquire(&CancellationToken::new()).await.unwrap();

        m.registry().insert(
            id,
            JobEntry {
                job,
                cancel: cancel.clone(),
            },
        );
        m.active().insert(
            id,
            ActiveJob {
                cancel: cancel.clone(),
                pid: None,
                finished: true,
                _permit: permit,
            },
        );

        // Outcome already decided: not reported as cancelled, token untouched.
        assert!(!m.cancel(id).await);
        assert!(!cancel.is_cancelled());

        m.active().get_mut(&id).unwrap().finished = false;
        assert!(m.cancel(id).await);
        assert!(cancel.is_cancelled());
    }
}
