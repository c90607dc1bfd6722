//! Shared fixtures: a fake `yt-dlp` shell script and polling helpers.
//!
//! The script dispatches on its last argument (the URL):
//!
//! - `fake://ok/...` prints a destination line and progress, exits 0
//! - `fake://fail/...` prints an error, exits 3
//! - `fake://hang/...` sleeps for a long time
//! - `fake://wait/<name>` blocks until [`FakeYtDlp::release`] is called for `<name>`
//!
//! Every start appends the URL to `started.log` in the scratch directory.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use ytdlm_download::{
    BroadcastDownloadEmitter, DownloadManagerConfig, DownloadManagerDeps, DownloadManagerImpl,
    DownloadManagerPort, DownloadRequest, DownloadStatus, Job, JobId, build_download_manager,
};

const SCRIPT: &str = r#"#!/bin/sh
for last; do :; done
echo "$last" >> "@DIR@/started.log"
case "$last" in
  fake://ok/*)
    echo "[download] Destination: @DIR@/My Clip.f137.mp4"
    echo "[download]  10.0% of 1.00MiB at 1.00MiB/s ETA 00:01"
    echo "[download]  55.5% of 1.00MiB at 1.00MiB/s ETA 00:01" 1>&2
    echo "[download] 100% of 1.00MiB"
    exit 0
    ;;
  fake://fail/*)
    echo "ERROR: Unsupported URL" 1>&2
    exit 3
    ;;
  fake://hang/*)
    sleep 30
    exit 0
    ;;
  fake://wait/*)
    name=${last#fake://wait/}
    while [ ! -f "@DIR@/release-$name" ]; do sleep 0.05; done
    exit 0
    ;;
esac
exit 1
"#;

pub struct FakeYtDlp {
    dir: TempDir,
    script: PathBuf,
}

impl FakeYtDlp {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("yt-dlp");
        let body = SCRIPT.replace("@DIR@", &dir.path().display().to_string());
        fs::write(&script, body).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir, script }
    }

    /// A manager running this script, plus an emitter to subscribe to.
    pub fn manager(&self, max_concurrent: u32) -> (Arc<DownloadManagerImpl>, BroadcastDownloadEmitter) {
        let emitter = BroadcastDownloadEmitter::with_defaults();
        let config = DownloadManagerConfig::default()
            .with_downloader_path(&self.script)
            .with_output_dir(self.dir.path())
            .with_max_concurrent(max_concurrent)
            .with_termination_grace(Duration::from_secs(2));
        let manager = build_download_manager(DownloadManagerDeps {
            event_emitter: Arc::new(emitter.clone()),
            config,
        });
        (Arc::new(manager), emitter)
    }

    /// URLs the script has been started with, in start order.
    pub fn started(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("started.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Let a `fake://wait/<name>` job exit successfully.
    pub fn release(&self, name: &str) {
        fs::write(self.dir.path().join(format!("release-{name}")), b"").unwrap();
    }
}

pub async fn submit(manager: &Arc<DownloadManagerImpl>, url: &str) -> JobId {
    Arc::clone(manager)
        .submit(DownloadRequest::new(url))
        .await
        .unwrap()
}

/// Poll `condition` until it holds or ten seconds pass.
pub async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

pub async fn wait_for_status(
    manager: &Arc<DownloadManagerImpl>,
    id: JobId,
    status: DownloadStatus,
) -> Job {
    let reached = wait_for(|| manager.get(id).is_some_and(|job| job.status() == status)).await;
    let job = manager.get(id);
    assert!(reached, "job never reached {status}: {job:?}");
    job.unwrap()
}
