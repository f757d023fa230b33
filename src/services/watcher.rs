use anyhow::{anyhow, Result};
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use crate::utils::image::is_image;

/// Longest stretch `next_image` blocks without looking at the stop flag.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Watches a camera drop folder for image files.
pub struct InboxWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<PathBuf>,
    stop: Arc<AtomicBool>,
}

impl InboxWatcher {
    /// Start watching `folder`. Setting `stop` makes any pending wait return `None`.
    pub fn start(folder: &Path, stop: Arc<AtomicBool>) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            for path in event.paths.into_iter().filter(|p| is_image(p)) {
                let _ = tx.send(path);
            }
        })?;
        watcher.watch(folder, RecursiveMode::NonRecursive)?;
        Ok(InboxWatcher {
            _watcher: watcher,
            rx,
            stop,
        })
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Blocks until an image not named in `known` lands in the folder and
    /// settles. `None` when `timeout` elapses or the watcher is stopped.
    pub fn next_image(&self, known: &HashSet<OsString>, timeout: Duration, settle: Duration) -> Result<Option<PathBuf>> {
        let deadline = Instant::now() + timeout;
        while !self.stopped() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            let path = match self.rx.recv_timeout(remaining.min(STOP_POLL)) {
                Ok(path) => path,
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(anyhow!("Inbox watcher stopped"));
                }
            };
            let fresh = path.file_name().map(|name| !known.contains(name)).unwrap_or(false);
            if fresh && self.wait_until_settled(&path, settle, deadline) {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    /// Polls the size every `settle` until two reads agree on a non-empty file.
    fn wait_until_settled(&self, path: &Path, settle: Duration, deadline: Instant) -> bool {
        let mut last_size = None;
        while !self.stopped() && Instant::now() < deadline {
            std::thread::sleep(settle);
            let size = match std::fs::metadata(path) {
                Ok(metadata) => metadata.len(),
                Err(_) => return false,
            };
            if size > 0 && last_size == Some(size) {
                return true;
            }
            last_size = Some(size);
        }
        false
    }
}

/// Names of the images already sitting in `folder`.
pub fn snapshot_images(folder: &Path) -> HashSet<OsString> {
    walkdir::WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| is_image(e.path()))
        .map(|e| e.file_name().to_os_string())
        .collect()
}
