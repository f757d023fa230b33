//! Image sources behind the scan screen: a camera drop folder on native
//! platforms, a file picker everywhere else.

use anyhow::anyhow;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{Platform, Settings};
use crate::error::ScanError;
use crate::services::watcher::{snapshot_images, InboxWatcher};
use crate::utils::image::mime_for_path;

/// Raw image bytes as handed over by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl CapturedImage {
    pub async fn read(path: &Path) -> Result<Self, ScanError> {
        let mime = mime_for_path(path)
            .ok_or_else(|| ScanError::Encode(format!("Unsupported image type: {}", path.display())))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ScanError::Capture(format!("Read {}: {}", path.display(), e)))?;
        if bytes.is_empty() {
            return Err(ScanError::Encode(format!("Empty image file: {}", path.display())));
        }
        debug!(bytes = bytes.len(), mime, "Read {}", path.display());
        Ok(CapturedImage {
            bytes,
            mime: mime.to_string(),
        })
    }
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    fn platform(&self) -> Platform;

    /// Ask for access to the device. Sources without a device grant at once.
    async fn request_permission(&self) -> Result<(), ScanError>;

    /// Obtain one image. `Ok(None)` means the user backed out or `stop` was
    /// set while waiting for the device.
    async fn acquire(&self, stop: &Arc<AtomicBool>) -> Result<Option<CapturedImage>, ScanError>;

    /// Hint for the next `acquire`; only file pickers use it.
    fn preselect(&self, _path: PathBuf) {}
}

/// Native camera, fed by the folder the device drops its shots into.
pub struct CameraSource {
    inbox: PathBuf,
    timeout: Duration,
    debounce_ms: u64,
}

impl CameraSource {
    pub fn new(inbox: impl Into<PathBuf>, timeout: Duration, debounce_ms: u64) -> Self {
        CameraSource {
            inbox: inbox.into(),
            timeout,
            debounce_ms,
        }
    }
}

#[async_trait]
impl ImageSource for CameraSource {
    fn platform(&self) -> Platform {
        Platform::Native
    }

    async fn request_permission(&self) -> Result<(), ScanError> {
        let inbox = self.inbox.clone();
        tokio::fs::read_dir(&inbox)
            .await
            .map(|_| ())
            .map_err(|e| ScanError::Permission(format!("{}: {}", inbox.display(), e)))
    }

    async fn acquire(&self, stop: &Arc<AtomicBool>) -> Result<Option<CapturedImage>, ScanError> {
        if stop.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let known = snapshot_images(&self.inbox);
        let watcher =
            InboxWatcher::start(&self.inbox, stop.clone()).map_err(|e| ScanError::Capture(e.to_string()))?;
        info!("Waiting for a shot in {}", self.inbox.display());

        let timeout = self.timeout;
        let settle = Duration::from_millis(self.debounce_ms);
        let found = tokio::task::spawn_blocking(move || watcher.next_image(&known, timeout, settle))
            .await
            .map_err(|e| ScanError::Capture(e.to_string()))?
            .map_err(|e| ScanError::Capture(e.to_string()))?;
        if stop.load(Ordering::SeqCst) {
            debug!("Capture cancelled");
            return Ok(None);
        }
        let path =
            found.ok_or_else(|| ScanError::Capture(format!("No photo arrived within {}s", timeout.as_secs())))?;

        debug!("Camera delivered {}", path.display());
        CapturedImage::read(&path).await.map(Some)
    }
}

/// Lets the user choose any image file.
#[derive(Default)]
pub struct FilePickerSource {
    pending: Mutex<Option<PathBuf>>,
}

impl FilePickerSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_pending(&self) -> Option<PathBuf> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

#[async_trait]
impl ImageSource for FilePickerSource {
    fn platform(&self) -> Platform {
        Platform::Web
    }

    async fn request_permission(&self) -> Result<(), ScanError> {
        Ok(())
    }

    async fn acquire(&self, _stop: &Arc<AtomicBool>) -> Result<Option<CapturedImage>, ScanError> {
        let path = match self.take_pending() {
            Some(path) => Some(path),
            None => tokio::task::spawn_blocking(|| {
                rfd::FileDialog::new()
                    .set_title("Select an invoice image")
                    .add_filter("Images", &["jpg", "jpeg", "png", "gif", "webp", "bmp", "heic", "heif", "tif", "tiff"])
                    .pick_file()
            })
            .await
            .map_err(|e| ScanError::Capture(e.to_string()))?,
        };

        match path {
            Some(path) => CapturedImage::read(&path).await.map(Some),
            None => Ok(None),
        }
    }

    fn preselect(&self, path: PathBuf) {
        *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(path);
    }
}

/// The source matching the declared platform.
pub fn image_source(settings: &Settings) -> anyhow::Result<Arc<dyn ImageSource>> {
    match settings.platform {
        Platform::Native => {
            let inbox = settings
                .inbox_folder
                .clone()
                .ok_or_else(|| anyhow!("The native platform needs an inbox folder (SCANNER_INBOX)"))?;
            Ok(Arc::new(CameraSource::new(
                inbox,
                settings.capture_timeout,
                settings.debounce_ms,
            )))
        }
        Platform::Web => Ok(Arc::new(FilePickerSource::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[tokio::test]
    async fn test_picker_reads_preselected_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let source = FilePickerSource::new();
        source.request_permission().await.unwrap();
        source.preselect(path.clone());
        let image = source.acquire(&running()).await.unwrap().unwrap();
        assert_eq!(image.bytes, vec![1, 2, 3]);
        assert_eq!(image.mime, "image/png");
    }

    #[tokio::test]
    async fn test_picker_rejects_unknown_types_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("invoice.txt");
        std::fs::write(&text, b"hello").unwrap();

        let source = FilePickerSource::new();
        source.preselect(text);
        assert!(matches!(source.acquire(&running()).await, Err(ScanError::Encode(_))));

        source.preselect(dir.path().join("gone.jpg"));
        assert!(matches!(source.acquire(&running()).await, Err(ScanError::Capture(_))));
    }

    #[tokio::test]
    async fn test_camera_permission_needs_inbox() {
        let dir = tempfile::tempdir().unwrap();
        let granted = CameraSource::new(dir.path(), Duration::from_secs(1), 10);
        assert!(granted.request_permission().await.is_ok());

        let denied = CameraSource::new(dir.path().join("missing"), Duration::from_secs(1), 10);
        assert!(matches!(denied.request_permission().await, Err(ScanError::Permission(_))));
    }

    #[tokio::test]
    async fn test_camera_takes_new_shot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.jpg"), b"old").unwrap();
        let source = CameraSource::new(dir.path(), Duration::from_secs(10), 20);

        let inbox = dir.path().to_path_buf();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            std::fs::write(inbox.join("shot.jpg"), b"new-shot").unwrap();
        });

        let image = source.acquire(&running()).await.unwrap().unwrap();
        writer.await.unwrap();
        assert_eq!(image.bytes, b"new-shot".to_vec());
        assert_eq!(image.mime, "image/jpeg");
    }

    #[tokio::test]
    async fn test_camera_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let source = CameraSource::new(dir.path(), Duration::from_millis(100), 10);
        assert!(matches!(source.acquire(&running()).await, Err(ScanError::Capture(_))));
    }

    #[tokio::test]
    async fn test_stop_releases_a_waiting_capture() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(CameraSource::new(dir.path(), Duration::from_secs(30), 10));

        let stop = running();

        let waiting = tokio::spawn({
            let source = source.clone();
            let stop = stop.clone();
            async move { source.acquire(&stop).await }
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        stop.store(true, Ordering::SeqCst);

        let outcome = tokio::time::timeout(Duration::from_secs(5), waiting).await.unwrap().unwrap();
        assert!(matches!(outcome, Ok(None)));
    }

    #[tokio::test]
    async fn test_stop_set_before_capture_skips_the_wait() {
        let dir = tempfile::tempdir().unwrap();
        let source = CameraSource::new(dir.path(), Duration::from_secs(30), 10);
        let stop = Arc::new(AtomicBool::new(true));

        let outcome = tokio::time::timeout(Duration::from_secs(1), source.acquire(&stop)).await.unwrap();
        assert!(matches!(outcome, Ok(None)));
    }

    #[test]
    fn test_source_follows_platform() {
        let web = image_source(&Settings::default()).unwrap();
        assert_eq!(web.platform(), Platform::Web);

        let native = image_source(&Settings {
            platform: Platform::Native,
            inbox_folder: Some(PathBuf::from("/tmp")),
            ..Settings::default()
        })
        .unwrap();
        assert_eq!(native.platform(), Platform::Native);
    }

    #[test]
    fn test_native_without_inbox_is_an_error() {
        let result = image_source(&Settings {
            platform: Platform::Native,
            inbox_folder: None,
            ..Settings::default()
        });
        assert!(result.is_err());
    }
}
