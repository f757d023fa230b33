//! Scan screen: one image in, one [`ScanResult`] out.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use crate::config::Platform;
use crate::error::ScanError;
use crate::models::ScanResult;
use crate::screens::{FlowCell, FlowState};
use crate::services::capture::{CapturedImage, ImageSource};
use crate::services::gateway::Gateway;
use crate::services::notify::{Notice, Notifier};
use crate::services::state::AppState;
use crate::utils::image::{encode_data_uri, is_valid_image_data_uri};
use crate::utils::today_iso;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraOp {
    Capturing,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Unknown,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Ready for review.
    Forwarded(ScanResult),
    /// A capture was already running.
    Ignored,
    /// The user closed the picker without choosing.
    Cancelled,
    PermissionRequired,
    Failed(String),
    Discarded,
}

pub struct CameraScreen {
    source: Arc<dyn ImageSource>,
    gateway: Arc<dyn Gateway>,
    notifier: Notifier,
    cell: FlowCell<CameraOp>,
    permission: Mutex<Permission>,
    released: Arc<AtomicBool>,
}

impl CameraScreen {
    pub fn new(state: &AppState) -> Self {
        Self::with_parts(state.source.clone(), state.gateway.clone(), state.notifier.clone())
    }

    pub fn with_parts(source: Arc<dyn ImageSource>, gateway: Arc<dyn Gateway>, notifier: Notifier) -> Self {
        CameraScreen {
            source,
            gateway,
            notifier,
            cell: FlowCell::new(),
            permission: Mutex::new(Permission::Unknown),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn mount(&self) -> Permission {
        self.request_permission().await
    }

    /// Also serves as the retry action after a denial.
    pub async fn request_permission(&self) -> Permission {
        let permission = match self.source.request_permission().await {
            Ok(()) => Permission::Granted,
            Err(err) => {
                error!("Error requesting camera permission: {}", err);
                Permission::Denied
            }
        };
        if self.cell.is_mounted() {
            self.set_permission(permission);
        }
        permission
    }

    pub fn permission(&self) -> Permission {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn platform(&self) -> Platform {
        self.source.platform()
    }

    pub fn state(&self) -> FlowState<CameraOp> {
        self.cell.state()
    }

    /// Whether the capture control is enabled.
    pub fn can_capture(&self) -> bool {
        self.permission() == Permission::Granted && !self.cell.is_busy()
    }

    pub fn preselect(&self, path: PathBuf) {
        self.source.preselect(path);
    }

    /// Leave the screen: later results are dropped and any device wait stops.
    pub fn unmount(&self) {
        self.cell.unmount();
        self.released.store(true, Ordering::SeqCst);
    }

    pub async fn capture(&self) -> CaptureOutcome {
        if self.permission() != Permission::Granted {
            return CaptureOutcome::PermissionRequired;
        }
        if !self.cell.try_begin(CameraOp::Capturing) {
            debug!("Capture already in flight");
            return CaptureOutcome::Ignored;
        }

        let image = match self.source.acquire(&self.released).await {
            Ok(Some(image)) => image,
            Ok(None) => {
                if !self.cell.is_mounted() {
                    return CaptureOutcome::Discarded;
                }
                self.cell.reset();
                return CaptureOutcome::Cancelled;
            }
            Err(err) => return self.abandon(err),
        };

        self.cell.advance(CameraOp::Processing);
        let result = self.process(image).await;
        if !self.cell.is_mounted() {
            debug!("Camera screen left; dropping scan result");
            return CaptureOutcome::Discarded;
        }
        match result {
            Ok(scan) => {
                info!(duplicate = scan.duplicate_check.is_duplicate, "Scan ready for review");
                self.cell.succeed();
                CaptureOutcome::Forwarded(scan)
            }
            Err(err) => self.abandon(err),
        }
    }

    async fn process(&self, image: CapturedImage) -> Result<ScanResult, ScanError> {
        let data_uri = encode_data_uri(&image.bytes, &image.mime);
        if !is_valid_image_data_uri(&data_uri) {
            return Err(ScanError::Encode(format!("Not an image: {}", image.mime)));
        }
        let duplicate_check = self.gateway.check_duplicates(&data_uri).await?;
        Ok(ScanResult::new(data_uri, duplicate_check, &today_iso()))
    }

    fn abandon(&self, err: ScanError) -> CaptureOutcome {
        if !self.cell.is_mounted() {
            return CaptureOutcome::Discarded;
        }
        error!("Error processing scan: {}", err);
        if matches!(err, ScanError::Permission(_)) {
            self.set_permission(Permission::Denied);
        }
        self.notifier.emit(Notice::error(self.failure_message(&err)));
        self.cell.fail(err.to_string());
        CaptureOutcome::Failed(err.to_string())
    }

    fn failure_message(&self, err: &ScanError) -> &'static str {
        match (self.platform(), err.is_capture_stage()) {
            (Platform::Native, true) => "Failed to capture photo",
            (Platform::Native, false) => "Failed to process photo",
            (Platform::Web, _) => "Failed to process image",
        }
    }

    fn set_permission(&self, permission: Permission) {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner()) = permission;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DuplicateCheck;
    use crate::screens::testing::{drain, invoice, notifier, Call, ScriptedGateway};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Clone)]
    enum Shot {
        Image(&'static [u8], &'static str),
        Cancel,
        Fail,
        Revoked,
        WaitForStop,
    }

    struct StubSource {
        platform: Platform,
        allowed: AtomicBool,
        shot: Mutex<Shot>,
        acquired: AtomicUsize,
    }

    impl StubSource {
        fn new(platform: Platform, shot: Shot) -> Arc<Self> {
            Arc::new(StubSource {
                platform,
                allowed: AtomicBool::new(true),
                shot: Mutex::new(shot),
                acquired: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ImageSource for StubSource {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn request_permission(&self) -> Result<(), ScanError> {
            if self.allowed.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(ScanError::Permission("denied".to_string()))
            }
        }

        async fn acquire(&self, stop: &Arc<AtomicBool>) -> Result<Option<CapturedImage>, ScanError> {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            let shot = self.shot.lock().unwrap().clone();
            match shot {
                Shot::Image(bytes, mime) => Ok(Some(CapturedImage {
                    bytes: bytes.to_vec(),
                    mime: mime.to_string(),
                })),
                Shot::Cancel => Ok(None),
                Shot::Fail => Err(ScanError::Capture("shutter jammed".to_string())),
                Shot::Revoked => Err(ScanError::Permission("camera revoked".to_string())),
                Shot::WaitForStop => {
                    while !stop.load(Ordering::SeqCst) {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    }
                    Ok(None)
                }
            }
        }
    }

    fn jpeg() -> Shot {
        Shot::Image(&[0xff, 0xd8, 0xff], "image/jpeg")
    }

    #[tokio::test]
    async fn test_capture_forwards_scan_result() {
        let gateway = Arc::new(ScriptedGateway::new());
        let (notifier, mut rx) = notifier();
        let screen = CameraScreen::with_parts(StubSource::new(Platform::Native, jpeg()), gateway.clone(), notifier);

        assert_eq!(screen.mount().await, Permission::Granted);
        let scan = match screen.capture().await {
            CaptureOutcome::Forwarded(scan) => scan,
            other => panic!("unexpected outcome {:?}", other),
        };

        assert_eq!(scan.image_base64, "data:image/jpeg;base64,/9j/");
        assert_eq!(scan.duplicate_check, DuplicateCheck::none());
        let extracted = scan.extracted_data.unwrap();
        assert_eq!(extracted.vendor, "");
        assert_eq!(extracted.date, today_iso());
        assert_eq!(extracted.total, 0.0);
        assert_eq!(
            gateway.calls(),
            vec![Call::CheckDuplicates("data:image/jpeg;base64,/9j/".to_string())]
        );
        assert_eq!(screen.state(), FlowState::Succeeded);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_verdict_travels_with_scan() {
        let gateway = Arc::new(ScriptedGateway::new());
        let verdict = DuplicateCheck {
            is_duplicate: true,
            similar_invoices: vec![invoice("41", "Acme", 10.0)],
            confidence: 0.92,
        };
        gateway.set_duplicate_check(verdict.clone());
        let (notifier, _rx) = notifier();
        let screen = CameraScreen::with_parts(StubSource::new(Platform::Web, jpeg()), gateway, notifier);
        screen.mount().await;

        match screen.capture().await {
            CaptureOutcome::Forwarded(scan) => assert_eq!(scan.duplicate_check, verdict),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_capture_is_ignored_while_busy() {
        let gateway = Arc::new(ScriptedGateway::new());
        let source = StubSource::new(Platform::Native, jpeg());
        let (notifier, _rx) = notifier();
        let screen = CameraScreen::with_parts(source.clone(), gateway.clone(), notifier);
        screen.mount().await;

        let (first, second) = tokio::join!(screen.capture(), screen.capture());
        assert!(matches!(first, CaptureOutcome::Forwarded(_)));
        assert_eq!(second, CaptureOutcome::Ignored);
        assert_eq!(source.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_gateway_failure_stays_on_screen() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.fail("check");
        let (notifier, mut rx) = notifier();
        let screen = CameraScreen::with_parts(StubSource::new(Platform::Native, jpeg()), gateway, notifier);
        screen.mount().await;

        assert!(matches!(screen.capture().await, CaptureOutcome::Failed(_)));
        assert!(matches!(screen.state(), FlowState::Failed(_)));
        assert!(screen.can_capture());
        assert_eq!(drain(&mut rx), vec![Notice::error("Failed to process photo")]);
    }

    #[tokio::test]
    async fn test_capture_failure_message_per_platform() {
        let (notifier, mut rx) = notifier();
        let native = CameraScreen::with_parts(
            StubSource::new(Platform::Native, Shot::Fail),
            Arc::new(ScriptedGateway::new()),
            notifier.clone(),
        );
        native.mount().await;
        native.capture().await;

        let web = CameraScreen::with_parts(
            StubSource::new(Platform::Web, Shot::Fail),
            Arc::new(ScriptedGateway::new()),
            notifier,
        );
        web.mount().await;
        web.capture().await;

        assert_eq!(
            drain(&mut rx),
            vec![Notice::error("Failed to capture photo"), Notice::error("Failed to process image")]
        );
    }

    #[tokio::test]
    async fn test_non_image_is_an_encode_failure() {
        let gateway = Arc::new(ScriptedGateway::new());
        let (notifier, _rx) = notifier();
        let screen = CameraScreen::with_parts(
            StubSource::new(Platform::Web, Shot::Image(b"hi", "text/plain")),
            gateway.clone(),
            notifier,
        );
        screen.mount().await;

        assert!(matches!(screen.capture().await, CaptureOutcome::Failed(_)));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_picker_returns_to_idle() {
        let gateway = Arc::new(ScriptedGateway::new());
        let (notifier, mut rx) = notifier();
        let screen = CameraScreen::with_parts(StubSource::new(Platform::Web, Shot::Cancel), gateway.clone(), notifier);
        screen.mount().await;

        assert_eq!(screen.capture().await, CaptureOutcome::Cancelled);
        assert_eq!(screen.state(), FlowState::Idle);
        assert!(gateway.calls().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_denied_permission_can_be_retried() {
        let source = StubSource::new(Platform::Native, jpeg());
        source.allowed.store(false, Ordering::SeqCst);
        let (notifier, _rx) = notifier();
        let screen = CameraScreen::with_parts(source.clone(), Arc::new(ScriptedGateway::new()), notifier);

        assert_eq!(screen.permission(), Permission::Unknown);
        assert_eq!(screen.mount().await, Permission::Denied);
        assert_eq!(screen.capture().await, CaptureOutcome::PermissionRequired);
        assert_eq!(source.acquired.load(Ordering::SeqCst), 0);

        source.allowed.store(true, Ordering::SeqCst);
        assert_eq!(screen.request_permission().await, Permission::Granted);
        assert!(screen.can_capture());
    }

    #[tokio::test]
    async fn test_result_dropped_after_unmount() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(ScriptedGateway::new().gated(gate.clone()));
        let (notifier, mut rx) = notifier();
        let screen = CameraScreen::with_parts(StubSource::new(Platform::Native, jpeg()), gateway, notifier);
        screen.mount().await;

        let (outcome, _) = tokio::join!(screen.capture(), async {
            tokio::task::yield_now().await;
            screen.unmount();
            gate.notify_one();
        });
        assert_eq!(outcome, CaptureOutcome::Discarded);
        assert_eq!(screen.state(), FlowState::InFlight(CameraOp::Processing));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_revoked_permission_during_capture() {
        let gateway = Arc::new(ScriptedGateway::new());
        let (notifier, mut rx) = notifier();
        let screen = CameraScreen::with_parts(StubSource::new(Platform::Native, Shot::Revoked), gateway.clone(), notifier);
        assert_eq!(screen.mount().await, Permission::Granted);

        assert!(matches!(screen.capture().await, CaptureOutcome::Failed(_)));
        assert_eq!(screen.permission(), Permission::Denied);
        assert!(!screen.can_capture());
        assert_eq!(screen.capture().await, CaptureOutcome::PermissionRequired);
        assert!(gateway.calls().is_empty());
        assert_eq!(drain(&mut rx), vec![Notice::error("Failed to capture photo")]);
    }

    #[tokio::test]
    async fn test_unmount_stops_a_pending_device_wait() {
        let gateway = Arc::new(ScriptedGateway::new());
        let (notifier, mut rx) = notifier();
        let screen = CameraScreen::with_parts(StubSource::new(Platform::Native, Shot::WaitForStop), gateway.clone(), notifier);
        screen.mount().await;

        let waiting = async {
            let (outcome, _) = tokio::join!(screen.capture(), async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                screen.unmount();
            });
            outcome
        };
        let outcome = tokio::time::timeout(Duration::from_secs(5), waiting).await.unwrap();
        assert_eq!(outcome, CaptureOutcome::Discarded);
        assert!(gateway.calls().is_empty());
        assert!(drain(&mut rx).is_empty());
    }
}
