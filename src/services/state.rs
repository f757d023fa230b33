use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::Settings;
use crate::services::capture::{image_source, ImageSource};
use crate::services::demo::DemoGateway;
use crate::services::gateway::{Gateway, HttpGateway};
use crate::services::notify::{Notice, Notifier};

/// Collaborators handed to every screen. Screens keep no other shared state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn Gateway>,
    pub source: Arc<dyn ImageSource>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(gateway: Arc<dyn Gateway>, source: Arc<dyn ImageSource>) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (notifier, rx) = Notifier::channel();
        let state = AppState {
            gateway,
            source,
            notifier,
        };
        (state, rx)
    }

    pub fn from_settings(settings: &Settings) -> Result<(Self, mpsc::UnboundedReceiver<Notice>)> {
        let gateway: Arc<dyn Gateway> = if settings.demo_mode {
            info!("Using the in-memory demo gateway");
            Arc::new(DemoGateway::new())
        } else {
            info!(url = %settings.api_base_url, "Using the HTTP gateway");
            Arc::new(HttpGateway::new(&settings.api_base_url, settings.request_timeout)?)
        };
        let source = image_source(settings)?;
        info!(platform = ?source.platform(), "Image source ready");
        Ok(Self::new(gateway, source))
    }
}
