//! Transient toast-style notifications raised by the screens.

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    /// Blocking-style prompt the user has to read (missing fields, details).
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            title: "Success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            title: "Error".to_string(),
            message: message.into(),
        }
    }

    pub fn prompt(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Prompt,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Fire-and-forget sender; a closed receiver drops notices silently.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Notifier { tx }, rx)
    }

    pub fn emit(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }
}
