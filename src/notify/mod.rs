//! User-facing notices
//!
//! Notices travel over a channel owned by whoever composes the application;
//! nothing here is global.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoticeLevel::Info => write!(f, "info"),
            NoticeLevel::Warning => write!(f, "warning"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
    /// How long the notice stays visible
    pub duration: Duration,
}

pub type NoticeReceiver = mpsc::UnboundedReceiver<Notice>;

/// Cloneable sending half of the notice channel
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notice>,
    next_id: Arc<AtomicU64>,
}

impl Notifier {
    pub fn channel() -> (Notifier, NoticeReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Notifier {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (notifier, rx)
    }

    /// Send a notice; returns its id. A closed channel drops it silently.
    pub fn send(&self, level: NoticeLevel, message: impl Into<String>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notice = Notice {
            id,
            level,
            message: message.into(),
            duration: DEFAULT_NOTICE_DURATION,
        };
        if self.tx.send(notice).is_err() {
            tracing::debug!("Notice {} dropped: no receiver", id);
        }
        id
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.send(NoticeLevel::Info, message)
    }

    pub fn warn(&self, message: impl Into<String>) -> u64 {
        self.send(NoticeLevel::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.send(NoticeLevel::Error, message)
    }
}

/// Drain everything currently queued on `rx`
pub fn drain(rx: &mut NoticeReceiver) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_across_clones() {
        let (notifier, mut rx) = Notifier::channel();
        let other = notifier.clone();

        assert_eq!(notifier.info("one"), 1);
        assert_eq!(other.warn("two"), 2);

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].level, NoticeLevel::Warning);
        assert_eq!(notices[1].duration, DEFAULT_NOTICE_DURATION);
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.error("nobody listening");
    }
}
