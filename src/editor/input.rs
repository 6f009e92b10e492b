//! Input gestures and the read-only warning throttle

use std::time::{Duration, Instant};

pub const DEFAULT_WARNING_INTERVAL: Duration = Duration::from_millis(2000);

/// A keyboard or clipboard gesture aimed at one pane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputGesture {
    /// Printable character: letters, digits, punctuation, space
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Paste,
    Cut,
    Undo,
    Redo,
    Copy,
    SelectAll,
    /// Arrow keys, paging, home/end
    Navigate,
    /// Lone modifier or function key
    Other,
}

impl InputGesture {
    /// Would this gesture mutate the pane's text
    pub fn is_edit_attempt(&self) -> bool {
        matches!(
            self,
            InputGesture::Char(_)
                | InputGesture::Enter
                | InputGesture::Tab
                | InputGesture::Backspace
                | InputGesture::Delete
                | InputGesture::Paste
                | InputGesture::Cut
                | InputGesture::Undo
                | InputGesture::Redo
        )
    }
}

/// Rate limit for repeated warnings on one pane
#[derive(Debug, Clone)]
pub struct WarningThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for WarningThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_WARNING_INTERVAL)
    }
}

impl WarningThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// True if a warning may fire at `now`; records it when so
    pub fn try_fire(&mut self, now: Instant) -> bool {
        let ready = match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if ready {
            self.last = Some(now);
        }
        ready
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
