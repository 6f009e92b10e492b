//! Contract for the embedded side-by-side diff widget
//!
//! The widget owns the live text of both panes and computes the diff itself.
//! The sync controller only needs what is listed here.

use serde::{Deserialize, Serialize};

/// Pane of the diff view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" | "original" => Ok(Side::Left),
            "right" | "modified" => Ok(Side::Right),
            _ => Err(format!("Invalid side: {}. Use: left, right", s)),
        }
    }
}

/// Replace the byte range `start..end` of a pane with `text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl TextEdit {
    /// Smallest single-range edit turning `from` into `to`.
    ///
    /// Shared prefix and suffix are left alone so the widget keeps undo
    /// history and cursor anchors outside the changed span. Offsets always
    /// fall on char boundaries.
    pub fn between(from: &str, to: &str) -> TextEdit {
        let prefix: usize = from
            .chars()
            .zip(to.chars())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.len_utf8())
            .sum();

        let from_rest = &from[prefix..];
        let to_rest = &to[prefix..];
        let suffix: usize = from_rest
            .chars()
            .rev()
            .zip(to_rest.chars().rev())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.len_utf8())
            .sum();

        TextEdit {
            start: prefix,
            end: from.len() - suffix,
            text: to[prefix..to.len() - suffix].to_string(),
        }
    }

    /// Apply to `text`, checking the range
    pub fn apply(&self, text: &str) -> Result<String, WidgetError> {
        if self.start > self.end
            || self.end > text.len()
            || !text.is_char_boundary(self.start)
            || !text.is_char_boundary(self.end)
        {
            return Err(WidgetError::InvalidRange {
                start: self.start,
                end: self.end,
                len: text.len(),
            });
        }
        let mut out = String::with_capacity(text.len() - (self.end - self.start) + self.text.len());
        out.push_str(&text[..self.start]);
        out.push_str(&self.text);
        out.push_str(&text[self.end..]);
        Ok(out)
    }
}

/// Widget-side failure while applying an edit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    #[error("Edit range {start}..{end} is invalid for a pane of {len} bytes")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Widget is not ready")]
    NotReady,

    #[error("Widget rejected the edit: {0}")]
    Rejected(String),
}

/// Events a listener can be registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    ContentChanged,
    KeyDown,
}

/// Handle of one registered listener; must be released on unmount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub id: u64,
    pub side: Side,
    pub kind: ListenerKind,
}

/// Presentation options forwarded to the widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub language: String,
    pub theme: String,
    pub line_numbers: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            language: "javascript".to_string(),
            theme: "vs".to_string(),
            line_numbers: true,
        }
    }
}

/// Embedded diff widget
pub trait DiffWidget {
    /// Live text of a pane
    fn text(&self, side: Side) -> String;

    /// Range-replace inside a pane. Change notifications for the edit may be
    /// dispatched during this call or later.
    fn apply_edit(&mut self, side: Side, edit: &TextEdit) -> Result<(), WidgetError>;

    fn set_read_only(&mut self, side: Side, read_only: bool);

    fn subscribe(&mut self, side: Side, kind: ListenerKind) -> Subscription;

    fn unsubscribe(&mut self, subscription: Subscription);

    /// Recompute layout after option changes
    fn layout(&mut self);

    fn configure(&mut self, _options: &ViewOptions) {}
}
