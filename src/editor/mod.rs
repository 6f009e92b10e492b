//! Side-by-side text editing
//!
//! The diff itself is computed by an embedded widget; this module keeps the
//! host's two buffers in step with it.

pub mod controller;
pub mod input;
pub mod memory;
pub mod widget;

pub use controller::{BufferEvent, BufferEvents, BufferSyncController, InputVerdict, Phase, WriteOutcome};
pub use input::{InputGesture, WarningThrottle};
pub use memory::MemoryWidget;
pub use widget::{DiffWidget, ListenerKind, Side, Subscription, TextEdit, ViewOptions, WidgetError};
