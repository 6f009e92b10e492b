//! Headless in-memory diff widget
//!
//! Used by the CLI text session and as the widget double in tests. Change
//! notifications are queued instead of dispatched, so the host decides
//! whether an echo arrives before or after the idle tick.

use std::collections::{HashMap, VecDeque};

use super::widget::{DiffWidget, ListenerKind, Side, Subscription, TextEdit, ViewOptions, WidgetError};

#[derive(Debug, Default, Clone)]
struct Pane {
    text: String,
    read_only: bool,
}

#[derive(Debug, Default)]
pub struct MemoryWidget {
    left: Pane,
    right: Pane,
    listeners: HashMap<u64, Subscription>,
    next_listener: u64,
    pending: VecDeque<Side>,
    /// Injected failure, optionally limited to one pane
    fail_next: Option<(Option<Side>, WidgetError)>,
    edits: usize,
    layouts: usize,
    options: ViewOptions,
}

impl MemoryWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(left: &str, right: &str) -> Self {
        let mut widget = Self::new();
        widget.left.text = left.to_string();
        widget.right.text = right.to_string();
        widget
    }

    fn pane(&self, side: Side) -> &Pane {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn pane_mut(&mut self, side: Side) -> &mut Pane {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn has_listener(&self, side: Side, kind: ListenerKind) -> bool {
        self.listeners
            .values()
            .any(|s| s.side == side && s.kind == kind)
    }

    fn notify(&mut self, side: Side) {
        if self.has_listener(side, ListenerKind::ContentChanged) {
            self.pending.push_back(side);
        }
    }

    /// Simulate a user edit typed into a pane. Read-only panes refuse it.
    pub fn type_edit(&mut self, side: Side, edit: &TextEdit) -> Result<(), WidgetError> {
        if self.pane(side).read_only {
            return Err(WidgetError::Rejected(format!("{} pane is read-only", side)));
        }
        let updated = edit.apply(&self.pane(side).text)?;
        self.pane_mut(side).text = updated;
        self.notify(side);
        Ok(())
    }

    /// Simulate the user replacing a pane's whole content
    pub fn type_text(&mut self, side: Side, text: &str) -> Result<(), WidgetError> {
        let edit = TextEdit::between(&self.pane(side).text, text);
        self.type_edit(side, &edit)
    }

    /// Drain queued change notifications, oldest first
    pub fn take_notifications(&mut self) -> Vec<Side> {
        self.pending.drain(..).collect()
    }

    /// Make the next `apply_edit` fail with `error`
    pub fn fail_next_edit(&mut self, error: WidgetError) {
        self.fail_next = Some((None, error));
    }

    /// Make the next `apply_edit` on `side` fail with `error`
    pub fn fail_next_edit_on(&mut self, side: Side, error: WidgetError) {
        self.fail_next = Some((Some(side), error));
    }

    fn take_failure(&mut self, side: Side) -> Option<WidgetError> {
        let hit = match &self.fail_next {
            Some((target, _)) => target.map_or(true, |t| t == side),
            None => false,
        };
        if hit {
            self.fail_next.take().map(|(_, err)| err)
        } else {
            None
        }
    }

    pub fn is_read_only(&self, side: Side) -> bool {
        self.pane(side).read_only
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Programmatic edits applied so far
    pub fn edit_count(&self) -> usize {
        self.edits
    }

    pub fn layout_count(&self) -> usize {
        self.layouts
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }
}

impl DiffWidget for MemoryWidget {
    fn text(&self, side: Side) -> String {
        self.pane(side).text.clone()
    }

    fn apply_edit(&mut self, side: Side, edit: &TextEdit) -> Result<(), WidgetError> {
        if let Some(err) = self.take_failure(side) {
            return Err(err);
        }
        let updated = edit.apply(&self.pane(side).text)?;
        self.pane_mut(side).text = updated;
        self.edits += 1;
        self.notify(side);
        Ok(())
    }

    fn set_read_only(&mut self, side: Side, read_only: bool) {
        self.pane_mut(side).read_only = read_only;
    }

    fn subscribe(&mut self, side: Side, kind: ListenerKind) -> Subscription {
        self.next_listener += 1;
        let subscription = Subscription {
            id: self.next_listener,
            side,
            kind,
        };
        self.listeners.insert(subscription.id, subscription);
        subscription
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.listeners.remove(&subscription.id);
    }

    fn layout(&mut self) {
        self.layouts += 1;
    }

    fn configure(&mut self, options: &ViewOptions) {
        self.options = options.clone();
    }
}
