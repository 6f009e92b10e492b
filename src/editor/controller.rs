//! Two-pane buffer synchronisation against an external diff widget
//!
//! Each pane moves independently between three phases:
//!
//! - `AwaitingWidget`: no widget mounted; writes are kept and replayed on mount
//! - `Idle`: host text and widget text agree
//! - `ApplyingExternal`: the host just wrote into the widget; change
//!   notifications for that pane are echoes and are dropped until the next
//!   idle tick
//!
//! A write requested while a pane is `ApplyingExternal` is queued and issued
//! after the lock is released, so windows on one pane never overlap.

use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use super::input::{InputGesture, WarningThrottle, DEFAULT_WARNING_INTERVAL};
use super::memory::MemoryWidget;
use super::widget::{DiffWidget, ListenerKind, Side, Subscription, TextEdit};
use crate::notify::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingWidget,
    Idle,
    ApplyingExternal,
}

/// Result of a host-initiated content update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Widget already shows the text
    Unchanged,
    /// No widget yet; kept for replay on mount
    Buffered,
    /// Written into the widget
    Applied,
    /// Pane is still applying a previous write; issued on the next idle tick
    Deferred,
    /// Widget refused the edit; host text left as it was
    Failed,
}

/// What happened to a key or clipboard gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputVerdict {
    Allowed,
    Blocked { warned: bool },
}

/// Genuine user edits reported to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferEvent {
    Changed { side: Side, text: String },
}

pub type BufferEvents = mpsc::UnboundedReceiver<BufferEvent>;

#[derive(Debug)]
struct PaneState {
    /// Last text known to be in (or being written into) the widget
    text: String,
    queued: Option<String>,
    read_only: bool,
    phase: Phase,
    throttle: WarningThrottle,
}

impl PaneState {
    fn new(text: String, warning_interval: Duration) -> Self {
        Self {
            text,
            queued: None,
            read_only: false,
            phase: Phase::AwaitingWidget,
            throttle: WarningThrottle::new(warning_interval),
        }
    }
}

/// Host-side state of one pane, kept so a failed swap can be undone
struct PaneSnapshot {
    text: String,
    queued: Option<String>,
    phase: Phase,
}

impl PaneSnapshot {
    fn of(pane: &PaneState) -> Self {
        Self {
            text: pane.text.clone(),
            queued: pane.queued.clone(),
            phase: pane.phase,
        }
    }

    fn restore(self, pane: &mut PaneState) {
        pane.text = self.text;
        pane.queued = self.queued;
        pane.phase = self.phase;
    }
}

struct PendingWrite {
    side: Side,
    previous: String,
    edit: TextEdit,
}

enum Staged {
    Done(WriteOutcome),
    Write(PendingWrite),
}

pub struct BufferSyncController<W: DiffWidget> {
    widget: Option<W>,
    left: PaneState,
    right: PaneState,
    subscriptions: Vec<Subscription>,
    events: mpsc::UnboundedSender<BufferEvent>,
    notifier: Notifier,
}

impl<W: DiffWidget> BufferSyncController<W> {
    pub fn new(
        left: impl Into<String>,
        right: impl Into<String>,
        notifier: Notifier,
    ) -> (Self, BufferEvents) {
        Self::with_warning_interval(left, right, notifier, DEFAULT_WARNING_INTERVAL)
    }

    pub fn with_warning_interval(
        left: impl Into<String>,
        right: impl Into<String>,
        notifier: Notifier,
        warning_interval: Duration,
    ) -> (Self, BufferEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            widget: None,
            left: PaneState::new(left.into(), warning_interval),
            right: PaneState::new(right.into(), warning_interval),
            subscriptions: Vec::new(),
            events: tx,
            notifier,
        };
        (controller, rx)
    }

    fn pane(&self, side: Side) -> &PaneState {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn pane_mut(&mut self, side: Side) -> &mut PaneState {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Widget and pane borrowed together
    fn parts(&mut self, side: Side) -> (Option<&mut W>, &mut PaneState) {
        let pane = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        (self.widget.as_mut(), pane)
    }

    pub fn is_mounted(&self) -> bool {
        self.widget.is_some()
    }

    pub fn phase(&self, side: Side) -> Phase {
        self.pane(side).phase
    }

    /// Host view of a pane: the latest requested text
    pub fn content(&self, side: Side) -> &str {
        let pane = self.pane(side);
        pane.queued.as_deref().unwrap_or(&pane.text)
    }

    pub fn is_read_only(&self, side: Side) -> bool {
        self.pane(side).read_only
    }

    pub fn widget(&self) -> Option<&W> {
        self.widget.as_ref()
    }

    pub fn widget_mut(&mut self) -> Option<&mut W> {
        self.widget.as_mut()
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Attach a widget. Any previous widget is unmounted first.
    ///
    /// Installs change and key listeners on both panes, applies read-only
    /// flags and replays buffered content. Returns the listener handles, all
    /// of which are released by [`unmount`](Self::unmount).
    pub fn mount(&mut self, mut widget: W) -> Vec<Subscription> {
        if self.widget.is_some() {
            self.unmount();
        }

        for side in Side::BOTH {
            let changed = widget.subscribe(side, ListenerKind::ContentChanged);
            let keys = widget.subscribe(side, ListenerKind::KeyDown);
            self.subscriptions.extend([changed, keys]);
            widget.set_read_only(side, self.pane(side).read_only);
        }
        widget.layout();
        self.widget = Some(widget);

        for side in Side::BOTH {
            let pane = self.pane_mut(side);
            pane.phase = Phase::Idle;
            let target = pane.text.clone();
            let staged = self.stage(side, target);
            self.commit(staged);
        }

        tracing::debug!("Diff widget mounted with {} listeners", self.subscriptions.len());
        self.subscriptions.clone()
    }

    /// Detach the widget, releasing every listener registered on it
    pub fn unmount(&mut self) -> Option<W> {
        let mut widget = self.widget.take()?;
        for subscription in self.subscriptions.drain(..) {
            widget.unsubscribe(subscription);
        }
        for side in Side::BOTH {
            let pane = self.pane_mut(side);
            if let Some(queued) = pane.queued.take() {
                pane.text = queued;
            }
            pane.phase = Phase::AwaitingWidget;
        }
        Some(widget)
    }

    /// Host-initiated replacement of one pane's content
    pub fn set_content(&mut self, side: Side, text: impl Into<String>) -> WriteOutcome {
        let staged = self.stage(side, text.into());
        self.commit(staged)
    }

    /// Exchange the text of both panes. Read-only flags stay where they are.
    ///
    /// Host state for both panes is updated before either widget write, and
    /// the two writes are issued back to back. If either write fails, both
    /// panes are put back the way they were and both outcomes are `Failed`.
    pub fn swap(&mut self) -> [WriteOutcome; 2] {
        let left = self.content(Side::Left).to_string();
        let right = self.content(Side::Right).to_string();
        let saved_left = PaneSnapshot::of(&self.left);
        let saved_right = PaneSnapshot::of(&self.right);

        let staged_left = self.stage(Side::Left, right);
        let staged_right = self.stage(Side::Right, left);

        let first = self.commit(staged_left);
        if first == WriteOutcome::Failed {
            saved_right.restore(&mut self.right);
            return [WriteOutcome::Failed; 2];
        }

        let second = self.commit(staged_right);
        if second == WriteOutcome::Failed {
            self.roll_back(Side::Left, saved_left, first);
            return [WriteOutcome::Failed; 2];
        }
        [first, second]
    }

    /// Undo a committed swap half. An applied write is reverted in the widget.
    fn roll_back(&mut self, side: Side, saved: PaneSnapshot, outcome: WriteOutcome) {
        let target = saved.text.clone();
        let (widget, pane) = self.parts(side);
        saved.restore(pane);

        if outcome != WriteOutcome::Applied {
            return;
        }
        let Some(widget) = widget else {
            return;
        };
        pane.phase = Phase::ApplyingExternal;
        let live = widget.text(side);
        let edit = TextEdit::between(&live, &target);
        if let Err(err) = widget.apply_edit(side, &edit) {
            tracing::warn!("Reverting {} pane after failed swap failed: {}", side, err);
            pane.text = live;
        }
    }

    /// Update host state for a write and work out the widget edit, if any
    fn stage(&mut self, side: Side, text: String) -> Staged {
        let (widget, pane) = self.parts(side);
        match pane.phase {
            Phase::AwaitingWidget => {
                if pane.text == text {
                    Staged::Done(WriteOutcome::Unchanged)
                } else {
                    pane.text = text;
                    Staged::Done(WriteOutcome::Buffered)
                }
            }
            Phase::ApplyingExternal => {
                if pane.text == text {
                    pane.queued = None;
                    Staged::Done(WriteOutcome::Unchanged)
                } else {
                    pane.queued = Some(text);
                    Staged::Done(WriteOutcome::Deferred)
                }
            }
            Phase::Idle => {
                let Some(widget) = widget else {
                    pane.text = text;
                    pane.phase = Phase::AwaitingWidget;
                    return Staged::Done(WriteOutcome::Buffered);
                };
                let live = widget.text(side);
                if live == text {
                    pane.text = text;
                    return Staged::Done(WriteOutcome::Unchanged);
                }
                let edit = TextEdit::between(&live, &text);
                let previous = std::mem::replace(&mut pane.text, text);
                pane.phase = Phase::ApplyingExternal;
                Staged::Write(PendingWrite {
                    side,
                    previous,
                    edit,
                })
            }
        }
    }

    fn commit(&mut self, staged: Staged) -> WriteOutcome {
        let pending = match staged {
            Staged::Done(outcome) => return outcome,
            Staged::Write(pending) => pending,
        };
        let side = pending.side;
        let (widget, pane) = self.parts(side);
        let Some(widget) = widget else {
            return WriteOutcome::Buffered;
        };

        match widget.apply_edit(side, &pending.edit) {
            Ok(()) => WriteOutcome::Applied,
            Err(err) => {
                tracing::warn!("Content update for {} pane failed: {}", side, err);
                pane.text = pending.previous;
                WriteOutcome::Failed
            }
        }
    }

    /// Release echo locks. Call once the widget has finished dispatching
    /// notifications for the current turn; queued writes are issued here.
    ///
    /// A pane with nothing queued is re-read from the widget, so user edits
    /// that landed inside the echo window are picked up and reported.
    pub fn idle_tick(&mut self) -> usize {
        let mut released = 0;
        for side in Side::BOTH {
            let pane = self.pane_mut(side);
            if pane.phase != Phase::ApplyingExternal {
                continue;
            }
            pane.phase = Phase::Idle;
            released += 1;
            match pane.queued.take() {
                Some(queued) => {
                    self.set_content(side, queued);
                }
                None => {
                    self.handle_widget_change(side);
                }
            }
        }
        released
    }

    /// Change notification from the widget for one pane.
    ///
    /// Returns true when the change was a genuine edit and was reported.
    pub fn handle_widget_change(&mut self, side: Side) -> bool {
        let (widget, pane) = self.parts(side);
        let Some(widget) = widget else {
            return false;
        };
        if pane.phase == Phase::ApplyingExternal {
            tracing::debug!("Suppressed echo on {} pane", side);
            return false;
        }

        let live = widget.text(side);
        if live == pane.text {
            return false;
        }
        pane.text = live.clone();
        if self.events.send(BufferEvent::Changed { side, text: live }).is_err() {
            tracing::debug!("Change on {} pane dropped: no receiver", side);
        }
        true
    }

    pub fn set_read_only(&mut self, side: Side, read_only: bool) {
        let (widget, pane) = self.parts(side);
        pane.read_only = read_only;
        if !read_only {
            pane.throttle.reset();
        }
        if let Some(widget) = widget {
            widget.set_read_only(side, read_only);
            widget.layout();
        }
    }

    /// Flip a pane's read-only flag; returns the new value
    pub fn toggle_read_only(&mut self, side: Side) -> bool {
        let read_only = !self.is_read_only(side);
        self.set_read_only(side, read_only);
        read_only
    }

    pub fn handle_input(&mut self, side: Side, gesture: InputGesture) -> InputVerdict {
        self.handle_input_at(side, gesture, Instant::now())
    }

    /// Classify a gesture at `now`. Edit attempts on a read-only pane are
    /// blocked and produce at most one warning per throttle interval.
    pub fn handle_input_at(&mut self, side: Side, gesture: InputGesture, now: Instant) -> InputVerdict {
        let pane = self.pane_mut(side);
        if !pane.read_only || !gesture.is_edit_attempt() {
            return InputVerdict::Allowed;
        }
        let warned = pane.throttle.try_fire(now);
        if warned {
            self.notifier.warn(format!(
                "The {} pane is read-only. Unlock it to edit.",
                side
            ));
        }
        InputVerdict::Blocked { warned }
    }

    /// Force a layout pass on the mounted widget
    pub fn refresh_layout(&mut self) {
        if let Some(widget) = self.widget.as_mut() {
            widget.layout();
        }
    }
}

impl BufferSyncController<MemoryWidget> {
    /// Feed queued widget notifications back through the controller.
    /// Returns how many were genuine edits.
    pub fn deliver_notifications(&mut self) -> usize {
        let sides = self
            .widget
            .as_mut()
            .map(|w| w.take_notifications())
            .unwrap_or_default();
        sides
            .into_iter()
            .filter(|side| self.handle_widget_change(*side))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify;

    fn controller() -> (BufferSyncController<MemoryWidget>, BufferEvents, notify::NoticeReceiver) {
        let (notifier, notices) = Notifier::channel();
        let (mut controller, events) = BufferSyncController::new("left", "right", notifier);
        controller.mount(MemoryWidget::new());
        controller.deliver_notifications();
        controller.idle_tick();
        (controller, events, notices)
    }

    #[test]
    fn test_mount_replays_initial_content() {
        let (controller, mut events, _) = controller();
        let widget = controller.widget().unwrap();
        assert_eq!(widget.text(Side::Left), "left");
        assert_eq!(widget.text(Side::Right), "right");
        assert!(events.try_recv().is_err());
        assert_eq!(controller.phase(Side::Left), Phase::Idle);
    }

    #[test]
    fn test_write_before_mount_is_buffered() {
        let (notifier, _notices) = Notifier::channel();
        let (mut controller, _events) =
            BufferSyncController::<MemoryWidget>::new("a", "b", notifier);

        assert_eq!(controller.set_content(Side::Left, "buffered"), WriteOutcome::Buffered);
        assert_eq!(controller.phase(Side::Left), Phase::AwaitingWidget);

        controller.mount(MemoryWidget::new());
        assert_eq!(controller.widget().unwrap().text(Side::Left), "buffered");
    }

    #[test]
    fn test_write_during_lock_is_deferred_until_idle() {
        let (mut controller, _events, _) = controller();

        assert_eq!(controller.set_content(Side::Left, "one"), WriteOutcome::Applied);
        assert_eq!(controller.set_content(Side::Left, "two"), WriteOutcome::Deferred);
        assert_eq!(controller.content(Side::Left), "two");
        assert_eq!(controller.widget().unwrap().text(Side::Left), "one");

        controller.idle_tick();
        assert_eq!(controller.widget().unwrap().text(Side::Left), "two");
        assert_eq!(controller.phase(Side::Left), Phase::ApplyingExternal);
    }

    #[test]
    fn test_sides_are_independent() {
        let (mut controller, _events, _) = controller();
        controller.set_content(Side::Left, "new left");

        assert_eq!(controller.phase(Side::Right), Phase::Idle);
        assert_eq!(controller.set_content(Side::Right, "new right"), WriteOutcome::Applied);
    }

    #[test]
    fn test_unmount_releases_listeners() {
        let (mut controller, _events, _) = controller();
        assert_eq!(controller.subscriptions().len(), 4);

        let widget = controller.unmount().unwrap();
        assert_eq!(widget.active_listeners(), 0);
        assert!(controller.subscriptions().is_empty());
        assert_eq!(controller.phase(Side::Right), Phase::AwaitingWidget);
    }
}
