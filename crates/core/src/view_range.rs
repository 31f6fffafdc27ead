//! Time-range selection for the trace minimap.
//!
//! The minimap emits a high-frequency stream of preview updates while a
//! selection handle is dragged and a single commit when it is released.
//! [`ViewRangeCoordinator`] keeps the two apart: previews never touch the
//! committed range, and every published range satisfies
//! `0 <= start <= end <= 1`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The selected window, as fractions of the trace duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeRange {
    pub current: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ViewRange {
    pub time: TimeRange,
}

impl ViewRange {
    pub fn full() -> Self {
        Self {
            time: TimeRange {
                current: [0.0, 1.0],
                cursor: None,
            },
        }
    }

    pub fn start(&self) -> f64 {
        self.time.current[0]
    }

    pub fn end(&self) -> f64 {
        self.time.current[1]
    }

    pub fn is_full(&self) -> bool {
        self.time.current == [0.0, 1.0]
    }
}

impl Default for ViewRange {
    fn default() -> Self {
        Self::full()
    }
}

/// A requested change to the view range. Carries intent only; the
/// coordinator decides what the resulting range is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "update", rename_all = "snake_case")]
pub enum ViewRangeTimeUpdate {
    /// A whole `[start, end]` selection.
    Range { start: f64, end: f64 },
    /// Moves only the hover cursor; `None` clears it.
    Cursor { cursor: Option<f64> },
    /// Drags the left handle, keeping the end the gesture started from.
    ShiftStart { start: f64 },
    /// Drags the right handle, keeping the start the gesture started from.
    ShiftEnd { end: f64 },
    /// Sweeps a new window from where the gesture began to where it is now.
    Reframe { anchor: f64, shift: f64 },
}

impl ViewRangeTimeUpdate {
    pub fn range(start: f64, end: f64) -> Self {
        Self::Range { start, end }
    }
}

/// What the minimap reports for a pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineEvent {
    Preview(ViewRangeTimeUpdate),
    Commit(ViewRangeTimeUpdate),
    /// Gesture ended without coordinates; the in-flight preview is committed.
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Dragging,
}

/// Receives ranges published by the coordinator.
pub trait ViewRangeListener {
    fn on_preview(&mut self, _preview: &ViewRange) {}

    fn on_commit(&mut self, committed: &ViewRange);
}

/// Single owner of the page's [`ViewRange`].
pub struct ViewRangeCoordinator {
    committed: ViewRange,
    /// Range the current handle gesture started from. Moves only when a
    /// drag begins or an absolute range is committed.
    base: [f64; 2],
    pending: Option<[f64; 2]>,
    hover: Option<f64>,
    listeners: Vec<Box<dyn ViewRangeListener>>,
}

impl ViewRangeCoordinator {
    pub fn new() -> Self {
        Self::with_range(ViewRange::full())
    }

    pub fn with_range(initial: ViewRange) -> Self {
        let [start, end] = normalize_bounds(initial.start(), initial.end(), [0.0, 1.0]);
        Self {
            committed: ViewRange {
                time: TimeRange {
                    current: [start, end],
                    cursor: initial.time.cursor.and_then(sanitize_cursor),
                },
            },
            base: [start, end],
            pending: None,
            hover: None,
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn ViewRangeListener>) {
        self.listeners.push(listener);
    }

    pub fn phase(&self) -> Phase {
        if self.pending.is_some() {
            Phase::Dragging
        } else {
            Phase::Idle
        }
    }

    /// The committed range. Previews are never visible here.
    pub fn current_range(&self) -> ViewRange {
        self.committed
    }

    /// What the minimap should draw right now: the in-flight selection
    /// while dragging, the committed range otherwise.
    pub fn preview(&self) -> ViewRange {
        ViewRange {
            time: TimeRange {
                current: self.pending.unwrap_or(self.committed.time.current),
                cursor: self.hover.or(self.committed.time.cursor),
            },
        }
    }

    /// Records an in-progress update. The latest call wins; the committed
    /// range is left alone.
    pub fn update_pending(&mut self, update: ViewRangeTimeUpdate) {
        match update {
            ViewRangeTimeUpdate::Cursor { cursor } => {
                self.hover = cursor.and_then(sanitize_cursor);
            }
            _ => {
                if self.pending.is_none() {
                    self.base = self.committed.time.current;
                }
                let bounds = self.resolve_bounds(update);
                if self.pending.is_none() {
                    tracing::trace!(start = bounds[0], end = bounds[1], "range drag started");
                }
                self.pending = Some(bounds);
            }
        }

        let preview = self.preview();
        for listener in &mut self.listeners {
            listener.on_preview(&preview);
        }
    }

    /// Finalizes an update and publishes it. Out-of-range values are
    /// clamped and inverted ranges are swapped; this never fails.
    ///
    /// Handle updates resolve against the range their gesture started from,
    /// so committing the same update again changes nothing. A cursor commit
    /// leaves an in-progress drag alone.
    pub fn commit(&mut self, update: ViewRangeTimeUpdate) {
        match update {
            ViewRangeTimeUpdate::Cursor { cursor } => {
                self.committed.time.cursor = cursor.and_then(sanitize_cursor);
                self.hover = None;
            }
            ViewRangeTimeUpdate::ShiftStart { .. } | ViewRangeTimeUpdate::ShiftEnd { .. } => {
                self.committed.time.current = self.resolve_bounds(update);
                self.end_drag();
            }
            ViewRangeTimeUpdate::Range { .. } | ViewRangeTimeUpdate::Reframe { .. } => {
                self.committed.time.current = self.resolve_bounds(update);
                self.base = self.committed.time.current;
                self.end_drag();
            }
        }
        self.publish();
    }

    /// Commits whatever the drag last previewed. Returns false, and changes
    /// nothing, when no drag is in progress.
    pub fn commit_pending(&mut self) -> bool {
        let Some(bounds) = self.pending else {
            return false;
        };
        self.committed.time.current = bounds;
        self.base = bounds;
        self.end_drag();
        self.publish();
        true
    }

    pub fn apply(&mut self, event: TimelineEvent) {
        match event {
            TimelineEvent::Preview(update) => self.update_pending(update),
            TimelineEvent::Commit(update) => self.commit(update),
            TimelineEvent::Release => {
                self.commit_pending();
            }
        }
    }

    fn end_drag(&mut self) {
        self.pending = None;
        self.hover = None;
    }

    fn publish(&mut self) {
        tracing::debug!(
            start = self.committed.start(),
            end = self.committed.end(),
            cursor = ?self.committed.time.cursor,
            "view range committed"
        );
        let committed = self.committed;
        for listener in &mut self.listeners {
            listener.on_commit(&committed);
        }
    }

    fn resolve_bounds(&self, update: ViewRangeTimeUpdate) -> [f64; 2] {
        let base = self.base;
        match update {
            ViewRangeTimeUpdate::Range { start, end } => normalize_bounds(start, end, base),
            ViewRangeTimeUpdate::ShiftStart { start } => normalize_bounds(start, base[1], base),
            ViewRangeTimeUpdate::ShiftEnd { end } => normalize_bounds(base[0], end, base),
            ViewRangeTimeUpdate::Reframe { anchor, shift } => {
                normalize_bounds(anchor, shift, base)
            }
            ViewRangeTimeUpdate::Cursor { .. } => self.committed.time.current,
        }
    }
}

impl Default for ViewRangeCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ViewRangeCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRangeCoordinator")
            .field("committed", &self.committed)
            .field("base", &self.base)
            .field("pending", &self.pending)
            .field("hover", &self.hover)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Clamps both bounds into `[0, 1]` and orders them. A NaN bound keeps the
/// corresponding bound of `fallback`.
pub fn normalize_bounds(start: f64, end: f64, fallback: [f64; 2]) -> [f64; 2] {
    let start = clamp_unit(start, fallback[0]);
    let end = clamp_unit(end, fallback[1]);
    if start <= end { [start, end] } else { [end, start] }
}

fn clamp_unit(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback.clamp(0.0, 1.0)
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn sanitize_cursor(value: f64) -> Option<f64> {
    (!value.is_nan()).then(|| value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default)]
    struct Recorded {
        previews: Vec<ViewRange>,
        commits: Vec<ViewRange>,
    }

    struct Recorder(Rc<RefCell<Recorded>>);

    impl ViewRangeListener for Recorder {
        fn on_preview(&mut self, preview: &ViewRange) {
            self.0.borrow_mut().previews.push(*preview);
        }

        fn on_commit(&mut self, committed: &ViewRange) {
            self.0.borrow_mut().commits.push(*committed);
        }
    }

    fn recording() -> (ViewRangeCoordinator, Rc<RefCell<Recorded>>) {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let mut coordinator = ViewRangeCoordinator::new();
        coordinator.add_listener(Box::new(Recorder(Rc::clone(&recorded))));
        (coordinator, recorded)
    }

    #[test]
    fn starts_idle_on_full_range() {
        let coordinator = ViewRangeCoordinator::new();
        assert_eq!(coordinator.phase(), Phase::Idle);
        assert!(coordinator.current_range().is_full());
        assert_eq!(coordinator.preview(), coordinator.current_range());
    }

    #[test]
    fn drag_then_commit_publishes_final_range_only() {
        let (mut coordinator, recorded) = recording();

        coordinator.update_pending(ViewRangeTimeUpdate::range(0.1, 0.3));
        assert!(coordinator.current_range().is_full());
        coordinator.update_pending(ViewRangeTimeUpdate::range(0.1, 0.5));
        assert!(coordinator.current_range().is_full());
        assert_eq!(coordinator.phase(), Phase::Dragging);
        assert_eq!(coordinator.preview().time.current, [0.1, 0.5]);

        coordinator.commit(ViewRangeTimeUpdate::range(0.1, 0.5));
        assert_eq!(coordinator.current_range().time.current, [0.1, 0.5]);
        assert_eq!(coordinator.phase(), Phase::Idle);

        let recorded = recorded.borrow();
        assert_eq!(recorded.previews.len(), 2);
        assert_eq!(recorded.previews[0].time.current, [0.1, 0.3]);
        assert_eq!(recorded.commits.len(), 1);
        assert_eq!(recorded.commits[0].time.current, [0.1, 0.5]);
    }

    #[test]
    fn abandoned_drag_leaves_committed_range() {
        let mut coordinator = ViewRangeCoordinator::new();
        coordinator.commit(ViewRangeTimeUpdate::range(0.2, 0.6));
        let before = coordinator.current_range();

        coordinator.update_pending(ViewRangeTimeUpdate::range(0.0, 0.1));
        coordinator.update_pending(ViewRangeTimeUpdate::ShiftEnd { end: 0.9 });
        coordinator.update_pending(ViewRangeTimeUpdate::Cursor { cursor: Some(0.4) });

        assert_eq!(coordinator.current_range(), before);
    }

    #[test]
    fn commit_clamps_out_of_range_bounds() {
        let mut coordinator = ViewRangeCoordinator::new();
        coordinator.commit(ViewRangeTimeUpdate::range(0.3, 0.4));
        coordinator.commit(ViewRangeTimeUpdate::range(-0.2, 1.4));
        assert_eq!(coordinator.current_range().time.current, [0.0, 1.0]);
    }

    #[test]
    fn commit_orders_inverted_bounds() {
        let mut coordinator = ViewRangeCoordinator::new();
        coordinator.commit(ViewRangeTimeUpdate::range(0.7, 0.3));
        let range = coordinator.current_range();
        assert!(range.start() <= range.end());
        assert_eq!(range.time.current, [0.3, 0.7]);
    }

    #[test]
    fn non_finite_bounds_are_normalized() {
        let mut coordinator = ViewRangeCoordinator::new();
        coordinator.commit(ViewRangeTimeUpdate::range(0.25, 0.75));
        coordinator.commit(ViewRangeTimeUpdate::range(f64::NAN, f64::INFINITY));
        assert_eq!(coordinator.current_range().time.current, [0.25, 1.0]);

        coordinator.commit(ViewRangeTimeUpdate::range(f64::NEG_INFINITY, f64::NAN));
        assert_eq!(coordinator.current_range().time.current, [0.0, 1.0]);
    }

    #[test]
    fn committing_twice_is_idempotent() {
        let updates = [
            ViewRangeTimeUpdate::range(0.9, 0.15),
            ViewRangeTimeUpdate::Cursor { cursor: Some(0.35) },
            ViewRangeTimeUpdate::Cursor { cursor: None },
            ViewRangeTimeUpdate::ShiftStart { start: 0.5 },
            ViewRangeTimeUpdate::ShiftStart { start: 0.95 },
            ViewRangeTimeUpdate::ShiftEnd { end: 0.1 },
            ViewRangeTimeUpdate::ShiftEnd { end: 0.6 },
            ViewRangeTimeUpdate::Reframe {
                anchor: 0.7,
                shift: 0.25,
            },
        ];
        for update in updates {
            let mut once = ViewRangeCoordinator::new();
            once.commit(ViewRangeTimeUpdate::range(0.2, 0.8));
            once.commit(update);

            let mut twice = ViewRangeCoordinator::new();
            twice.commit(ViewRangeTimeUpdate::range(0.2, 0.8));
            twice.commit(update);
            twice.commit(update);

            assert_eq!(once.current_range(), twice.current_range(), "{update:?}");
        }
    }

    #[test]
    fn handle_commit_after_drag_resolves_against_drag_start() {
        let mut coordinator = ViewRangeCoordinator::new();
        coordinator.commit(ViewRangeTimeUpdate::range(0.2, 0.8));

        coordinator.update_pending(ViewRangeTimeUpdate::ShiftEnd { end: 0.5 });
        coordinator.commit(ViewRangeTimeUpdate::ShiftEnd { end: 0.6 });
        assert_eq!(coordinator.current_range().time.current, [0.2, 0.6]);
        coordinator.commit(ViewRangeTimeUpdate::ShiftEnd { end: 0.6 });
        assert_eq!(coordinator.current_range().time.current, [0.2, 0.6]);

        coordinator.update_pending(ViewRangeTimeUpdate::ShiftStart { start: 0.4 });
        assert_eq!(coordinator.preview().time.current, [0.4, 0.6]);
        assert!(coordinator.commit_pending());
        assert_eq!(coordinator.current_range().time.current, [0.4, 0.6]);
    }

    #[test]
    fn cursor_commit_keeps_drag_in_progress() {
        let (mut coordinator, recorded) = recording();
        coordinator.update_pending(ViewRangeTimeUpdate::range(0.1, 0.5));
        coordinator.commit(ViewRangeTimeUpdate::Cursor { cursor: Some(0.3) });

        assert_eq!(coordinator.phase(), Phase::Dragging);
        assert!(coordinator.current_range().is_full());
        assert_eq!(coordinator.current_range().time.cursor, Some(0.3));
        assert_eq!(coordinator.preview().time.current, [0.1, 0.5]);
        assert_eq!(recorded.borrow().commits.len(), 1);

        coordinator.apply(TimelineEvent::Release);
        assert_eq!(coordinator.phase(), Phase::Idle);
        assert_eq!(coordinator.current_range().time.current, [0.1, 0.5]);
        assert_eq!(coordinator.current_range().time.cursor, Some(0.3));
        assert_eq!(recorded.borrow().commits.len(), 2);
    }

    #[test]
    fn cursor_preview_during_drag_keeps_pending_bounds() {
        let mut coordinator = ViewRangeCoordinator::new();
        coordinator.update_pending(ViewRangeTimeUpdate::range(0.2, 0.4));
        coordinator.update_pending(ViewRangeTimeUpdate::Cursor { cursor: Some(0.3) });

        assert_eq!(coordinator.phase(), Phase::Dragging);
        assert_eq!(coordinator.preview().time.current, [0.2, 0.4]);
        assert_eq!(coordinator.preview().time.cursor, Some(0.3));
        assert!(coordinator.commit_pending());
        assert_eq!(coordinator.current_range().time.current, [0.2, 0.4]);
    }

    #[test]
    fn handle_drags_keep_the_other_committed_bound() {
        let mut coordinator = ViewRangeCoordinator::new();
        coordinator.commit(ViewRangeTimeUpdate::range(0.2, 0.8));

        coordinator.update_pending(ViewRangeTimeUpdate::ShiftStart { start: 0.3 });
        coordinator.update_pending(ViewRangeTimeUpdate::ShiftStart { start: 0.4 });
        assert_eq!(coordinator.preview().time.current, [0.4, 0.8]);

        coordinator.commit(ViewRangeTimeUpdate::ShiftEnd { end: 0.1 });
        assert_eq!(coordinator.current_range().time.current, [0.1, 0.2]);
    }

    #[test]
    fn reframe_sweeps_from_anchor_in_either_direction() {
        let mut coordinator = ViewRangeCoordinator::new();
        coordinator.update_pending(ViewRangeTimeUpdate::Reframe {
            anchor: 0.6,
            shift: 0.35,
        });
        assert_eq!(coordinator.preview().time.current, [0.35, 0.6]);
        assert!(coordinator.current_range().is_full());
    }

    #[test]
    fn release_commits_latest_preview() {
        let (mut coordinator, recorded) = recording();
        coordinator.apply(TimelineEvent::Preview(ViewRangeTimeUpdate::range(0.1, 0.2)));
        coordinator.apply(TimelineEvent::Preview(ViewRangeTimeUpdate::range(0.1, 0.45)));
        coordinator.apply(TimelineEvent::Release);

        assert_eq!(coordinator.current_range().time.current, [0.1, 0.45]);
        assert_eq!(coordinator.phase(), Phase::Idle);
        assert_eq!(recorded.borrow().commits.len(), 1);
    }

    #[test]
    fn release_without_drag_is_a_no_op() {
        let (mut coordinator, recorded) = recording();
        assert!(!coordinator.commit_pending());
        coordinator.apply(TimelineEvent::Release);
        assert!(coordinator.current_range().is_full());
        assert!(recorded.borrow().commits.is_empty());
    }

    #[test]
    fn hover_cursor_is_preview_only_until_committed() {
        let mut coordinator = ViewRangeCoordinator::new();
        coordinator.update_pending(ViewRangeTimeUpdate::Cursor { cursor: Some(0.42) });
        assert_eq!(coordinator.phase(), Phase::Idle);
        assert_eq!(coordinator.preview().time.cursor, Some(0.42));
        assert_eq!(coordinator.current_range().time.cursor, None);

        coordinator.commit(ViewRangeTimeUpdate::Cursor { cursor: Some(1.7) });
        assert_eq!(coordinator.current_range().time.cursor, Some(1.0));
        assert_eq!(coordinator.current_range().time.current, [0.0, 1.0]);
    }

    #[test]
    fn initial_range_is_normalized() {
        let coordinator = ViewRangeCoordinator::with_range(ViewRange {
            time: TimeRange {
                current: [1.5, 0.5],
                cursor: Some(f64::NAN),
            },
        });
        assert_eq!(coordinator.current_range().time.current, [0.5, 1.0]);
        assert_eq!(coordinator.current_range().time.cursor, None);
    }

    #[test]
    fn update_serializes_with_tag() {
        let json = serde_json::to_value(ViewRangeTimeUpdate::range(0.1, 0.5)).unwrap();
        assert_eq!(json["update"], "range");
        let parsed: ViewRangeTimeUpdate =
            serde_json::from_str(r#"{"update":"shift_end","end":0.4}"#).unwrap();
        assert_eq!(parsed, ViewRangeTimeUpdate::ShiftEnd { end: 0.4 });
    }
}
