//! Model change classification.
//!
//! The first value ever assigned to the field may be resolved; every later
//! change can only invalidate a required field, never validate it. Only a
//! selection or resolver commit turns the flag back on.

use tracing::trace;

/// Values longer than this are resolved on first assignment.
pub const RESOLVE_ON_ASSIGN_MIN_CHARS: usize = 2;
/// Required values shorter than this are invalid.
pub const REQUIRED_MIN_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WatchState {
    #[default]
    Initial,
    Steady {
        previous: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchDecision {
    NoOp,
    Resolve(String),
    Invalidate,
}

#[derive(Debug, Default)]
pub struct ModelChangeWatcher {
    state: WatchState,
}

fn char_len(value: Option<&str>) -> usize {
    value.map(|text| text.chars().count()).unwrap_or(0)
}

impl ModelChangeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// Classify a change of the bound value.
    pub fn observe(&mut self, value: Option<&str>, required: bool) -> WatchDecision {
        let decision = match &self.state {
            WatchState::Initial => match value {
                None => return WatchDecision::NoOp,
                Some(text) if char_len(Some(text)) > RESOLVE_ON_ASSIGN_MIN_CHARS => WatchDecision::Resolve(text.to_string()),
                Some(_) => WatchDecision::NoOp,
            },
            WatchState::Steady { previous } => {
                let new_len = char_len(value);
                let shrank = new_len < char_len(previous.as_deref());
                let empty = value.is_none_or(str::is_empty);
                if required && (empty || shrank || new_len < REQUIRED_MIN_CHARS) {
                    WatchDecision::Invalidate
                } else {
                    WatchDecision::NoOp
                }
            }
        };
        trace!(?decision, "model change classified");
        self.state = WatchState::Steady {
            previous: value.map(str::to_string),
        };
        decision
    }

    /// Record a value written by a commit path as the new baseline without classifying it.
    pub fn record_commit(&mut self, value: &str) {
        self.state = WatchState::Steady {
            previous: Some(value.to_string()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_long_assignment_resolves_once() {
        let mut watcher = ModelChangeWatcher::new();
        assert_eq!(watcher.observe(Some("Toronto"), false), WatchDecision::Resolve("Toronto".into()));
        assert_eq!(watcher.observe(Some("Toronto, ON"), false), WatchDecision::NoOp);
        assert_eq!(watcher.observe(Some("Montreal"), true), WatchDecision::NoOp);
    }

    #[test]
    fn undefined_first_value_keeps_initial_state() {
        let mut watcher = ModelChangeWatcher::new();
        assert_eq!(watcher.observe(None, true), WatchDecision::NoOp);
        assert_eq!(watcher.state(), &WatchState::Initial);
        assert_eq!(watcher.observe(Some("Oslo"), true), WatchDecision::Resolve("Oslo".into()));
    }

    #[test]
    fn short_first_assignment_moves_to_steady_without_resolving() {
        let mut watcher = ModelChangeWatcher::new();
        assert_eq!(watcher.observe(Some("NY"), false), WatchDecision::NoOp);
        assert!(matches!(watcher.state(), WatchState::Steady { .. }));
        assert_eq!(watcher.observe(Some("NYC Manhattan"), false), WatchDecision::NoOp);
    }

    #[test]
    fn required_field_invalidates_on_deletion_empty_or_short() {
        let mut watcher = ModelChangeWatcher::new();
        watcher.record_commit("10 Downing Street, London");
        assert_eq!(watcher.observe(Some("10 Downing Street, Londo"), true), WatchDecision::Invalidate);
        assert_eq!(watcher.observe(Some("10 Downing Street, London"), true), WatchDecision::NoOp);
        assert_eq!(watcher.observe(None, true), WatchDecision::Invalidate);
        assert_eq!(watcher.observe(Some(""), true), WatchDecision::Invalidate);
        assert_eq!(watcher.observe(Some("a"), true), WatchDecision::Invalidate);
    }

    #[test]
    fn optional_field_never_invalidates() {
        let mut watcher = ModelChangeWatcher::new();
        watcher.record_commit("Berlin");
        assert_eq!(watcher.observe(Some("B"), false), WatchDecision::NoOp);
        assert_eq!(watcher.observe(None, false), WatchDecision::NoOp);
    }
}
