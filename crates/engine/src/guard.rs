//! Focus-revert guard.
//!
//! After a resolution rewrites the field, the provider widget may put its own
//! text back when the input loses focus. The guard is a single slot: arming
//! replaces whatever was armed before, and the first focus loss consumes it.

use std::time::Duration;

use tracing::debug;

/// Delay used by the non-strict path; long enough to land after the widget's own rewrite.
pub const DEFERRED_REVERT_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertTiming {
    Immediate,
    Deferred(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmedGuard {
    pub text: String,
    pub timing: RevertTiming,
}

/// What the field must do when focus is lost with an armed guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertAction {
    Rewrite(String),
    Schedule { token: u64, delay: Duration },
}

#[derive(Debug, Default)]
pub struct RevertGuard {
    slot: Option<ArmedGuard>,
    scheduled: Option<(u64, String)>,
    next_token: u64,
}

impl RevertGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the guard with `text`. Any previously armed guard or scheduled rewrite is dropped.
    pub fn arm(&mut self, text: impl Into<String>, timing: RevertTiming) {
        let text = text.into();
        if self.slot.is_some() || self.scheduled.is_some() {
            debug!("replacing focus-revert guard");
        }
        self.scheduled = None;
        self.slot = Some(ArmedGuard { text, timing });
    }

    pub fn disarm(&mut self) {
        self.slot = None;
        self.scheduled = None;
    }

    pub fn armed(&self) -> Option<&ArmedGuard> {
        self.slot.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    pub fn has_scheduled_rewrite(&self) -> bool {
        self.scheduled.is_some()
    }

    /// Consume the armed guard, if any.
    pub fn on_focus_lost(&mut self) -> Option<RevertAction> {
        let ArmedGuard { text, timing } = self.slot.take()?;
        match timing {
            RevertTiming::Immediate => Some(RevertAction::Rewrite(text)),
            RevertTiming::Deferred(delay) => {
                self.next_token += 1;
                let token = self.next_token;
                self.scheduled = Some((token, text));
                Some(RevertAction::Schedule { token, delay })
            }
        }
    }

    /// Text to write when the timer for `token` elapses. Unknown or superseded tokens yield `None`.
    pub fn on_timer(&mut self, token: u64) -> Option<String> {
        match self.scheduled.take() {
            Some((scheduled_token, text)) if scheduled_token == token => Some(text),
            other => {
                self.scheduled = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_guard_fires_once() {
        let mut guard = RevertGuard::new();
        guard.arm("10 Downing Street, London", RevertTiming::Immediate);
        assert_eq!(
            guard.on_focus_lost(),
            Some(RevertAction::Rewrite("10 Downing Street, London".into()))
        );
        assert_eq!(guard.on_focus_lost(), None);
    }

    #[test]
    fn arming_replaces_previous_guard() {
        let mut guard = RevertGuard::new();
        guard.arm("first", RevertTiming::Immediate);
        guard.arm("second", RevertTiming::Immediate);
        assert_eq!(guard.armed().map(|armed| armed.text.as_str()), Some("second"));
        assert_eq!(guard.on_focus_lost(), Some(RevertAction::Rewrite("second".into())));
        assert!(!guard.is_armed());
    }

    #[test]
    fn deferred_guard_schedules_and_matches_token() {
        let mut guard = RevertGuard::new();
        guard.arm("Paris, France", RevertTiming::Deferred(DEFERRED_REVERT_DELAY));
        let Some(RevertAction::Schedule { token, delay }) = guard.on_focus_lost() else {
            panic!("expected a scheduled rewrite");
        };
        assert_eq!(delay, DEFERRED_REVERT_DELAY);
        assert_eq!(guard.on_timer(token + 1), None);
        assert_eq!(guard.on_timer(token), Some("Paris, France".into()));
        assert_eq!(guard.on_timer(token), None);
    }

    #[test]
    fn rearming_drops_scheduled_rewrite() {
        let mut guard = RevertGuard::new();
        guard.arm("Paris, France", RevertTiming::Deferred(DEFERRED_REVERT_DELAY));
        let Some(RevertAction::Schedule { token, .. }) = guard.on_focus_lost() else {
            panic!("expected a scheduled rewrite");
        };
        guard.arm("Lyon, France", RevertTiming::Immediate);
        assert_eq!(guard.on_timer(token), None);
    }
}
