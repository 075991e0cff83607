use pairline_core::AlertKind;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Last emission time per alert kind, gating alerts behind a cooldown.
#[derive(Debug, Clone)]
pub struct AlertState {
    cooldown: Duration,
    last_emitted: HashMap<AlertKind, Instant>,
}

impl AlertState {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_emitted: HashMap::new(),
        }
    }

    /// Records `now` and returns true unless `kind` was emitted less than
    /// one cooldown ago. A refused call leaves the state untouched.
    pub fn should_emit(&mut self, kind: AlertKind, now: Instant) -> bool {
        if let Some(last) = self.last_emitted.get(&kind) {
            // an instant before `last` saturates to zero and stays gated
            if now.saturating_duration_since(*last) < self.cooldown {
                return false;
            }
        }
        self.last_emitted.insert(kind, now);
        true
    }

    pub fn last_emitted(&self, kind: AlertKind) -> Option<Instant> {
        self.last_emitted.get(&kind).copied()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
