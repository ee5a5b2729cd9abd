//! Bookkeeping for in-flight generator calls.
//!
//! Each call is keyed by what it targets (a concept id or a question index)
//! so a completion can be matched against the entity it was issued for.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum OperationKind {
    DeepDive,
    Challenge,
    ChallengeEvaluation,
    SocraticEvaluation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationKey {
    pub kind: OperationKind,
    pub target: String,
}

impl OperationKey {
    pub fn new(kind: OperationKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message")]
pub enum OperationState {
    Pending,
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct OperationTracker {
    operations: HashMap<OperationKey, OperationState>,
}

impl OperationTracker {
    /// Marks `key` pending. Returns `false` when it already is.
    pub fn start(&mut self, key: OperationKey) -> bool {
        if self.is_pending(&key) {
            return false;
        }
        self.operations.insert(key, OperationState::Pending);
        true
    }

    pub fn succeed(&mut self, key: OperationKey) {
        self.operations.insert(key, OperationState::Succeeded);
    }

    pub fn fail(&mut self, key: OperationKey, message: impl Into<String>) {
        self.operations
            .insert(key, OperationState::Failed(message.into()));
    }

    pub fn is_pending(&self, key: &OperationKey) -> bool {
        matches!(self.operations.get(key), Some(OperationState::Pending))
    }

    pub fn state(&self, key: &OperationKey) -> Option<&OperationState> {
        self.operations.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_start_refused_while_pending() {
        let mut tracker = OperationTracker::default();
        let key = OperationKey::new(OperationKind::DeepDive, "c1");
        assert!(tracker.start(key.clone()));
        assert!(!tracker.start(key.clone()));

        tracker.fail(key.clone(), "timeout");
        assert_eq!(
            tracker.state(&key),
            Some(&OperationState::Failed("timeout".to_string()))
        );
        assert!(tracker.start(key));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut tracker = OperationTracker::default();
        tracker.start(OperationKey::new(OperationKind::DeepDive, "c1"));
        assert!(!tracker.is_pending(&OperationKey::new(OperationKind::DeepDive, "c2")));
        assert!(!tracker.is_pending(&OperationKey::new(OperationKind::Challenge, "c1")));
        assert!(tracker.is_pending(&OperationKey::new(OperationKind::DeepDive, "c1")));
    }
}
