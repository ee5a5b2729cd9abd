//! Stability meter, streak and bounded stability history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const STABILITY_MIN: f64 = 0.0;
pub const STABILITY_MAX: f64 = 100.0;
pub const INITIAL_STABILITY: f64 = 50.0;

/// Reward for a correct concept check.
pub const STABILITY_BONUS: f64 = 10.0;
/// Penalty for a wrong concept check or a failed socratic defence.
pub const STABILITY_PENALTY: f64 = 15.0;
/// Reward for a passed socratic defence.
pub const SOCRATIC_BONUS: f64 = STABILITY_BONUS * 1.5;
/// Reward for a passed sync protocol challenge.
pub const SYNC_PASS_DELTA: f64 = 10.0;
/// Penalty for a failed sync protocol challenge.
pub const SYNC_FAIL_DELTA: f64 = -5.0;

/// Free text answers scoring at least this much pass.
pub const SOCRATIC_PASS_THRESHOLD: f64 = 70.0;

/// Maximum number of samples kept in [`StabilityHistory`].
pub const HISTORY_CAPACITY: usize = 20;

/// `clamp(stability + delta, 0, 100)`.
///
/// NaN deltas leave the value unchanged.
pub fn apply_stability_delta(stability: f64, delta: f64) -> f64 {
    let next = stability + delta;
    if next.is_nan() {
        return stability.clamp(STABILITY_MIN, STABILITY_MAX);
    }
    next.clamp(STABILITY_MIN, STABILITY_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub synced_nodes: u32,
    pub stability: f64,
    pub streak: u32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            synced_nodes: 0,
            stability: INITIAL_STABILITY,
            streak: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilitySample {
    pub time: usize,
    pub stability: f64,
}

/// Ring buffer of the most recent stability samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityHistory {
    samples: VecDeque<StabilitySample>,
}

impl StabilityHistory {
    /// History seeded with the starting stability at time zero.
    pub fn seeded(stability: f64) -> Self {
        let mut samples = VecDeque::with_capacity(HISTORY_CAPACITY);
        samples.push_back(StabilitySample { time: 0, stability });
        Self { samples }
    }

    pub fn empty() -> Self {
        Self {
            samples: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Appends `{time: len, stability}` and drops the oldest samples beyond
    /// [`HISTORY_CAPACITY`].
    pub fn record(&mut self, stability: f64) {
        let time = self.samples.len();
        self.samples.push_back(StabilitySample { time, stability });
        while self.samples.len() > HISTORY_CAPACITY {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&StabilitySample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StabilitySample> {
        self.samples.iter()
    }
}

impl Default for StabilityHistory {
    fn default() -> Self {
        Self::seeded(INITIAL_STABILITY)
    }
}

/// Stats plus history, updated together by every scored interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub stats: PlayerStats,
    pub history: StabilityHistory,
}

impl Scoreboard {
    /// Applies a scoring event and returns the new stability.
    ///
    /// Positive deltas extend the streak, anything else resets it.
    pub fn apply(&mut self, delta: f64) -> f64 {
        let stability = apply_stability_delta(self.stats.stability, delta);
        self.stats.stability = stability;
        if delta > 0.0 {
            self.stats.streak += 1;
        } else {
            self.stats.streak = 0;
        }
        self.history.record(stability);
        stability
    }
}
