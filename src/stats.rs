//! Session statistics, owned by the outer cast loop

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::player_state::format_fish;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Attempts started
    pub casts: u64,
    /// Attempts confirmed by a cast-count advance
    pub successes: u64,
    /// Attempts that timed out, got no transaction id, or errored
    pub failures: u64,
    /// Sum of confirmed fish deltas (raw units)
    pub total_fish: u64,
    pub started_at: DateTime<Utc>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            casts: 0,
            successes: 0,
            failures: 0,
            total_fish: 0,
            started_at: Utc::now(),
        }
    }

    pub fn record_success(&mut self, fish_delta: u64) {
        self.casts += 1;
        self.successes += 1;
        self.total_fish = self.total_fish.saturating_add(fish_delta);
    }

    pub fn record_failure(&mut self) {
        self.casts += 1;
        self.failures += 1;
    }

    pub fn success_rate(&self) -> f64 {
        if self.casts == 0 {
            0.0
        } else {
            self.successes as f64 / self.casts as f64
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Total fish: {}, {}/{} success ({} failed)",
            format_fish(self.total_fish),
            self.successes,
            self.casts,
            self.failures
        )
    }
}
