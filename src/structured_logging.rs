//! Structured logging for cast attempts

use crate::observability::CorrelationId;
use crate::player_state::format_fish;
use crate::stats::SessionStats;

/// Logger bound to a single cast attempt
#[derive(Debug, Clone)]
pub struct CastLogger {
    correlation_id: CorrelationId,
    cast_number: u64,
}

impl CastLogger {
    pub fn new(cast_number: u64) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            cast_number,
        }
    }

    pub fn log_attempt_start(&self, cast_count: u64) {
        tracing::info!(
            context_id = %self.correlation_id.short(),
            cast = self.cast_number,
            cast_count,
            "Cast attempt started"
        );
    }

    pub fn log_submitted(&self, tx_id: &str) {
        tracing::debug!(
            context_id = %self.correlation_id.short(),
            cast = self.cast_number,
            signature = %tx_id,
            "Cast submitted"
        );
    }

    pub fn log_poll(&self, poll: u32, cast_count: u64) {
        tracing::debug!(
            context_id = %self.correlation_id.short(),
            cast = self.cast_number,
            poll,
            cast_count,
            "Polled player state"
        );
    }

    pub fn log_confirmed(&self, fish_delta: u64, polls: u32, stats: &SessionStats) {
        tracing::info!(
            context_id = %self.correlation_id.short(),
            cast = self.cast_number,
            polls,
            "✅ +{} FISH | Total: {} | {}/{} success",
            format_fish(fish_delta),
            format_fish(stats.total_fish),
            stats.successes,
            stats.casts
        );
    }

    pub fn log_unconfirmed(&self, reason: &str, stats: &SessionStats) {
        tracing::warn!(
            context_id = %self.correlation_id.short(),
            cast = self.cast_number,
            reason = %reason,
            "❌ Failed | {}/{}",
            stats.successes,
            stats.casts
        );
    }

    pub fn log_error(&self, error: &str, category: &str, stats: &SessionStats) {
        tracing::error!(
            context_id = %self.correlation_id.short(),
            cast = self.cast_number,
            category = %category,
            error = %error,
            "❌ Error | {}/{}",
            stats.successes,
            stats.casts
        );
    }
}
