//! castbot - automated fishing casts on a Fogo program
//!
//! This library exposes the core modules for the binary, tests and
//! integration purposes.
//!
//! - [`keys`]: session-key container conversion
//! - [`player_state`]: fixed-layout player record decoding
//! - [`tx_builder`]: template patching and partial signing
//! - [`cast_engine`]: cast attempt state machine and session loop
//! - [`rpc`]: collaborator traits and their network adapters

pub mod cast_engine;
pub mod compat;
pub mod config;
pub mod endpoints;
pub mod keys;
pub mod metrics;
pub mod observability;
pub mod player_state;
pub mod rpc;
pub mod stats;
pub mod structured_logging;
pub mod tx_builder;
pub mod wallet;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use cast_engine::{CastEngine, CastError, CastOutcome, CastResult, CastSession};
pub use player_state::PlayerAccountState;
pub use solana_sdk::{message::VersionedMessage, pubkey::Pubkey, signature::Signature};
pub use stats::SessionStats;
