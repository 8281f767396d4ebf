//! External collaborators
//!
//! The cast engine never talks to the network directly. It consumes the four
//! narrow traits below; production adapters live in [`solana`] and [`http`],
//! and tests substitute scripted fakes.

use async_trait::async_trait;
use solana_sdk::{hash::Hash, pubkey::Pubkey};

use crate::tx_builder::Capability;

pub mod errors;
pub mod http;
pub mod solana;

pub use errors::RpcError;
pub use http::{HttpCapabilityIssuer, PaymasterSubmitter};
pub use solana::SolanaRpc;

/// Raw account reads
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// Fetch raw account data, or [`RpcError::AccountNotFound`]
    async fn fetch_account(&self, address: &Pubkey) -> Result<Vec<u8>, RpcError>;
}

/// Chain tip information needed to build a fresh transaction
#[async_trait]
pub trait ChainTip: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash, RpcError>;

    async fn current_slot(&self) -> Result<u64, RpcError>;
}

/// Issues short-lived cast authorizations
#[async_trait]
pub trait CapabilityIssuer: Send + Sync {
    async fn issue(&self, wallet: &Pubkey, program_id: &Pubkey) -> Result<Capability, RpcError>;
}

/// Broadcasts signed transactions
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Returns the transaction id, or `None` when the transport accepted the
    /// request without reporting one
    async fn submit(&self, signed_tx: &[u8]) -> Result<Option<String>, RpcError>;
}
