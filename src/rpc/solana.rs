//! JSON-RPC node adapter

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey};
use std::time::Duration;
use tracing::debug;

use super::{AccountSource, ChainTip, RpcError};

/// Account reads and chain tip over a single RPC endpoint
pub struct SolanaRpc {
    client: RpcClient,
    endpoint: String,
}

impl SolanaRpc {
    /// Reads use `confirmed` commitment, matching what the confirmation poll expects
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        Self {
            client: RpcClient::new_with_timeout_and_commitment(
                endpoint.to_string(),
                timeout,
                CommitmentConfig::confirmed(),
            ),
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl AccountSource for SolanaRpc {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Vec<u8>, RpcError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .await
            .map_err(|e| RpcError::from_client_error(e, &self.endpoint))?;

        match response.value {
            Some(account) => {
                debug!(account = %address, len = account.data.len(), slot = response.context.slot, "Fetched account");
                Ok(account.data)
            }
            None => Err(RpcError::AccountNotFound {
                account: address.to_string(),
                endpoint: self.endpoint.clone(),
            }),
        }
    }
}

#[async_trait]
impl ChainTip for SolanaRpc {
    async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| RpcError::from_client_error(e, &self.endpoint))
    }

    async fn current_slot(&self) -> Result<u64, RpcError> {
        self.client
            .get_slot()
            .await
            .map_err(|e| RpcError::from_client_error(e, &self.endpoint))
    }
}
