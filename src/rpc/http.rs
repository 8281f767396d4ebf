//! HTTP adapters for the capability service and the paymaster

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;
use tracing::debug;

use super::{CapabilityIssuer, RpcError, TransactionSubmitter};
use crate::tx_builder::{layout::CAPABILITY_SIGNATURE_LEN, Capability};

/// Base58 run long enough to be a transaction signature
static SIGNATURE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[1-9A-HJ-NP-Za-km-z]{64,88}").expect("valid signature regex"));

/// Cast modes requested from the capability service
pub const DEFAULT_REQUESTED_MODES: u8 = 3;

#[derive(Debug, Serialize)]
struct CapabilityRequest {
    wallet: String,
    requested_modes: u8,
    program_id: String,
}

#[derive(Debug, Deserialize)]
struct CapabilityResponse {
    message_b64: String,
    signature_b64: String,
}

#[derive(Debug, Serialize)]
struct SponsorRequest<'a> {
    transaction: &'a str,
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, RpcError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RpcError::Transport {
            endpoint: "<client>".to_string(),
            message: e.to_string(),
        })
}

/// Capability issuer backed by the game's HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpCapabilityIssuer {
    client: reqwest::Client,
    url: String,
    requested_modes: u8,
}

impl HttpCapabilityIssuer {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RpcError> {
        Ok(Self {
            client: http_client(timeout)?,
            url: url.to_string(),
            requested_modes: DEFAULT_REQUESTED_MODES,
        })
    }

    pub fn with_requested_modes(mut self, modes: u8) -> Self {
        self.requested_modes = modes;
        self
    }
}

#[async_trait]
impl CapabilityIssuer for HttpCapabilityIssuer {
    async fn issue(&self, wallet: &Pubkey, program_id: &Pubkey) -> Result<Capability, RpcError> {
        let request = CapabilityRequest {
            wallet: wallet.to_string(),
            requested_modes: self.requested_modes,
            program_id: program_id.to_string(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::from_http_error(e, &self.url))?
            .error_for_status()
            .map_err(|e| RpcError::from_http_error(e, &self.url))?;

        let body: CapabilityResponse = response
            .json()
            .await
            .map_err(|e| RpcError::Decode(format!("capability response: {e}")))?;

        let message = STANDARD
            .decode(&body.message_b64)
            .map_err(|e| RpcError::Decode(format!("capability message: {e}")))?;
        let signature_bytes = STANDARD
            .decode(&body.signature_b64)
            .map_err(|e| RpcError::Decode(format!("capability signature: {e}")))?;
        let signature: [u8; CAPABILITY_SIGNATURE_LEN] =
            signature_bytes.as_slice().try_into().map_err(|_| {
                RpcError::Decode(format!(
                    "capability signature is {} bytes, expected {}",
                    signature_bytes.len(),
                    CAPABILITY_SIGNATURE_LEN
                ))
            })?;

        debug!(message_len = message.len(), "Capability issued");
        Ok(Capability { message, signature })
    }
}

/// Sponsored submission through the paymaster
#[derive(Debug, Clone)]
pub struct PaymasterSubmitter {
    client: reqwest::Client,
    url: String,
}

impl PaymasterSubmitter {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RpcError> {
        Ok(Self {
            client: http_client(timeout)?,
            url: url.to_string(),
        })
    }
}

/// Pull the transaction id out of a paymaster response body.
///
/// The paymaster answers with free-form text; anything mentioning `"error"`
/// is a rejection, otherwise the first signature-shaped run is the id.
pub fn parse_sponsor_response(body: &str, endpoint: &str) -> Result<Option<String>, RpcError> {
    if body.contains("\"error\"") {
        return Err(RpcError::Rejected {
            endpoint: endpoint.to_string(),
            message: body.chars().take(200).collect(),
        });
    }
    Ok(SIGNATURE_PATTERN.find(body).map(|m| m.as_str().to_string()))
}

#[async_trait]
impl TransactionSubmitter for PaymasterSubmitter {
    async fn submit(&self, signed_tx: &[u8]) -> Result<Option<String>, RpcError> {
        let encoded = STANDARD.encode(signed_tx);
        let body = self
            .client
            .post(&self.url)
            .json(&SponsorRequest {
                transaction: &encoded,
            })
            .send()
            .await
            .map_err(|e| RpcError::from_http_error(e, &self.url))?
            .text()
            .await
            .map_err(|e| RpcError::from_http_error(e, &self.url))?;

        parse_sponsor_response(&body, &self.url)
    }
}
