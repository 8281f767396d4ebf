//! Error types for template decoding, patching and signing
//!
//! Every variant here is structural: it indicates the template or its inputs
//! do not match the expected layout, so none of them are worth retrying.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransactionBuilderError {
    /// Template could not be decoded, or is missing the patched instructions
    ///
    /// Usually means the on-chain program changed its instruction layout and
    /// a fresh template has to be captured.
    #[error("Malformed transaction template: {0}")]
    MalformedTemplate(String),

    /// Capability message does not fit the 2-byte length field
    #[error("Capability message too large: {len} bytes (max {max})")]
    CapabilityTooLarge { len: usize, max: usize },

    /// `nonce + 1` is not representable
    #[error("Nonce overflow: current cast count {0} cannot be advanced")]
    NonceOverflow(u64),

    /// Wallet is not a required signer of the template
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl TransactionBuilderError {
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedTemplate(_) => "template",
            Self::CapabilityTooLarge { .. } => "capability",
            Self::NonceOverflow(_) => "nonce",
            Self::Signing(_) => "signing",
            Self::Serialization(_) => "serialization",
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedTemplate(reason.into())
    }
}
