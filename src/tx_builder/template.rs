//! Immutable transaction template
//!
//! The template is a fully formed cast transaction captured once from the
//! game client. It is decoded and layout-checked at startup, then shared
//! read-only; every attempt clones it before patching.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use solana_sdk::transaction::VersionedTransaction;

use super::errors::TransactionBuilderError;
use super::layout::{
    CAST_DATA_MIN_LEN, CAST_IX_INDEX, MIN_INSTRUCTIONS, VERIFY_HEADER_LEN, VERIFY_IX_INDEX,
};
use crate::compat;

#[derive(Debug, Clone)]
pub struct TxTemplate {
    tx: VersionedTransaction,
}

impl TxTemplate {
    /// Decode a base64 wire-format transaction.
    pub fn from_base64(encoded: &str) -> Result<Self, TransactionBuilderError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| TransactionBuilderError::malformed(format!("base64 decode failed: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Decode a wire-format transaction.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionBuilderError> {
        let tx: VersionedTransaction = bincode::deserialize(bytes).map_err(|e| {
            TransactionBuilderError::malformed(format!("transaction decode failed: {e}"))
        })?;
        Self::from_transaction(tx)
    }

    pub fn from_transaction(tx: VersionedTransaction) -> Result<Self, TransactionBuilderError> {
        check_layout(&tx)?;
        Ok(Self { tx })
    }

    pub fn transaction(&self) -> &VersionedTransaction {
        &self.tx
    }
}

/// Ensure the instructions we patch exist and are long enough to patch.
pub(crate) fn check_layout(tx: &VersionedTransaction) -> Result<(), TransactionBuilderError> {
    let instructions = compat::get_instructions(&tx.message);
    if instructions.len() < MIN_INSTRUCTIONS {
        return Err(TransactionBuilderError::malformed(format!(
            "expected at least {} instructions, found {}",
            MIN_INSTRUCTIONS,
            instructions.len()
        )));
    }

    let verify_len = instructions[VERIFY_IX_INDEX].data.len();
    if verify_len < VERIFY_HEADER_LEN {
        return Err(TransactionBuilderError::malformed(format!(
            "verify instruction data is {} bytes, need at least {}",
            verify_len, VERIFY_HEADER_LEN
        )));
    }

    let cast_len = instructions[CAST_IX_INDEX].data.len();
    if cast_len < CAST_DATA_MIN_LEN {
        return Err(TransactionBuilderError::malformed(format!(
            "cast instruction data is {} bytes, need at least {}",
            cast_len, CAST_DATA_MIN_LEN
        )));
    }

    Ok(())
}
