//! Assembled transaction ready for signing and broadcast
//!
//! The cast template is co-signed: a sponsor (the paymaster) pays fees and
//! signs server-side, while the session key signs locally. Signing here is
//! therefore partial: only the wallet's own slot is filled, every other slot
//! keeps whatever the template carried.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Signature, Signer},
    transaction::VersionedTransaction,
};

use crate::compat;
use crate::tx_builder::errors::TransactionBuilderError;
use crate::wallet::WalletManager;

/// Attempt-local transaction envelope
///
/// Built fresh from the template for every attempt and never shared.
#[derive(Debug, Clone)]
pub struct TxBuildOutput {
    /// The patched transaction
    pub tx: VersionedTransaction,

    /// Extracted from message.header.num_required_signatures
    pub required_signers: Vec<Pubkey>,
}

impl TxBuildOutput {
    pub fn new(tx: VersionedTransaction) -> Self {
        let required_signers = compat::get_required_signers(&tx.message).to_vec();
        Self {
            tx,
            required_signers,
        }
    }

    pub fn required_signers(&self) -> &[Pubkey] {
        &self.required_signers
    }

    /// Sign the message at the wallet's signer slot.
    pub fn sign(&mut self, wallet: &WalletManager) -> Result<Signature, TransactionBuilderError> {
        let signer = wallet.pubkey();
        let index = compat::signer_index(&self.tx.message, &signer).ok_or_else(|| {
            TransactionBuilderError::Signing(format!(
                "{} is not a required signer of the template",
                signer
            ))
        })?;

        let required = compat::get_num_required_signatures(&self.tx.message) as usize;
        if self.tx.signatures.len() < required {
            self.tx.signatures.resize(required, Signature::default());
        }

        let signature = wallet.keypair().sign_message(&self.tx.message.serialize());
        self.tx.signatures[index] = signature;
        Ok(signature)
    }

    /// Wire-format bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionBuilderError> {
        bincode::serialize(&self.tx)
            .map_err(|e| TransactionBuilderError::Serialization(e.to_string()))
    }

    /// Wire-format bytes as base64, the form the paymaster accepts
    pub fn to_base64(&self) -> Result<String, TransactionBuilderError> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }
}
