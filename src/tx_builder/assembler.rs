//! Template patching
//!
//! Three regions of the template change per attempt:
//! 1. the recent blockhash
//! 2. the capability signature and message inside the verify instruction
//! 3. the slot and expected cast count inside the cast instruction
//!
//! Everything else is carried over byte for byte.

use solana_sdk::hash::Hash;

use super::errors::TransactionBuilderError;
use super::layout::*;
use super::output::TxBuildOutput;
use super::template::{check_layout, TxTemplate};
use crate::compat;

/// Short-lived authorization issued by the game backend
#[derive(Clone, PartialEq, Eq)]
pub struct Capability {
    pub message: Vec<u8>,
    pub signature: [u8; CAPABILITY_SIGNATURE_LEN],
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("message_len", &self.message.len())
            .field("signature", &bs58::encode(self.signature).into_string())
            .finish()
    }
}

/// Build fresh verify-instruction data from the template's header.
pub fn patch_verify_data(
    template_data: &[u8],
    capability: &Capability,
) -> Result<Vec<u8>, TransactionBuilderError> {
    if template_data.len() < VERIFY_HEADER_LEN {
        return Err(TransactionBuilderError::malformed(format!(
            "verify instruction data is {} bytes, need at least {}",
            template_data.len(),
            VERIFY_HEADER_LEN
        )));
    }

    let message_len = u16::try_from(capability.message.len()).map_err(|_| {
        TransactionBuilderError::CapabilityTooLarge {
            len: capability.message.len(),
            max: u16::MAX as usize,
        }
    })?;

    let mut data = vec![0u8; VERIFY_MESSAGE_OFFSET + capability.message.len()];
    data[..VERIFY_HEADER_LEN].copy_from_slice(&template_data[..VERIFY_HEADER_LEN]);
    data[VERIFY_MESSAGE_LEN_OFFSET..VERIFY_MESSAGE_LEN_OFFSET + 2]
        .copy_from_slice(&message_len.to_le_bytes());
    data[VERIFY_SIGNATURE_OFFSET..VERIFY_MESSAGE_OFFSET].copy_from_slice(&capability.signature);
    data[VERIFY_MESSAGE_OFFSET..].copy_from_slice(&capability.message);
    Ok(data)
}

/// Overwrite slot and expected cast count in cast-instruction data.
///
/// `nonce` is the account's current cast count; the program expects the next one.
pub fn patch_cast_data(data: &mut [u8], slot: u64, nonce: u64) -> Result<(), TransactionBuilderError> {
    if data.len() < CAST_DATA_MIN_LEN {
        return Err(TransactionBuilderError::malformed(format!(
            "cast instruction data is {} bytes, need at least {}",
            data.len(),
            CAST_DATA_MIN_LEN
        )));
    }

    let expected = nonce
        .checked_add(1)
        .ok_or(TransactionBuilderError::NonceOverflow(nonce))?;

    data[CAST_SLOT_OFFSET..CAST_SLOT_OFFSET + 8].copy_from_slice(&slot.to_le_bytes());
    data[CAST_NONCE_OFFSET..CAST_NONCE_OFFSET + 8].copy_from_slice(&expected.to_le_bytes());
    Ok(())
}

/// Produce an unsigned envelope from the template.
pub fn assemble(
    template: &TxTemplate,
    blockhash: Hash,
    capability: &Capability,
    slot: u64,
    nonce: u64,
) -> Result<TxBuildOutput, TransactionBuilderError> {
    let mut tx = template.transaction().clone();
    check_layout(&tx)?;

    compat::set_recent_blockhash(&mut tx.message, blockhash);

    let instructions = compat::get_instructions_mut(&mut tx.message);
    let verify_data = patch_verify_data(&instructions[VERIFY_IX_INDEX].data, capability)?;
    instructions[VERIFY_IX_INDEX].data = verify_data;
    patch_cast_data(&mut instructions[CAST_IX_INDEX].data, slot, nonce)?;

    Ok(TxBuildOutput::new(tx))
}
