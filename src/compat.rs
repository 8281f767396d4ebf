//! Compatibility layer over `VersionedMessage`
//!
//! Transaction templates may arrive as either Legacy or V0 messages. Both carry
//! the same header, static keys and compiled instructions behind different
//! types; these helpers give the assembler a single view of them.

use solana_sdk::{
    hash::Hash,
    instruction::CompiledInstruction,
    message::{MessageHeader, VersionedMessage},
    pubkey::Pubkey,
};

#[inline]
#[must_use]
pub fn get_message_header(message: &VersionedMessage) -> &MessageHeader {
    match message {
        VersionedMessage::Legacy(legacy_msg) => &legacy_msg.header,
        VersionedMessage::V0(v0_msg) => &v0_msg.header,
    }
}

/// Static account keys (lookup-table addresses are not included for V0).
#[inline]
#[must_use]
pub fn get_static_account_keys(message: &VersionedMessage) -> &[Pubkey] {
    match message {
        VersionedMessage::Legacy(legacy_msg) => &legacy_msg.account_keys,
        VersionedMessage::V0(v0_msg) => &v0_msg.account_keys,
    }
}

/// Accounts that must sign, always the first `num_required_signatures` static keys.
#[inline]
#[must_use]
pub fn get_required_signers(message: &VersionedMessage) -> &[Pubkey] {
    let header = get_message_header(message);
    let account_keys = get_static_account_keys(message);
    let num_signers = header.num_required_signatures as usize;

    &account_keys[..num_signers.min(account_keys.len())]
}

#[inline]
#[must_use]
pub fn get_num_required_signatures(message: &VersionedMessage) -> u8 {
    get_message_header(message).num_required_signatures
}

/// Position of `signer` among the required signers, if it is one.
#[must_use]
pub fn signer_index(message: &VersionedMessage, signer: &Pubkey) -> Option<usize> {
    get_required_signers(message)
        .iter()
        .position(|key| key == signer)
}

#[inline]
#[must_use]
pub fn get_instructions(message: &VersionedMessage) -> &[CompiledInstruction] {
    message.instructions()
}

/// Mutable access to the compiled instructions, for in-place data patching.
#[inline]
pub fn get_instructions_mut(message: &mut VersionedMessage) -> &mut Vec<CompiledInstruction> {
    match message {
        VersionedMessage::Legacy(legacy_msg) => &mut legacy_msg.instructions,
        VersionedMessage::V0(v0_msg) => &mut v0_msg.instructions,
    }
}

#[inline]
pub fn set_recent_blockhash(message: &mut VersionedMessage, blockhash: Hash) {
    match message {
        VersionedMessage::Legacy(legacy_msg) => legacy_msg.recent_blockhash = blockhash,
        VersionedMessage::V0(v0_msg) => v0_msg.recent_blockhash = blockhash,
    }
}
