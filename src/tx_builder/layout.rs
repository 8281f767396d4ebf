//! Instruction data layout of the cast transaction, version 1.
//!
//! These offsets are a contract with two external programs: the Ed25519
//! signature-verification precompile (instruction 1) and the fishing program's
//! cast instruction (instruction 2). A template captured against a different
//! program version must be checked against them before use.
//!
//! ```text
//! instruction[1]  ed25519 verify
//!   [0..48)     header and offsets block, copied from the template
//!   [12..14)    message length, u16 LE (overwritten)
//!   [48..112)   capability signature
//!   [112..)     capability message
//!
//! instruction[2]  cast
//!   [40..48)    slot, u64 LE
//!   [49..57)    expected cast count (nonce + 1), u64 LE
//! ```

/// Index of the signature-verification instruction
pub const VERIFY_IX_INDEX: usize = 1;

/// Index of the cast instruction
pub const CAST_IX_INDEX: usize = 2;

/// Minimum number of instructions a template must carry
pub const MIN_INSTRUCTIONS: usize = CAST_IX_INDEX + 1;

/// Leading bytes of the verify instruction copied verbatim
pub const VERIFY_HEADER_LEN: usize = 48;

/// Offset of the u16 message length inside the verify header
pub const VERIFY_MESSAGE_LEN_OFFSET: usize = 12;

pub const VERIFY_SIGNATURE_OFFSET: usize = 48;

pub const CAPABILITY_SIGNATURE_LEN: usize = 64;

pub const VERIFY_MESSAGE_OFFSET: usize = VERIFY_SIGNATURE_OFFSET + CAPABILITY_SIGNATURE_LEN;

pub const CAST_SLOT_OFFSET: usize = 40;

pub const CAST_NONCE_OFFSET: usize = 49;

/// Minimum data length of the cast instruction
pub const CAST_DATA_MIN_LEN: usize = CAST_NONCE_OFFSET + 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_follows_signature() {
        assert_eq!(VERIFY_MESSAGE_OFFSET, 112);
        assert_eq!(CAST_DATA_MIN_LEN, 57);
        assert!(VERIFY_MESSAGE_LEN_OFFSET + 2 <= VERIFY_HEADER_LEN);
    }
}
