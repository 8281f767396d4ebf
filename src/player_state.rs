//! Player account record decoding
//!
//! The fishing program stores one fixed-size record per player at a PDA
//! derived from `["player", owner]`. The layout below is a contract with the
//! on-chain program and must be re-validated whenever the program upgrades.
//!
//! ```text
//! [0..8)    discriminator (skipped)
//! [8..40)   owner                 Pubkey
//! [40]      rod_level             u8
//! [41]      boat_tier             u8
//! [42]      bump                  u8
//! [43..51)  cast_count            u64 LE
//! [51..59)  fish_caught_all_time  u64 LE
//! [59..67)  power                 u64 LE
//! [67..71)  max_durability        u32 LE
//! [71..75)  current_durability    u32 LE
//! [75..79)  supercast_remaining   u32 LE
//! [79..87)  last_durability_ts    i64 LE
//! [87..95)  unprocessed_fish      u64 LE
//! ```

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Player record layout, version 1.
pub mod layout {
    pub const DISCRIMINATOR_LEN: usize = 8;
    pub const OWNER_OFFSET: usize = 8;
    pub const ROD_LEVEL_OFFSET: usize = 40;
    pub const BOAT_TIER_OFFSET: usize = 41;
    pub const BUMP_OFFSET: usize = 42;
    pub const CAST_COUNT_OFFSET: usize = 43;
    pub const FISH_CAUGHT_OFFSET: usize = 51;
    pub const POWER_OFFSET: usize = 59;
    pub const MAX_DURABILITY_OFFSET: usize = 67;
    pub const CURRENT_DURABILITY_OFFSET: usize = 71;
    pub const SUPERCAST_REMAINING_OFFSET: usize = 75;
    pub const LAST_DURABILITY_TS_OFFSET: usize = 79;
    pub const UNPROCESSED_FISH_OFFSET: usize = 87;

    /// Minimum record length
    pub const RECORD_LEN: usize = 95;
}

/// Seed prefix of the player PDA
pub const PLAYER_SEED: &[u8] = b"player";

/// Fish amounts are stored with 6 decimals
pub const FISH_DECIMALS: f64 = 1e6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateDecodeError {
    #[error("Truncated player record: need at least {expected} bytes, got {actual}")]
    TruncatedRecord { expected: usize, actual: usize },
}

/// Decoded player account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAccountState {
    /// Base58 owner address
    pub owner: String,
    pub rod_level: u8,
    pub boat_tier: u8,
    pub bump: u8,
    /// Per-account nonce; advances once per confirmed cast
    pub cast_count: u64,
    pub fish_caught_all_time: u64,
    pub power: u64,
    pub max_durability: u32,
    pub current_durability: u32,
    pub supercast_remaining: u32,
    pub last_durability_ts: i64,
    pub unprocessed_fish: u64,
}

impl PlayerAccountState {
    /// Decode a raw account buffer. Bytes past the record are ignored.
    pub fn decode(raw: &[u8]) -> Result<Self, StateDecodeError> {
        use layout::*;

        if raw.len() < RECORD_LEN {
            return Err(StateDecodeError::TruncatedRecord {
                expected: RECORD_LEN,
                actual: raw.len(),
            });
        }

        let mut reader = RecordReader::new(raw, DISCRIMINATOR_LEN);
        let owner = bs58::encode(reader.bytes::<32>()).into_string();
        let rod_level = reader.u8();
        let boat_tier = reader.u8();
        let bump = reader.u8();
        debug_assert_eq!(reader.offset, CAST_COUNT_OFFSET);
        let cast_count = reader.u64();
        let fish_caught_all_time = reader.u64();
        let power = reader.u64();
        let max_durability = reader.u32();
        let current_durability = reader.u32();
        let supercast_remaining = reader.u32();
        let last_durability_ts = reader.i64();
        let unprocessed_fish = reader.u64();
        debug_assert_eq!(reader.offset, RECORD_LEN);

        Ok(Self {
            owner,
            rod_level,
            boat_tier,
            bump,
            cast_count,
            fish_caught_all_time,
            power,
            max_durability,
            current_durability,
            supercast_remaining,
            last_durability_ts,
            unprocessed_fish,
        })
    }
}

/// Sequential little-endian reader over a length-checked buffer.
///
/// Callers validate the total length up front, so reads cannot go out of bounds.
struct RecordReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    fn new(buf: &'a [u8], offset: usize) -> Self {
        Self { buf, offset }
    }

    fn bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.offset..self.offset + N]);
        self.offset += N;
        out
    }

    fn u8(&mut self) -> u8 {
        self.bytes::<1>()[0]
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.bytes())
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.bytes())
    }

    fn i64(&mut self) -> i64 {
        i64::from_le_bytes(self.bytes())
    }
}

/// Address of the player record owned by `owner`.
pub fn player_state_address(owner: &Pubkey, program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[PLAYER_SEED, owner.as_ref()], program_id).0
}

/// Render a raw fish amount with three decimals.
pub fn format_fish(raw: u64) -> String {
    format!("{:.3}", raw as f64 / FISH_DECIMALS)
}
