//! Test Utilities Module
//!
//! Deterministic stand-ins for the chain, the capability service and the
//! paymaster, plus builders for player records and cast templates.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::{v0::Message as MessageV0, VersionedMessage},
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::player_state::layout;
use crate::rpc::{AccountSource, CapabilityIssuer, ChainTip, RpcError, TransactionSubmitter};
use crate::tx_builder::{Capability, TxTemplate};

/// Transaction id returned by [`FakeChain`] unless told otherwise
pub const FAKE_TX_ID: &str =
    "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW";

/// Slot reported by [`FakeChain`]
pub const FAKE_SLOT: u64 = 250_000_000;

/// Raw player record with the given counters; other fields get fixed values
pub fn player_record(owner: &Pubkey, cast_count: u64, fish_caught_all_time: u64) -> Vec<u8> {
    let mut raw = vec![0u8; layout::RECORD_LEN];
    raw[..layout::DISCRIMINATOR_LEN].copy_from_slice(&[0xC5; 8]);
    raw[layout::OWNER_OFFSET..layout::OWNER_OFFSET + 32].copy_from_slice(owner.as_ref());
    raw[layout::ROD_LEVEL_OFFSET] = 2;
    raw[layout::BOAT_TIER_OFFSET] = 1;
    raw[layout::BUMP_OFFSET] = 254;
    put(&mut raw, layout::CAST_COUNT_OFFSET, &cast_count.to_le_bytes());
    put(&mut raw, layout::FISH_CAUGHT_OFFSET, &fish_caught_all_time.to_le_bytes());
    put(&mut raw, layout::POWER_OFFSET, &10u64.to_le_bytes());
    put(&mut raw, layout::MAX_DURABILITY_OFFSET, &100u32.to_le_bytes());
    put(&mut raw, layout::CURRENT_DURABILITY_OFFSET, &90u32.to_le_bytes());
    put(&mut raw, layout::SUPERCAST_REMAINING_OFFSET, &0u32.to_le_bytes());
    put(&mut raw, layout::LAST_DURABILITY_TS_OFFSET, &1_700_000_000i64.to_le_bytes());
    put(&mut raw, layout::UNPROCESSED_FISH_OFFSET, &0u64.to_le_bytes());
    raw
}

fn put(raw: &mut [u8], offset: usize, bytes: &[u8]) {
    raw[offset..offset + bytes.len()].copy_from_slice(bytes);
}

/// V0 cast transaction shaped like the captured client template.
///
/// `sponsor` pays fees and is signer 0, `session` is signer 1.
pub fn sample_transaction(sponsor: &Pubkey, session: &Pubkey, program_id: &Pubkey) -> VersionedTransaction {
    let budget = Instruction::new_with_bytes(Pubkey::new_unique(), &[2, 0x40, 0x0D, 0x03, 0x00], vec![]);

    // 48-byte header followed by a 64-byte signature and a 16-byte message
    let mut verify_data = vec![0u8; 112 + 16];
    verify_data[0] = 1;
    verify_data[12..14].copy_from_slice(&16u16.to_le_bytes());
    verify_data[48..112].copy_from_slice(&[0xAB; 64]);
    let verify = Instruction::new_with_bytes(Pubkey::new_unique(), &verify_data, vec![]);

    let mut cast_data: Vec<u8> = (0..64u8).collect();
    cast_data[40..48].copy_from_slice(&1u64.to_le_bytes());
    cast_data[49..57].copy_from_slice(&1u64.to_le_bytes());
    let cast = Instruction::new_with_bytes(
        *program_id,
        &cast_data,
        vec![
            AccountMeta::new(*session, true),
            AccountMeta::new(Pubkey::new_unique(), false),
        ],
    );

    let message = MessageV0::try_compile(sponsor, &[budget, verify, cast], &[], Hash::default())
        .expect("compile sample message");
    let num_signers = message.header.num_required_signatures as usize;

    VersionedTransaction {
        signatures: vec![Signature::default(); num_signers],
        message: VersionedMessage::V0(message),
    }
}

pub fn sample_template(sponsor: &Pubkey, session: &Pubkey, program_id: &Pubkey) -> TxTemplate {
    TxTemplate::from_transaction(sample_transaction(sponsor, session, program_id))
        .expect("sample template layout")
}

pub fn sample_capability() -> Capability {
    Capability {
        message: b"fogo-capability:cast:v1:0123456789".to_vec(),
        signature: [0x42; 64],
    }
}

/// Scripted chain, capability service and paymaster in one
///
/// Account reads are served from a queue; once the queue is empty the last
/// successful record is repeated.
#[derive(Clone)]
pub struct FakeChain {
    reads: Arc<Mutex<VecDeque<Result<Vec<u8>, RpcError>>>>,
    last_read: Arc<Mutex<Option<Vec<u8>>>>,
    fetch_count: Arc<AtomicUsize>,
    submitted: Arc<Mutex<Vec<Vec<u8>>>>,
    tx_id: Arc<Mutex<Option<String>>>,
    issue_error: Arc<Mutex<Option<RpcError>>>,
    blockhash: Hash,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            reads: Arc::new(Mutex::new(VecDeque::new())),
            last_read: Arc::new(Mutex::new(None)),
            fetch_count: Arc::new(AtomicUsize::new(0)),
            submitted: Arc::new(Mutex::new(Vec::new())),
            tx_id: Arc::new(Mutex::new(Some(FAKE_TX_ID.to_string()))),
            issue_error: Arc::new(Mutex::new(None)),
            blockhash: Hash::new_unique(),
        }
    }

    pub async fn push_record(&self, raw: Vec<u8>) {
        self.reads.lock().await.push_back(Ok(raw));
    }

    pub async fn push_error(&self, error: RpcError) {
        self.reads.lock().await.push_back(Err(error));
    }

    pub async fn set_tx_id(&self, tx_id: Option<String>) {
        *self.tx_id.lock().await = tx_id;
    }

    pub async fn fail_issue(&self, error: RpcError) {
        *self.issue_error.lock().await = Some(error);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub async fn submitted(&self) -> Vec<Vec<u8>> {
        self.submitted.lock().await.clone()
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }
}

impl Default for FakeChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountSource for FakeChain {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Vec<u8>, RpcError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        let next = self.reads.lock().await.pop_front();
        let mut last = self.last_read.lock().await;
        match next {
            Some(Ok(raw)) => {
                *last = Some(raw.clone());
                Ok(raw)
            }
            Some(Err(e)) => Err(e),
            None => last.clone().ok_or_else(|| RpcError::AccountNotFound {
                account: address.to_string(),
                endpoint: "fake".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ChainTip for FakeChain {
    async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
        Ok(self.blockhash)
    }

    async fn current_slot(&self) -> Result<u64, RpcError> {
        Ok(FAKE_SLOT)
    }
}

#[async_trait]
impl CapabilityIssuer for FakeChain {
    async fn issue(&self, _wallet: &Pubkey, _program_id: &Pubkey) -> Result<Capability, RpcError> {
        match self.issue_error.lock().await.clone() {
            Some(e) => Err(e),
            None => Ok(sample_capability()),
        }
    }
}

#[async_trait]
impl TransactionSubmitter for FakeChain {
    async fn submit(&self, signed_tx: &[u8]) -> Result<Option<String>, RpcError> {
        self.submitted.lock().await.push(signed_tx.to_vec());
        Ok(self.tx_id.lock().await.clone())
    }
}
