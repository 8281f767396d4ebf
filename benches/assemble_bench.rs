//! Benchmarks for the per-attempt hot path
//!
//! Benchmarks:
//! - Template patching (blockhash, capability, slot/nonce)
//! - Partial signing plus wire serialization
//! - Player record decoding

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::{v0::Message as MessageV0, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::VersionedTransaction,
};

use castbot::player_state::PlayerAccountState;
use castbot::tx_builder::{assemble, Capability, TxTemplate};
use castbot::wallet::WalletManager;

/// Helper: three-instruction cast template co-signed by a sponsor and `session`
fn build_template(session: &Pubkey) -> TxTemplate {
    let sponsor = Pubkey::new_unique();
    let budget = Instruction::new_with_bytes(Pubkey::new_unique(), &[2, 0, 0, 0, 0], vec![]);
    let verify = Instruction::new_with_bytes(Pubkey::new_unique(), &[0u8; 160], vec![]);
    let cast = Instruction::new_with_bytes(
        Pubkey::new_unique(),
        &[0u8; 64],
        vec![AccountMeta::new(*session, true)],
    );

    let message = MessageV0::try_compile(&sponsor, &[budget, verify, cast], &[], Hash::default())
        .unwrap();
    let tx = VersionedTransaction {
        signatures: vec![Signature::default(); message.header.num_required_signatures as usize],
        message: VersionedMessage::V0(message),
    };
    TxTemplate::from_transaction(tx).unwrap()
}

fn bench_assemble(c: &mut Criterion) {
    let session = Keypair::new();
    let template = build_template(&session.pubkey());
    let blockhash = Hash::new_unique();

    let mut group = c.benchmark_group("assemble");
    for message_len in [32usize, 128, 512] {
        let capability = Capability {
            message: vec![7u8; message_len],
            signature: [9u8; 64],
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(message_len),
            &capability,
            |b, capability| {
                b.iter(|| {
                    assemble(
                        black_box(&template),
                        blockhash,
                        capability,
                        black_box(250_000_000),
                        black_box(41),
                    )
                    .unwrap()
                })
            },
        );
    }
    group.finish();
}

fn bench_sign_and_serialize(c: &mut Criterion) {
    let session = Keypair::new();
    let template = build_template(&session.pubkey());
    let wallet = WalletManager::from_keypair(session);
    let capability = Capability {
        message: vec![7u8; 128],
        signature: [9u8; 64],
    };

    c.bench_function("assemble_sign_base64", |b| {
        b.iter(|| {
            let mut output = assemble(&template, Hash::new_unique(), &capability, 1, 1).unwrap();
            output.sign(&wallet).unwrap();
            black_box(output.to_base64().unwrap())
        })
    });
}

fn bench_decode_player(c: &mut Criterion) {
    let raw = vec![1u8; 95];
    c.bench_function("decode_player_record", |b| {
        b.iter(|| PlayerAccountState::decode(black_box(&raw)).unwrap())
    });
}

criterion_group!(benches, bench_assemble, bench_sign_and_serialize, bench_decode_player);
criterion_main!(benches);
