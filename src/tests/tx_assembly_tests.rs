//! Template patching against a realistic V0 cast transaction

use base64::{engine::general_purpose::STANDARD, Engine as _};
use solana_sdk::{
    hash::Hash,
    message::{v0::Message as MessageV0, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};

use crate::compat;
use crate::test_utils::{sample_capability, sample_template, sample_transaction};
use crate::tx_builder::{assemble, TransactionBuilderError, TxTemplate};
use crate::wallet::WalletManager;

struct Fixture {
    template: TxTemplate,
    session: WalletManager,
    program_id: Pubkey,
}

fn fixture() -> Fixture {
    let session = WalletManager::from_keypair(Keypair::new());
    let program_id = Pubkey::new_unique();
    let template = sample_template(&Pubkey::new_unique(), &session.pubkey(), &program_id);
    Fixture {
        template,
        session,
        program_id,
    }
}

#[test]
fn test_verify_instruction_carries_capability() {
    let f = fixture();
    let capability = sample_capability();

    let output = assemble(&f.template, Hash::new_unique(), &capability, 42, 7).unwrap();
    let data = &compat::get_instructions(&output.tx.message)[1].data;

    assert_eq!(data.len(), 112 + capability.message.len());
    assert_eq!(data[0], 1);
    assert_eq!(
        u16::from_le_bytes([data[12], data[13]]) as usize,
        capability.message.len()
    );
    assert_eq!(&data[48..112], &capability.signature);
    assert_eq!(&data[112..], capability.message.as_slice());
}

#[test]
fn test_cast_instruction_gets_slot_and_next_nonce() {
    let f = fixture();
    let template_data = compat::get_instructions(&f.template.transaction().message)[2]
        .data
        .clone();

    let output = assemble(&f.template, Hash::new_unique(), &sample_capability(), 987_654, 7).unwrap();
    let cast_ix = &compat::get_instructions(&output.tx.message)[2];
    let keys = compat::get_static_account_keys(&output.tx.message);
    assert_eq!(keys[cast_ix.program_id_index as usize], f.program_id);

    let data = &cast_ix.data;
    assert_eq!(u64::from_le_bytes(data[40..48].try_into().unwrap()), 987_654);
    assert_eq!(u64::from_le_bytes(data[49..57].try_into().unwrap()), 8);
    assert_eq!(&data[..40], &template_data[..40]);
    assert_eq!(data[48], template_data[48]);
    assert_eq!(&data[57..], &template_data[57..]);
}

#[test]
fn test_blockhash_replaced_and_template_untouched() {
    let f = fixture();
    let blockhash = Hash::new_unique();

    let output = assemble(&f.template, blockhash, &sample_capability(), 1, 1).unwrap();

    assert_eq!(*output.tx.message.recent_blockhash(), blockhash);
    assert_eq!(*f.template.transaction().message.recent_blockhash(), Hash::default());
    assert_eq!(
        compat::get_instructions(&output.tx.message)[0],
        compat::get_instructions(&f.template.transaction().message)[0]
    );
}

#[test]
fn test_template_needs_three_instructions() {
    let payer = Pubkey::new_unique();
    let ix = solana_sdk::instruction::Instruction::new_with_bytes(Pubkey::new_unique(), &[0u8; 64], vec![]);
    let message = MessageV0::try_compile(&payer, &[ix.clone(), ix], &[], Hash::default()).unwrap();
    let tx = VersionedTransaction {
        signatures: vec![Signature::default()],
        message: VersionedMessage::V0(message),
    };

    let err = TxTemplate::from_transaction(tx).unwrap_err();
    assert!(matches!(err, TransactionBuilderError::MalformedTemplate(_)));
    assert_eq!(err.category(), "template");
}

#[test]
fn test_partial_signature_fills_session_slot_only() {
    let f = fixture();
    let mut output = assemble(&f.template, Hash::new_unique(), &sample_capability(), 1, 1).unwrap();

    assert_eq!(output.required_signers().len(), 2);
    let signature = output.sign(&f.session).unwrap();

    assert_eq!(output.tx.signatures.len(), 2);
    assert_eq!(output.tx.signatures[0], Signature::default());
    assert_eq!(output.tx.signatures[1], signature);
    assert!(signature.verify(f.session.pubkey().as_ref(), &output.tx.message.serialize()));
}

#[test]
fn test_signing_with_foreign_wallet_fails() {
    let f = fixture();
    let stranger = WalletManager::from_keypair(Keypair::new());
    let mut output = assemble(&f.template, Hash::new_unique(), &sample_capability(), 1, 1).unwrap();

    assert!(matches!(
        output.sign(&stranger),
        Err(TransactionBuilderError::Signing(_))
    ));
}

#[test]
fn test_base64_template_through_to_wire() {
    let session = Keypair::new();
    let program_id = Pubkey::new_unique();
    let raw = sample_transaction(&Pubkey::new_unique(), &session.pubkey(), &program_id);
    let encoded = STANDARD.encode(bincode::serialize(&raw).unwrap());

    let template = TxTemplate::from_base64(&encoded).unwrap();
    let mut output = assemble(&template, Hash::new_unique(), &sample_capability(), 5, 9).unwrap();
    output.sign(&WalletManager::from_keypair(session)).unwrap();

    let wire = STANDARD.decode(output.to_base64().unwrap()).unwrap();
    let decoded: VersionedTransaction = bincode::deserialize(&wire).unwrap();
    assert_eq!(decoded.message, output.tx.message);
    assert!(compat::get_static_account_keys(&decoded.message).contains(&program_id));
}

#[test]
fn test_bad_base64_is_malformed_template() {
    assert!(matches!(
        TxTemplate::from_base64("not base64 at all!"),
        Err(TransactionBuilderError::MalformedTemplate(_))
    ));
}
