use std::sync::Arc;

use tonkey_cosign::cell::{boc, Cell, CellBuilder};
use tonkey_cosign::multisig::{build_chain, parse_authorization, verify, KeyPair, Signer};
use tonkey_cosign::wallet::{resolve_key, DerivationScheme};
use tonkey_cosign::{
    CosignSession, CosignSettings, ErrorCode, ParticipantInput, SessionState, TonAddress,
};

const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const ZOO: &str = "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong";
const LEGAL: &str = "legal winner thank year wave sausage worth useful legal winner thank yellow";

const TX_HASH: &str = "8da63e8b87b37ae43c83787be78b6cb66eb914b3fd487a20fb33ed4ac60a5bc7";
const ORDER_BOC: &str = "b5ee9c7241010201004800011e00008e388cae08ac0000000100000301006842000d4657ab40e2a465a4a8b16229e180b483bd4ca12ff56e88288cbc34dbfa4f9f202faf080000000000000000000000000000d7be5224";
const WALLET: &str = "EQA73dVDgA1DyuhDsdSQR6cdpR9H8gM5lrnso-huxy6iBIDZ";

fn digest() -> [u8; 32] {
    hex::decode(TX_HASH).unwrap().try_into().unwrap()
}

fn order() -> Cell {
    boc::from_boc(&hex::decode(ORDER_BOC).unwrap()).unwrap()
}

fn session(threshold: u32, settings: CosignSettings) -> CosignSession {
    CosignSession::new(
        TonAddress::from_string(WALLET).unwrap(),
        threshold,
        &digest(),
        order(),
        settings,
    )
    .unwrap()
}

fn participant(scheme: DerivationScheme, mnemonic: &str, index: u8) -> ParticipantInput {
    ParticipantInput {
        scheme,
        mnemonic: mnemonic.to_string(),
        address: None,
        index,
        account_index: None,
    }
}

fn standard_key(mnemonic: &str) -> KeyPair {
    resolve_key(mnemonic, DerivationScheme::Standard, None, None)
        .unwrap()
        .keypair
}

#[test]
fn two_of_two_standard_participants() {
    let mut s = session(2, CosignSettings::default());
    let message = s
        .run(&[
            participant(DerivationScheme::Standard, ABANDON, 0),
            participant(DerivationScheme::Standard, ZOO, 1),
        ])
        .unwrap();

    let key0 = standard_key(ABANDON);
    let key1 = standard_key(ZOO);
    let sig0 = key0.sign(&digest()).unwrap();

    // chain holds only participant 0 as a terminal node
    let chain = build_chain(s.collected(), 1).unwrap().unwrap();
    let mut node = chain.parse();
    assert_eq!(node.load_bytes(64).unwrap(), sig0.to_vec());
    assert_eq!(node.load_uint(8).unwrap(), 0);
    assert!(!node.load_bit().unwrap());
    assert_eq!(node.remaining_refs(), 0);

    // body = {1, 1, ^chain, order}
    let mut body = CellBuilder::new();
    body.store_uint(1, 8)
        .unwrap()
        .store_bit(true)
        .unwrap()
        .store_ref(Arc::new(chain))
        .unwrap()
        .store_cell(&order())
        .unwrap();
    let body = body.build().unwrap();
    assert_eq!(message.body_hash(), body.hash());

    assert_eq!(message.signature, key1.sign(&body.hash()).unwrap());
    assert!(verify(&key1.public_key(), &body.hash(), &message.signature).unwrap());

    // final = signature ++ body
    let mut expected = CellBuilder::new();
    expected
        .store_bytes(&message.signature)
        .unwrap()
        .store_cell(&body)
        .unwrap();
    assert_eq!(
        message.to_boc().unwrap(),
        boc::to_boc(&expected.build().unwrap()).unwrap()
    );
    assert_eq!(s.state(), SessionState::Done);
}

#[test]
fn one_of_one_has_no_chain() {
    let mut s = session(1, CosignSettings::default());
    let message = s
        .run(&[participant(DerivationScheme::Standard, ABANDON, 0)])
        .unwrap();

    let mut body = CellBuilder::new();
    body.store_uint(0, 8)
        .unwrap()
        .store_bit(false)
        .unwrap()
        .store_cell(&order())
        .unwrap();
    assert_eq!(message.body_hash(), body.build().unwrap().hash());
    assert_eq!(message.payload.chain_length, 0);

    let parsed = parse_authorization(&message.to_boc().unwrap()).unwrap();
    assert_eq!(parsed.final_signer_index, 0);
    assert!(parsed.chain.is_empty());
    assert_eq!(parsed.order.hash(), order().hash());
}

#[test]
fn three_of_three_roundtrip_and_signature_checks() {
    let mut s = session(3, CosignSettings::default());
    let participants = [
        participant(DerivationScheme::Standard, ZOO, 2),
        participant(DerivationScheme::Standard, LEGAL, 0),
        participant(DerivationScheme::Standard, ABANDON, 5),
    ];
    let message = s.run(&participants).unwrap();

    let parsed = parse_authorization(&message.to_boc().unwrap()).unwrap();
    assert_eq!(parsed.final_signer_index, 5);
    assert_eq!(parsed.chain.len(), 2);
    // last folded entry is the head
    assert_eq!(parsed.chain[0].participant_index, 0);
    assert_eq!(parsed.chain[1].participant_index, 2);
    assert_eq!(parsed.body_hash, message.body_hash());

    // every nested signature covers the shared digest under its own key
    for (entry, mnemonic) in parsed.signatures_in_fold_order().iter().zip([ZOO, LEGAL]) {
        let key = standard_key(mnemonic);
        assert!(verify(&key.public_key(), &digest(), &entry.signature).unwrap());
    }
    assert!(verify(
        &standard_key(ABANDON).public_key(),
        &parsed.body_hash,
        &parsed.signature
    )
    .unwrap());
}

#[test]
fn ledger_participant_found_by_address() {
    let declared = resolve_key(LEGAL, DerivationScheme::Ledger, Some(3), None)
        .unwrap()
        .address;

    let mut settings = CosignSettings::default();
    settings.search.max_index = 10;
    let mut s = session(2, settings);

    let mut ledger = participant(DerivationScheme::Ledger, LEGAL, 1);
    ledger.address = Some(declared.to_string());

    let message = s
        .run(&[participant(DerivationScheme::Standard, ABANDON, 0), ledger])
        .unwrap();
    assert_eq!(message.payload.final_signer_index, 1);

    let ledger_key = resolve_key(LEGAL, DerivationScheme::Ledger, Some(3), None)
        .unwrap()
        .keypair;
    assert!(verify(&ledger_key.public_key(), &message.body_hash(), &message.signature).unwrap());
}

#[test]
fn key_not_found_aborts_without_output() {
    let unreachable = resolve_key(LEGAL, DerivationScheme::MultiChain, Some(50), None)
        .unwrap()
        .address;

    let mut settings = CosignSettings::default();
    settings.search.max_index = 5;
    let mut s = session(2, settings);

    let mut multi = participant(DerivationScheme::MultiChain, LEGAL, 1);
    multi.address = Some(unreachable.to_string());

    let err = s
        .run(&[participant(DerivationScheme::Standard, ABANDON, 0), multi])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::KeyNotFound);
    assert_eq!(s.state(), SessionState::Aborted);

    let retry = s.submit(&participant(DerivationScheme::Standard, ZOO, 2));
    assert_eq!(retry.unwrap_err().code, ErrorCode::SessionClosed);
}

#[test]
fn duplicate_index_in_session_is_rejected() {
    let mut s = session(2, CosignSettings::default());
    let err = s
        .run(&[
            participant(DerivationScheme::Standard, ABANDON, 3),
            participant(DerivationScheme::Standard, ZOO, 3),
        ])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateParticipantIndex);
}

#[test]
fn external_message_targets_the_wallet() {
    let mut s = session(1, CosignSettings::default());
    let message = s
        .run(&[participant(DerivationScheme::Standard, ABANDON, 0)])
        .unwrap();
    let output = s.output(&message).unwrap();

    use base64::Engine;
    let ext_bytes = base64::engine::general_purpose::STANDARD
        .decode(&output.external_message_boc)
        .unwrap();
    let ext = boc::from_boc(&ext_bytes).unwrap();
    let mut slice = ext.parse();
    assert_eq!(slice.load_uint(2).unwrap(), 0b10);
    assert_eq!(slice.load_uint(2).unwrap(), 0b00);
    assert_eq!(slice.load_uint(3).unwrap(), 0b100);
    assert_eq!(slice.load_int(8).unwrap(), 0);
    let wallet = TonAddress::from_string(WALLET).unwrap();
    assert_eq!(slice.load_bytes(32).unwrap(), wallet.hash.to_vec());
}
