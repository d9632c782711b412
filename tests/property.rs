use proptest::prelude::*;
use tonkey_cosign::cell::{boc, Cell, CellBuilder};
use tonkey_cosign::multisig::{
    build_authorization, build_chain, build_payload, parse_authorization, DuplicatePolicy, KeyPair,
};
use tonkey_cosign::CollectedSignature;

fn any_signature() -> impl Strategy<Value = CollectedSignature> {
    (prop::collection::vec(any::<u8>(), 64), 0u8..8).prop_map(|(bytes, index)| {
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&bytes);
        CollectedSignature::new(signature, index)
    })
}

fn any_order() -> impl Strategy<Value = Cell> {
    (prop::collection::vec(any::<u8>(), 0..48), 0usize..8).prop_map(|(bytes, extra_bits)| {
        let mut builder = CellBuilder::new();
        builder.store_bytes(&bytes).unwrap();
        builder.store_uint(0, extra_bits).unwrap();
        builder.build().unwrap()
    })
}

/// Walk a chain from its head, collecting entries
fn walk(chain: &Cell) -> Vec<CollectedSignature> {
    let mut out = Vec::new();
    let mut node = chain.clone();
    loop {
        let mut slice = node.parse();
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&slice.load_bytes(64).unwrap());
        let index = slice.load_uint(8).unwrap() as u8;
        out.push(CollectedSignature::new(signature, index));
        if !slice.load_bit().unwrap() {
            return out;
        }
        let next = (**slice.load_ref().unwrap()).clone();
        node = next;
    }
}

proptest! {
    #[test]
    fn chain_is_deterministic(sigs in prop::collection::vec(any_signature(), 0..6), exclude in 0u8..8) {
        let a = build_chain(&sigs, exclude).unwrap();
        let b = build_chain(&sigs, exclude).unwrap();
        prop_assert_eq!(a.map(|c| c.hash()), b.map(|c| c.hash()));
    }

    #[test]
    fn chain_excludes_exactly_the_final_index(
        sigs in prop::collection::vec(any_signature(), 0..6),
        exclude in 0u8..8,
    ) {
        let kept: Vec<_> = sigs.iter().copied().filter(|s| s.participant_index != exclude).collect();
        match build_chain(&sigs, exclude).unwrap() {
            None => prop_assert!(kept.is_empty()),
            Some(chain) => {
                let mut walked = walk(&chain);
                walked.reverse();
                prop_assert_eq!(walked, kept);
            }
        }
    }

    #[test]
    fn authorization_roundtrips(
        sigs in prop::collection::vec(any_signature(), 0..5),
        final_index in 0u8..8,
        order in any_order(),
        seed in prop::array::uniform32(any::<u8>()),
    ) {
        let signer = KeyPair::from_seed(&seed).unwrap();
        let message = build_authorization(&signer, final_index, &sigs, &order, DuplicatePolicy::PassThrough).unwrap();
        let parsed = parse_authorization(&message.to_boc().unwrap()).unwrap();

        prop_assert_eq!(parsed.final_signer_index, final_index);
        prop_assert_eq!(parsed.chain.len(), message.payload.chain_length);
        prop_assert_eq!(parsed.body_hash, message.body_hash());
        prop_assert_eq!(parsed.order.hash(), order.hash());
        prop_assert_eq!(parsed.signature, message.signature);
    }

    #[test]
    fn body_hash_depends_on_every_signature_byte(
        sigs in prop::collection::vec(any_signature(), 1..4),
        position in 0usize..64,
        order in any_order(),
    ) {
        // final index 255 is never produced by any_signature
        let base = build_payload(255, &sigs, &order, DuplicatePolicy::PassThrough).unwrap();
        let mut tampered = sigs.clone();
        tampered[0].signature[position] ^= 0x01;
        let changed = build_payload(255, &tampered, &order, DuplicatePolicy::PassThrough).unwrap();
        prop_assert_ne!(base.hash(), changed.hash());
    }

    #[test]
    fn boc_export_is_stable(order in any_order()) {
        let bytes = boc::to_boc(&order).unwrap();
        let parsed = boc::from_boc(&bytes).unwrap();
        prop_assert_eq!(boc::to_boc(&parsed).unwrap(), bytes);
    }
}
