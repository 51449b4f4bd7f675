//! Property-based tests for signatures, banding and sweep metrics.
//!
//! These tests verify invariants that should hold regardless of input:
//! - Signatures are deterministic for a fixed seed
//! - Bands partition a prefix of the signature
//! - An indexed entity always retrieves itself
//! - Counts and metrics stay within their bounds

use lshblock::{
    Banding, DuplicatePair, EntityRecord, GeneratorSpec, GridSearchEvaluator, GridSpec,
    GroundTruth, LshIndex, ParamRange, Signature, SignatureGenerator, SignatureKind,
};
use proptest::prelude::*;

prop_compose! {
    fn arb_entity()(words in prop::collection::vec("[a-z0-9]{1,6}", 0..8)) -> EntityRecord {
        EntityRecord::from_values(words)
    }
}

fn arb_kind() -> impl Strategy<Value = SignatureKind> {
    prop_oneof![
        (1usize..48).prop_map(|len| SignatureKind::MinHash { len }),
        (1usize..48, 1usize..64).prop_map(|(len, feature_dim)| SignatureKind::SuperBit {
            len,
            feature_dim
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn signatures_are_deterministic(entity in arb_entity(), kind in arb_kind(), seed in any::<u64>()) {
        let g = SignatureGenerator::new(kind, seed).unwrap();
        let a = g.generate(&entity);
        let b = g.generate(&entity);
        prop_assert_eq!(a.len(), kind.signature_len());
        prop_assert_eq!(&a, &b);
        let replay = SignatureGenerator::new(kind, seed).unwrap();
        prop_assert_eq!(a, replay.generate(&entity));
    }

    #[test]
    fn bands_partition_a_prefix(
        values in prop::collection::vec(any::<u64>(), 0..64),
        r in 1usize..20,
    ) {
        let banding = Banding::new(r, 10).unwrap();
        let sig = Signature::new(values.clone());
        let bands: Vec<&[u64]> = banding.bands(&sig).collect();
        prop_assert_eq!(bands.len(), values.len() / r);
        prop_assert_eq!(bands.len(), banding.num_bands(values.len()));
        prop_assert!(bands.iter().all(|b| b.len() == r));
        let joined = bands.concat();
        prop_assert_eq!(&joined[..], &values[..joined.len()]);
        prop_assert!(values.len() - joined.len() < r);
    }

    #[test]
    fn indexed_entities_retrieve_themselves(
        entities in prop::collection::vec(arb_entity(), 1..10),
        kind in arb_kind(),
        r in 1usize..8,
        buckets in 1usize..100,
        seed in any::<u64>(),
    ) {
        prop_assume!(r <= kind.signature_len());
        let g = SignatureGenerator::new(kind, seed).unwrap();
        let ix = LshIndex::build(g, Banding::new(r, buckets).unwrap(), &entities);
        for (id, e) in entities.iter().enumerate() {
            prop_assert!(ix.query(e).contains(&id), "entity {} not retrieved", id);
        }
    }

    #[test]
    fn counts_and_metrics_are_bounded(
        source in prop::collection::vec(arb_entity(), 0..6),
        target in prop::collection::vec(arb_entity(), 0..6),
        pairs in prop::collection::vec((0usize..6, 0usize..6), 0..8),
        seed in any::<u64>(),
    ) {
        let truth: GroundTruth = pairs
            .into_iter()
            .filter(|&(s, t)| s < source.len() && t < target.len())
            .map(|(s, t)| DuplicatePair::new(s, t))
            .collect();
        let grid = GridSpec::new(ParamRange::new(1, 3, 1), ParamRange::new(1, 21, 10));
        let report = GridSearchEvaluator::new(
            &source,
            &target,
            &truth,
            GeneratorSpec::seeded(SignatureKind::MinHash { len: 12 }, seed),
            grid,
        )
        .unwrap()
        .sweep()
        .unwrap();

        let max_pairs = (source.len() * target.len()) as u64;
        for rec in &report.records {
            prop_assert!(rec.true_positives <= rec.verifications);
            prop_assert!(rec.verifications <= max_pairs);
            for m in [rec.recall, rec.precision, rec.f1] {
                prop_assert!((0.0..=1.0).contains(&m), "metric {} out of range", m);
            }
        }

        let best = report.best.unwrap();
        prop_assert!(report.records.iter().all(|r| r.f1 <= best.f1));
        let first_max = report.records.iter().find(|r| r.f1 == best.f1).unwrap();
        prop_assert_eq!(first_max.iteration, best.iteration);
    }
}
