use proptest::prelude::*;
use recommendation_service::services::{similarity, similarity_dense, SimilarityMetric};

fn metric_strategy() -> impl Strategy<Value = SimilarityMetric> {
    prop::sample::select(SimilarityMetric::ALL.to_vec())
}

/// Vector pair of the same length with some entries unset
fn sparse_pair() -> impl Strategy<Value = (Vec<Option<f64>>, Vec<Option<f64>>)> {
    (0..16usize).prop_flat_map(|len| {
        (
            prop::collection::vec(prop::option::of(-50.0f64..50.0), len),
            prop::collection::vec(prop::option::of(-50.0f64..50.0), len),
        )
    })
}

/// Vector pair of star ratings (1 to 5) with some entries unset
fn rating_pair() -> impl Strategy<Value = (Vec<Option<f64>>, Vec<Option<f64>>)> {
    (0..16usize).prop_flat_map(|len| {
        (
            prop::collection::vec(prop::option::of((1u8..=5).prop_map(f64::from)), len),
            prop::collection::vec(prop::option::of((1u8..=5).prop_map(f64::from)), len),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_cosine_symmetric_and_bounded((a, b) in sparse_pair()) {
        let ab = similarity(SimilarityMetric::Cosine, &a, &b);
        let ba = similarity(SimilarityMetric::Cosine, &b, &a);

        prop_assert_eq!(ab, ba);
        prop_assert!((-1.0..=1.0).contains(&ab));
    }

    #[test]
    fn prop_cosine_self_similarity_is_one(a in prop::collection::vec(-100.0f64..100.0, 1..20)) {
        prop_assume!(a.iter().any(|x| x.abs() > 1e-3));

        let score = similarity_dense(SimilarityMetric::Cosine, &a, &a);
        prop_assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_scores_are_always_finite(metric in metric_strategy(), (a, b) in sparse_pair()) {
        prop_assert!(similarity(metric, &a, &b).is_finite());
    }

    #[test]
    fn prop_zero_vectors_score_zero(metric in metric_strategy(), len in 0..32usize) {
        let zeros = vec![0.0; len];
        prop_assert_eq!(similarity_dense(metric, &zeros, &zeros), 0.0);

        let unset: Vec<Option<f64>> = vec![None; len];
        prop_assert_eq!(similarity(metric, &unset, &unset), 0.0);
    }

    #[test]
    fn prop_set_metrics_within_unit_interval(
        metric in prop::sample::select(vec![SimilarityMetric::Jaccard, SimilarityMetric::Dice]),
        (a, b) in rating_pair(),
    ) {
        let score = similarity(metric, &a, &b);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn prop_dice_matches_value_sum_formula((a, b) in rating_pair()) {
        let matches = a
            .iter()
            .zip(b.iter())
            .filter(|(x, y)| x.is_some() && x == y)
            .count() as f64;
        let total: f64 = a.iter().chain(b.iter()).flatten().sum();
        let expected = if total == 0.0 { 0.0 } else { 2.0 * matches / total };

        let score = similarity(SimilarityMetric::Dice, &a, &b);
        prop_assert!((score - expected).abs() < 1e-12);
    }
}

#[test]
fn test_empty_vectors_score_zero() {
    for metric in SimilarityMetric::ALL {
        assert_eq!(similarity(metric, &[], &[]), 0.0);
    }
}

#[test]
fn test_length_mismatch_scores_zero() {
    let score = similarity_dense(SimilarityMetric::Pearson, &[1.0, 2.0], &[1.0, 2.0, 3.0]);
    assert_eq!(score, 0.0);
}
