use mfalign_common::config::GraphConfig;
use mfalign_common::feature::MassFeature;

/// Computes the weighted similarity of two features.
///
/// Each axis contributes `1 - diff / tolerance`; the weighted sum is taken
/// only when both contributions are strictly positive, otherwise the score
/// is exactly 0.0. With weights summing to 1 a non-zero score lies in (0, 1].
///
/// # Parameters
/// - `a`, `b`: The two features to compare
/// - `config`: Tolerances and axis weights
///
/// # Returns
/// The similarity score, symmetric in `a` and `b`.
pub fn similarity_score(a: &MassFeature, b: &MassFeature, config: &GraphConfig) -> f64 {
    let mz_score = 1.0 - (a.mz - b.mz).abs() / config.mz_tolerance;
    let rt_score = 1.0 - (a.rt - b.rt).abs() / config.rt_tolerance;
    if mz_score > 0.0 && rt_score > 0.0 {
        config.weights.mz * mz_score + config.weights.rt * rt_score
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn feature(mz: f64, rt: f64) -> MassFeature {
        MassFeature {
            mz,
            rt,
            ..Default::default()
        }
    }

    #[test]
    fn test_weighted_score() {
        let config = GraphConfig::default();
        let a = feature(100.000, 5.0);
        let b = feature(100.005, 5.2);
        // mz_score = 0.5, rt_score = 0.8
        let score = similarity_score(&a, &b, &config);
        assert!((score - (0.7 * 0.5 + 0.3 * 0.8)).abs() < 1e-12);
    }

    #[test]
    fn test_identical_features_score_one() {
        let config = GraphConfig::default();
        let a = feature(100.0, 5.0);
        assert_eq!(similarity_score(&a, &a, &config), 1.0);
    }

    #[test]
    fn test_zero_at_tolerance_boundary() {
        let config = GraphConfig::default();
        let a = feature(100.00, 5.0);
        // mz_diff equals the tolerance exactly: mz_score == 0
        assert_eq!(similarity_score(&a, &feature(100.01, 5.0), &config), 0.0);
        // rt_diff beyond tolerance
        assert_eq!(similarity_score(&a, &feature(100.0, 6.5), &config), 0.0);
    }

    #[test]
    fn test_one_bad_axis_zeroes_the_score() {
        let config = GraphConfig::default();
        let a = feature(100.000, 5.0);
        // perfect rt agreement cannot rescue an out-of-tolerance mz
        assert_eq!(similarity_score(&a, &feature(100.02, 5.0), &config), 0.0);
    }

    proptest! {
        #[test]
        fn prop_score_is_symmetric(
            mz1 in 99.0..101.0f64, rt1 in 0.0..10.0f64,
            mz2 in 99.0..101.0f64, rt2 in 0.0..10.0f64,
        ) {
            let config = GraphConfig::default();
            let a = feature(mz1, rt1);
            let b = feature(mz2, rt2);
            prop_assert_eq!(
                similarity_score(&a, &b, &config),
                similarity_score(&b, &a, &config)
            );
        }

        #[test]
        fn prop_score_range(
            mz1 in 99.99..100.01f64, rt1 in 4.0..6.0f64,
            mz2 in 99.99..100.01f64, rt2 in 4.0..6.0f64,
        ) {
            let config = GraphConfig::default();
            let score = similarity_score(&feature(mz1, rt1), &feature(mz2, rt2), &config);
            prop_assert!(score >= 0.0 && score <= 1.0);
            if (mz1 - mz2).abs() >= config.mz_tolerance || (rt1 - rt2).abs() >= config.rt_tolerance {
                prop_assert_eq!(score, 0.0);
            }
        }
    }
}
