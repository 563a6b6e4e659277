//! Alpha-relative Pearson divergence.
//!
//! ```text
//! PE_α = mean(r_ref) − ½·(α·mean(r_ref²) + (1 − α)·mean(r_test²)) − ½
//! ```
//!
//! where `r` is the fitted alpha-relative density ratio. Identical
//! distributions give `r ≡ 1` and therefore `PE_α = 0`.

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::ratio::{mean, mean_sq, DensityRatioEstimator};
use crate::Result;

/// Divergence score together with the ratio evaluated at the test samples.
#[derive(Debug, Clone)]
pub struct DivergenceScore {
    pub score: f64,
    pub ratio_at_test: Array1<f64>,
}

/// Pearson divergence from ratios already evaluated at both sample sets.
pub fn pearson_divergence(alpha: f64, at_reference: ArrayView1<'_, f64>, at_test: ArrayView1<'_, f64>) -> f64 {
    mean(at_reference) - 0.5 * (alpha * mean_sq(at_reference) + (1.0 - alpha) * mean_sq(at_test)) - 0.5
}

/// Fits the density ratio once and reduces it to a Pearson divergence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DivergenceEstimator {
    ratio: DensityRatioEstimator,
}

impl DivergenceEstimator {
    pub fn new(alpha: f64, sigma: f64, lambda: f64) -> Result<Self> {
        Ok(Self {
            ratio: DensityRatioEstimator::new(alpha, sigma, lambda)?,
        })
    }

    pub fn score(
        &self,
        reference: ArrayView2<'_, f64>,
        test: ArrayView2<'_, f64>,
        centers: ArrayView2<'_, f64>,
    ) -> Result<DivergenceScore> {
        let fit = self.ratio.fit_and_evaluate(reference, test, centers)?;
        let score = pearson_divergence(
            self.ratio.alpha(),
            fit.at_reference.view(),
            fit.at_test.view(),
        );
        Ok(DivergenceScore {
            score,
            ratio_at_test: fit.at_test,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_unit_ratio_has_zero_divergence() {
        let ones = Array1::<f64>::ones(7);
        for alpha in [0.0, 0.3, 1.0] {
            let pe = pearson_divergence(alpha, ones.view(), ones.view());
            assert!(pe.abs() < 1e-12, "r ≡ 1 should give PE = 0, got {pe}");
        }
    }

    #[test]
    fn test_formula() {
        let r_ref = array![2.0, 2.0];
        let r_test = array![0.0, 0.0];
        // 2 − ½·(0.5·4 + 0.5·0) − ½ = 0.5
        let pe = pearson_divergence(0.5, r_ref.view(), r_test.view());
        assert!((pe - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_score_matches_ratio_fit() {
        let reference = array![[0.0, 0.4, 0.8, 1.2, 0.2], [0.1, 0.3, 0.0, 0.5, 0.9]];
        let test = array![[1.5, 2.0, 2.4], [1.0, 1.6, 0.8]];

        let estimator = DivergenceEstimator::new(0.2, 0.6, 0.05).unwrap();
        let result = estimator
            .score(reference.view(), test.view(), reference.view())
            .unwrap();

        let fit = DensityRatioEstimator::new(0.2, 0.6, 0.05)
            .unwrap()
            .fit_and_evaluate(reference.view(), test.view(), reference.view())
            .unwrap();
        let expected = pearson_divergence(0.2, fit.at_reference.view(), fit.at_test.view());

        assert_eq!(result.ratio_at_test.len(), 3);
        assert!((result.score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_propagates_configuration_errors() {
        assert!(DivergenceEstimator::new(0.5, -1.0, 0.1).is_err());
    }
}
