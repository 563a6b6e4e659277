//! Model selection and repeated scoring.

use std::fmt;

use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::divergence::{DivergenceEstimator, DivergenceScore};
use crate::ratio::check_samples;
use crate::selection::{cross_validate, CrossValidation};
use crate::{Error, Result};

/// Seed of the generator used by [`Rulsif::train`].
pub const DEFAULT_SEED: u64 = 0;

/// Centers and hyperparameters chosen by [`Rulsif::train`].
#[derive(Debug, Clone)]
pub struct FittedModel {
    centers: Array2<f64>,
    sigma: f64,
    lambda: f64,
    cross_validation: Option<CrossValidation>,
}

impl FittedModel {
    pub fn centers(&self) -> ArrayView2<'_, f64> {
        self.centers.view()
    }

    pub fn basis_count(&self) -> usize {
        self.centers.ncols()
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// The score grid, unless the hyperparameters came from the configuration.
    pub fn cross_validation(&self) -> Option<&CrossValidation> {
        self.cross_validation.as_ref()
    }
}

/// Relative unconstrained least-squares importance fitting.
///
/// `train` picks kernel centers and cross-validates (σ, λ); `apply` then
/// scores any number of reference/test pairs with the alpha-relative Pearson
/// divergence.
///
/// ```rust
/// use ndarray::Array2;
/// use rulsif::{Config, Error, Rulsif};
///
/// let model = Rulsif::new(Config::default())?;
/// let samples = Array2::<f64>::zeros((2, 10));
/// assert!(matches!(model.apply(samples.view(), samples.view()), Err(Error::NotTrained)));
/// # Ok::<(), rulsif::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Rulsif {
    config: Config,
    fitted: Option<FittedModel>,
}

impl Rulsif {
    /// # Errors
    ///
    /// Whatever [`Config::validate`] rejects.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fitted: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fitted(&self) -> Option<&FittedModel> {
        self.fitted.as_ref()
    }

    pub fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }

    /// Kernel centers for `reference` under the configured strategy.
    pub fn select_centers<R: Rng + ?Sized>(&self, reference: ArrayView2<'_, f64>, rng: &mut R) -> Array2<f64> {
        self.config
            .center_strategy
            .select(reference, self.config.kernel_basis, rng)
    }

    /// [`Rulsif::train_with_rng`] with a generator seeded by [`DEFAULT_SEED`],
    /// so repeated runs on the same data select the same model.
    pub fn train(&mut self, reference: ArrayView2<'_, f64>, test: ArrayView2<'_, f64>) -> Result<()> {
        let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);
        self.train_with_rng(reference, test, &mut rng)
    }

    /// Select centers, then σ and λ, replacing any previous fit.
    ///
    /// `rng` drives random center selection and the fold permutations.
    /// When both σ and λ are configured they are adopted as-is and no
    /// cross-validation runs. On error the previous fit is left untouched.
    pub fn train_with_rng<R: Rng + ?Sized>(
        &mut self,
        reference: ArrayView2<'_, f64>,
        test: ArrayView2<'_, f64>,
        rng: &mut R,
    ) -> Result<()> {
        check_samples(reference, test, reference)?;

        let centers = self.select_centers(reference, rng);
        trace_debug!(
            strategy = %self.config.center_strategy,
            dims = centers.nrows(),
            basis = centers.ncols(),
            "selected kernel centers"
        );

        let (sigma, lambda, cross_validation) = match self.config.overrides() {
            Some((sigma, lambda)) => (sigma, lambda, None),
            None => {
                if self.config.sigma.is_some() || self.config.lambda.is_some() {
                    trace_warn!(
                        sigma = ?self.config.sigma,
                        lambda = ?self.config.lambda,
                        "only one of sigma/lambda configured; selecting both by cross-validation"
                    );
                }
                let cv = cross_validate(
                    self.config.alpha,
                    self.config.folds,
                    reference,
                    test,
                    centers.view(),
                    rng,
                )?;
                trace_debug!(widths = ?cv.widths, lambdas = ?cv.lambdas, "candidate grid");
                trace_debug!(scores = %cv.scores, "cross-validation scores");

                let best = cv.best();
                (best.sigma, best.lambda, Some(cv))
            }
        };
        trace_info!(
            sigma,
            lambda,
            basis = centers.ncols(),
            cross_validated = cross_validation.is_some(),
            "model trained"
        );

        self.fitted = Some(FittedModel {
            centers,
            sigma,
            lambda,
            cross_validation,
        });
        Ok(())
    }

    /// Alpha-relative Pearson divergence of `test` from `reference`.
    ///
    /// # Errors
    ///
    /// [`Error::NotTrained`] before a successful `train`,
    /// [`Error::MissingHyperparameters`] when σ or λ is zero, and anything
    /// the divergence estimator reports.
    pub fn apply(&self, reference: ArrayView2<'_, f64>, test: ArrayView2<'_, f64>) -> Result<f64> {
        Ok(self.apply_detailed(reference, test)?.score)
    }

    /// Like [`Rulsif::apply`], also returning the ratio at the test samples.
    pub fn apply_detailed(&self, reference: ArrayView2<'_, f64>, test: ArrayView2<'_, f64>) -> Result<DivergenceScore> {
        let fitted = self.fitted.as_ref().ok_or(Error::NotTrained)?;
        if fitted.centers.is_empty() {
            return Err(Error::NotTrained);
        }
        if fitted.sigma == 0.0 || fitted.lambda == 0.0 {
            return Err(Error::MissingHyperparameters {
                sigma: fitted.sigma,
                lambda: fitted.lambda,
            });
        }

        let estimator = DivergenceEstimator::new(self.config.alpha, fitted.sigma, fitted.lambda)?;
        let result = estimator.score(reference, test, fitted.centers.view())?;
        trace_info!(score = result.score, "pearson divergence");

        if self.config.debug {
            println!("{}", self.report_for(fitted, result.score));
        }
        Ok(result)
    }

    /// Summary of the fitted model alongside a divergence `score`.
    pub fn report(&self, score: f64) -> Option<Report> {
        self.fitted.as_ref().map(|fitted| self.report_for(fitted, score))
    }

    fn report_for(&self, fitted: &FittedModel, score: f64) -> Report {
        Report {
            alpha: self.config.alpha,
            basis_count: fitted.basis_count(),
            sigma: fitted.sigma,
            lambda: fitted.lambda,
            score,
        }
    }
}

/// Labeled text summary printed by `apply` in debug mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    pub alpha: f64,
    pub basis_count: usize,
    pub sigma: f64,
    pub lambda: f64,
    pub score: f64,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[RULSIF Results]")?;
        writeln!(f)?;
        writeln!(f, "Alpha Constraint         : {}", self.alpha)?;
        writeln!(f, "Kernel Basis Functions   : {}", self.basis_count)?;
        writeln!(f, "Basis Function Width     : {}", self.sigma)?;
        writeln!(f, "Regularization Parameter : {}", self.lambda)?;
        writeln!(f, "Pearson Divergence Score : {}", self.score)?;
        writeln!(f)?;
        write!(f, "---------------")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::centers::CenterStrategy;
    use crate::ErrorKind;
    use ndarray::array;

    fn reference() -> Array2<f64> {
        array![
            [0.0, 0.3, 0.1, 0.4, 0.2, 0.5, 0.15, 0.35, 0.05, 0.25],
            [0.1, 0.0, 0.4, 0.2, 0.3, 0.1, 0.25, 0.45, 0.35, 0.15]
        ]
    }

    fn shifted(by: f64) -> Array2<f64> {
        reference().mapv(|v| v + by)
    }

    #[test]
    fn test_apply_before_train() {
        let model = Rulsif::new(Config::default()).unwrap();
        let err = model.apply(reference().view(), shifted(1.0).view()).unwrap_err();
        assert!(matches!(err, Error::NotTrained));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(model.report(0.0).is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Rulsif::new(Config::default().with_folds(1)).is_err());
    }

    #[test]
    fn test_train_selects_from_grid() {
        let mut model = Rulsif::new(Config::default().with_alpha(0.1)).unwrap();
        model.train(reference().view(), shifted(0.5).view()).unwrap();

        let fitted = model.fitted().unwrap();
        assert_eq!(fitted.basis_count(), 10, "all reference columns become centers");
        let cv = fitted.cross_validation().unwrap();
        assert!(cv.widths.contains(&fitted.sigma()));
        assert!(cv.lambdas.contains(&fitted.lambda()));
        assert_eq!(cv.best().sigma, fitted.sigma());
    }

    #[test]
    fn test_overrides_skip_cross_validation() {
        let config = Config::default().with_sigma(0.7).with_lambda(0.05);
        let mut model = Rulsif::new(config).unwrap();
        model.train(reference().view(), shifted(0.5).view()).unwrap();

        let fitted = model.fitted().unwrap();
        assert_eq!(fitted.sigma(), 0.7);
        assert_eq!(fitted.lambda(), 0.05);
        assert!(fitted.cross_validation().is_none());
    }

    #[test]
    fn test_partial_override_is_ignored() {
        let mut model = Rulsif::new(Config::default().with_sigma(123.0)).unwrap();
        model.train(reference().view(), shifted(0.5).view()).unwrap();
        let fitted = model.fitted().unwrap();
        assert_ne!(fitted.sigma(), 123.0);
        assert!(fitted.cross_validation().is_some());
    }

    #[test]
    fn test_zero_override_fails_at_apply() {
        let config = Config::default().with_sigma(0.7).with_lambda(0.0);
        let mut model = Rulsif::new(config).unwrap();
        model.train(reference().view(), shifted(0.5).view()).unwrap();

        let err = model.apply(reference().view(), shifted(0.5).view()).unwrap_err();
        assert!(matches!(err, Error::MissingHyperparameters { lambda, .. } if lambda == 0.0));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut model = Rulsif::new(Config::default().with_alpha(0.2)).unwrap();
        model.train(reference().view(), shifted(0.3).view()).unwrap();

        let a = model.apply(reference().view(), shifted(0.3).view()).unwrap();
        let b = model.apply(reference().view(), shifted(0.3).view()).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_apply_detailed_ratio_length() {
        let mut model = Rulsif::new(Config::default()).unwrap();
        model.train(reference().view(), shifted(0.3).view()).unwrap();

        let test = shifted(0.3);
        let smaller = test.slice(ndarray::s![.., 0..7]);
        let result = model.apply_detailed(reference().view(), smaller).unwrap();
        assert_eq!(result.ratio_at_test.len(), 7);
    }

    #[test]
    fn test_failed_train_keeps_previous_fit() {
        let mut model = Rulsif::new(Config::default()).unwrap();
        model.train(reference().view(), shifted(0.3).view()).unwrap();
        let before = model.fitted().unwrap().sigma();

        let too_few = shifted(0.3).slice(ndarray::s![.., 0..2]).to_owned();
        let err = model.train(reference().view(), too_few.view()).unwrap_err();
        assert!(matches!(err, Error::InsufficientSamples { set: "test", .. }));
        assert_eq!(model.fitted().unwrap().sigma(), before);
    }

    #[test]
    fn test_first_n_strategy_clamps_basis() {
        let config = Config::default()
            .with_center_strategy(CenterStrategy::FirstN)
            .with_kernel_basis(50);
        let mut model = Rulsif::new(config).unwrap();
        model.train(reference().view(), shifted(0.3).view()).unwrap();
        assert_eq!(model.fitted().unwrap().basis_count(), 10);

        let config = Config::default()
            .with_center_strategy(CenterStrategy::FirstN)
            .with_kernel_basis(4);
        let mut model = Rulsif::new(config).unwrap();
        model.train(reference().view(), shifted(0.3).view()).unwrap();
        let fitted = model.fitted().unwrap();
        assert_eq!(fitted.basis_count(), 4);
        assert_eq!(fitted.centers(), reference().slice(ndarray::s![.., 0..4]));
    }

    #[test]
    fn test_injected_rng_is_used() {
        let config = Config::default()
            .with_center_strategy(CenterStrategy::Random)
            .with_kernel_basis(5);
        let mut a = Rulsif::new(config.clone()).unwrap();
        let mut b = Rulsif::new(config).unwrap();
        a.train_with_rng(reference().view(), shifted(0.3).view(), &mut StdRng::seed_from_u64(9))
            .unwrap();
        b.train_with_rng(reference().view(), shifted(0.3).view(), &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(a.fitted().unwrap().centers(), b.fitted().unwrap().centers());
        assert_eq!(a.fitted().unwrap().basis_count(), 5);
    }

    #[test]
    fn test_report_format() {
        let report = Report {
            alpha: 0.1,
            basis_count: 200,
            sigma: 0.5,
            lambda: 0.01,
            score: 0.25,
        };
        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[RULSIF Results]");
        assert_eq!(lines[2], "Alpha Constraint         : 0.1");
        assert_eq!(lines[3], "Kernel Basis Functions   : 200");
        assert_eq!(lines[4], "Basis Function Width     : 0.5");
        assert_eq!(lines[5], "Regularization Parameter : 0.01");
        assert_eq!(lines[6], "Pearson Divergence Score : 0.25");
    }
}
