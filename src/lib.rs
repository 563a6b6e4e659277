//! # rulsif
//!
//! Alpha-relative density-ratio estimation and Pearson divergence for
//! comparing two sample sets.
//!
//! ## Intuition
//!
//! To tell whether a "test" sample was drawn from the same distribution as a
//! "reference" sample, we never estimate either density. Instead we fit the
//! alpha-relative density ratio
//!
//! ```text
//! r_α(x) = p_ref(x) / (α·p_ref(x) + (1 − α)·p_test(x))
//! ```
//!
//! directly, as a linear combination of Gaussian kernels centered on the
//! reference points. The fit is a regularized least-squares problem with a
//! closed-form solution, and the fitted ratio reduces to a scalar
//! alpha-relative Pearson divergence. A score near zero means the two
//! samples look alike; a large positive score means drift.
//!
//! Mixing a little of `p_ref` into the denominator (α > 0) keeps the ratio
//! bounded by `1/α`, which makes the estimate far less sensitive to regions
//! where the test density vanishes.
//!
//! ## Key Types
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Rulsif`] | Train (centers + cross-validated σ, λ), then score sample pairs |
//! | [`Config`] | Per-instance settings, parsed from flat key/value pairs |
//! | [`DensityRatioEstimator`] | Closed-form kernel fit of `r_α` |
//! | [`DivergenceEstimator`] | Pearson divergence on top of the ratio fit |
//! | [`GaussianKernel`] | Kernel design matrices |
//! | [`CenterStrategy`] | Which reference columns become basis centers |
//!
//! Sample matrices are `ndarray` arrays of shape `(dimensions, count)`:
//! every **column** is one observation.
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::array;
//! use rulsif::{Config, Rulsif};
//!
//! let reference = array![
//!     [0.0, 0.3, 0.1, 0.4, 0.2, 0.5, 0.15, 0.35, 0.05, 0.25],
//!     [0.1, 0.0, 0.4, 0.2, 0.3, 0.1, 0.25, 0.45, 0.35, 0.15],
//! ];
//! let test = array![
//!     [4.0, 4.3, 4.1, 4.4, 4.2, 4.5, 4.15, 4.35, 4.05, 4.25],
//!     [4.1, 4.0, 4.4, 4.2, 4.3, 4.1, 4.25, 4.45, 4.35, 4.15],
//! ];
//!
//! let mut model = Rulsif::new(Config::default().with_alpha(0.1))?;
//! model.train(reference.view(), test.view())?;
//! let score = model.apply(reference.view(), test.view())?;
//! assert!(score > 0.1);
//! # Ok::<(), rulsif::Error>(())
//! ```
//!
//! ## What Can Go Wrong
//!
//! 1. **λ = 0**: `H` is a Gram matrix and is often rank deficient; the solve
//!    then fails with [`Error::SingularSystem`].
//! 2. **Negative ratios**: the kernel model is not constrained to be
//!    non-negative. Small λ or a poor σ can produce negative values; this is
//!    a property of the estimator, not a bug.
//! 3. **Too few samples**: k-fold cross-validation needs at least `folds`
//!    columns in each sample set.
//!
//! ## References
//!
//! - Yamada, Suzuki, Kanamori, Hachiya, Sugiyama (2011). "Relative
//!   Density-Ratio Estimation for Robust Distribution Comparison" (NIPS)
//! - Kanamori, Hido, Sugiyama (2009). "A Least-squares Approach to Direct
//!   Importance Estimation" (JMLR)
//! - Jaakkola, Diekhans, Haussler (1999). Median heuristic for RBF widths

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

pub mod centers;
pub mod config;
pub mod divergence;
pub mod kernel;
pub mod ratio;
mod rulsif;
pub mod selection;

pub use centers::CenterStrategy;
pub use config::Config;
pub use divergence::{pearson_divergence, DivergenceEstimator, DivergenceScore};
pub use kernel::{median_distance, rbf, GaussianKernel};
pub use ratio::{objective, DensityRatioEstimator, RatioFit};
pub use rulsif::{FittedModel, Report, Rulsif, DEFAULT_SEED};
pub use selection::{
    candidate_lambdas, candidate_widths, cross_validate, CrossValidation, FoldAssignment, FoldSystem,
    Selection,
};

use thiserror::Error;

/// Broad classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The model is not trained or a hyperparameter is missing or out of range.
    Configuration,
    /// The regularized linear system could not be solved.
    Numerical,
    /// The sample matrices cannot be used as given.
    Input,
}

/// Errors for density-ratio estimation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("empty input")]
    EmptyInput,

    #[error("dimension mismatch: {0} vs {1}")]
    DimensionMismatch(usize, usize),

    #[error("{set} samples: {got} columns, but {folds}-fold cross-validation needs at least {folds}")]
    InsufficientSamples {
        set: &'static str,
        got: usize,
        folds: usize,
    },

    #[error("all pairwise distances are zero; cannot derive a kernel width")]
    DegenerateSamples,

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("invalid setting '{key}': {value:?}")]
    InvalidSetting { key: String, value: String },

    #[error("missing kernel basis function parameters; call train first")]
    NotTrained,

    #[error("missing model selection parameters: sigma = {sigma}, lambda = {lambda}")]
    MissingHyperparameters { sigma: f64, lambda: f64 },

    #[error("singular system: H + {lambda}·I ({basis_count}×{basis_count}) is not positive definite")]
    SingularSystem { basis_count: usize, lambda: f64 },
}

impl Error {
    /// Which family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParameter { .. }
            | Error::InvalidSetting { .. }
            | Error::NotTrained
            | Error::MissingHyperparameters { .. } => ErrorKind::Configuration,
            Error::SingularSystem { .. } => ErrorKind::Numerical,
            Error::EmptyInput
            | Error::DimensionMismatch(..)
            | Error::InsufficientSamples { .. }
            | Error::DegenerateSamples => ErrorKind::Input,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::NotTrained.kind(), ErrorKind::Configuration);
        assert_eq!(
            Error::MissingHyperparameters {
                sigma: 0.0,
                lambda: 1.0
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            Error::SingularSystem {
                basis_count: 3,
                lambda: 0.0
            }
            .kind(),
            ErrorKind::Numerical
        );
        assert_eq!(Error::DimensionMismatch(2, 3).kind(), ErrorKind::Input);
    }

    #[test]
    fn test_error_messages() {
        let e = Error::InsufficientSamples {
            set: "reference",
            got: 3,
            folds: 5,
        };
        assert_eq!(
            e.to_string(),
            "reference samples: 3 columns, but 5-fold cross-validation needs at least 5"
        );
        assert_eq!(Error::DimensionMismatch(2, 3).to_string(), "dimension mismatch: 2 vs 3");
    }
}
