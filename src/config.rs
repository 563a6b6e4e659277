//! Per-instance settings for [`Rulsif`](crate::Rulsif).
//!
//! A [`Config`] is built once, validated, and then owned by the model. It
//! can be assembled with the `with_*` methods or parsed from flat string
//! settings such as those produced by a command-line parser:
//!
//! ```rust
//! use rulsif::{CenterStrategy, Config};
//!
//! let config = Config::from_settings([
//!     ("--alpha", "0.1"),
//!     ("--folds", "4"),
//!     ("--centers", "random"),
//!     ("--output", "ignored.csv"),
//! ])?;
//! assert_eq!(config.alpha, 0.1);
//! assert_eq!(config.folds, 4);
//! assert_eq!(config.center_strategy, CenterStrategy::Random);
//! assert_eq!(config.sigma, None);
//! # Ok::<(), rulsif::Error>(())
//! ```

use crate::centers::CenterStrategy;
use crate::{Error, Result};

pub const DEFAULT_KERNEL_BASIS: usize = 100;
pub const DEFAULT_FOLDS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Mixing weight α ∈ [0, 1] of the reference density in the denominator.
    pub alpha: f64,
    /// Kernel width override. Used only together with `lambda`.
    pub sigma: Option<f64>,
    /// Regularization override. Used only together with `sigma`.
    pub lambda: Option<f64>,
    /// Requested number of kernel centers (ignored by [`CenterStrategy::All`]).
    pub kernel_basis: usize,
    /// Number of cross-validation folds, at least 2.
    pub folds: usize,
    /// Print a [`Report`](crate::Report) after every `apply`.
    pub debug: bool,
    pub center_strategy: CenterStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            sigma: None,
            lambda: None,
            kernel_basis: DEFAULT_KERNEL_BASIS,
            folds: DEFAULT_FOLDS,
            debug: false,
            center_strategy: CenterStrategy::All,
        }
    }
}

impl Config {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = Some(sigma);
        self
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = Some(lambda);
        self
    }

    pub fn with_kernel_basis(mut self, kernel_basis: usize) -> Self {
        self.kernel_basis = kernel_basis;
        self
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_center_strategy(mut self, center_strategy: CenterStrategy) -> Self {
        self.center_strategy = center_strategy;
        self
    }

    /// Both overrides, when both are configured.
    pub fn overrides(&self) -> Option<(f64, f64)> {
        self.sigma.zip(self.lambda)
    }

    /// Parse flat `key = value` settings on top of the defaults.
    ///
    /// Recognized keys, with or without a leading `--`:
    ///
    /// | key | field |
    /// |-----|-------|
    /// | `alpha` | [`Config::alpha`] |
    /// | `sigma` | [`Config::sigma`] |
    /// | `lambda` | [`Config::lambda`] |
    /// | `kernels`, `kernelBasis`, `kernel-basis` | [`Config::kernel_basis`] |
    /// | `folds` | [`Config::folds`] |
    /// | `debug` | [`Config::debug`] |
    /// | `centers` | [`Config::center_strategy`] |
    ///
    /// An empty value leaves the field at its default. A `debug` key with an
    /// empty value turns debugging on. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSetting`] for unparsable values, then anything
    /// [`Config::validate`] rejects.
    pub fn from_settings<I, K, V>(settings: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Config::default();
        for (key, value) in settings {
            let raw_key = key.as_ref();
            let value = value.as_ref().trim();
            let invalid = || Error::InvalidSetting {
                key: raw_key.to_string(),
                value: value.to_string(),
            };

            let name = raw_key.trim_start_matches('-');
            if value.is_empty() && name != "debug" {
                continue;
            }
            match name {
                "alpha" => config.alpha = value.parse().map_err(|_| invalid())?,
                "sigma" => config.sigma = Some(value.parse().map_err(|_| invalid())?),
                "lambda" => config.lambda = Some(value.parse().map_err(|_| invalid())?),
                "kernels" | "kernelBasis" | "kernel-basis" | "kernel_basis" => {
                    config.kernel_basis = value.parse().map_err(|_| invalid())?
                }
                "folds" => config.folds = value.parse().map_err(|_| invalid())?,
                "debug" => config.debug = parse_flag(value).ok_or_else(invalid)?,
                "centers" => config.center_strategy = value.parse().map_err(|_| invalid())?,
                _ => {
                    trace_debug!(key = raw_key, "ignoring unrecognized setting");
                }
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the ranges every component relies on.
    ///
    /// Overrides of exactly zero pass here; they are rejected when the model
    /// is applied.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] for α outside `[0, 1]`, negative or
    /// non-finite overrides, a zero basis count or fewer than two folds.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(Error::InvalidParameter {
                name: "alpha",
                value: self.alpha,
            });
        }
        for (name, value) in [("sigma", self.sigma), ("lambda", self.lambda)] {
            if let Some(v) = value {
                if !(v.is_finite() && v >= 0.0) {
                    return Err(Error::InvalidParameter { name, value: v });
                }
            }
        }
        if self.kernel_basis == 0 {
            return Err(Error::InvalidParameter {
                name: "kernel_basis",
                value: 0.0,
            });
        }
        if self.folds < 2 {
            return Err(Error::InvalidParameter {
                name: "folds",
                value: self.folds as f64,
            });
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
