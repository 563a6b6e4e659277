//! Choice of kernel centers.
//!
//! Centers are reference columns: the ratio `r_α` is large where the
//! reference density is large, so that is where basis functions are placed.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;

/// Which reference columns become kernel centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CenterStrategy {
    /// Every reference column; the basis count becomes the reference count.
    #[default]
    All,
    /// The first `min(basis, n_ref)` reference columns.
    FirstN,
    /// `min(basis, n_ref)` reference columns drawn without replacement.
    Random,
}

impl CenterStrategy {
    /// Number of centers this strategy yields for `n_ref` reference columns
    /// and a requested basis count.
    pub fn basis_count(self, requested: usize, n_ref: usize) -> usize {
        match self {
            CenterStrategy::All => n_ref,
            CenterStrategy::FirstN | CenterStrategy::Random => requested.min(n_ref),
        }
    }

    /// Select centers from `reference` (dimensions × n_ref).
    ///
    /// Only [`CenterStrategy::Random`] draws from `rng`.
    pub fn select<R: Rng + ?Sized>(
        self,
        reference: ArrayView2<'_, f64>,
        requested: usize,
        rng: &mut R,
    ) -> Array2<f64> {
        let n_ref = reference.ncols();
        let basis = self.basis_count(requested, n_ref);
        match self {
            CenterStrategy::All | CenterStrategy::FirstN => {
                reference.select(Axis(1), &(0..basis).collect::<Vec<_>>())
            }
            CenterStrategy::Random => {
                let mut idx: Vec<usize> = (0..n_ref).collect();
                idx.shuffle(rng);
                reference.select(Axis(1), &idx[..basis])
            }
        }
    }
}

impl fmt::Display for CenterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CenterStrategy::All => "all",
            CenterStrategy::FirstN => "first-n",
            CenterStrategy::Random => "random",
        })
    }
}

impl FromStr for CenterStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(CenterStrategy::All),
            "first-n" | "first_n" | "firstn" => Ok(CenterStrategy::FirstN),
            "random" => Ok(CenterStrategy::Random),
            other => Err(format!("unknown center strategy '{other}'")),
        }
    }
}
