//! Hyperparameter selection by k-fold cross-validation.
//!
//! The grid is five kernel widths around the median heuristic times five
//! ridge strengths on a log scale. For every width the design matrices are
//! built once; every fold then forms its training system (Ĥ, ĥ) once and
//! solves it for every λ, scoring the held-out columns with the squared-error
//! criterion [`objective`](crate::ratio::objective).
//!
//! Each (σ, fold, λ) trial depends only on its [`FoldSystem`] and λ, so the
//! trials are independent of one another.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::kernel::{median_bandwidth, GaussianKernel};
use crate::ratio::{check_alpha, check_samples, evaluate_model, h_matrix, h_vector, objective, solve_theta};
use crate::{Error, Result};

/// Multiples of the median-heuristic width tried by cross-validation.
pub const WIDTH_MULTIPLIERS: [f64; 5] = [0.6, 0.8, 1.0, 1.2, 1.4];

/// Base-10 exponents of the ridge strengths tried by cross-validation.
pub const LAMBDA_EXPONENTS: [i32; 5] = [-3, -2, -1, 0, 1];

/// Kernel-width candidates: the median heuristic over the pooled samples,
/// scaled by [`WIDTH_MULTIPLIERS`].
pub fn candidate_widths(reference: ArrayView2<'_, f64>, test: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
    let width = median_bandwidth(reference, test)?;
    Ok(WIDTH_MULTIPLIERS.iter().map(|m| width * m).collect())
}

/// Ridge candidates `10^-3 … 10^1`.
pub fn candidate_lambdas() -> Vec<f64> {
    LAMBDA_EXPONENTS.iter().map(|&e| 10.0_f64.powi(e)).collect()
}

/// Random split of `n` sample indices into `folds` near-equal folds.
///
/// The indices are shuffled once; position `i` of the shuffled order goes to
/// fold `⌊i · folds / n⌋`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldAssignment {
    order: Vec<usize>,
    folds: usize,
}

impl FoldAssignment {
    pub fn new<R: Rng + ?Sized>(n: usize, folds: usize, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        Self { order, folds }
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn fold_at(&self, position: usize) -> usize {
        position * self.folds / self.order.len()
    }

    /// Fold id of every sample index.
    pub fn fold_ids(&self) -> Vec<usize> {
        let mut ids = vec![0; self.order.len()];
        for (position, &sample) in self.order.iter().enumerate() {
            ids[sample] = self.fold_at(position);
        }
        ids
    }

    /// Sample indices held out in `fold`, in shuffled order.
    pub fn held_out(&self, fold: usize) -> Vec<usize> {
        self.select(|f| f == fold)
    }

    /// Sample indices used for training when `fold` is held out.
    pub fn training(&self, fold: usize) -> Vec<usize> {
        self.select(|f| f != fold)
    }

    fn select(&self, keep: impl Fn(usize) -> bool) -> Vec<usize> {
        self.order
            .iter()
            .enumerate()
            .filter(|&(position, _)| keep(self.fold_at(position)))
            .map(|(_, &sample)| sample)
            .collect()
    }
}

/// Training system and validation design matrices of one fold at one width.
#[derive(Debug, Clone)]
pub struct FoldSystem {
    alpha: f64,
    h_mat: Array2<f64>,
    h_vec: Array1<f64>,
    held_ref: Array2<f64>,
    held_test: Array2<f64>,
}

impl FoldSystem {
    /// Split full design matrices (`basis × samples`) by fold.
    pub fn new(
        alpha: f64,
        k_ref: ArrayView2<'_, f64>,
        k_test: ArrayView2<'_, f64>,
        ref_folds: &FoldAssignment,
        test_folds: &FoldAssignment,
        fold: usize,
    ) -> Result<Self> {
        let train_ref = k_ref.select(Axis(1), &ref_folds.training(fold));
        let train_test = k_test.select(Axis(1), &test_folds.training(fold));

        Ok(Self {
            alpha,
            h_mat: h_matrix(alpha, train_ref.view(), train_test.view()),
            h_vec: h_vector(train_ref.view())?,
            held_ref: k_ref.select(Axis(1), &ref_folds.held_out(fold)),
            held_test: k_test.select(Axis(1), &test_folds.held_out(fold)),
        })
    }

    /// Held-out squared-error criterion of the fit at ridge strength `lambda`.
    pub fn evaluate(&self, lambda: f64) -> Result<f64> {
        let theta = solve_theta(self.h_mat.view(), self.h_vec.view(), lambda)?;
        let at_reference = evaluate_model(self.held_ref.view(), theta.view());
        let at_test = evaluate_model(self.held_test.view(), theta.view());
        Ok(objective(self.alpha, at_reference.view(), at_test.view()))
    }
}

/// Winner of a cross-validated grid search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub sigma: f64,
    pub lambda: f64,
    pub sigma_index: usize,
    pub lambda_index: usize,
    pub score: f64,
}

/// Mean held-out scores over a (width × lambda) grid.
#[derive(Debug, Clone)]
pub struct CrossValidation {
    pub widths: Vec<f64>,
    pub lambdas: Vec<f64>,
    /// `scores[[s, l]]`: mean criterion over folds for `widths[s]`, `lambdas[l]`.
    pub scores: Array2<f64>,
}

impl CrossValidation {
    /// Lowest mean score; ties go to the lowest λ index within a width and
    /// then to the lowest width index. A NaN score is selected at its first
    /// occurrence, so it surfaces in [`Selection::score`].
    pub fn best(&self) -> Selection {
        let lambda_argmins: Vec<usize> = self
            .scores
            .rows()
            .into_iter()
            .map(|row| argmin(row.iter().copied()))
            .collect();
        let row_mins: Vec<f64> = lambda_argmins
            .iter()
            .enumerate()
            .map(|(s, &l)| self.scores[[s, l]])
            .collect();

        let sigma_index = argmin(row_mins.iter().copied());
        let lambda_index = lambda_argmins[sigma_index];
        Selection {
            sigma: self.widths[sigma_index],
            lambda: self.lambdas[lambda_index],
            sigma_index,
            lambda_index,
            score: row_mins[sigma_index],
        }
    }
}

/// Index of the first minimum, or of the first NaN if there is one.
fn argmin(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::INFINITY;
    for (i, v) in values.enumerate() {
        if v.is_nan() {
            return i;
        }
        if i == 0 || v < best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

/// Cross-validate the default candidate grid.
pub fn cross_validate<R: Rng + ?Sized>(
    alpha: f64,
    folds: usize,
    reference: ArrayView2<'_, f64>,
    test: ArrayView2<'_, f64>,
    centers: ArrayView2<'_, f64>,
    rng: &mut R,
) -> Result<CrossValidation> {
    let widths = candidate_widths(reference, test)?;
    cross_validate_grid(alpha, folds, reference, test, centers, widths, candidate_lambdas(), rng)
}

/// Cross-validate an explicit (width × lambda) grid.
///
/// Draws one permutation of the reference columns, then one of the test
/// columns, from `rng`.
///
/// # Errors
///
/// Input errors for unusable matrices, [`Error::InsufficientSamples`] when a
/// set has fewer columns than folds, and [`Error::SingularSystem`] when a
/// candidate λ cannot regularize a fold's system.
pub fn cross_validate_grid<R: Rng + ?Sized>(
    alpha: f64,
    folds: usize,
    reference: ArrayView2<'_, f64>,
    test: ArrayView2<'_, f64>,
    centers: ArrayView2<'_, f64>,
    widths: Vec<f64>,
    lambdas: Vec<f64>,
    rng: &mut R,
) -> Result<CrossValidation> {
    check_alpha(alpha)?;
    check_samples(reference, test, centers)?;
    if folds < 2 {
        return Err(Error::InvalidParameter {
            name: "folds",
            value: folds as f64,
        });
    }
    for (set, got) in [("reference", reference.ncols()), ("test", test.ncols())] {
        if got < folds {
            return Err(Error::InsufficientSamples { set, got, folds });
        }
    }
    if widths.is_empty() || lambdas.is_empty() {
        return Err(Error::EmptyInput);
    }

    let ref_folds = FoldAssignment::new(reference.ncols(), folds, rng);
    let test_folds = FoldAssignment::new(test.ncols(), folds, rng);

    let mut scores = Array2::zeros((widths.len(), lambdas.len()));
    for (s, &sigma) in widths.iter().enumerate() {
        let kernel = GaussianKernel::new(sigma)?;
        let k_ref = kernel.evaluate(reference, centers)?;
        let k_test = kernel.evaluate(test, centers)?;

        let mut fold_scores = Array2::zeros((folds, lambdas.len()));
        for fold in 0..folds {
            let system = FoldSystem::new(alpha, k_ref.view(), k_test.view(), &ref_folds, &test_folds, fold)?;
            for (l, &lambda) in lambdas.iter().enumerate() {
                fold_scores[[fold, l]] = system.evaluate(lambda)?;
            }
        }
        let mean = fold_scores.mean_axis(Axis(0)).ok_or(Error::EmptyInput)?;
        scores.row_mut(s).assign(&mean);
    }

    Ok(CrossValidation {
        widths,
        lambdas,
        scores,
    })
}
