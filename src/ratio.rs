//! Alpha-relative density-ratio estimation (RuLSIF).
//!
//! The ratio `r_α(x) = p_ref(x) / (α·p_ref(x) + (1 − α)·p_test(x))` is modeled
//! as a kernel expansion over centers `c_l`:
//!
//! ```text
//! g(x; θ) = Σ_l θ_l · k(x, c_l)
//! ```
//!
//! Minimizing the squared error to `r_α` plus a ridge penalty gives
//!
//! ```text
//! θ̂ = argmin  ½ θᵀ Ĥ θ − ĥᵀ θ + (λ/2) θᵀ θ   ⇒   (Ĥ + λI) θ̂ = ĥ
//!
//! Ĥ = (α/n_ref)·K_ref K_refᵀ + ((1−α)/n_test)·K_test K_testᵀ
//! ĥ = mean of the columns of K_ref
//! ```
//!
//! The building blocks are public so that model selection can refit on
//! slices of precomputed design matrices.

use faer::linalg::solvers::{Llt, Solve};
use faer::{Mat, Side};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::kernel::GaussianKernel;
use crate::{Error, Result};

/// Fitted weights and the ratio evaluated at both sample sets.
#[derive(Debug, Clone)]
pub struct RatioFit {
    /// Kernel weights, one per center.
    pub theta: Array1<f64>,
    /// `r_α` at every reference column.
    pub at_reference: Array1<f64>,
    /// `r_α` at every test column.
    pub at_test: Array1<f64>,
}

/// Closed-form alpha-relative density-ratio estimator at fixed (α, σ, λ).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityRatioEstimator {
    alpha: f64,
    kernel: GaussianKernel,
    lambda: f64,
}

impl DensityRatioEstimator {
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] when α is outside `[0, 1]`, σ is not
    /// positive, or λ is negative (or any of them is not finite).
    pub fn new(alpha: f64, sigma: f64, lambda: f64) -> Result<Self> {
        check_alpha(alpha)?;
        check_lambda(lambda)?;
        Ok(Self {
            alpha,
            kernel: GaussianKernel::new(sigma)?,
            lambda,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn sigma(&self) -> f64 {
        self.kernel.sigma()
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Fit θ on `reference`/`test` with basis functions at `centers`, then
    /// evaluate the ratio at both sample sets.
    ///
    /// The returned ratios are not clipped and may be negative.
    ///
    /// # Errors
    ///
    /// Input errors for empty or mismatched matrices, and
    /// [`Error::SingularSystem`] when `Ĥ + λI` cannot be factored.
    pub fn fit_and_evaluate(
        &self,
        reference: ArrayView2<'_, f64>,
        test: ArrayView2<'_, f64>,
        centers: ArrayView2<'_, f64>,
    ) -> Result<RatioFit> {
        check_samples(reference, test, centers)?;

        let k_ref = self.kernel.evaluate(reference, centers)?;
        let k_test = self.kernel.evaluate(test, centers)?;

        let h_mat = h_matrix(self.alpha, k_ref.view(), k_test.view());
        let h_vec = h_vector(k_ref.view())?;
        let theta = solve_theta(h_mat.view(), h_vec.view(), self.lambda)?;

        let at_reference = evaluate_model(k_ref.view(), theta.view());
        let at_test = evaluate_model(k_test.view(), theta.view());

        Ok(RatioFit {
            theta,
            at_reference,
            at_test,
        })
    }
}

/// `Ĥ = (α/n_ref)·K_ref K_refᵀ + ((1−α)/n_test)·K_test K_testᵀ`.
///
/// Both design matrices are `(basis, samples)`; the result is
/// `(basis, basis)` and symmetric.
pub fn h_matrix(alpha: f64, k_ref: ArrayView2<'_, f64>, k_test: ArrayView2<'_, f64>) -> Array2<f64> {
    let n_ref = k_ref.ncols() as f64;
    let n_test = k_test.ncols() as f64;

    let mut h = k_ref.dot(&k_ref.t()) * (alpha / n_ref);
    h.scaled_add((1.0 - alpha) / n_test, &k_test.dot(&k_test.t()));
    h
}

/// `ĥ`: mean of the reference design matrix over its columns.
pub fn h_vector(k_ref: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
    k_ref.mean_axis(Axis(1)).ok_or(Error::EmptyInput)
}

/// Solve `(Ĥ + λI)·θ = ĥ` exactly with a Cholesky factorization.
///
/// # Errors
///
/// [`Error::SingularSystem`] when the regularized matrix is not positive
/// definite (typically λ = 0 with a rank-deficient Ĥ) or the solution is
/// not finite.
pub fn solve_theta(h_mat: ArrayView2<'_, f64>, h_vec: ArrayView1<'_, f64>, lambda: f64) -> Result<Array1<f64>> {
    let b = h_vec.len();
    let singular = || Error::SingularSystem {
        basis_count: b,
        lambda,
    };

    let a = Mat::from_fn(b, b, |i, j| {
        if i == j {
            h_mat[[i, j]] + lambda
        } else {
            h_mat[[i, j]]
        }
    });
    let llt = Llt::new(a.as_ref(), Side::Lower).map_err(|_| singular())?;
    let rhs = Mat::from_fn(b, 1, |i, _| h_vec[i]);
    let sol = llt.solve(rhs.as_ref());

    let theta = Array1::from_iter((0..b).map(|i| sol[(i, 0)]));
    if !theta.iter().all(|t| t.is_finite()) {
        return Err(singular());
    }
    Ok(theta)
}

/// `g(x; θ) = Kᵀθ` for every column of the design matrix `k`.
pub fn evaluate_model(k: ArrayView2<'_, f64>, theta: ArrayView1<'_, f64>) -> Array1<f64> {
    k.t().dot(&theta)
}

/// Squared-error criterion on held-out ratios (lower is better):
///
/// ```text
/// J = (α/2)·mean(r_ref²) + ((1−α)/2)·mean(r_test²) − mean(r_ref)
/// ```
pub fn objective(alpha: f64, at_reference: ArrayView1<'_, f64>, at_test: ArrayView1<'_, f64>) -> f64 {
    (alpha / 2.0) * mean_sq(at_reference) + ((1.0 - alpha) / 2.0) * mean_sq(at_test) - mean(at_reference)
}

pub(crate) fn mean(v: ArrayView1<'_, f64>) -> f64 {
    v.sum() / v.len() as f64
}

pub(crate) fn mean_sq(v: ArrayView1<'_, f64>) -> f64 {
    v.dot(&v) / v.len() as f64
}

pub(crate) fn check_alpha(alpha: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(Error::InvalidParameter {
            name: "alpha",
            value: alpha,
        });
    }
    Ok(())
}

pub(crate) fn check_lambda(lambda: f64) -> Result<()> {
    if !(lambda.is_finite() && lambda >= 0.0) {
        return Err(Error::InvalidParameter {
            name: "lambda",
            value: lambda,
        });
    }
    Ok(())
}

/// Non-empty reference, test and center matrices of equal dimension.
pub(crate) fn check_samples(
    reference: ArrayView2<'_, f64>,
    test: ArrayView2<'_, f64>,
    centers: ArrayView2<'_, f64>,
) -> Result<()> {
    if reference.is_empty() || test.is_empty() || centers.is_empty() {
        return Err(Error::EmptyInput);
    }
    let dim = reference.nrows();
    if test.nrows() != dim {
        return Err(Error::DimensionMismatch(dim, test.nrows()));
    }
    if centers.nrows() != dim {
        return Err(Error::DimensionMismatch(dim, centers.nrows()));
    }
    Ok(())
}
