//! Gaussian kernel design matrices and the median-distance width heuristic.
//!
//! Sample matrices hold one observation per **column**. A design matrix
//! `K` built from `samples` and `centers` has one row per center and one
//! column per sample:
//!
//! ```text
//! K[l, i] = k(samples[:, i], centers[:, l])
//! ```

use ndarray::{concatenate, Array2, ArrayView1, ArrayView2, Axis};

use crate::{Error, Result};

/// Radial Basis Function (Gaussian) kernel: k(x, y) = exp(-||x-y||² / (2σ²))
///
/// # Example
///
/// ```rust
/// use ndarray::array;
/// use rulsif::rbf;
///
/// let x = array![0.0, 0.0];
/// let y = array![1.0, 0.0];
///
/// // exp(-1/(2*1)) = exp(-0.5) ≈ 0.606
/// let k = rbf(x.view(), y.view(), 1.0);
/// assert!((k - 0.606).abs() < 0.01);
/// ```
pub fn rbf(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>, sigma: f64) -> f64 {
    let sq_dist: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| (xi - yi).powi(2))
        .sum();
    (-sq_dist / (2.0 * sigma * sigma)).exp()
}

/// Gaussian kernel of fixed width σ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianKernel {
    sigma: f64,
}

impl GaussianKernel {
    /// Kernel of width `sigma`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] unless `sigma` is finite and positive.
    pub fn new(sigma: f64) -> Result<Self> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(Error::InvalidParameter {
                name: "sigma",
                value: sigma,
            });
        }
        Ok(Self { sigma })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Design matrix of shape `(centers.ncols(), samples.ncols())`.
    ///
    /// Rows index the centers, columns index the samples.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] when `samples` and `centers` differ in
    /// their number of rows.
    pub fn evaluate(&self, samples: ArrayView2<'_, f64>, centers: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if samples.nrows() != centers.nrows() {
            return Err(Error::DimensionMismatch(samples.nrows(), centers.nrows()));
        }
        Ok(Array2::from_shape_fn((centers.ncols(), samples.ncols()), |(l, i)| {
            rbf(samples.column(i), centers.column(l), self.sigma)
        }))
    }
}

/// Squared Euclidean distances between all column pairs, via the
/// squared-norm expansion `||x_i||² + ||x_j||² − 2·x_i·x_j`.
///
/// Only the strict upper triangle is returned (`i < j`), in column-major
/// order of the full matrix. Entries can be slightly negative or positive
/// for identical columns because of rounding.
pub fn pairwise_sq_distances(samples: ArrayView2<'_, f64>) -> Vec<f64> {
    let n = samples.ncols();
    let gram = samples.t().dot(&samples);
    let norms = gram.diag();

    let mut distances = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for j in 0..n {
        for i in 0..j {
            distances.push(norms[i] + norms[j] - 2.0 * gram[[i, j]]);
        }
    }
    distances
}

fn median_of(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}

/// Median Euclidean distance between distinct columns.
///
/// The median is taken over the positive squared distances of one triangle
/// (even counts average the two middle values) and then square-rooted.
/// Pairs at distance zero do not count.
///
/// # Errors
///
/// [`Error::DegenerateSamples`] when no pair of columns is apart.
///
/// # Example
///
/// ```rust
/// use ndarray::array;
/// use rulsif::median_distance;
///
/// // Squared distances 9, 16, 25 → median 16 → distance 4.
/// let points = array![[0.0, 3.0, 0.0], [0.0, 0.0, 4.0]];
/// assert!((median_distance(points.view())? - 4.0).abs() < 1e-12);
/// # Ok::<(), rulsif::Error>(())
/// ```
pub fn median_distance(samples: ArrayView2<'_, f64>) -> Result<f64> {
    let mut positive: Vec<f64> = pairwise_sq_distances(samples)
        .into_iter()
        .filter(|&d| d > 0.0)
        .collect();
    if positive.is_empty() {
        return Err(Error::DegenerateSamples);
    }
    Ok(median_of(&mut positive).sqrt())
}

/// Median heuristic for the Gaussian width of the pooled sample.
///
/// Sets σ = median(||xᵢ - xⱼ||) / sqrt(2) over the columns of `reference`
/// and `test` taken together.
pub fn median_bandwidth(reference: ArrayView2<'_, f64>, test: ArrayView2<'_, f64>) -> Result<f64> {
    if reference.nrows() != test.nrows() {
        return Err(Error::DimensionMismatch(reference.nrows(), test.nrows()));
    }
    let pooled = concatenate(Axis(1), &[reference.view(), test.view()])
        .map_err(|_| Error::DimensionMismatch(reference.nrows(), test.nrows()))?;
    Ok(median_distance(pooled.view())? / 2.0_f64.sqrt())
}
