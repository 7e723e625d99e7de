//! Least squares helpers on top of nalgebra

use nalgebra::{DMatrix, DVector, Dyn, SVD};

use super::AnalysisError;

/// Solution of a linear least squares problem
#[derive(Debug, Clone)]
pub struct LeastSquares {
    /// Minimum norm solution
    pub solution: DVector<f64>,
    /// Effective rank of the system matrix
    pub rank: usize,
}

/// Solve `min |a x - b|` using the SVD
///
/// Singular values below `eps * max(rows, cols) * sigma_max` are treated as zero,
/// giving the minimum norm solution for rank deficient systems.
pub fn lstsq(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<LeastSquares, AnalysisError> {
    if a.nrows() != b.len() {
        return Err(AnalysisError::DimensionMismatch {
            rows: a.nrows(),
            values: b.len(),
        });
    }
    if a.nrows() == 0 || a.ncols() == 0 {
        return Err(AnalysisError::TooFewPoints {
            needed: 1,
            got: a.nrows(),
        });
    }

    let (svd, tol) = decompose(a);
    let rank = svd.rank(tol);
    let solution = svd
        .solve(b, tol)
        .map_err(|e| AnalysisError::Solver(e.to_string()))?;

    Ok(LeastSquares { solution, rank })
}

/// Least squares solutions for several right hand sides (the columns of `b`) at once
pub fn lstsq_columns(a: &DMatrix<f64>, b: &DMatrix<f64>) -> Result<DMatrix<f64>, AnalysisError> {
    if a.nrows() != b.nrows() {
        return Err(AnalysisError::DimensionMismatch {
            rows: a.nrows(),
            values: b.nrows(),
        });
    }
    if a.nrows() == 0 || a.ncols() == 0 {
        return Err(AnalysisError::TooFewPoints {
            needed: 1,
            got: a.nrows(),
        });
    }

    let (svd, tol) = decompose(a);
    svd.solve(b, tol)
        .map_err(|e| AnalysisError::Solver(e.to_string()))
}

fn decompose(a: &DMatrix<f64>) -> (SVD<f64, Dyn, Dyn>, f64) {
    let svd = a.clone().svd(true, true);
    let sigma_max = svd.singular_values.max();
    let tol = f64::EPSILON * a.nrows().max(a.ncols()) as f64 * sigma_max;
    (svd, tol)
}

/// Fit a polynomial of degree `deg` to `(x, y)`
///
/// Coefficients are returned lowest order first: `y ≈ c[0] + c[1] x + ...`
pub fn polyfit(x: &[f64], y: &[f64], deg: usize) -> Result<Vec<f64>, AnalysisError> {
    if x.len() != y.len() {
        return Err(AnalysisError::DimensionMismatch {
            rows: x.len(),
            values: y.len(),
        });
    }
    if x.len() < deg + 1 {
        return Err(AnalysisError::TooFewPoints {
            needed: deg + 1,
            got: x.len(),
        });
    }

    let a = DMatrix::from_fn(x.len(), deg + 1, |r, c| x[r].powi(c as i32));
    let b = DVector::from_column_slice(y);
    Ok(lstsq(&a, &b)?.solution.iter().copied().collect())
}

/// Evaluate a polynomial with coefficients lowest order first
pub fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Evenly spaced values from `start` to `end`, both included
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (num - 1) as f64;
            (0..num).map(|i| start + step * i as f64).collect()
        }
    }
}

/// The Macaulay bracket, `<x> = max(x, 0)`
pub fn macaulay(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        0.0
    }
}

/// Euclidean norm
pub fn norm(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().map(|v| v * v).sum::<f64>().sqrt()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
