//! Dense linear algebra for ordinary least squares
//!
//! Free functions over row-major `Vec<Vec<f64>>` matrices, kept apart from
//! the statistics layer so they can be fuzzed on synthetic systems with
//! known solutions.

use thiserror::Error;

/// Row-major dense matrix
pub type Matrix = Vec<Vec<f64>>;

/// Relative pivot tolerance below which a matrix is treated as singular
const PIVOT_TOLERANCE: f64 = 1e-10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinalgError {
    #[error("Dimension mismatch: {left_rows}x{left_cols} by {right_rows}x{right_cols}")]
    DimensionMismatch {
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },

    #[error("Matrix is not square: {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("Matrix is not positive definite (pivot {pivot})")]
    NotPositiveDefinite { pivot: usize },

    #[error("Ragged matrix: row {row} has {len} columns, expected {expected}")]
    Ragged {
        row: usize,
        len: usize,
        expected: usize,
    },
}

pub type Result<T> = std::result::Result<T, LinalgError>;

fn shape(matrix: &[Vec<f64>]) -> Result<(usize, usize)> {
    let rows = matrix.len();
    let cols = matrix.first().map_or(0, Vec::len);
    for (row, values) in matrix.iter().enumerate() {
        if values.len() != cols {
            return Err(LinalgError::Ragged {
                row,
                len: values.len(),
                expected: cols,
            });
        }
    }
    Ok((rows, cols))
}

/// Transpose an `r x c` matrix into `c x r`
pub fn transpose(matrix: &[Vec<f64>]) -> Result<Matrix> {
    let (rows, cols) = shape(matrix)?;
    let mut out = vec![vec![0.0; rows]; cols];
    for (i, row) in matrix.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            out[j][i] = *value;
        }
    }
    Ok(out)
}

/// Matrix product `a * b`
pub fn multiply(a: &[Vec<f64>], b: &[Vec<f64>]) -> Result<Matrix> {
    let (a_rows, a_cols) = shape(a)?;
    let (b_rows, b_cols) = shape(b)?;
    if a_cols != b_rows {
        return Err(LinalgError::DimensionMismatch {
            left_rows: a_rows,
            left_cols: a_cols,
            right_rows: b_rows,
            right_cols: b_cols,
        });
    }

    let mut out = vec![vec![0.0; b_cols]; a_rows];
    for (i, a_row) in a.iter().enumerate() {
        for (k, a_ik) in a_row.iter().enumerate() {
            if *a_ik == 0.0 {
                continue;
            }
            for (j, b_kj) in b[k].iter().enumerate() {
                out[i][j] += a_ik * b_kj;
            }
        }
    }
    Ok(out)
}

/// Matrix-vector product `a * v`
pub fn multiply_vector(a: &[Vec<f64>], v: &[f64]) -> Result<Vec<f64>> {
    let (rows, cols) = shape(a)?;
    if cols != v.len() {
        return Err(LinalgError::DimensionMismatch {
            left_rows: rows,
            left_cols: cols,
            right_rows: v.len(),
            right_cols: 1,
        });
    }
    Ok(a.iter()
        .map(|row| row.iter().zip(v).map(|(x, y)| x * y).sum())
        .collect())
}

/// Lower-triangular Cholesky factor `L` with `a = L * Lᵀ`
///
/// Fails with [`LinalgError::NotPositiveDefinite`] when a pivot is not
/// comfortably positive, which is how collinear design columns show up.
pub fn cholesky_decompose(a: &[Vec<f64>]) -> Result<Matrix> {
    let (rows, cols) = shape(a)?;
    if rows != cols {
        return Err(LinalgError::NotSquare { rows, cols });
    }
    let n = rows;
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                let tolerance = PIVOT_TOLERANCE * a[i][i].abs().max(1.0);
                if !sum.is_finite() || sum <= tolerance {
                    return Err(LinalgError::NotPositiveDefinite { pivot: i });
                }
                l[i][i] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Ok(l)
}

/// Solve `L * Lᵀ * x = b` given the Cholesky factor `L`
pub fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let (n, cols) = shape(l)?;
    if n != cols {
        return Err(LinalgError::NotSquare { rows: n, cols });
    }
    if b.len() != n {
        return Err(LinalgError::DimensionMismatch {
            left_rows: n,
            left_cols: n,
            right_rows: b.len(),
            right_cols: 1,
        });
    }

    // Forward substitution: L * z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|k| l[i][k] * z[k]).sum();
        z[i] = (b[i] - sum) / l[i][i];
    }

    // Back substitution: Lᵀ * x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|k| l[k][i] * x[k]).sum();
        x[i] = (z[i] - sum) / l[i][i];
    }

    Ok(x)
}

/// Least-squares coefficients for `design * beta ≈ response`
///
/// Solves the normal equations `(XᵀX) β = Xᵀy` through Cholesky.
pub fn solve_least_squares(design: &[Vec<f64>], response: &[f64]) -> Result<Vec<f64>> {
    let xt = transpose(design)?;
    let xtx = multiply(&xt, design)?;
    let xty = multiply_vector(&xt, response)?;
    let l = cholesky_decompose(&xtx)?;
    cholesky_solve(&l, &xty)
}
