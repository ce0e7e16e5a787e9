use crate::error::{Error, Result};

/// Pivots smaller than this are treated as zero
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Solve the square system `a · x = b` by Gauss-Jordan elimination with
/// partial pivoting
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = a.len();

    if n == 0 {
        return Err(Error::ComputationError("empty system".into()));
    }
    if b.len() != n {
        return Err(Error::ComputationError(format!(
            "right-hand side has {} entries, expected {}",
            b.len(),
            n
        )));
    }
    if a.iter().any(|row| row.len() != n) {
        return Err(Error::ComputationError("matrix must be square".into()));
    }

    // Augmented matrix [A|b]
    let mut augmented: Vec<Vec<f64>> = a
        .iter()
        .zip(b)
        .map(|(row, &rhs)| {
            let mut r = Vec::with_capacity(n + 1);
            r.extend_from_slice(row);
            r.push(rhs);
            r
        })
        .collect();

    for i in 0..n {
        // Pivot selection
        let mut max_row = i;
        let mut max_val = augmented[i][i].abs();
        for (j, row) in augmented.iter().enumerate().skip(i + 1) {
            if row[i].abs() > max_val {
                max_row = j;
                max_val = row[i].abs();
            }
        }

        if max_val < SINGULAR_TOLERANCE {
            return Err(Error::ComputationError(
                "matrix is singular to working precision".into(),
            ));
        }

        if max_row != i {
            augmented.swap(i, max_row);
        }

        let pivot = augmented[i][i];
        for value in augmented[i].iter_mut() {
            *value /= pivot;
        }

        let pivot_row = augmented[i].clone();
        for (j, row) in augmented.iter_mut().enumerate() {
            if j == i {
                continue;
            }
            let factor = row[i];
            if factor == 0.0 {
                continue;
            }
            for (value, p) in row.iter_mut().zip(&pivot_row) {
                *value -= factor * p;
            }
        }
    }

    Ok(augmented.into_iter().map(|row| row[n]).collect())
}
