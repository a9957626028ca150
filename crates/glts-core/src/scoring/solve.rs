/// Dense linear-system solving for the global scorer.
///
/// In-place LU decomposition with partial pivoting over a row-major
/// `Array2<f64>`, followed by forward elimination of the right-hand side and
/// back substitution. A pivot below [`PIVOT_THRESHOLD`] reports the system
/// as singular instead of dividing by (nearly) zero.
use ndarray::{Array1, Array2};

/// Smallest pivot magnitude accepted before the system counts as singular.
const PIVOT_THRESHOLD: f64 = 1e-12;

/// Error produced when a system has no numerically unique solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Singular;

/// Solves `matrix · x = rhs` for `x`.
///
/// Consumes both operands; the caller keeps no copy, which bounds the
/// working memory at one n×n matrix.
///
/// # Errors
///
/// Returns [`Singular`] when elimination encounters a pivot below the
/// threshold.
pub(crate) fn solve_dense(
    mut matrix: Array2<f64>,
    mut rhs: Array1<f64>,
) -> Result<Array1<f64>, Singular> {
    let n = matrix.nrows();

    for column in 0..n {
        // Partial pivoting: bring the largest remaining magnitude up.
        let mut pivot_row = column;
        let mut pivot_magnitude = matrix[[column, column]].abs();
        for row in column + 1..n {
            let magnitude = matrix[[row, column]].abs();
            if magnitude > pivot_magnitude {
                pivot_row = row;
                pivot_magnitude = magnitude;
            }
        }
        if !pivot_magnitude.is_finite() || pivot_magnitude < PIVOT_THRESHOLD {
            return Err(Singular);
        }
        if pivot_row != column {
            for k in column..n {
                matrix.swap([column, k], [pivot_row, k]);
            }
            rhs.swap(column, pivot_row);
        }

        // Eliminate below the pivot.
        for row in column + 1..n {
            let factor = matrix[[row, column]] / matrix[[column, column]];
            if factor == 0.0 {
                continue;
            }
            for k in column..n {
                matrix[[row, k]] -= factor * matrix[[column, k]];
            }
            rhs[row] -= factor * rhs[column];
        }
    }

    // Back substitution.
    let mut solution = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let mut value = rhs[row];
        for k in row + 1..n {
            value -= matrix[[row, k]] * solution[k];
        }
        solution[row] = value / matrix[[row, row]];
    }
    Ok(solution)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use ndarray::array;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn solves_a_diagonal_system() {
        let matrix = array![[2.0, 0.0], [0.0, 4.0]];
        let rhs = array![2.0, 8.0];
        let solution = solve_dense(matrix, rhs).expect("regular system");
        assert_close(solution[0], 1.0);
        assert_close(solution[1], 2.0);
    }

    #[test]
    fn solves_a_system_that_needs_pivoting() {
        // The first pivot position is zero, forcing a row swap.
        let matrix = array![[0.0, 1.0], [1.0, 1.0]];
        let rhs = array![3.0, 5.0];
        let solution = solve_dense(matrix, rhs).expect("regular system");
        assert_close(solution[0], 2.0);
        assert_close(solution[1], 3.0);
    }

    #[test]
    fn solves_a_three_by_three_system() {
        let matrix = array![[2.0, 1.0, -1.0], [-3.0, -1.0, 2.0], [-2.0, 1.0, 2.0]];
        let rhs = array![8.0, -11.0, -3.0];
        let solution = solve_dense(matrix, rhs).expect("regular system");
        assert_close(solution[0], 2.0);
        assert_close(solution[1], 3.0);
        assert_close(solution[2], -1.0);
    }

    #[test]
    fn rejects_a_singular_system() {
        let matrix = array![[1.0, 2.0], [2.0, 4.0]];
        let rhs = array![1.0, 2.0];
        assert_eq!(solve_dense(matrix, rhs), Err(Singular));
    }

    #[test]
    fn empty_system_has_the_empty_solution() {
        let matrix = Array2::<f64>::zeros((0, 0));
        let rhs = Array1::<f64>::zeros(0);
        let solution = solve_dense(matrix, rhs).expect("trivially regular");
        assert_eq!(solution.len(), 0);
    }
}
