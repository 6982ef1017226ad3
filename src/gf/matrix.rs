//! Gauss-Jordan matrix inversion over GF(2^8).
//!
//! Shared by the sub-stripe codec (C3), which inverts the present-block
//! submatrix to decode after two or more erasures.

use crate::gf::vandermonde::Matrix;
use crate::gf::{div, mul};

/// Inverts a square GF(2^8) matrix via augmented-identity Gauss-Jordan
/// elimination.
///
/// Returns `None` if `m` is singular. `m` must be square; a non-square
/// input is a programmer error and panics.
pub fn invert(m: &Matrix) -> Option<Matrix> {
    assert_eq!(m.rows, m.cols, "invert: matrix must be square");
    let n = m.rows;

    // Build the augmented [m | I] matrix, n rows by 2n columns.
    let mut aug = Matrix::zeros(n, 2 * n);
    for r in 0..n {
        for c in 0..n {
            aug.set(r, c, m.get(r, c));
        }
        aug.set(r, n + r, 1);
    }

    for pivot in 0..n {
        // Find a nonzero pivot, swapping rows if necessary.
        if aug.get(pivot, pivot) == 0 {
            let swap_with = (pivot + 1..n).find(|&r| aug.get(r, pivot) != 0)?;
            swap_rows(&mut aug, pivot, swap_with);
        }

        let pivot_val = aug.get(pivot, pivot);
        let pivot_inv = div(1, pivot_val).ok()?;
        scale_row(&mut aug, pivot, pivot_inv);

        for r in 0..n {
            if r == pivot {
                continue;
            }
            let factor = aug.get(r, pivot);
            if factor == 0 {
                continue;
            }
            eliminate_row(&mut aug, pivot, r, factor);
        }
    }

    let mut inv = Matrix::zeros(n, n);
    for r in 0..n {
        for c in 0..n {
            inv.set(r, c, aug.get(r, n + c));
        }
    }
    Some(inv)
}

fn swap_rows(m: &mut Matrix, a: usize, b: usize) {
    if a == b {
        return;
    }
    for c in 0..m.cols {
        let tmp = m.get(a, c);
        m.set(a, c, m.get(b, c));
        m.set(b, c, tmp);
    }
}

fn scale_row(m: &mut Matrix, r: usize, factor: u8) {
    for c in 0..m.cols {
        let v = m.get(r, c);
        m.set(r, c, mul(v, factor));
    }
}

/// `row[target] ^= factor * row[pivot]`, eliminating `target`'s entry in
/// the pivot column.
fn eliminate_row(m: &mut Matrix, pivot: usize, target: usize, factor: u8) {
    for c in 0..m.cols {
        let p = m.get(pivot, c);
        let t = m.get(target, c);
        m.set(target, c, t ^ mul(p, factor));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gf::vandermonde::generator_matrix;

    fn identity(n: usize) -> Matrix {
        let mut id = Matrix::zeros(n, n);
        for i in 0..n {
            id.set(i, i, 1);
        }
        id
    }

    fn mat_mul(a: &Matrix, b: &Matrix) -> Matrix {
        assert_eq!(a.cols, b.rows);
        let mut out = Matrix::zeros(a.rows, b.cols);
        for r in 0..a.rows {
            for c in 0..b.cols {
                let mut acc = 0u8;
                for k in 0..a.cols {
                    acc ^= mul(a.get(r, k), b.get(k, c));
                }
                out.set(r, c, acc);
            }
        }
        out
    }

    #[test]
    fn inverts_identity_to_itself() {
        let id = identity(5);
        let inv = invert(&id).unwrap();
        assert_eq!(inv, id);
    }

    #[test]
    fn inverse_of_vandermonde_submatrix_round_trips() {
        // First 10 rows of a 14x10 extended generator (identity + 4
        // parity rows) form an invertible 10x10 matrix for any choice of
        // 10 distinct evaluation points; here we just use the identity
        // rows plus parity rows 0..4 as a stand-in square matrix.
        let k = 10;
        let m = 4;
        let gen = generator_matrix(k, m);
        let mut square = Matrix::zeros(k, k);
        for j in 0..k - m {
            square.set(j, j, 1);
        }
        for i in 0..m {
            for j in 0..k {
                square.set(k - m + i, j, gen.get(i, j));
            }
        }
        let inv = invert(&square).expect("square should be invertible");
        let product = mat_mul(&square, &inv);
        assert_eq!(product, identity(k));
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let mut m = Matrix::zeros(2, 2);
        m.set(0, 0, 1);
        m.set(0, 1, 1);
        m.set(1, 0, 1);
        m.set(1, 1, 1);
        assert!(invert(&m).is_none());
    }
}
