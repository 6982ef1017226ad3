//! Single data-node repair engine (C5).
//!
//! Losing exactly one data node doesn't need a full stripe decode: the
//! pairing transform (C4) leaves half of every column's sub-stripes
//! untouched by any pairing level, which is enough surviving structure to
//! rebuild the lost column from a quarter of the stripe's cells instead
//! of the whole thing. Concretely, for lost data column `t`:
//!
//! 1. **Load set.** `t` and its pairing partner `p` sit in the same
//!    level; the four sub-stripes where `t` is untouched by that level
//!    are exactly the four where `p` *is* touched. At those four
//!    sub-stripes, read the pure (pairing-inverted) values of the other
//!    eight data columns and two of the four parity columns — ten cells
//!    per sub-stripe, stacked into a 4x10 matrix `L`.
//! 2. **Recovery matrix.** `R` is 10x10: one identity row per surviving
//!    data column (picking its value straight out of `X`, the vector of
//!    original data values) and two Vandermonde rows (degree 0 and 1) for
//!    the two parity columns used. `L = X * R`, so `X = L * R^-1`.
//! 3. **Solve**, independently per byte offset, recovers the pure value
//!    of every one of the ten data columns at those four sub-stripes —
//!    including `t` and `p`.
//! 4. **Undo pairing** for `t`'s other four sub-stripes (where it *is*
//!    paired with `p`): `p`'s raw stored cell there, combined with the
//!    now-known pure value of `p` at the partner sub-stripe just solved,
//!    gives `t`'s original value directly from the forward pair equation
//!    — no matrix needed for that half.
//!
//! `p` itself is also rewritten in full: the skipped pairing level leaves
//! its four touched-role cells still forward-transformed, and step 3's
//! solve is what restores them.

use crate::ec::pairing::{self, cell, cell_mut, role_and_partner, role_of_row, row_partner, Buffer, Role, LEVELS};
use crate::error::{Error, Result};
use crate::gf::matrix::{self, Matrix};
use crate::gf::{div, mul, mul_region, xor_region};
use crate::SUBSTRIPES;

/// Rebuilds data column `t` and restores its pairing partner across every
/// sub-stripe, using the load-set/recovery-matrix procedure above.
///
/// `fdata[*][t]` is overwritten entirely; `fdata[*][partner(t)]` is
/// overwritten at the four sub-stripes its own pairing role left
/// un-inverted. `fcoding` is read-only. `gen` is the session's `m x k`
/// RS generator matrix — only its first two rows (the parity-0 and
/// parity-1 equations) are used.
///
/// # Panics
/// Panics if `t >= k` (only data columns are repairable this way; a lost
/// parity column is simply recomputed by [`crate::ec::codec::encode`]).
pub fn repair_data_column(
    fdata: &mut [Vec<u8>],
    fcoding: &[Vec<u8>],
    t: usize,
    k: usize,
    blocksize: usize,
    gen: &Matrix,
) -> Result<()> {
    assert!(t < k, "repair_data_column: column {t} is not a data column");

    let (role, partner) = role_and_partner(Buffer::Data, t);
    let level = &LEVELS[pairing::level_index_for(Buffer::Data, t)];
    let untouched_role = match role {
        Role::Hi => Role::Lo,
        Role::Lo => Role::Hi,
    };
    let load_rows: Vec<usize> = (0..SUBSTRIPES).filter(|&r| role_of_row(level.stride, r) == untouched_role).collect();
    let touched_rows: Vec<usize> = (0..SUBSTRIPES).filter(|&r| role_of_row(level.stride, r) == role).collect();

    let other_data_cols: Vec<usize> = (0..k).filter(|&c| c != t && c != partner).collect();
    let parity_cols = [0usize, 1usize];

    // Recovery matrix R maps the k unknowns (rows) to the k measurements
    // (columns, `L = X * R`): column i for a surviving data column picks
    // out that column's unknown directly (`R[c][i] = 1` iff
    // `other_data_cols[i] == c`); the last two columns are the parity-0
    // (all-ones) and parity-1 (Vandermonde degree-1) equations.
    let mut r = Matrix::zeros(k, k);
    for (i, &c) in other_data_cols.iter().enumerate() {
        r.set(c, i, 1);
    }
    for c in 0..k {
        r.set(c, k - 2, gen.get(0, c));
        r.set(c, k - 1, gen.get(1, c));
    }
    let r_inv = matrix::invert(&r).ok_or(Error::RecoveryMatrixSingular)?;

    // Pure cells for the measurement columns, at the four load-set rows.
    let measurement_cols: Vec<(Buffer, usize)> = other_data_cols
        .iter()
        .map(|&c| (Buffer::Data, c))
        .chain(parity_cols.iter().map(|&c| (Buffer::Coding, c)))
        .collect();

    let mut recovered_t = vec![vec![0u8; blocksize]; load_rows.len()];
    let mut recovered_partner = vec![vec![0u8; blocksize]; load_rows.len()];

    for b in 0..blocksize {
        // L_b: one row per load-set sub-stripe, one column per measurement.
        let mut l_b = Matrix::zeros(load_rows.len(), k);
        for (row_idx, &row) in load_rows.iter().enumerate() {
            for (m, &(buffer, col)) in measurement_cols.iter().enumerate() {
                let pure = pairing::pure_cell(fdata, fcoding, buffer, col, row, blocksize);
                l_b.set(row_idx, m, pure[b]);
            }
        }
        // X_b = L_b * R^-1.
        for row_idx in 0..load_rows.len() {
            let mut x_t = 0u8;
            let mut x_partner = 0u8;
            for m in 0..k {
                let l = l_b.get(row_idx, m);
                x_t ^= mul(l, r_inv.get(m, t));
                x_partner ^= mul(l, r_inv.get(m, partner));
            }
            recovered_t[row_idx][b] = x_t;
            recovered_partner[row_idx][b] = x_partner;
        }
    }

    for (row_idx, &row) in load_rows.iter().enumerate() {
        cell_mut(&mut fdata[row], t, blocksize).copy_from_slice(&recovered_t[row_idx]);
        cell_mut(&mut fdata[row], partner, blocksize).copy_from_slice(&recovered_partner[row_idx]);
    }

    // The other half: t's touched sub-stripes, paired within this level
    // against a load-set sub-stripe whose partner value we just solved.
    for &row in &touched_rows {
        let partner_row = row_partner(level.stride, row);
        let partner_pure_idx = load_rows
            .iter()
            .position(|&r| r == partner_row)
            .expect("touched row's partner must be a load-set row");
        let partner_pure = &recovered_partner[partner_pure_idx];
        let partner_raw = cell(&fdata[partner_row], partner, blocksize).to_vec();

        let t_orig = match role {
            Role::Hi => {
                // lo' (partner_raw) = lo_orig (partner_pure) ^ hi_orig (t).
                let mut out = partner_raw.clone();
                xor_region(partner_pure, &mut out);
                out
            }
            Role::Lo => {
                // hi' (partner_raw) = e*lo_orig(t) ^ hi_orig (partner_pure).
                let mut diff = partner_raw.clone();
                xor_region(partner_pure, &mut diff);
                let e_inv = div(1, level.e)?;
                let mut out = vec![0u8; blocksize];
                mul_region(&diff, e_inv, &mut out, false);
                out
            }
        };
        cell_mut(&mut fdata[row], t, blocksize).copy_from_slice(&t_orig);
    }

    Ok(())
}

/// Validates that a repair request names exactly one data-column erasure,
/// translating any other erasure count into the caller's `DecodeInfeasible`
/// path instead (this engine only covers the single-data-node case; two or
/// more erasures, or a parity-only erasure, fall back to the general
/// sub-stripe decode in [`crate::ec::codec`]).
pub fn is_repairable(erased_columns: &[usize], k: usize) -> bool {
    erased_columns.len() == 1 && erased_columns[0] < k
}

pub fn single_data_erasure(erased_columns: &[usize], k: usize, m: usize) -> Result<usize> {
    if !is_repairable(erased_columns, k) {
        return Err(Error::DecodeInfeasible {
            erasures: erased_columns.len(),
            max: m,
        });
    }
    Ok(erased_columns[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ec::{codec, pairing as pairing_mod};
    use crate::gf::vandermonde::generator_matrix;

    fn sample_stripe(k: usize, m: usize, substripes: usize, blocksize: usize) -> (Vec<Vec<u8>>, Vec<Vec<u8>>, Matrix) {
        let gen = generator_matrix(k, m);
        let mut fdata = Vec::with_capacity(substripes);
        let mut fcoding = Vec::with_capacity(substripes);
        for s in 0..substripes {
            let data: Vec<Vec<u8>> = (0..k)
                .map(|j| (0..blocksize).map(|b| ((s * 13 + j * 31 + b * 7) % 256) as u8).collect())
                .collect();
            let parity = codec::encode(&data, &gen);
            fdata.push(data.concat());
            fcoding.push(parity.concat());
        }
        pairing_mod::forward(&mut fdata, &mut fcoding, blocksize);
        (fdata, fcoding, gen)
    }

    #[test]
    fn repairs_every_data_column_at_every_substripe() {
        let (k, m, substripes, blocksize) = (10, 4, 8, 6);
        let (fdata0, fcoding, gen) = sample_stripe(k, m, substripes, blocksize);

        for t in 0..k {
            let mut fdata = fdata0.clone();
            for row in fdata.iter_mut() {
                cell_mut(row, t, blocksize).fill(0);
            }
            repair_data_column(&mut fdata, &fcoding, t, k, blocksize, &gen).unwrap();
            assert_eq!(fdata, fdata0, "column {t} did not repair correctly");
        }
    }

    #[test]
    fn single_data_erasure_identifies_the_lone_column() {
        assert_eq!(single_data_erasure(&[3], 10, 4).unwrap(), 3);
    }

    #[test]
    fn two_erasures_are_not_single_node_repairable() {
        assert!(!is_repairable(&[3, 4], 10));
        let err = single_data_erasure(&[3, 4], 10, 4).unwrap_err();
        assert!(matches!(err, Error::DecodeInfeasible { erasures: 2, max: 4 }));
    }

    #[test]
    fn a_parity_erasure_is_not_single_node_repairable() {
        assert!(!is_repairable(&[11], 10));
    }
}
