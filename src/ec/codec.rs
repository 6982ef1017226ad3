//! Sub-stripe Reed-Solomon codec (C3).
//!
//! Per-sub-stripe encode/decode via the Vandermonde generator matrix and
//! Gauss-Jordan inversion over GF(2^8). Operates on one sub-stripe's worth
//! of `k` data blocks and `m` parity blocks at a time; the caller (C7,
//! `session`) drives this once per sub-stripe.

use crate::error::{Error, Result};
use crate::gf::matrix::{self, Matrix};
use crate::gf::mul_region;
use tracing::instrument;

/// Computes the `m` parity blocks for one sub-stripe's `k` data blocks.
///
/// `parity[i] = sum_j G[i][j] * data[j]`.
#[instrument(skip(data, gen), fields(k = data.len(), m = gen.rows))]
pub fn encode(data: &[Vec<u8>], gen: &Matrix) -> Vec<Vec<u8>> {
    let k = data.len();
    let m = gen.rows;
    assert_eq!(gen.cols, k, "encode: generator/column mismatch");
    let blocksize = data[0].len();
    let mut parity = vec![vec![0u8; blocksize]; m];
    for (i, parity_block) in parity.iter_mut().enumerate() {
        for (j, data_block) in data.iter().enumerate() {
            mul_region(data_block, gen.get(i, j), parity_block, j != 0);
        }
    }
    parity
}

/// Reconstructs missing blocks given up to `m` erasures.
///
/// `blocks[0..k)` are data blocks, `blocks[k..k+m)` are parity blocks, each
/// `Some` if present or `None` if erased. On success every entry is
/// `Some`: data blocks are recovered first via the inverted present-block
/// submatrix, then any missing parity blocks are recomputed by re-running
/// the generator matrix over the now-complete data set.
#[instrument(skip(blocks, gen), fields(k = gen.cols, m = gen.rows))]
pub fn decode(blocks: &mut [Option<Vec<u8>>], gen: &Matrix) -> Result<()> {
    let k = gen.cols;
    let m = gen.rows;
    assert_eq!(blocks.len(), k + m, "decode: block count mismatch");

    let erased: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| b.is_none())
        .map(|(i, _)| i)
        .collect();
    if erased.len() > m {
        return Err(Error::DecodeInfeasible {
            erasures: erased.len(),
            max: m,
        });
    }
    if erased.is_empty() {
        return Ok(());
    }

    let blocksize = blocks
        .iter()
        .find_map(|b| b.as_ref().map(|v| v.len()))
        .expect("at least one block must survive when erased.len() <= m < k + m");

    // The first k present blocks, in index order, give us k independent
    // linear equations in the k original data values.
    let present: Vec<usize> = (0..k + m).filter(|i| blocks[*i].is_some()).take(k).collect();
    assert_eq!(present.len(), k, "fewer than k blocks survived");

    // Row r is the coefficient row for present block `present[r]`:
    // identity row if it's a data block, generator row if it's parity.
    let mut sub = Matrix::zeros(k, k);
    for (r, &idx) in present.iter().enumerate() {
        if idx < k {
            sub.set(r, idx, 1);
        } else {
            let gi = idx - k;
            for c in 0..k {
                sub.set(r, c, gen.get(gi, c));
            }
        }
    }
    let inv = matrix::invert(&sub).ok_or(Error::DecodeInfeasible {
        erasures: erased.len(),
        max: m,
    })?;

    // data[j] = sum_r inv[j][r] * present_value[r]
    let missing_data: Vec<usize> = erased.iter().copied().filter(|&i| i < k).collect();
    for &j in &missing_data {
        let mut out = vec![0u8; blocksize];
        for (r, &idx) in present.iter().enumerate() {
            let coeff = inv.get(j, r);
            let src = blocks[idx].as_ref().unwrap();
            mul_region(src, coeff, &mut out, r != 0);
        }
        blocks[j] = Some(out);
    }

    let missing_parity: Vec<usize> = erased.iter().copied().filter(|&i| i >= k).collect();
    if !missing_parity.is_empty() {
        let data: Vec<&[u8]> = (0..k).map(|j| blocks[j].as_deref().unwrap()).collect();
        for idx in missing_parity {
            let gi = idx - k;
            let mut out = vec![0u8; blocksize];
            for (j, data_block) in data.iter().enumerate() {
                mul_region(data_block, gen.get(gi, j), &mut out, j != 0);
            }
            blocks[idx] = Some(out);
        }
    }

    Ok(())
}
