//! Stripe marshaller (C6).
//!
//! Pure permutation between two buffer layouts, no field arithmetic:
//!
//! - **per-block**: one contiguous array per on-disk file, `SUBSTRIPES *
//!   blocksize` bytes, sub-stripes laid out consecutively.
//! - **stripe-major**: one array per sub-stripe, with every file's block
//!   for that sub-stripe laid out consecutively (`FData`/`FCoding` in
//!   [`crate::ec::pairing`] and [`crate::ec::codec`] both operate in this
//!   layout, since the pairing transform needs fast cell-at-`(substripe,
//!   column)` addressing).

use crate::error::{Error, Result};

/// Converts `K` (or `M_PARITY`) per-block arrays into `SUBSTRIPES`
/// stripe-major rows, each `count * blocksize` bytes.
///
/// `blocks[i]` must have length `substripes * blocksize` for every `i`.
pub fn to_stripe_major(blocks: &[Vec<u8>], substripes: usize, blocksize: usize) -> Result<Vec<Vec<u8>>> {
    let count = blocks.len();
    for b in blocks {
        if b.len() != substripes * blocksize {
            return Err(Error::SizeMismatch {
                len: b.len(),
                substripes,
            });
        }
    }

    let mut rows = vec![vec![0u8; count * blocksize]; substripes];
    for (i, block) in blocks.iter().enumerate() {
        for s in 0..substripes {
            let src = &block[s * blocksize..(s + 1) * blocksize];
            let dst = &mut rows[s][i * blocksize..(i + 1) * blocksize];
            dst.copy_from_slice(src);
        }
    }
    Ok(rows)
}

/// Inverse of [`to_stripe_major`]: reassembles `count` per-block arrays
/// from `substripes` stripe-major rows.
pub fn to_per_block(rows: &[Vec<u8>], count: usize, blocksize: usize) -> Vec<Vec<u8>> {
    let substripes = rows.len();
    let mut blocks = vec![vec![0u8; substripes * blocksize]; count];
    for (s, row) in rows.iter().enumerate() {
        for i in 0..count {
            let src = &row[i * blocksize..(i + 1) * blocksize];
            let dst = &mut blocks[i][s * blocksize..(s + 1) * blocksize];
            dst.copy_from_slice(src);
        }
    }
    blocks
}
