//! Pairing transform engine (C4).
//!
//! Applies and inverts the seven-level pairwise XOR/multiply schedule that
//! mixes specific block positions between the `SUBSTRIPES` sub-stripe rows
//! of `FData`/`FCoding` after the sub-stripe RS codec (C3) has run.
//!
//! Each level pairs its two cell-columns *across* a sub-stripe stride: the
//! higher column's cell at the low sub-stripe of a stride pair is mixed
//! with the lower column's cell at the high sub-stripe. Concretely, for a
//! level with columns `(c0, c1)`, `c0 < c1`, and a stride pair `(s_lo,
//! s_hi)`, the two cells touched are `(s_lo, c1)` ("lo") and `(s_hi, c0)`
//! ("hi") — one pair spans both a column boundary and a sub-stripe
//! boundary at once. This is the scheme the source's active decode path
//! implements; see the module's unit tests for a worked trace.
//!
//! A consequence worth keeping in mind for the repair engine (C5): within
//! a level, each of its two columns is touched at only half of
//! `SUBSTRIPES` sub-stripes (whichever half its role — lo or hi — owns).
//! The other half of that column is never touched by any level and stays
//! a plain pre-transform RS value.

use crate::gf::{inv, mul_region, xor_region};
use crate::SUBSTRIPES;

/// The seven level-mixing constants, indexed by level.
pub const E: [u8; 7] = [20, 18, 21, 16, 25, 13, 54];

/// Which of the two stripe-major buffers a level pairs cells in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffer {
    Data,
    Coding,
}

/// Which half of a stride pair a column plays in a level: "lo" columns
/// live at the pair's low sub-stripe, "hi" columns at its high sub-stripe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Lo,
    Hi,
}

/// One of the seven pairing levels: which buffer, which two columns in
/// that buffer, and the sub-stripe stride the pairing uses.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Level {
    pub buffer: Buffer,
    /// `(c0, c1)` with `c0 < c1`. `c0` plays the "hi" role, `c1` the "lo"
    /// role — see the module docs for the cross-column assignment.
    pub columns: (usize, usize),
    pub stride: usize,
    pub e: u8,
}

pub(crate) const LEVELS: [Level; 7] = [
    Level { buffer: Buffer::Data, columns: (0, 1), stride: 1, e: E[0] },
    Level { buffer: Buffer::Data, columns: (2, 3), stride: 2, e: E[1] },
    Level { buffer: Buffer::Data, columns: (4, 5), stride: 2, e: E[2] },
    Level { buffer: Buffer::Data, columns: (6, 7), stride: 2, e: E[3] },
    Level { buffer: Buffer::Data, columns: (8, 9), stride: 4, e: E[4] },
    Level { buffer: Buffer::Coding, columns: (0, 1), stride: 4, e: E[5] },
    Level { buffer: Buffer::Coding, columns: (2, 3), stride: 4, e: E[6] },
];

/// Partitions `[0, SUBSTRIPES)` into disjoint `(low, low + stride)` pairs,
/// grouping so each group of `2 * stride` consecutive sub-stripes pairs
/// its first half against its second half.
pub(crate) fn stride_pairs(stride: usize) -> Vec<(usize, usize)> {
    let group = 2 * stride;
    let mut pairs = Vec::with_capacity(SUBSTRIPES / 2);
    let mut base = 0;
    while base < SUBSTRIPES {
        for i in 0..stride {
            pairs.push((base + i, base + i + stride));
        }
        base += group;
    }
    pairs
}

/// Whether `row` is the low or high half of its stride pair.
pub(crate) fn role_of_row(stride: usize, row: usize) -> Role {
    for (lo, hi) in stride_pairs(stride) {
        if lo == row {
            return Role::Lo;
        }
        if hi == row {
            return Role::Hi;
        }
    }
    unreachable!("row {row} out of range for stride {stride}")
}

/// The row a stride pair pairs `row` with.
pub(crate) fn row_partner(stride: usize, row: usize) -> usize {
    for (lo, hi) in stride_pairs(stride) {
        if lo == row {
            return hi;
        }
        if hi == row {
            return lo;
        }
    }
    unreachable!("row {row} out of range for stride {stride}")
}

/// Index into [`LEVELS`] for a given buffer-relative column.
pub(crate) fn level_index_for(buffer: Buffer, col: usize) -> usize {
    match buffer {
        Buffer::Data => col / 2,
        Buffer::Coding => 5 + col / 2,
    }
}

/// A column's role (lo/hi) within its level, and its partner column
/// (buffer-relative) in that same level.
pub(crate) fn role_and_partner(buffer: Buffer, col: usize) -> (Role, usize) {
    let level = &LEVELS[level_index_for(buffer, col)];
    if col == level.columns.0 {
        (Role::Hi, level.columns.1)
    } else {
        (Role::Lo, level.columns.0)
    }
}

pub(crate) fn cell<'a>(row: &'a [u8], col: usize, blocksize: usize) -> &'a [u8] {
    &row[col * blocksize..(col + 1) * blocksize]
}

pub(crate) fn cell_mut(row: &mut [u8], col: usize, blocksize: usize) -> &mut [u8] {
    &mut row[col * blocksize..(col + 1) * blocksize]
}

/// Forward pair: `lo ^= hi; hi ^= e * lo` (post-XOR `lo`).
///
/// Net linear map: `lo' = lo ^ hi`, `hi' = e*lo' ^ hi = e*lo ^ (e^1)*hi`.
pub(crate) fn forward_pair(lo: &mut [u8], hi: &mut [u8], e: u8) {
    xor_region(hi, lo); // lo = lo ^ hi
    mul_region(lo, e, hi, true); // hi ^= e * lo
}

/// Inverse pair. The forward map is `[lo'; hi'] = [[1,1],[e,e^1]] * [lo;
/// hi]`, a matrix with determinant `1` in GF(2^8) (`(e^1) ^ e == 1`), so
/// its inverse is the adjugate `[[e^1,1],[e,1]]` with no division needed:
/// `lo = (e^1)*lo' ^ hi'`, `hi = e*lo' ^ hi'`.
pub(crate) fn inverse_pair(lo: &mut [u8], hi: &mut [u8], e: u8) {
    let lo_saved = lo.to_vec();
    let hi_saved = hi.to_vec();
    let e1 = e ^ 1;
    mul_region(&lo_saved, e1, lo, false); // lo = e1 * lo'
    xor_region(&hi_saved, lo); // lo ^= hi'  => lo = e1*lo' ^ hi'
    mul_region(&lo_saved, e, hi, false); // hi = e * lo'
    xor_region(&hi_saved, hi); // hi ^= hi'  => hi = e*lo' ^ hi'
}

fn apply_level(
    level: &Level,
    fdata: &mut [Vec<u8>],
    fcoding: &mut [Vec<u8>],
    blocksize: usize,
    k: usize,
    erased_columns: &[usize],
    pair_fn: fn(&mut [u8], &mut [u8], u8),
) {
    let rows: &mut [Vec<u8>] = match level.buffer {
        Buffer::Data => fdata,
        Buffer::Coding => fcoding,
    };
    let (c0, c1) = level.columns;
    let abs_hi_col = absolute_column(level.buffer, c0, k);
    let abs_lo_col = absolute_column(level.buffer, c1, k);
    if erased_columns.contains(&abs_hi_col) || erased_columns.contains(&abs_lo_col) {
        // Either column of this level has no surviving data at all; no
        // pair can be inverted without its missing partner. The repair
        // engine (C5) reconstructs both columns of a skipped level
        // directly instead of going through this generic path.
        return;
    }
    for (s_lo, s_hi) in stride_pairs(level.stride) {
        let (left, right) = rows.split_at_mut(s_hi);
        let lo = cell_mut(&mut left[s_lo], c1, blocksize);
        let hi = cell_mut(&mut right[0], c0, blocksize);
        pair_fn(lo, hi, level.e);
    }
}

/// Absolute column index for a level's buffer-relative column, in the
/// `[0, K + M_PARITY)` numbering the repair and codec layers use (data
/// columns first, then coding columns).
pub(crate) fn absolute_column(buffer: Buffer, col: usize, k: usize) -> usize {
    match buffer {
        Buffer::Data => col,
        Buffer::Coding => k + col,
    }
}

/// Applies all seven levels in order, mutating `fdata`/`fcoding` in place.
pub fn forward(fdata: &mut [Vec<u8>], fcoding: &mut [Vec<u8>], blocksize: usize) {
    for level in LEVELS.iter() {
        apply_level(level, fdata, fcoding, blocksize, crate::K, &[], forward_pair);
    }
}

/// Applies the inverse of all seven levels, in reverse order.
///
/// `erased_columns` holds the absolute `[0, K + M_PARITY)` indices of any
/// columns with no surviving data (an erased node spans every sub-stripe,
/// so its column is entirely absent rather than merely containing stale
/// bytes). A level with either column in this set is skipped entirely —
/// its live column's cells stay in their forward-transformed state. The
/// caller is responsible for reconstructing skipped columns afterwards
/// (C5/C3).
pub fn inverse(
    fdata: &mut [Vec<u8>],
    fcoding: &mut [Vec<u8>],
    blocksize: usize,
    erased_columns: &[usize],
) {
    for level in LEVELS.iter().rev() {
        apply_level(level, fdata, fcoding, blocksize, crate::K, erased_columns, inverse_pair);
    }
}

/// Per-sub-stripe erasure set for the general decode fallback (C3).
///
/// `inverse` restores a level only when *both* of its columns survive; if
/// exactly one is erased, the whole level is skipped and the surviving
/// column's own touched-role rows are left forward-transformed rather than
/// plain RS values. The general sub-stripe decode that follows `inverse`
/// on the ≥2-erasure path must treat those rows as erased too, on top of
/// the columns that are actually missing, or it'll happily "reconstruct"
/// real data from still-mixed bytes. This has no effect on rows/columns
/// untouched by a half-erased level — those are already pure regardless.
pub(crate) fn effective_erasures_at(erased_columns: &[usize], k: usize, row: usize) -> Vec<usize> {
    let mut result = erased_columns.to_vec();
    for level in LEVELS.iter() {
        let abs0 = absolute_column(level.buffer, level.columns.0, k);
        let abs1 = absolute_column(level.buffer, level.columns.1, k);
        let col0_erased = erased_columns.contains(&abs0);
        let col1_erased = erased_columns.contains(&abs1);
        if col0_erased == col1_erased {
            // Neither or both erased: either nothing to taint, or the
            // whole level is already accounted for.
            continue;
        }
        let (surviving_abs, surviving_role) = if col0_erased { (abs1, Role::Lo) } else { (abs0, Role::Hi) };
        if role_of_row(level.stride, row) == surviving_role && !result.contains(&surviving_abs) {
            result.push(surviving_abs);
        }
    }
    result
}

/// Reads cell `(substripe, column)` out of `fdata`/`fcoding`, by absolute
/// column index `[0, K + M_PARITY)` (data columns first). Used by the
/// repair engine (C5) to load the surviving cells it needs.
pub fn read_cell<'a>(
    fdata: &'a [Vec<u8>],
    fcoding: &'a [Vec<u8>],
    substripe: usize,
    column: usize,
    k: usize,
    blocksize: usize,
) -> &'a [u8] {
    if column < k {
        cell(&fdata[substripe], column, blocksize)
    } else {
        cell(&fcoding[substripe], column - k, blocksize)
    }
}

/// Recovers the pure (pre-pairing) value of a *surviving* column's cell
/// at `row`, undoing its level's pairing in place if `row` is one the
/// level actually touches for this column.
///
/// Used by the repair engine (C5) to read a handful of cells out of an
/// otherwise still-forward-transformed stripe without inverting the
/// whole thing. Panics if the column's partner cell is itself missing —
/// callers must only ask this of columns whose pairing partner survives.
pub(crate) fn pure_cell(
    fdata: &[Vec<u8>],
    fcoding: &[Vec<u8>],
    buffer: Buffer,
    col: usize,
    row: usize,
    blocksize: usize,
) -> Vec<u8> {
    let level = &LEVELS[level_index_for(buffer, col)];
    let (my_role, partner_col) = role_and_partner(buffer, col);
    if role_of_row(level.stride, row) != my_role {
        // This level never touches (row, col); it's already pure.
        let rows = match buffer {
            Buffer::Data => fdata,
            Buffer::Coding => fcoding,
        };
        return cell(&rows[row], col, blocksize).to_vec();
    }

    let partner_row = row_partner(level.stride, row);
    let rows = match buffer {
        Buffer::Data => fdata,
        Buffer::Coding => fcoding,
    };
    let mut this_val = cell(&rows[row], col, blocksize).to_vec();
    let mut partner_val = cell(&rows[partner_row], partner_col, blocksize).to_vec();
    match my_role {
        Role::Lo => {
            inverse_pair(&mut this_val, &mut partner_val, level.e);
            this_val
        }
        Role::Hi => {
            inverse_pair(&mut partner_val, &mut this_val, level.e);
            this_val
        }
    }
}
