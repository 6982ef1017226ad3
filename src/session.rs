//! Codec session (C7).
//!
//! Ties the sub-stripe RS codec (`ec::codec`), the pairing transform
//! (`ec::pairing`), single-node repair (`ec::repair`), and the stripe
//! marshaller (`ec::marshal`) into the two entry points a caller needs:
//! [`Session::encode`] and [`Session::decode`]. A session is fixed to one
//! `blocksize` for its lifetime and owns all its working buffers; it holds
//! no file handles and performs no I/O itself (the `cli` binary does that).

use crate::ec::{codec, marshal, pairing, repair};
use crate::error::{Error, Result};
use crate::gf::vandermonde::{self, Matrix};
use crate::{K, M_PARITY, PAD_BYTE, SUBSTRIPES};
use tracing::{debug, info, instrument};

/// The `K + M_PARITY` on-disk streams one encoded stripe is split across:
/// `data_streams[i]` is node `i`'s file contents, `coding_streams[j]` is
/// parity node `j`'s.
#[derive(Debug, Clone)]
pub struct EncodedStripes {
    pub data_streams: Vec<Vec<u8>>,
    pub coding_streams: Vec<Vec<u8>>,
    pub blocksize: usize,
    pub origsize: usize,
}

/// A fixed-`blocksize` encode/decode session over one stripe.
pub struct Session {
    blocksize: usize,
    gen: Matrix,
}

impl Session {
    /// Creates a session for a given sub-stripe `blocksize`. `blocksize`
    /// must be nonzero.
    pub fn new(blocksize: usize) -> Result<Self> {
        if blocksize == 0 {
            return Err(Error::InvalidConfig("blocksize must be nonzero".to_string()));
        }
        Ok(Self {
            blocksize,
            gen: vandermonde::generator_matrix(K, M_PARITY),
        })
    }

    /// The smallest `blocksize` that fits `origsize` bytes into one stripe
    /// (`K * SUBSTRIPES` blocks), at least `1`.
    pub fn blocksize_for(origsize: usize) -> usize {
        let units = K * SUBSTRIPES;
        origsize.div_ceil(units).max(1)
    }

    pub fn blocksize(&self) -> usize {
        self.blocksize
    }

    fn per_block_len(&self) -> usize {
        SUBSTRIPES * self.blocksize
    }

    fn stripe_capacity(&self) -> usize {
        K * self.per_block_len()
    }

    /// Pads, RS-encodes, and pairing-transforms `data` into `K + M_PARITY`
    /// per-block streams ready to persist.
    #[instrument(skip(self, data), fields(blocksize = self.blocksize))]
    pub fn encode(&self, data: &[u8]) -> Result<EncodedStripes> {
        let origsize = data.len();
        let capacity = self.stripe_capacity();
        if origsize > capacity {
            return Err(Error::InvalidConfig(format!(
                "input of {origsize} bytes exceeds the {capacity}-byte capacity of a {}-byte-block stripe",
                self.blocksize
            )));
        }

        let mut padded = data.to_vec();
        padded.resize(capacity, PAD_BYTE);
        if padded.len() != origsize {
            debug!(origsize, padded = padded.len(), "padded input to stripe capacity");
        }

        let per_block = self.per_block_len();
        let data_blocks: Vec<Vec<u8>> = (0..K).map(|i| padded[i * per_block..(i + 1) * per_block].to_vec()).collect();

        let mut fdata = marshal::to_stripe_major(&data_blocks, SUBSTRIPES, self.blocksize)?;
        let mut fcoding = vec![Vec::new(); SUBSTRIPES];
        for s in 0..SUBSTRIPES {
            let cells: Vec<Vec<u8>> = (0..K).map(|j| pairing::cell(&fdata[s], j, self.blocksize).to_vec()).collect();
            fcoding[s] = codec::encode(&cells, &self.gen).concat();
        }

        pairing::forward(&mut fdata, &mut fcoding, self.blocksize);

        Ok(EncodedStripes {
            data_streams: marshal::to_per_block(&fdata, K, self.blocksize),
            coding_streams: marshal::to_per_block(&fcoding, M_PARITY, self.blocksize),
            blocksize: self.blocksize,
            origsize,
        })
    }

    /// Reconstructs the original data from `K + M_PARITY` streams, any of
    /// which may be `None` (erased). `origsize` truncates the padded
    /// output back to the caller's original length.
    #[instrument(skip(self, streams), fields(blocksize = self.blocksize))]
    pub fn decode(&self, streams: [Option<Vec<u8>>; K + M_PARITY], origsize: usize) -> Result<Vec<u8>> {
        let reconstructed = self.reconstruct(streams)?;
        let per_block = self.per_block_len();
        let mut out = Vec::with_capacity(per_block * K);
        for block in &reconstructed.data_streams {
            out.extend_from_slice(block);
        }
        out.truncate(origsize);
        Ok(out)
    }

    /// Fills in every erased node's stream and returns the complete set of
    /// `K + M_PARITY` per-block streams, still padded to a whole stripe.
    /// Used by [`Session::decode`] and by the `cli` binary's `repair`
    /// subcommand, which writes a single healed node back to disk instead
    /// of reassembling the original file.
    #[instrument(skip(self, streams), fields(blocksize = self.blocksize))]
    pub fn reconstruct(&self, streams: [Option<Vec<u8>>; K + M_PARITY]) -> Result<EncodedStripes> {
        let per_block = self.per_block_len();
        let mut erased_columns = Vec::new();
        for (i, stream) in streams.iter().enumerate() {
            match stream {
                Some(v) if v.len() == per_block => {}
                Some(v) => {
                    return Err(Error::SizeMismatch {
                        len: v.len(),
                        substripes: SUBSTRIPES,
                    })
                }
                None => erased_columns.push(i),
            }
        }
        if erased_columns.len() > M_PARITY {
            return Err(Error::DecodeInfeasible {
                erasures: erased_columns.len(),
                max: M_PARITY,
            });
        }
        info!(erasures = erased_columns.len(), "decoding stripe");

        let data_present: Vec<Vec<u8>> = (0..K).map(|i| streams[i].clone().unwrap_or_else(|| vec![0u8; per_block])).collect();
        let coding_present: Vec<Vec<u8>> = (0..M_PARITY)
            .map(|j| streams[K + j].clone().unwrap_or_else(|| vec![0u8; per_block]))
            .collect();

        let mut fdata = marshal::to_stripe_major(&data_present, SUBSTRIPES, self.blocksize)?;
        let mut fcoding = marshal::to_stripe_major(&coding_present, SUBSTRIPES, self.blocksize)?;

        if erased_columns.is_empty() {
            pairing::inverse(&mut fdata, &mut fcoding, self.blocksize, &erased_columns);
            debug!("no erasures; emitting directly");
        } else if repair::is_repairable(&erased_columns, K) {
            let t = erased_columns[0];
            info!(column = t, "repairing single data node");
            // Repair reads the other surviving columns straight out of
            // their still-forward-transformed state (pairing::pure_cell
            // inverts on demand), so it must run before the blanket
            // inverse below — it fully restores t and its pairing
            // partner itself; inverse() then only needs to fix every
            // other level, which it skips for t's own level since t is
            // still in `erased_columns`.
            repair::repair_data_column(&mut fdata, &fcoding, t, K, self.blocksize, &self.gen)?;
            pairing::inverse(&mut fdata, &mut fcoding, self.blocksize, &erased_columns);
        } else {
            pairing::inverse(&mut fdata, &mut fcoding, self.blocksize, &erased_columns);
            info!("falling back to general sub-stripe decode");
            self.rs_decode_remaining(&mut fdata, &mut fcoding, &erased_columns)?;
        }

        Ok(EncodedStripes {
            data_streams: marshal::to_per_block(&fdata, K, self.blocksize),
            coding_streams: marshal::to_per_block(&fcoding, M_PARITY, self.blocksize),
            blocksize: self.blocksize,
            origsize: per_block * K,
        })
    }

    /// Runs the general sub-stripe RS decode for two-or-more erasures,
    /// after `pairing::inverse` has already restored every level whose
    /// both columns survived.
    ///
    /// A level with exactly one column erased is skipped wholesale by
    /// `inverse`, which leaves the surviving column's own touched-role
    /// rows still forward-transformed at *those* rows only (its other
    /// half was never touched by that level and is already pure). This
    /// treats those rows as erased too, per sub-stripe, via
    /// [`pairing::effective_erasures_at`], instead of assuming every
    /// non-listed column is trustworthy at every row — and overwrites
    /// them with the recovered value once decode fills them in.
    fn rs_decode_remaining(&self, fdata: &mut [Vec<u8>], fcoding: &mut [Vec<u8>], erased_columns: &[usize]) -> Result<()> {
        for s in 0..SUBSTRIPES {
            let effective = pairing::effective_erasures_at(erased_columns, K, s);
            let mut blocks: Vec<Option<Vec<u8>>> = (0..K + M_PARITY)
                .map(|idx| {
                    if effective.contains(&idx) {
                        None
                    } else if idx < K {
                        Some(pairing::cell(&fdata[s], idx, self.blocksize).to_vec())
                    } else {
                        Some(pairing::cell(&fcoding[s], idx - K, self.blocksize).to_vec())
                    }
                })
                .collect();
            codec::decode(&mut blocks, &self.gen)?;
            for &idx in &effective {
                let recovered = blocks[idx].as_ref().expect("codec::decode fills every entry on success");
                if idx < K {
                    pairing::cell_mut(&mut fdata[s], idx, self.blocksize).copy_from_slice(recovered);
                } else {
                    pairing::cell_mut(&mut fcoding[s], idx - K, self.blocksize).copy_from_slice(recovered);
                }
            }
        }
        Ok(())
    }
}
