//! Error types for the pairwise-regenerating erasure coding codec

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encoding, transforming, or decoding a stripe
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// A GF(2^8) operation was attempted on a value with no valid result
    /// (currently only division/inversion by zero).
    #[error("GF(2^8) arithmetic error: {0}")]
    Gf(#[from] crate::gf::GfError),

    /// The metadata file is missing or its fields don't parse into a
    /// configuration consistent with this codec.
    #[error("bad metadata: {0}")]
    BadMetadata(String),

    /// I/O error reading or writing a block or metadata file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// More erasures were present than the code can tolerate, or the
    /// induced decode submatrix turned out to be singular.
    #[error("decode infeasible: {erasures} erasures exceed the {max} this code tolerates")]
    DecodeInfeasible { erasures: usize, max: usize },

    /// An on-disk block's length isn't a multiple of the sub-stripe count.
    #[error("block length {len} is not a multiple of {substripes} sub-stripes")]
    SizeMismatch { len: usize, substripes: usize },

    /// The single-node repair engine's 10x10 recovery matrix turned out
    /// to be singular. Shouldn't happen with the fixed identity/Vandermonde
    /// construction; surfaced as a fatal bug rather than silently falling
    /// back to general decode.
    #[error("recovery matrix is singular")]
    RecoveryMatrixSingular,

    /// A caller-supplied configuration disagrees with this codec's fixed
    /// parameters (k, m, sub-stripe count).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
