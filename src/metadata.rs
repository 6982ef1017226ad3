//! Stripe metadata file (C8).
//!
//! Parses and writes the plaintext `name_meta.txt` format: one line,
//! whitespace-separated, `original-filename origsize k m w packetsize
//! buffersize technique technique-enum readins`. Parsing is strict — a
//! missing file, wrong field count, or a `k`/`m` that disagrees with this
//! crate's fixed parameters is `Error::BadMetadata`, checked before any
//! block file is opened so a corrupt metadata file never produces a
//! partially-decoded output.

use crate::error::{Error, Result};
use crate::{K, M_PARITY};
use std::fmt;
use std::path::Path;

/// The parsed contents of a `name_meta.txt` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub original_filename: String,
    pub origsize: usize,
    pub k: usize,
    pub m: usize,
    pub w: u32,
    pub packetsize: usize,
    pub buffersize: usize,
    pub technique: String,
    pub technique_enum: u32,
    pub readins: usize,
}

impl Metadata {
    /// Builds metadata for a session about to encode `original_filename`,
    /// using this crate's fixed `K`, `M_PARITY`, and field width.
    pub fn new(original_filename: impl Into<String>, origsize: usize, blocksize: usize) -> Self {
        Self {
            original_filename: original_filename.into(),
            origsize,
            k: K,
            m: M_PARITY,
            w: crate::FIELD_WIDTH,
            packetsize: blocksize,
            buffersize: blocksize,
            technique: "pairwise-regenerating".to_string(),
            technique_enum: 0,
            readins: 1,
        }
    }

    /// Parses the whitespace-separated single-line format.
    pub fn parse(text: &str) -> Result<Self> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() != 10 {
            return Err(Error::BadMetadata(format!(
                "expected 10 whitespace-separated fields, found {}",
                fields.len()
            )));
        }

        let parse_usize = |name: &str, s: &str| -> Result<usize> {
            s.parse::<usize>().map_err(|_| Error::BadMetadata(format!("{name} is not a valid integer: {s:?}")))
        };
        let parse_u32 = |name: &str, s: &str| -> Result<u32> {
            s.parse::<u32>().map_err(|_| Error::BadMetadata(format!("{name} is not a valid integer: {s:?}")))
        };

        let meta = Metadata {
            original_filename: fields[0].to_string(),
            origsize: parse_usize("origsize", fields[1])?,
            k: parse_usize("k", fields[2])?,
            m: parse_usize("m", fields[3])?,
            w: parse_u32("w", fields[4])?,
            packetsize: parse_usize("packetsize", fields[5])?,
            buffersize: parse_usize("buffersize", fields[6])?,
            technique: fields[7].to_string(),
            technique_enum: parse_u32("technique-enum", fields[8])?,
            readins: parse_usize("readins", fields[9])?,
        };

        if meta.k != K || meta.m != M_PARITY {
            return Err(Error::BadMetadata(format!(
                "metadata k={} m={} does not match this codec's fixed k={K} m={M_PARITY}",
                meta.k, meta.m
            )));
        }
        if meta.buffersize == 0 {
            return Err(Error::BadMetadata("buffersize must be nonzero".to_string()));
        }

        Ok(meta)
    }

    /// Reads and parses `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Writes the single-line whitespace-separated format to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_string())?;
        Ok(())
    }

    /// The `blocksize` a `Session` should be constructed with to reproduce
    /// this stripe's layout.
    pub fn blocksize(&self) -> usize {
        self.buffersize
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} {} {} {} {} {} {} {} {}",
            self.original_filename,
            self.origsize,
            self.k,
            self.m,
            self.w,
            self.packetsize,
            self.buffersize,
            self.technique,
            self.technique_enum,
            self.readins
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_parse() {
        let meta = Metadata::new("photo.raw", 12345, 64);
        let text = meta.to_string();
        let parsed = Metadata::parse(&text).unwrap();
        assert_eq!(parsed, meta);
    }

    #[test]
    fn wrong_field_count_is_bad_metadata() {
        let err = Metadata::parse("only three fields here").unwrap_err();
        assert!(matches!(err, Error::BadMetadata(_)));
    }

    #[test]
    fn mismatched_k_or_m_is_bad_metadata() {
        let text = "file.ext 100 8 3 8 16 16 pairwise-regenerating 0 1";
        let err = Metadata::parse(text).unwrap_err();
        assert!(matches!(err, Error::BadMetadata(_)));
    }

    #[test]
    fn non_numeric_field_is_bad_metadata() {
        let text = "file.ext notanumber 10 4 8 16 16 pairwise-regenerating 0 1";
        let err = Metadata::parse(text).unwrap_err();
        assert!(matches!(err, Error::BadMetadata(_)));
    }
}
