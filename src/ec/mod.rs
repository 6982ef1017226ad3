//! Striped erasure-coding codec.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        ec module                                   │
//! ├───────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌──────────────┐   ┌───────────────────────┐    │
//! │  │   codec    │   │   pairing    │   │        repair         │    │
//! │  │ (RS, C3)   │   │  (C4)        │   │  (single-node, C5)     │    │
//! │  └────────────┘   └──────────────┘   └───────────────────────┘    │
//! │         │                │                      │                 │
//! │         └────────────────┴──────────┬───────────┘                 │
//! │                                     │                              │
//! │                               ┌─────┴─────┐                        │
//! │                               │  marshal  │                        │
//! │                               │   (C6)    │                        │
//! │                               └───────────┘                        │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **codec** (`codec.rs`): per-sub-stripe Reed-Solomon encode/decode over
//!   the Vandermonde generator matrix.
//! - **pairing** (`pairing.rs`): the seven-level pairwise mixing transform
//!   applied across sub-stripes after encoding.
//! - **repair** (`repair.rs`): single data-node recovery, cheaper than a
//!   full multi-erasure decode.
//! - **marshal** (`marshal.rs`): pure-permutation conversion between
//!   per-block and stripe-major buffer layouts.

pub mod codec;
pub mod marshal;
pub mod pairing;
pub mod repair;

#[cfg(test)]
mod proptest;
