//! Minimal acyclic finite state transducer (FST) engine.
//!
//! This crate compiles an ordered set of byte-string keys, each mapped to a
//! `u64` output, into a compact immutable binary automaton, and answers
//! exact, range and prefix queries directly over the encoded bytes.
//!
//! # Architecture
//!
//! - [`state`] -- Mutable node representation used during construction
//! - [`registry`] -- Bounded hash-consing cache that merges equivalent states
//! - [`builder`] -- Incremental, output-pushing construction from sorted keys
//! - [`transition`] -- Transition model and fixed-width integer packing
//! - [`node`] -- Node record encoder and zero-copy decoder
//! - [`format`] -- Footer layout and validation
//! - [`config`] -- Builder configuration
//! - [`reader`] -- Loading a compiled FST and point lookups
//! - [`stream`] -- Ordered range/prefix iteration
//!
//! # Example
//!
//! ```
//! use lexfst::{Builder, BuilderConfig, Fst};
//!
//! let mut builder = Builder::new(Vec::new(), BuilderConfig::default())?;
//! builder.insert(b"mon", 1)?;
//! builder.insert(b"tue", 3)?;
//! builder.insert(b"tuesday", 2)?;
//! let fst = Fst::from_bytes(builder.into_inner()?)?;
//!
//! assert_eq!(fst.get(b"tuesday")?, Some(2));
//! assert!(!fst.contains(b"tu")?);
//! # Ok::<(), lexfst::FstError>(())
//! ```

pub mod builder;
pub mod config;
pub mod format;
pub mod node;
pub mod reader;
pub mod registry;
pub mod state;
pub mod stream;
pub mod transition;

pub use builder::{BuildStats, Builder};
pub use config::BuilderConfig;
pub use reader::Fst;
pub use stream::{FstIterator, Pairs};
pub use transition::{StateAddress, Transition};

/// Error type for building, loading and traversing an FST.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error("key {key:?} is not greater than previously inserted key {previous:?}")]
    OutOfOrder { previous: Vec<u8>, key: Vec<u8> },
    #[error("builder is closed")]
    BuilderClosed,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("write failure: {0}")]
    Write(#[source] std::io::Error),
    #[error("read failure: {0}")]
    Read(#[source] std::io::Error),
    #[error("invalid magic number in FST footer")]
    InvalidMagic,
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("corrupt FST data: {0}")]
    CorruptFormat(String),
    #[error("unsupported FST format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("iterator exhausted")]
    IteratorDone,
    #[error("FST is closed")]
    Closed,
}

impl FstError {
    /// Whether this is the normal end-of-iteration signal rather than a failure.
    pub fn is_iterator_done(&self) -> bool {
        matches!(self, FstError::IteratorDone)
    }

    /// Whether this error reports damaged or foreign input data.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            FstError::InvalidMagic
                | FstError::TooShort { .. }
                | FstError::CorruptFormat(_)
                | FstError::UnsupportedVersion { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FstError>;
