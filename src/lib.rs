//! # Retrobox Archiver Library
//!
//! Package an ordered list of files into a single archive using one of four
//! lossless compression algorithms, and reverse the process to reconstruct
//! the files.
//!
//! * `static_huffman` builds a two-pass canonical Huffman tree from a frequency table.
//! * `adaptive_huffman` is a one-pass FGK-style coder with an explicit NYT leaf.
//! * `lz77` is a sliding-window back-reference coder (511-byte search, 63-byte lookahead).
//! * `lz78` is a dictionary coder with 16-bit indices into a 65,535-entry table.
//!
//! `bitio` holds the bit-level primitives shared by all four codecs, and
//! `archive` stitches them together into the multi-file container format.
//!
//! ## Buffer Example
//!
//! ```
//! use retrobox::{archive,CompressAlg};
//! let files = vec![
//!     ("a.bin".to_string(), vec![1,2,3,2,1]),
//!     ("b.bin".to_string(), vec![]),
//! ];
//! let packed = archive::pack_to_buffer(&files,CompressAlg::Lz77).expect("pack failed");
//! let unpacked = archive::unpack_from_buffer(&packed).expect("unpack failed");
//! assert_eq!(files,unpacked);
//! ```

pub mod bitio;
pub mod static_huffman;
pub mod adaptive_huffman;
pub mod lz77;
pub mod lz78;
pub mod archive;
pub mod progress;

pub use archive::CompressAlg;

/// Convenience alias matching the crate's error-boxing convention.
pub type DYNERR = Box<dyn std::error::Error>;
pub type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Errors produced by the codecs and the archive container.
///
/// Every variant is fatal to the codec invocation that raised it; the
/// container does not attempt local recovery and aborts the whole run on
/// the first failure (see `archive::pack`/`archive::unpack`).
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("unexpected end of input")]
    EndOfInput,
    #[error("invalid archive: {0}")]
    InvalidArchive(String),
    #[error("malformed compressed stream: {0}")]
    MalformedStream(String),
    #[error("output path already exists: {0}")]
    OutputExists(String),
    #[error("io error: {0}")]
    IOError(#[from] std::io::Error)
}
