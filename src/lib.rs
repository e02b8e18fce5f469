//! # huffpack
//!
//! Lossless two-pass Huffman compression over bytes plus a synthetic
//! end-of-stream symbol.
//!
//! ```rust
//! use huffpack::{HeaderMode, compress_bytes, decompress_bytes};
//!
//! let packed = compress_bytes(b"abracadabra", HeaderMode::Tree)?;
//! assert_eq!(decompress_bytes(&packed)?, b"abracadabra");
//! # Ok::<(), huffpack::HuffError>(())
//! ```

pub mod bitio;
pub mod codec;
pub mod error;
pub mod header;
pub mod huffman;

pub use bitio::{BitReader, BitWriter};
pub use codec::{Codec, code_table_for, compress_bytes, decompress_bytes};
pub use error::{HuffError, Result};
pub use header::{HUFF_COUNTS, HUFF_NUMBER, HUFF_TREE, HeaderMode};
pub use huffman::{CodeTable, Histogram, Node, Symbol};

pub const BITS_PER_WORD: u32 = 8;
pub const BITS_PER_INT: u32 = 32;
/// Width of a symbol id in the tree header; 9 bits so `PSEUDO_EOF` fits.
pub const BITS_PER_SYMBOL: u32 = BITS_PER_WORD + 1;
pub const ALPHABET_SIZE: usize = 1 << BITS_PER_WORD;
pub const PSEUDO_EOF: Symbol = ALPHABET_SIZE as Symbol;
