use std::io;

pub type Result<T> = std::result::Result<T, HuffError>;

/// Failures surfaced by compression and decompression. Every variant is fatal
/// to the call that produced it.
#[derive(Debug, thiserror::Error)]
pub enum HuffError {
    /// The stream does not start with a recognized magic number.
    #[error("not a compressed stream: bad magic number {found:#010x}")]
    Format { found: u32 },

    /// Payload bits ran out before the end-of-stream symbol was decoded.
    #[error("compressed stream truncated: no end-of-stream symbol")]
    TruncatedStream,

    #[error("compressed stream truncated inside the header")]
    TruncatedHeader,

    #[error("invalid symbol {0} in tree header")]
    InvalidSymbol(u16),

    #[error("tree header nested too deeply")]
    TreeTooDeep,

    /// A byte seen on the encoding pass was absent from the histogram pass.
    #[error("byte {0:#04x} has no code; input changed between passes")]
    UnmappedSymbol(u8),

    #[error("count {count} for byte {symbol:#04x} does not fit the counts header")]
    CountOverflow { symbol: u8, count: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HuffError {
    /// True for errors that mean the input was cut short rather than malformed.
    pub fn is_truncation(&self) -> bool {
        matches!(self, HuffError::TruncatedStream | HuffError::TruncatedHeader)
    }
}
