//! Self-describing stream header: a 32-bit magic number followed by either a
//! preorder serialization of the code tree or the raw byte histogram.
//!
//! Tree layout, per node in preorder: flag bit `0` for an internal node
//! (left subtree then right subtree follow), flag bit `1` for a leaf followed
//! by its 9-bit symbol id. Weights are not stored.

use std::fmt;
use std::io::{Read, Seek, Write};
use std::str::FromStr;

use log::debug;

use crate::bitio::{BitReader, BitWriter};
use crate::error::{HuffError, Result};
use crate::huffman::{Histogram, Node, Symbol, build_huffman_tree};
use crate::{ALPHABET_SIZE, BITS_PER_INT, BITS_PER_SYMBOL, PSEUDO_EOF};

pub const HUFF_NUMBER: u32 = 0xface_8200;
pub const HUFF_TREE: u32 = HUFF_NUMBER | 1;
pub const HUFF_COUNTS: u32 = HUFF_NUMBER | 2;

/// A tree over 257 leaves is at most 256 levels deep.
const MAX_TREE_DEPTH: usize = ALPHABET_SIZE;

/// Which header variant the compressor emits.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum HeaderMode {
    #[default]
    Tree,
    Counts,
}

impl HeaderMode {
    pub fn magic(self) -> u32 {
        match self {
            HeaderMode::Tree => HUFF_TREE,
            HeaderMode::Counts => HUFF_COUNTS,
        }
    }

    pub fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            HUFF_TREE => Some(HeaderMode::Tree),
            HUFF_COUNTS => Some(HeaderMode::Counts),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderMode::Tree => f.write_str("tree"),
            HeaderMode::Counts => f.write_str("counts"),
        }
    }
}

impl FromStr for HeaderMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tree" => Ok(HeaderMode::Tree),
            "counts" => Ok(HeaderMode::Counts),
            other => Err(format!("unknown header mode '{}'", other)),
        }
    }
}

/// Writes the magic number for `mode` and then the matching header body.
/// `histogram` is only consulted in counts mode.
pub fn write_header<W: Write>(
    mode: HeaderMode,
    root: &Node,
    histogram: &Histogram,
    out: &mut BitWriter<W>,
) -> Result<()> {
    let start = out.bits_written();
    out.write_bits(BITS_PER_INT, mode.magic())?;
    match mode {
        HeaderMode::Tree => write_tree(root, out)?,
        HeaderMode::Counts => write_counts(histogram, out)?,
    }
    debug!(
        "Wrote {} header: {} bits",
        mode,
        out.bits_written() - start
    );
    Ok(())
}

/// Validates the magic number and rebuilds the code tree it introduces.
pub fn read_header<R: Read + Seek>(input: &mut BitReader<R>) -> Result<(HeaderMode, Node)> {
    let magic = input
        .read_bits(BITS_PER_INT)?
        .ok_or(HuffError::TruncatedHeader)?;
    let mode = HeaderMode::from_magic(magic).ok_or(HuffError::Format { found: magic })?;

    let root = match mode {
        HeaderMode::Tree => read_tree(input, 0)?,
        HeaderMode::Counts => build_huffman_tree(&read_counts(input)?),
    };
    debug!(
        "Read {} header: {} leaves, depth {}",
        mode,
        root.leaf_count(),
        root.depth()
    );
    Ok((mode, root))
}

pub fn write_tree<W: Write>(node: &Node, out: &mut BitWriter<W>) -> Result<()> {
    match node {
        Node::Leaf { symbol, .. } => {
            out.write_bits(1, 1)?;
            out.write_bits(BITS_PER_SYMBOL, *symbol as u32)?;
        }
        Node::Internal { left, right, .. } => {
            out.write_bits(1, 0)?;
            write_tree(left, out)?;
            write_tree(right, out)?;
        }
    }
    Ok(())
}

pub fn read_tree<R: Read + Seek>(input: &mut BitReader<R>, depth: usize) -> Result<Node> {
    let flag = input.read_bits(1)?.ok_or(HuffError::TruncatedHeader)?;
    if flag == 0 {
        if depth >= MAX_TREE_DEPTH {
            return Err(HuffError::TreeTooDeep);
        }
        let left = read_tree(input, depth + 1)?;
        let right = read_tree(input, depth + 1)?;
        return Ok(Node::internal(left, right));
    }

    let symbol = input
        .read_bits(BITS_PER_SYMBOL)?
        .ok_or(HuffError::TruncatedHeader)? as Symbol;
    if symbol > PSEUDO_EOF {
        return Err(HuffError::InvalidSymbol(symbol));
    }
    Ok(Node::leaf(symbol, 0))
}

fn write_counts<W: Write>(histogram: &Histogram, out: &mut BitWriter<W>) -> Result<()> {
    for (byte, &count) in histogram.iter().enumerate() {
        let count32 = u32::try_from(count).map_err(|_| HuffError::CountOverflow {
            symbol: byte as u8,
            count,
        })?;
        out.write_bits(BITS_PER_INT, count32)?;
    }
    Ok(())
}

fn read_counts<R: Read + Seek>(input: &mut BitReader<R>) -> Result<Histogram> {
    let mut histogram = [0u64; ALPHABET_SIZE];
    for slot in histogram.iter_mut() {
        *slot = input
            .read_bits(BITS_PER_INT)?
            .ok_or(HuffError::TruncatedHeader)? as u64;
    }
    Ok(histogram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::huffman::build_code_table;
    use std::io::Cursor;

    fn histogram_of(data: &[u8]) -> Histogram {
        let mut histogram = [0u64; ALPHABET_SIZE];
        for &b in data {
            histogram[b as usize] += 1;
        }
        histogram
    }

    fn header_bytes(mode: HeaderMode, data: &[u8]) -> (Node, Vec<u8>) {
        let histogram = histogram_of(data);
        let root = build_huffman_tree(&histogram);
        let mut out = BitWriter::new(Vec::new());
        write_header(mode, &root, &histogram, &mut out).unwrap();
        (root, out.finish().unwrap())
    }

    #[test]
    fn tree_header_bit_layout_for_lone_eof() {
        let (_, bytes) = header_bytes(HeaderMode::Tree, b"");
        // magic, flag 1, 9-bit 256, padded: 42 bits -> 6 bytes
        assert_eq!(
            bytes,
            vec![0xfa, 0xce, 0x82, 0x01, 0b1100_0000, 0b0000_0000]
        );
    }

    #[test]
    fn tree_header_rebuilds_same_codes() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let (root, bytes) = header_bytes(HeaderMode::Tree, data);

        let (mode, rebuilt) = read_header(&mut BitReader::new(Cursor::new(bytes))).unwrap();
        assert_eq!(mode, HeaderMode::Tree);
        assert_eq!(build_code_table(&rebuilt), build_code_table(&root));
        assert_eq!(rebuilt.leaf_count(), root.leaf_count());
    }

    #[test]
    fn counts_header_rebuilds_identical_tree() {
        let data = b"mississippi river";
        let (root, bytes) = header_bytes(HeaderMode::Counts, data);
        assert_eq!(bytes.len(), 4 + ALPHABET_SIZE * 4);

        let (mode, rebuilt) = read_header(&mut BitReader::new(Cursor::new(bytes))).unwrap();
        assert_eq!(mode, HeaderMode::Counts);
        assert_eq!(rebuilt, root);
    }

    #[test]
    fn unknown_magic_is_format_error() {
        let bytes = vec![0xde, 0xad, 0xbe, 0xef, 0xff];
        let err = read_header(&mut BitReader::new(Cursor::new(bytes))).unwrap_err();
        assert!(matches!(err, HuffError::Format { found: 0xdead_beef }));
    }

    #[test]
    fn short_stream_is_truncated_header() {
        let err = read_header(&mut BitReader::new(Cursor::new(vec![0xfa, 0xce]))).unwrap_err();
        assert!(matches!(err, HuffError::TruncatedHeader));

        let err =
            read_header(&mut BitReader::new(Cursor::new(vec![0xfa, 0xce, 0x82, 0x01]))).unwrap_err();
        assert!(matches!(err, HuffError::TruncatedHeader));
    }

    #[test]
    fn out_of_range_leaf_symbol_is_rejected() {
        let mut out = BitWriter::new(Vec::new());
        out.write_bits(BITS_PER_INT, HUFF_TREE).unwrap();
        out.write_bits(1, 1).unwrap();
        out.write_bits(BITS_PER_SYMBOL, 300).unwrap();
        let bytes = out.finish().unwrap();

        let err = read_header(&mut BitReader::new(Cursor::new(bytes))).unwrap_err();
        assert!(matches!(err, HuffError::InvalidSymbol(300)));
    }

    #[test]
    fn runaway_internal_flags_are_rejected() {
        let mut bytes = vec![0xfa, 0xce, 0x82, 0x01];
        bytes.extend(std::iter::repeat_n(0u8, 64));
        let err = read_header(&mut BitReader::new(Cursor::new(bytes))).unwrap_err();
        assert!(matches!(err, HuffError::TreeTooDeep));
    }

    #[test]
    fn oversized_count_cannot_use_counts_header() {
        let mut histogram = [0u64; ALPHABET_SIZE];
        histogram[7] = u32::MAX as u64 + 1;
        let root = build_huffman_tree(&histogram);
        let mut out = BitWriter::new(Vec::new());
        let err = write_header(HeaderMode::Counts, &root, &histogram, &mut out).unwrap_err();
        assert!(matches!(err, HuffError::CountOverflow { symbol: 7, .. }));
    }

    #[test]
    fn header_mode_parsing() {
        assert_eq!("tree".parse::<HeaderMode>(), Ok(HeaderMode::Tree));
        assert_eq!("COUNTS".parse::<HeaderMode>(), Ok(HeaderMode::Counts));
        assert!("bogus".parse::<HeaderMode>().is_err());
        assert_eq!(HeaderMode::default(), HeaderMode::Tree);
        assert_eq!(HeaderMode::from_magic(HUFF_COUNTS), Some(HeaderMode::Counts));
        assert_eq!(HeaderMode::from_magic(HUFF_NUMBER), None);
    }
}
