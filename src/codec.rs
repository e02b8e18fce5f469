use std::io::{Cursor, Read, Seek, Write};
use std::time::Instant;

use log::{debug, info};

use crate::bitio::{BitReader, BitWriter};
use crate::error::{HuffError, Result};
use crate::header::{HeaderMode, read_header, write_header};
use crate::huffman::{CodeTable, Node, build_code_table, build_huffman_tree, count_frequencies};
use crate::{BITS_PER_WORD, PSEUDO_EOF};

/// Two-pass Huffman compressor and its inverse.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    header: HeaderMode,
}

impl Codec {
    pub fn new(header: HeaderMode) -> Self {
        Codec { header }
    }

    pub fn header_mode(&self) -> HeaderMode {
        self.header
    }

    /// Counts byte frequencies, writes the header, rewinds `input`, and emits
    /// each byte's code followed by the end-of-stream code.
    pub fn compress<R: Read + Seek, W: Write>(
        &self,
        input: &mut BitReader<R>,
        output: &mut BitWriter<W>,
    ) -> Result<()> {
        info!("Compressing with {} header", self.header);
        let start_time = Instant::now();

        let histogram = count_frequencies(input)?;
        let root = build_huffman_tree(&histogram);
        let codes = build_code_table(&root);
        write_header(self.header, &root, &histogram, output)?;

        input.reset()?;

        let payload_start = output.bits_written();
        let mut count = 0u64;
        while let Some(byte) = input.read_bits(BITS_PER_WORD)? {
            let code = codes
                .get(&(byte as u16))
                .ok_or(HuffError::UnmappedSymbol(byte as u8))?;
            write_code(code, output)?;
            count += 1;
        }
        // The builder always adds the EOF leaf, so its code is present.
        write_code(&codes[&PSEUDO_EOF], output)?;

        debug!(
            "Encoded {} bytes into {} payload bits in {:.2?}",
            count,
            output.bits_written() - payload_start,
            start_time.elapsed()
        );
        info!("Compression done: {} bits written", output.bits_written());
        Ok(())
    }

    /// Reads the header and decodes symbols until end-of-stream. Nothing is
    /// written to `output` if the header is rejected.
    pub fn decompress<R: Read + Seek, W: Write>(
        &self,
        input: &mut BitReader<R>,
        output: &mut BitWriter<W>,
    ) -> Result<()> {
        let start_time = Instant::now();
        let (mode, root) = read_header(input)?;
        info!("Decompressing stream with {} header", mode);

        let count = decode_payload(&root, input, output)?;

        debug!(
            "Decoded {} bytes from {} bits in {:.2?}",
            count,
            input.bits_read(),
            start_time.elapsed()
        );
        info!("Decompression done: {} bytes written", count);
        Ok(())
    }
}

fn write_code<W: Write>(code: &str, output: &mut BitWriter<W>) -> Result<()> {
    for c in code.bytes() {
        output.write_bit(c == b'1')?;
    }
    Ok(())
}

fn decode_payload<R: Read + Seek, W: Write>(
    root: &Node,
    input: &mut BitReader<R>,
    output: &mut BitWriter<W>,
) -> Result<u64> {
    let mut count = 0u64;
    let mut current = root;
    loop {
        let bit = input.read_bits(1)?.ok_or(HuffError::TruncatedStream)?;
        current = match current {
            Node::Internal { left, right, .. } => {
                if bit == 0 {
                    &**left
                } else {
                    &**right
                }
            }
            // A leaf root: every code is the single bit "0".
            Node::Leaf { .. } => current,
        };

        if let Node::Leaf { symbol, .. } = current {
            if *symbol == PSEUDO_EOF {
                return Ok(count);
            }
            output.write_bits(BITS_PER_WORD, *symbol as u32)?;
            count += 1;
            current = root;
        }
    }
}

/// Compresses an in-memory buffer.
pub fn compress_bytes(data: &[u8], header: HeaderMode) -> Result<Vec<u8>> {
    let mut input = BitReader::new(Cursor::new(data));
    let mut output = BitWriter::new(Vec::new());
    Codec::new(header).compress(&mut input, &mut output)?;
    Ok(output.finish()?)
}

/// Decompresses an in-memory buffer; the header mode is taken from the magic.
pub fn decompress_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut input = BitReader::new(Cursor::new(data));
    let mut output = BitWriter::new(Vec::new());
    Codec::default().decompress(&mut input, &mut output)?;
    Ok(output.finish()?)
}

/// Code table the compressor would use for `data`, for inspection.
pub fn code_table_for(data: &[u8]) -> Result<CodeTable> {
    let mut input = BitReader::new(Cursor::new(data));
    let histogram = count_frequencies(&mut input)?;
    Ok(build_code_table(&build_huffman_tree(&histogram)))
}
