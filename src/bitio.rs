use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};

/// Reads MSB-first bit fields from a seekable byte source.
pub struct BitReader<R: Read + Seek> {
    inner: BufReader<R>,
    current: u8,
    remaining: u8,
    bits_read: u64,
}

impl<R: Read + Seek> BitReader<R> {
    pub fn new(inner: R) -> Self {
        BitReader {
            inner: BufReader::new(inner),
            current: 0,
            remaining: 0,
            bits_read: 0,
        }
    }

    /// Reads the next `count` bits (at most 32) as an unsigned integer.
    ///
    /// Returns `Ok(None)` once the source cannot supply all `count` bits.
    pub fn read_bits(&mut self, count: u32) -> io::Result<Option<u32>> {
        debug_assert!(count <= 32);
        let mut value = 0u32;
        for _ in 0..count {
            if self.remaining == 0 {
                match self.next_byte()? {
                    Some(byte) => {
                        self.current = byte;
                        self.remaining = 8;
                    }
                    None => return Ok(None),
                }
            }
            self.remaining -= 1;
            let bit = (self.current >> self.remaining) & 1;
            value = (value << 1) | bit as u32;
        }
        self.bits_read += count as u64;
        Ok(Some(value))
    }

    /// Rewinds to the first byte and drops any partially consumed byte.
    pub fn reset(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        self.current = 0;
        self.remaining = 0;
        self.bits_read = 0;
        Ok(())
    }

    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Packs MSB-first bit fields into bytes.
pub struct BitWriter<W: Write> {
    inner: W,
    current: u8,
    filled: u8,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        BitWriter {
            inner,
            current: 0,
            filled: 0,
            bits_written: 0,
        }
    }

    /// Appends the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, count: u32, value: u32) -> io::Result<()> {
        debug_assert!(count <= 32);
        for i in (0..count).rev() {
            self.write_bit((value >> i) & 1 == 1)?;
        }
        Ok(())
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.current = (self.current << 1) | bit as u8;
        self.filled += 1;
        self.bits_written += 1;
        if self.filled == 8 {
            self.inner.write_all(&[self.current])?;
            self.current = 0;
            self.filled = 0;
        }
        Ok(())
    }

    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Zero-pads the last partial byte, flushes, and hands back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        if self.filled > 0 {
            let byte = self.current << (8 - self.filled);
            self.inner.write_all(&[byte])?;
            self.current = 0;
            self.filled = 0;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}
