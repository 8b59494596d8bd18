use std::cmp::min;
use std::io::{self, Read};

use crate::error::{InflateError, Result};

/// Byte buffer filled from the source plus a LSB-first bit accumulator packed
/// from it.
#[derive(Clone)]
pub(crate) struct BitReader {
    input: Box<[u8]>,
    filled: usize,
    pos: usize,
    // Bits above `bitsleft` are always zero.
    pub(crate) bitbuf: u64,
    pub(crate) bitsleft: u32,
}

impl BitReader {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            input: vec![0; capacity].into_boxed_slice(),
            filled: 0,
            pos: 0,
            bitbuf: 0,
            bitsleft: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.input.len()
    }

    /// Bytes taken from the source that have not been consumed yet. A byte with
    /// some of its bits consumed counts as consumed.
    pub(crate) fn unconsumed_bytes(&self) -> usize {
        (self.filled - self.pos) + (self.bitsleft / 8) as usize
    }

    fn fill_input<R: Read>(&mut self, src: &mut R) -> Result<()> {
        debug_assert!(self.pos >= self.filled);
        loop {
            match src.read(&mut self.input) {
                Ok(0) => return Err(InflateError::UnexpectedEof),
                Ok(n) => {
                    self.filled = n;
                    self.pos = 0;
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Packs whole bytes from the byte buffer into the accumulator without
    /// touching the source.
    #[inline(always)]
    pub(crate) fn refill(&mut self) {
        let num_bytes = min(((64 - self.bitsleft) >> 3) as usize, self.filled - self.pos);
        for &b in &self.input[self.pos..self.pos + num_bytes] {
            self.bitbuf |= (b as u64) << self.bitsleft;
            self.bitsleft += 8;
        }
        self.pos += num_bytes;
    }

    pub(crate) fn read_bits<R: Read>(&mut self, src: &mut R, count: u32) -> Result<u32> {
        debug_assert!((1..=16).contains(&count));
        while self.bitsleft < count {
            if self.pos >= self.filled {
                self.fill_input(src)?;
            }
            self.refill();
        }
        let result = (self.bitbuf & ((1u64 << count) - 1)) as u32;
        self.bitbuf >>= count;
        self.bitsleft -= count;
        Ok(result)
    }

    #[inline(always)]
    pub(crate) fn read_bit<R: Read>(&mut self, src: &mut R) -> Result<u32> {
        if self.bitsleft > 0 {
            let bit = (self.bitbuf & 1) as u32;
            self.bitbuf >>= 1;
            self.bitsleft -= 1;
            Ok(bit)
        } else {
            self.read_bits(src, 1)
        }
    }

    pub(crate) fn align_to_byte(&mut self) {
        let discard = self.bitsleft & 7;
        self.bitbuf >>= discard;
        self.bitsleft -= discard;
    }

    /// Copies buffered bytes into `dst` without I/O, after aligning to a byte
    /// boundary. Returns the number of bytes copied.
    pub(crate) fn read_buffered(&mut self, dst: &mut [u8]) -> usize {
        self.align_to_byte();
        let mut n = 0;
        while n < dst.len() && self.bitsleft >= 8 {
            dst[n] = self.bitbuf as u8;
            self.bitbuf >>= 8;
            self.bitsleft -= 8;
            n += 1;
        }
        let take = min(dst.len() - n, self.filled - self.pos);
        dst[n..n + take].copy_from_slice(&self.input[self.pos..self.pos + take]);
        self.pos += take;
        n + take
    }

    /// Fills `dst` exactly, going to the source directly once the buffers are
    /// drained.
    pub(crate) fn read_bytes<R: Read>(&mut self, src: &mut R, dst: &mut [u8]) -> Result<()> {
        let mut off = self.read_buffered(dst);
        while off < dst.len() {
            match src.read(&mut dst[off..]) {
                Ok(0) => return Err(InflateError::UnexpectedEof),
                Ok(n) => off += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
