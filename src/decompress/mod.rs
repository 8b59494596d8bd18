mod bits;
mod huffman;
mod tables;
mod window;

use self::bits::BitReader;
use self::huffman::{HuffmanCode, fixed_codes};
use self::tables::*;
use self::window::Window;
use crate::common::*;
use crate::error::{FormatError, Result};
use std::borrow::Cow;
use std::cmp::min;
use std::io::{self, Read};
use tracing::{debug, trace};

pub use self::tables::{DICTIONARY_SIZE, TABLE_BITS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecompressorState {
    /// Between blocks, or before the first one.
    Start,
    UncompressedBody { remaining: usize },
    HuffmanBody,
    /// Raw bytes are forwarded from the source without decoding.
    PassThrough,
}

#[derive(Clone)]
struct BlockCodes {
    litlen: Cow<'static, HuffmanCode>,
    // None when the block carries only literals.
    distance: Option<Cow<'static, HuffmanCode>>,
}

impl BlockCodes {
    fn fixed() -> Self {
        let codes = fixed_codes();
        Self {
            litlen: Cow::Borrowed(&codes.litlen),
            distance: Some(Cow::Borrowed(&codes.distance)),
        }
    }
}

#[derive(Clone)]
enum BlockState {
    Start,
    Uncompressed { remaining: usize },
    Huffman(BlockCodes),
    PassThrough,
}

/// Decoded bytes that did not fit into the caller's buffer.
#[derive(Clone)]
struct Staging {
    buf: [u8; STAGING_CAPACITY],
    len: usize,
    pos: usize,
}

impl Staging {
    fn new() -> Self {
        Self {
            buf: [0; STAGING_CAPACITY],
            len: 0,
            pos: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    fn push(&mut self, byte: u8) {
        debug_assert!(self.len < STAGING_CAPACITY);
        self.buf[self.len] = byte;
        self.len += 1;
    }

    fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let n = min(self.len - self.pos, out.len());
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        if self.pos == self.len {
            self.len = 0;
            self.pos = 0;
        }
        n
    }
}

/// Decoder state for one raw DEFLATE stream, independent of the byte source
/// it pulls from. `Clone` is a full deep copy.
///
/// This is the block state machine driven by [`crate::DeflateDecoder`]; for
/// whole-buffer decompression use [`crate::Decompressor`] instead.
#[derive(Clone)]
pub struct Decompressor {
    bits: BitReader,
    window: Window,
    staging: Staging,
    state: BlockState,
    is_final_block: bool,
}

impl Decompressor {
    pub fn new(input_buffer_size: usize) -> Self {
        Self {
            bits: BitReader::new(input_buffer_size),
            window: Window::new(),
            staging: Staging::new(),
            state: BlockState::Start,
            is_final_block: false,
        }
    }

    pub fn input_buffer_size(&self) -> usize {
        self.bits.capacity()
    }

    pub fn state(&self) -> DecompressorState {
        match self.state {
            BlockState::Start => DecompressorState::Start,
            BlockState::Uncompressed { remaining } => {
                DecompressorState::UncompressedBody { remaining }
            }
            BlockState::Huffman(_) => DecompressorState::HuffmanBody,
            BlockState::PassThrough => DecompressorState::PassThrough,
        }
    }

    pub fn is_final_block(&self) -> bool {
        self.is_final_block
    }

    /// True once the final block has ended and every decoded byte was handed out.
    pub fn is_done(&self) -> bool {
        self.is_final_block && matches!(self.state, BlockState::Start) && self.staging.is_empty()
    }

    /// Bytes pulled from the source but not yet consumed by decoding.
    pub fn unconsumed_input(&self) -> usize {
        self.bits.unconsumed_bytes()
    }

    /// Decodes into `output`. Returns `None` at the end of the stream and
    /// `Some(0)` only for an empty `output`.
    pub fn decompress<R: Read>(
        &mut self,
        src: &mut R,
        output: &mut [u8],
    ) -> Result<Option<usize>> {
        if output.is_empty() {
            return Ok(if self.is_done() { None } else { Some(0) });
        }

        let mut out_idx = self.staging.drain_into(output);
        if out_idx == output.len() {
            return Ok(Some(out_idx));
        }
        debug_assert!(self.staging.is_empty());

        loop {
            match self.state {
                BlockState::Start => {
                    if self.is_final_block {
                        return Ok(if out_idx > 0 { Some(out_idx) } else { None });
                    }
                    self.read_block_header(src)?;
                }
                BlockState::Uncompressed { remaining } => {
                    let count = min(remaining, output.len() - out_idx);
                    let dst = &mut output[out_idx..out_idx + count];
                    self.bits.read_bytes(src, dst)?;
                    self.window.extend(dst);
                    out_idx += count;
                    self.state = if remaining == count {
                        BlockState::Start
                    } else {
                        BlockState::Uncompressed {
                            remaining: remaining - count,
                        }
                    };
                    return Ok(Some(out_idx));
                }
                BlockState::Huffman(ref codes) => {
                    let (produced, block_done) = decompress_huffman_block(
                        codes,
                        &mut self.bits,
                        &mut self.window,
                        &mut self.staging,
                        src,
                        &mut output[out_idx..],
                    )?;
                    out_idx += produced;
                    if block_done {
                        self.state = BlockState::Start;
                    }
                    if out_idx == output.len() {
                        return Ok(Some(out_idx));
                    }
                }
                BlockState::PassThrough => {
                    return match self.read_pass_through(src, &mut output[out_idx..])? {
                        Some(n) => Ok(Some(out_idx + n)),
                        None if out_idx > 0 => Ok(Some(out_idx)),
                        None => Ok(None),
                    };
                }
            }
        }
    }

    /// Switches to forwarding raw bytes. Fails if already forwarding.
    pub(crate) fn enter_pass_through(&mut self) -> bool {
        if matches!(self.state, BlockState::PassThrough) {
            return false;
        }
        self.state = BlockState::PassThrough;
        true
    }

    /// Prepares for a new stream following the current position of the source.
    pub(crate) fn restart(&mut self) {
        self.bits.align_to_byte();
        self.window.clear();
        self.is_final_block = false;
        self.state = BlockState::Start;
    }

    fn read_block_header<R: Read>(&mut self, src: &mut R) -> Result<()> {
        self.is_final_block = self.bits.read_bits(src, 1)? == 1;
        let block_type = self.bits.read_bits(src, 2)?;
        trace!(block_type, is_final = self.is_final_block, "deflate block header");

        match block_type {
            DEFLATE_BLOCKTYPE_UNCOMPRESSED => {
                self.bits.align_to_byte();
                let len = self.bits.read_bits(src, 16)? as u16;
                let nlen = self.bits.read_bits(src, 16)? as u16;
                if len != !nlen {
                    return Err(FormatError::StoredLengthMismatch { len, nlen }.into());
                }
                self.state = match len {
                    0 => BlockState::Start,
                    n => BlockState::Uncompressed {
                        remaining: n as usize,
                    },
                };
            }
            DEFLATE_BLOCKTYPE_STATIC_HUFFMAN => {
                self.state = BlockState::Huffman(BlockCodes::fixed());
            }
            DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN => {
                let codes = self.read_dynamic_huffman_header(src)?;
                self.state = BlockState::Huffman(codes);
            }
            _ => return Err(FormatError::ReservedBlockType.into()),
        }
        Ok(())
    }

    fn read_dynamic_huffman_header<R: Read>(&mut self, src: &mut R) -> Result<BlockCodes> {
        let num_litlen_syms = self.bits.read_bits(src, 5)? as usize + 257;
        let num_offset_syms = self.bits.read_bits(src, 5)? as usize + 1;
        let num_precode_syms = self.bits.read_bits(src, 4)? as usize + 4;
        debug!(
            num_litlen_syms,
            num_offset_syms, num_precode_syms, "dynamic huffman header"
        );

        let mut precode_lens = [0u8; DEFLATE_NUM_PRECODE_SYMS];
        for &sym in &CODE_LENGTH_ORDER[..num_precode_syms] {
            precode_lens[sym] = self.bits.read_bits(src, 3)? as u8;
        }
        let precode = HuffmanCode::from_lengths(&precode_lens)?;

        let total_syms = num_litlen_syms + num_offset_syms;
        let mut lens = [0u8; DEFLATE_NUM_LITLEN_SYMS + DEFLATE_NUM_OFFSET_SYMS];
        let mut i = 0;
        while i < total_syms {
            let presym = precode.decode_slow(&mut self.bits, src)?;
            let (rep_val, rep_count) = match presym {
                0..=15 => {
                    lens[i] = presym as u8;
                    i += 1;
                    continue;
                }
                16 => {
                    if i == 0 {
                        return Err(FormatError::NoPreviousLength.into());
                    }
                    (lens[i - 1], 3 + self.bits.read_bits(src, 2)? as usize)
                }
                17 => (0, 3 + self.bits.read_bits(src, 3)? as usize),
                _ => (0, 11 + self.bits.read_bits(src, 7)? as usize),
            };
            if i + rep_count > total_syms {
                return Err(FormatError::CodeLengthOverflow.into());
            }
            lens[i..i + rep_count].fill(rep_val);
            i += rep_count;
        }

        let litlen = HuffmanCode::from_lengths(&lens[..num_litlen_syms])?;
        let distance = build_distance_code(&lens[num_litlen_syms..total_syms])?;
        Ok(BlockCodes {
            litlen: Cow::Owned(litlen),
            distance: distance.map(Cow::Owned),
        })
    }

    fn read_pass_through<R: Read>(
        &mut self,
        src: &mut R,
        output: &mut [u8],
    ) -> Result<Option<usize>> {
        let buffered = self.bits.read_buffered(output);
        if buffered > 0 {
            return Ok(Some(buffered));
        }
        loop {
            match src.read(output) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(n)),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn build_distance_code(lens: &[u8]) -> Result<Option<HuffmanCode>, FormatError> {
    if lens.iter().all(|&l| l == 0) {
        return Ok(None);
    }
    let ones = lens.iter().filter(|&&l| l == 1).count();
    let longer = lens.iter().filter(|&&l| l > 1).count();
    if ones == 1 && longer == 0 {
        // A lone one-bit code: pad with an unused symbol so the tree is full.
        let mut padded = [0u8; DEFLATE_NUM_OFFSET_SYMS];
        padded[..lens.len()].copy_from_slice(lens);
        padded[DEFLATE_NUM_OFFSET_SYMS - 1] = 1;
        return HuffmanCode::from_lengths(&padded).map(Some);
    }
    HuffmanCode::from_lengths(lens).map(Some)
}

#[inline(always)]
fn low_bits(bitbuf: u64, count: u32) -> u32 {
    (bitbuf & ((1u64 << count) - 1)) as u32
}

#[inline(always)]
fn read_extra<R: Read>(bits: &mut BitReader, src: &mut R, count: u32) -> Result<u32> {
    if count == 0 {
        Ok(0)
    } else {
        bits.read_bits(src, count)
    }
}

/// Decodes symbols until `output` is full or the block ends. Bytes of a match
/// that do not fit go to `staging`. Returns the bytes written and whether the
/// end-of-block symbol was consumed.
fn decompress_huffman_block<R: Read>(
    codes: &BlockCodes,
    bits: &mut BitReader,
    window: &mut Window,
    staging: &mut Staging,
    src: &mut R,
    output: &mut [u8],
) -> Result<(usize, bool)> {
    let litlen = &*codes.litlen;
    let distance = codes.distance.as_deref();
    let mut out_idx = 0;

    while out_idx < output.len() {
        if bits.bitsleft < DEFLATE_MAX_PAIR_BITS {
            bits.refill();
        }

        let (length, offset) = if bits.bitsleft >= DEFLATE_MAX_PAIR_BITS {
            // A whole length/distance pair fits in the accumulator.
            let mut bitbuf = bits.bitbuf;
            let mut bitsleft = bits.bitsleft;

            let sym = litlen.decode_fast(&mut bitbuf, &mut bitsleft) as usize;
            if sym < DEFLATE_NUM_LITERALS {
                bits.bitbuf = bitbuf;
                bits.bitsleft = bitsleft;
                output[out_idx] = sym as u8;
                window.put(sym as u8);
                out_idx += 1;
                continue;
            }
            if sym == DEFLATE_END_OF_BLOCK {
                bits.bitbuf = bitbuf;
                bits.bitsleft = bitsleft;
                return Ok((out_idx, true));
            }
            if sym > DEFLATE_LAST_LEN_SYM {
                return Err(FormatError::ReservedLengthSymbol(sym as u16).into());
            }
            let (base, extra) = length_base(sym);
            let length = base + low_bits(bitbuf, extra);
            bitbuf >>= extra;
            bitsleft -= extra;

            let offset_code = distance.ok_or(FormatError::MissingDistanceCode)?;
            let offset_sym = offset_code.decode_fast(&mut bitbuf, &mut bitsleft) as usize;
            if offset_sym > DEFLATE_LAST_OFFSET_SYM {
                return Err(FormatError::ReservedDistanceSymbol(offset_sym as u16).into());
            }
            let (base, extra) = distance_base(offset_sym);
            let offset = base + low_bits(bitbuf, extra);
            bitbuf >>= extra;
            bitsleft -= extra;

            bits.bitbuf = bitbuf;
            bits.bitsleft = bitsleft;
            (length as usize, offset as usize)
        } else {
            let sym = litlen.decode_slow(bits, src)? as usize;
            if sym < DEFLATE_NUM_LITERALS {
                output[out_idx] = sym as u8;
                window.put(sym as u8);
                out_idx += 1;
                continue;
            }
            if sym == DEFLATE_END_OF_BLOCK {
                return Ok((out_idx, true));
            }
            if sym > DEFLATE_LAST_LEN_SYM {
                return Err(FormatError::ReservedLengthSymbol(sym as u16).into());
            }
            let (base, extra) = length_base(sym);
            let length = base + read_extra(bits, src, extra)?;

            let offset_code = distance.ok_or(FormatError::MissingDistanceCode)?;
            let offset_sym = offset_code.decode_slow(bits, src)? as usize;
            if offset_sym > DEFLATE_LAST_OFFSET_SYM {
                return Err(FormatError::ReservedDistanceSymbol(offset_sym as u16).into());
            }
            let (base, extra) = distance_base(offset_sym);
            let offset = base + read_extra(bits, src, extra)?;
            (length as usize, offset as usize)
        };

        debug_assert!((DEFLATE_MIN_MATCH_LEN..=DEFLATE_MAX_MATCH_LEN).contains(&length));
        debug_assert!((1..=DEFLATE_MAX_MATCH_OFFSET).contains(&offset));
        out_idx += window.copy_split(offset, length, &mut output[out_idx..], &mut |b| {
            staging.push(b)
        });
    }
    Ok((out_idx, false))
}
