#![allow(dead_code)]

use std::io::Write;

pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

const LENGTH_BASES: [usize; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115,
    131, 163, 195, 227, 258,
];
const LENGTH_EXTRA: [u32; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];
const DISTANCE_BASES: [usize; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
const DISTANCE_EXTRA: [u32; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

#[derive(Clone, Copy, Debug)]
pub enum Token {
    Literal(u8),
    Match { length: usize, distance: usize },
}

/// LSB-first bit writer producing raw DEFLATE.
#[derive(Default)]
pub struct BitWriter {
    out: Vec<u8>,
    acc: u64,
    nbits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bits(&mut self, value: u32, count: u32) {
        assert!(count <= 32);
        if count == 0 {
            return;
        }
        self.acc |= ((value as u64) & ((1u64 << count) - 1)) << self.nbits;
        self.nbits += count;
        while self.nbits >= 8 {
            self.out.push(self.acc as u8);
            self.acc >>= 8;
            self.nbits -= 8;
        }
    }

    /// Huffman codes go out starting from their most significant bit.
    pub fn write_code(&mut self, code: u32, len: u32) {
        let reversed = code.reverse_bits() >> (32 - len);
        self.write_bits(reversed, len);
    }

    pub fn align_to_byte(&mut self) {
        if self.nbits > 0 {
            self.write_bits(0, 8 - self.nbits);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        assert_eq!(self.nbits, 0);
        self.out.extend_from_slice(bytes);
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.out
    }
}

pub fn canonical_codes(lengths: &[u8]) -> Vec<u32> {
    let mut bl_count = [0u32; 16];
    for &l in lengths {
        if l > 0 {
            bl_count[l as usize] += 1;
        }
    }
    let mut next_code = [0u32; 16];
    let mut code = 0;
    for bits in 1..16 {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }
    lengths
        .iter()
        .map(|&l| {
            if l == 0 {
                0
            } else {
                let c = next_code[l as usize];
                next_code[l as usize] += 1;
                c
            }
        })
        .collect()
}

fn length_symbol(length: usize) -> (usize, u32, u32) {
    let i = LENGTH_BASES.iter().rposition(|&b| b <= length).unwrap();
    (257 + i, LENGTH_EXTRA[i], (length - LENGTH_BASES[i]) as u32)
}

fn distance_symbol(distance: usize) -> (usize, u32, u32) {
    let i = DISTANCE_BASES.iter().rposition(|&b| b <= distance).unwrap();
    (i, DISTANCE_EXTRA[i], (distance - DISTANCE_BASES[i]) as u32)
}

pub fn fixed_litlen_lengths() -> Vec<u8> {
    let mut lens = vec![8u8; 288];
    lens[144..256].fill(9);
    lens[256..280].fill(7);
    lens
}

pub fn write_stored_block(w: &mut BitWriter, data: &[u8], is_final: bool) {
    assert!(data.len() <= 0xFFFF);
    w.write_bits(is_final as u32, 1);
    w.write_bits(0, 2);
    w.align_to_byte();
    let len = data.len() as u16;
    w.write_bits(len as u32, 16);
    w.write_bits(!len as u32, 16);
    w.write_bytes(data);
}

fn write_tokens(w: &mut BitWriter, litlen_lens: &[u8], dist_lens: &[u8], tokens: &[Token]) {
    let litlen_codes = canonical_codes(litlen_lens);
    let dist_codes = canonical_codes(dist_lens);
    for token in tokens {
        match *token {
            Token::Literal(b) => {
                let sym = b as usize;
                w.write_code(litlen_codes[sym], litlen_lens[sym] as u32);
            }
            Token::Match { length, distance } => {
                let (sym, extra, value) = length_symbol(length);
                w.write_code(litlen_codes[sym], litlen_lens[sym] as u32);
                w.write_bits(value, extra);
                let (dsym, dextra, dvalue) = distance_symbol(distance);
                w.write_code(dist_codes[dsym], dist_lens[dsym] as u32);
                w.write_bits(dvalue, dextra);
            }
        }
    }
    w.write_code(litlen_codes[256], litlen_lens[256] as u32);
}

pub fn write_fixed_block(w: &mut BitWriter, tokens: &[Token], is_final: bool) {
    w.write_bits(is_final as u32, 1);
    w.write_bits(1, 2);
    write_tokens(w, &fixed_litlen_lengths(), &[5; 32], tokens);
}

/// Writes the dynamic block header for the given lengths, each length sent as
/// a plain code-length symbol.
pub fn write_dynamic_header(
    w: &mut BitWriter,
    litlen_lens: &[u8],
    dist_lens: &[u8],
    is_final: bool,
) {
    w.write_bits(is_final as u32, 1);
    w.write_bits(2, 2);
    w.write_bits((litlen_lens.len() - 257) as u32, 5);
    w.write_bits((dist_lens.len() - 1) as u32, 5);
    w.write_bits(19 - 4, 4);
    // Code-length symbols 0..=15 all get 4-bit codes, so symbol k is code k.
    for &sym in &CODE_LENGTH_ORDER {
        w.write_bits(if sym < 16 { 4 } else { 0 }, 3);
    }
    for &len in litlen_lens.iter().chain(dist_lens) {
        w.write_code(len as u32, 4);
    }
}

pub fn write_dynamic_block(
    w: &mut BitWriter,
    litlen_lens: &[u8],
    dist_lens: &[u8],
    tokens: &[Token],
    is_final: bool,
) {
    write_dynamic_header(w, litlen_lens, dist_lens, is_final);
    write_tokens(w, litlen_lens, dist_lens, tokens);
}

/// Naive LZ77 parse, good enough to produce back-references in test data.
pub fn greedy_tokens(data: &[u8], max_distance: usize) -> Vec<Token> {
    greedy_tokens_range(data, 0, data.len(), max_distance)
}

/// Parses `data[start..end]`, letting matches reach back before `start`.
pub fn greedy_tokens_range(
    data: &[u8],
    start: usize,
    end: usize,
    max_distance: usize,
) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = start;
    while i < end {
        let mut best = (0, 0);
        for j in i.saturating_sub(max_distance)..i {
            let mut l = 0;
            while l < 258 && i + l < end && data[j + l] == data[i + l] {
                l += 1;
            }
            if l > best.0 {
                best = (l, i - j);
            }
        }
        if best.0 >= 3 {
            tokens.push(Token::Match {
                length: best.0,
                distance: best.1,
            });
            i += best.0;
        } else {
            tokens.push(Token::Literal(data[i]));
            i += 1;
        }
    }
    tokens
}

pub fn sample_text(len: usize) -> Vec<u8> {
    let words = [
        "deflate ", "window ", "huffman ", "block ", "literal ", "stream ", "length ", "distance ",
    ];
    let mut out = Vec::with_capacity(len);
    let mut seed = 0x2545F491u32;
    while out.len() < len {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        out.extend_from_slice(words[(seed % words.len() as u32) as usize].as_bytes());
        if seed % 7 == 0 {
            out.push((seed >> 8) as u8);
        }
    }
    out.truncate(len);
    out
}

pub fn pseudo_random(len: usize, mut seed: u32) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
            (seed >> 24) as u8
        })
        .collect()
}

pub fn compress_flate2(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder =
        flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::new(level));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn compress_libdeflater(data: &[u8], level: i32) -> Vec<u8> {
    let mut compressor =
        libdeflater::Compressor::new(libdeflater::CompressionLvl::new(level).unwrap());
    let mut out = vec![0u8; compressor.deflate_compress_bound(data.len())];
    let size = compressor.deflate_compress(data, &mut out).unwrap();
    out.truncate(size);
    out
}

pub fn inflate_all(data: &[u8]) -> Result<Vec<u8>, inflate_rsx::InflateError> {
    let mut decoder = inflate_rsx::DeflateDecoder::new(data);
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    while let Some(n) = decoder.read_chunk(&mut buf)? {
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

/// Routes decoder logs to the test harness; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
