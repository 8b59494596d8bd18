pub const DEFLATE_BLOCKTYPE_UNCOMPRESSED: u32 = 0;
pub const DEFLATE_BLOCKTYPE_STATIC_HUFFMAN: u32 = 1;
pub const DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN: u32 = 2;

pub const DEFLATE_MIN_MATCH_LEN: usize = 3;
pub const DEFLATE_MAX_MATCH_LEN: usize = 258;

pub const DEFLATE_MAX_MATCH_OFFSET: usize = 32768;

pub const DEFLATE_NUM_PRECODE_SYMS: usize = 19;
pub const DEFLATE_NUM_LITLEN_SYMS: usize = 288;
pub const DEFLATE_NUM_OFFSET_SYMS: usize = 32;

pub const DEFLATE_NUM_LITERALS: usize = 256;
pub const DEFLATE_END_OF_BLOCK: usize = 256;
pub const DEFLATE_LAST_LEN_SYM: usize = 285;
pub const DEFLATE_LAST_OFFSET_SYM: usize = 29;

pub const DEFLATE_MAX_CODEWORD_LEN: usize = 15;

/// Worst case bits for one length/distance pair: 15 + 5 + 15 + 13.
pub const DEFLATE_MAX_PAIR_BITS: u32 = 48;

/// Largest number of bytes one decode step can leave over after the caller's
/// buffer has room for at least one byte.
pub const STAGING_CAPACITY: usize = DEFLATE_MAX_MATCH_LEN - 1;

pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 16 * 1024;
