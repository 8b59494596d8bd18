/// Bits resolved per lookup table access. Any value from 1 to 15 decodes the
/// same output; 9 covers most literal codes in one step.
pub const TABLE_BITS: u32 = 9;
pub const TABLE_SIZE: usize = 1 << TABLE_BITS;
pub const TABLE_MASK: u64 = (TABLE_SIZE as u64) - 1;

pub const DICTIONARY_SIZE: usize = 32 * 1024;
pub const DICTIONARY_MASK: usize = DICTIONARY_SIZE - 1;

pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Length symbols 257..=285 as `(base << 3) | extra_bits`.
pub const LENGTH_TABLE: [u16; 29] = [
    24, 32, 40, 48, 56, 64, 72, 80, 89, 105, 121, 137, 154, 186, 218, 250, 283, 347, 411, 475,
    540, 668, 796, 924, 1053, 1309, 1565, 1821, 2064,
];

/// Distance symbols 0..=29 as `(base << 4) | extra_bits`.
pub const DISTANCE_TABLE: [u32; 30] = [
    16, 32, 48, 64, 81, 113, 146, 210, 275, 403, 532, 788, 1045, 1557, 2070, 3094, 4119, 6167,
    8216, 12312, 16409, 24601, 32794, 49178, 65563, 98331, 131100, 196636, 262173, 393245,
];

#[inline(always)]
pub fn length_base(sym: usize) -> (u32, u32) {
    let entry = LENGTH_TABLE[sym - 257] as u32;
    (entry >> 3, entry & 7)
}

#[inline(always)]
pub fn distance_base(sym: usize) -> (u32, u32) {
    let entry = DISTANCE_TABLE[sym];
    (entry >> 4, entry & 0xF)
}

pub fn fixed_litlen_lengths() -> [u8; 288] {
    let mut lens = [0u8; 288];
    lens[..144].fill(8);
    lens[144..256].fill(9);
    lens[256..280].fill(7);
    lens[280..].fill(8);
    lens
}

pub fn fixed_distance_lengths() -> [u8; 32] {
    [5; 32]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_table_matches_rfc() {
        assert_eq!(length_base(257), (3, 0));
        assert_eq!(length_base(264), (10, 0));
        assert_eq!(length_base(265), (11, 1));
        assert_eq!(length_base(284), (227, 5));
        assert_eq!(length_base(285), (258, 0));
    }

    #[test]
    fn test_distance_table_matches_rfc() {
        assert_eq!(distance_base(0), (1, 0));
        assert_eq!(distance_base(4), (5, 1));
        assert_eq!(distance_base(29), (24577, 13));
        let (base, extra) = distance_base(29);
        assert_eq!(base + (1 << extra) - 1, 32768);
    }
}
