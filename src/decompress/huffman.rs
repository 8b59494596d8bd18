use std::io::Read;
use std::sync::OnceLock;

use super::bits::BitReader;
use super::tables::{
    TABLE_BITS, TABLE_MASK, TABLE_SIZE, fixed_distance_lengths, fixed_litlen_lengths,
};
use crate::common::DEFLATE_MAX_CODEWORD_LEN;
use crate::error::{FormatError, Result};

const LEAF: u16 = 0x8000;

/// A child slot in the code tree: either the index of another node pair or a
/// decoded symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Node(u16);

impl Node {
    #[inline(always)]
    pub(crate) const fn internal(index: usize) -> Self {
        Node(index as u16)
    }

    #[inline(always)]
    pub(crate) const fn leaf(symbol: u16) -> Self {
        Node(LEAF | symbol)
    }

    #[inline(always)]
    pub(crate) const fn is_leaf(self) -> bool {
        self.0 & LEAF != 0
    }

    #[inline(always)]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub(crate) const fn symbol(self) -> u16 {
        self.0 & !LEAF
    }
}

/// Table entries pack `(bits consumed << 16) | node`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TableEntry(u32);

impl TableEntry {
    #[inline(always)]
    pub(crate) const fn consumed(self) -> u32 {
        self.0 >> 16
    }

    #[inline(always)]
    pub(crate) const fn node(self) -> Node {
        Node(self.0 as u16)
    }
}

/// Canonical Huffman code as a flat tree plus a `TABLE_BITS` lookup table.
#[derive(Clone, Debug)]
pub(crate) struct HuffmanCode {
    tree: Box<[Node]>,
    table: Box<[TableEntry]>,
}

impl HuffmanCode {
    pub(crate) fn from_lengths(lengths: &[u8]) -> Result<Self, FormatError> {
        let tree = build_tree(lengths)?;
        let table = build_table(&tree);
        Ok(Self { tree, table })
    }

    #[inline(always)]
    pub(crate) fn child(&self, node: usize, bit: u64) -> Node {
        self.tree[node + bit as usize]
    }

    #[inline(always)]
    pub(crate) fn lookup(&self, bitbuf: u64) -> TableEntry {
        self.table[(bitbuf & TABLE_MASK) as usize]
    }

    /// Decodes one symbol from a local accumulator. The caller guarantees at
    /// least `DEFLATE_MAX_CODEWORD_LEN` valid bits.
    #[inline(always)]
    pub(crate) fn decode_fast(&self, bitbuf: &mut u64, bitsleft: &mut u32) -> u16 {
        let entry = self.lookup(*bitbuf);
        let consumed = entry.consumed();
        *bitbuf >>= consumed;
        *bitsleft -= consumed;
        let mut node = entry.node();
        while !node.is_leaf() {
            node = self.child(node.index(), *bitbuf & 1);
            *bitbuf >>= 1;
            *bitsleft -= 1;
        }
        node.symbol()
    }

    /// Walks the tree one bit at a time, pulling from the source as needed.
    pub(crate) fn decode_slow<R: Read>(&self, bits: &mut BitReader, src: &mut R) -> Result<u16> {
        let mut node = Node::internal(0);
        loop {
            node = self.child(node.index(), bits.read_bit(src)? as u64);
            if node.is_leaf() {
                return Ok(node.symbol());
            }
        }
    }
}

// Children of a node occupy two adjacent slots; the parent stores the index of
// the left one. Open slots are worked level by level, left to right.
fn build_tree(lengths: &[u8]) -> Result<Box<[Node]>, FormatError> {
    let max_len = lengths.iter().copied().max().unwrap_or(0) as usize;
    debug_assert!(max_len <= DEFLATE_MAX_CODEWORD_LEN);

    let mut remaining = [0usize; DEFLATE_MAX_CODEWORD_LEN + 2];
    for &len in lengths {
        remaining[len as usize] += 1;
    }
    // Symbols still to be placed at depth > current.
    let mut deeper: usize = remaining[1..].iter().sum();

    let mut arena = Vec::with_capacity(2 * lengths.len().saturating_sub(1).max(1));
    arena.extend_from_slice(&[Node::internal(0), Node::internal(0)]);
    let mut open: Vec<usize> = vec![0, 1];
    let mut next_open = Vec::new();

    for len in 1..=max_len {
        let mut slots = open.iter();
        for (symbol, _) in lengths.iter().enumerate().filter(|&(_, &l)| l as usize == len) {
            let &slot = slots.next().ok_or(FormatError::OversubscribedCode)?;
            arena[slot] = Node::leaf(symbol as u16);
        }
        deeper -= remaining[len];

        let still_open = slots.as_slice();
        if still_open.is_empty() {
            if deeper > 0 {
                return Err(FormatError::OversubscribedCode);
            }
            open.clear();
            break;
        }
        // Each open slot needs at least two symbols below it.
        if still_open.len() * 2 > deeper {
            return Err(FormatError::IncompleteCode);
        }
        next_open.clear();
        for &slot in still_open {
            let child = arena.len();
            arena[slot] = Node::internal(child);
            arena.extend_from_slice(&[Node::internal(0), Node::internal(0)]);
            next_open.extend_from_slice(&[child, child + 1]);
        }
        std::mem::swap(&mut open, &mut next_open);
    }

    if !open.is_empty() {
        return Err(FormatError::IncompleteCode);
    }
    Ok(arena.into_boxed_slice())
}

fn build_table(tree: &[Node]) -> Box<[TableEntry]> {
    (0..TABLE_SIZE as u64)
        .map(|pattern| {
            let mut node = Node::internal(0);
            let mut consumed = 0;
            loop {
                node = tree[node.index() + ((pattern >> consumed) & 1) as usize];
                consumed += 1;
                if node.is_leaf() || consumed == TABLE_BITS {
                    break;
                }
            }
            TableEntry((consumed << 16) | node.0 as u32)
        })
        .collect()
}

pub(crate) struct FixedCodes {
    pub(crate) litlen: HuffmanCode,
    pub(crate) distance: HuffmanCode,
}

static FIXED_CODES: OnceLock<FixedCodes> = OnceLock::new();

pub(crate) fn fixed_codes() -> &'static FixedCodes {
    FIXED_CODES.get_or_init(|| FixedCodes {
        litlen: HuffmanCode::from_lengths(&fixed_litlen_lengths())
            .unwrap_or_else(|e| unreachable!("fixed literal/length code: {e}")),
        distance: HuffmanCode::from_lengths(&fixed_distance_lengths())
            .unwrap_or_else(|e| unreachable!("fixed distance code: {e}")),
    })
}
