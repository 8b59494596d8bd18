use super::tables::{DICTIONARY_MASK, DICTIONARY_SIZE};

/// The last 32 KiB of output, for resolving back-references.
#[derive(Clone)]
pub(crate) struct Window {
    data: Box<[u8; DICTIONARY_SIZE]>,
    // Next slot to write.
    pos: usize,
}

impl Window {
    pub(crate) fn new() -> Self {
        Self {
            data: Box::new([0; DICTIONARY_SIZE]),
            pos: 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.data.fill(0);
        self.pos = 0;
    }

    #[inline(always)]
    pub(crate) fn put(&mut self, byte: u8) {
        self.data[self.pos] = byte;
        self.pos = (self.pos + 1) & DICTIONARY_MASK;
    }

    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.put(b);
        }
    }

    /// Replays `count` bytes starting `distance` back, feeding each byte to
    /// `sink` as it is written. The source may overlap the bytes being written,
    /// and slots never written since the last clear read as zero.
    #[inline(always)]
    pub(crate) fn copy<F: FnMut(u8)>(&mut self, distance: usize, count: usize, mut sink: F) {
        debug_assert!((1..=DICTIONARY_SIZE).contains(&distance));
        let mut read = (self.pos.wrapping_sub(distance)) & DICTIONARY_MASK;
        for _ in 0..count {
            let b = self.data[read];
            self.data[self.pos] = b;
            read = (read + 1) & DICTIONARY_MASK;
            self.pos = (self.pos + 1) & DICTIONARY_MASK;
            sink(b);
        }
    }

    /// Like `copy`, writing the first bytes into `out` and the rest into
    /// `overflow`. Returns how many bytes went into `out`.
    #[inline(always)]
    pub(crate) fn copy_split(
        &mut self,
        distance: usize,
        count: usize,
        out: &mut [u8],
        overflow: &mut impl FnMut(u8),
    ) -> usize {
        if out.len() >= count {
            let mut i = 0;
            self.copy(distance, count, |b| {
                out[i] = b;
                i += 1;
            });
            count
        } else {
            let mut i = 0;
            self.copy(distance, count, |b| {
                if i < out.len() {
                    out[i] = b;
                    i += 1;
                } else {
                    overflow(b);
                }
            });
            i
        }
    }
}
