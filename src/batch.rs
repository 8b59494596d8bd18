use crate::api::Decompressor;
use crate::error::Result;
use crate::stream::DecoderOptions;
use rayon::prelude::*;

/// Decodes independent raw DEFLATE members in parallel.
pub struct BatchDecompressor {
    template: Decompressor,
}

impl Default for BatchDecompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchDecompressor {
    pub fn new() -> Self {
        Self {
            template: Decompressor::new(),
        }
    }

    pub fn with_options(options: DecoderOptions) -> Result<Self> {
        Ok(Self {
            template: Decompressor::with_options(options)?,
        })
    }

    /// One result per input, in input order. `size_hints` may be shorter than
    /// `inputs`; missing hints default to twice the compressed size.
    pub fn decompress_batch(&self, inputs: &[&[u8]], size_hints: &[usize]) -> Vec<Result<Vec<u8>>> {
        inputs
            .par_iter()
            .enumerate()
            .map_init(
                || self.template.clone(),
                |decompressor, (i, &input)| {
                    let hint = size_hints.get(i).copied().unwrap_or(input.len() * 2);
                    decompressor.decompress_deflate(input, hint)
                },
            )
            .collect()
    }
}
