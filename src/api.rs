use crate::error::{InflateError, Result};
use crate::stream::{DecoderOptions, DeflateDecoder};

const SCRATCH_SIZE: usize = 32 * 1024;

/// One-shot decompression of in-memory raw DEFLATE data. Each call runs a
/// fresh [`DeflateDecoder`] over the input slice.
#[derive(Clone)]
pub struct Decompressor {
    options: DecoderOptions,
    scratch: Vec<u8>,
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor {
    pub fn new() -> Self {
        Self {
            options: DecoderOptions::default(),
            scratch: Vec::new(),
        }
    }

    pub fn with_options(options: DecoderOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            scratch: Vec::new(),
        })
    }

    /// Decompresses `data`. `expected_size` is only a capacity hint.
    pub fn decompress_deflate(&mut self, data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
        let mut decoder = DeflateDecoder::with_options(data, self.options)?;
        self.scratch.resize(SCRATCH_SIZE, 0);
        let mut output = Vec::with_capacity(expected_size);
        while let Some(n) = decoder.read_chunk(&mut self.scratch)? {
            output.extend_from_slice(&self.scratch[..n]);
        }
        Ok(output)
    }

    /// Decompresses `data` into `output`, failing if it does not fit.
    pub fn decompress_deflate_into(&mut self, data: &[u8], output: &mut [u8]) -> Result<usize> {
        let mut decoder = DeflateDecoder::with_options(data, self.options)?;
        let mut written = 0;
        while written < output.len() {
            match decoder.read_chunk(&mut output[written..])? {
                Some(n) => written += n,
                None => return Ok(written),
            }
        }
        match decoder.read_byte()? {
            Some(_) => Err(InflateError::InsufficientSpace),
            None => Ok(written),
        }
    }
}
