use crate::common::DEFAULT_INPUT_BUFFER_SIZE;
use crate::decompress::{Decompressor, DecompressorState};
use crate::error::{InflateError, Result, UsageError};
use std::io::{self, Read, Seek, SeekFrom};
use tracing::debug;

/// Construction options for [`DeflateDecoder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderOptions {
    input_buffer_size: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            input_buffer_size: DEFAULT_INPUT_BUFFER_SIZE,
        }
    }
}

impl DecoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the internal read buffer. Larger means fewer reads from the
    /// source, and more bytes read past the end of the compressed data.
    pub fn input_buffer_size(mut self, size: usize) -> Self {
        self.input_buffer_size = size;
        self
    }

    pub fn get_input_buffer_size(&self) -> usize {
        self.input_buffer_size
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.input_buffer_size == 0 {
            return Err(UsageError::ZeroBufferSize.into());
        }
        Ok(())
    }
}

type RewindFn<R> = fn(&mut R, u64) -> io::Result<()>;

fn seek_back<R: Seek>(inner: &mut R, count: u64) -> io::Result<()> {
    inner.seek(SeekFrom::Current(-(count as i64)))?;
    Ok(())
}

#[derive(Clone, Debug)]
enum Lifecycle {
    Open,
    Failed(InflateError),
    /// The source was rewound and handed back; no further decoding.
    Released,
    Closed,
}

/// Reads raw DEFLATE data from `R` and yields the decompressed bytes.
///
/// Decoders built with [`DeflateDecoder::new_seekable`] detach by seeking the
/// source back to the first byte after the compressed data. All others detach
/// into pass-through mode, where the remaining bytes of the source are
/// forwarded as is until [`DeflateDecoder::attach`] starts a new stream.
pub struct DeflateDecoder<R> {
    inner: Option<R>,
    decompressor: Option<Box<Decompressor>>,
    lifecycle: Lifecycle,
    rewind: Option<RewindFn<R>>,
}

impl<R: Read> DeflateDecoder<R> {
    pub fn new(inner: R) -> Self {
        Self::build(inner, DecoderOptions::default(), None)
    }

    pub fn with_options(inner: R, options: DecoderOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(inner, options, None))
    }

    fn build(inner: R, options: DecoderOptions, rewind: Option<RewindFn<R>>) -> Self {
        Self {
            inner: Some(inner),
            decompressor: Some(Box::new(Decompressor::new(options.input_buffer_size))),
            lifecycle: Lifecycle::Open,
            rewind,
        }
    }

    fn parts(&mut self) -> Result<(&mut R, &mut Decompressor)> {
        match &self.lifecycle {
            Lifecycle::Open => {}
            Lifecycle::Failed(e) => return Err(e.clone()),
            Lifecycle::Released => return Err(UsageError::AlreadyDetached.into()),
            Lifecycle::Closed => return Err(UsageError::Closed.into()),
        }
        match (self.inner.as_mut(), self.decompressor.as_deref_mut()) {
            (Some(inner), Some(decompressor)) => Ok((inner, decompressor)),
            _ => Err(UsageError::Closed.into()),
        }
    }

    // Terminal: buffers are dropped, the source is kept so `close` still works.
    fn fail(&mut self, err: InflateError) -> InflateError {
        debug!(error = %err, "deflate stream terminated");
        self.decompressor = None;
        self.lifecycle = Lifecycle::Failed(err.clone());
        err
    }

    /// Reads decompressed bytes into `buf`.
    ///
    /// Returns `Ok(None)` at the end of the stream. `Ok(Some(0))` is only
    /// returned for an empty `buf` while more data may follow.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let result = {
            let (inner, decompressor) = self.parts()?;
            decompressor.decompress(inner, buf)
        };
        result.map_err(|e| self.fail(e))
    }

    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut b = [0u8; 1];
        Ok(self.read_chunk(&mut b)?.map(|_| b[0]))
    }

    /// Detaches the decoder from the compressed data.
    ///
    /// In rewind mode the source is positioned at the first byte not consumed
    /// by decoding and the decoder stops; fetch the source back with
    /// [`into_inner`](Self::into_inner). Otherwise the decoder switches to
    /// pass-through. Can only be done once.
    pub fn detach(&mut self) -> Result<()> {
        let rewind = self.rewind;
        let (inner, decompressor) = self.parts()?;
        match rewind {
            Some(rewind) => {
                let count = decompressor.unconsumed_input() as u64;
                if let Err(e) = rewind(inner, count) {
                    return Err(self.fail(e.into()));
                }
                debug!(rewound = count, "deflate decoder detached");
                self.decompressor = None;
                self.lifecycle = Lifecycle::Released;
            }
            None => {
                if !decompressor.enter_pass_through() {
                    return Err(UsageError::AlreadyDetached.into());
                }
                debug!(
                    buffered = decompressor.unconsumed_input(),
                    "deflate decoder in pass-through"
                );
            }
        }
        Ok(())
    }

    /// Starts decoding a new DEFLATE stream at the next byte boundary of the
    /// source. Only valid in pass-through mode.
    pub fn attach(&mut self) -> Result<()> {
        let (_, decompressor) = self.parts()?;
        if decompressor.state() != DecompressorState::PassThrough {
            return Err(UsageError::NotDetached.into());
        }
        decompressor.restart();
        debug!("deflate decoder attached");
        Ok(())
    }

    /// Releases the buffers and drops the source. Safe to call repeatedly and
    /// after errors.
    pub fn close(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Closed) {
            return;
        }
        self.inner = None;
        self.decompressor = None;
        self.lifecycle = Lifecycle::Closed;
        debug!("deflate decoder closed");
    }

    /// Deep copy of the decoder state on top of `inner`, which the caller must
    /// have positioned where this decoder's source currently is.
    pub fn fork(&self, inner: R) -> Result<Self> {
        match &self.lifecycle {
            Lifecycle::Released => return Err(UsageError::AlreadyDetached.into()),
            Lifecycle::Closed => return Err(UsageError::Closed.into()),
            Lifecycle::Open | Lifecycle::Failed(_) => {}
        }
        Ok(Self {
            inner: Some(inner),
            decompressor: self.decompressor.clone(),
            lifecycle: self.lifecycle.clone(),
            rewind: self.rewind,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.decompressor.as_ref().is_some_and(|d| d.is_done())
    }

    pub fn is_pass_through(&self) -> bool {
        self.decompressor
            .as_ref()
            .is_some_and(|d| d.state() == DecompressorState::PassThrough)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Closed)
    }

    pub fn can_rewind(&self) -> bool {
        self.rewind.is_some()
    }

    /// Bytes already read from the source that decoding has not consumed.
    pub fn buffered_input(&self) -> usize {
        self.decompressor
            .as_ref()
            .map_or(0, |d| d.unconsumed_input())
    }

    pub fn get_ref(&self) -> Option<&R> {
        self.inner.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut R> {
        self.inner.as_mut()
    }

    pub fn into_inner(self) -> Option<R> {
        self.inner
    }
}

impl<R: Read + Seek> DeflateDecoder<R> {
    pub fn new_seekable(inner: R) -> Self {
        Self::build(inner, DecoderOptions::default(), Some(seek_back::<R>))
    }

    pub fn seekable_with_options(inner: R, options: DecoderOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(inner, options, Some(seek_back::<R>)))
    }
}

impl<R: Read> Read for DeflateDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_chunk(buf)?.unwrap_or(0))
    }
}
