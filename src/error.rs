use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Malformed compressed data. Never recoverable within the same stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("reserved block type")]
    ReservedBlockType,
    #[error("stored block length {len:#06x} does not match complement {nlen:#06x}")]
    StoredLengthMismatch { len: u16, nlen: u16 },
    #[error("canonical code is over-subscribed")]
    OversubscribedCode,
    #[error("canonical code is incomplete")]
    IncompleteCode,
    #[error("reserved length symbol {0}")]
    ReservedLengthSymbol(u16),
    #[error("reserved distance symbol {0}")]
    ReservedDistanceSymbol(u16),
    #[error("length symbol in a block without a distance code")]
    MissingDistanceCode,
    #[error("code length repeat with no previous length")]
    NoPreviousLength,
    #[error("code length run exceeds the number of codes")]
    CodeLengthOverflow,
}

/// Programmer errors against the decoder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("decoder already closed")]
    Closed,
    #[error("decoder already detached")]
    AlreadyDetached,
    #[error("decoder is not in pass-through mode")]
    NotDetached,
    #[error("input buffer size must be positive")]
    ZeroBufferSize,
}

#[derive(Debug, Clone, Error)]
pub enum InflateError {
    #[error("invalid deflate data: {0}")]
    Format(#[from] FormatError),
    #[error("unexpected end of deflate stream")]
    UnexpectedEof,
    #[error("i/o error in underlying stream: {0}")]
    Io(#[source] Arc<io::Error>),
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error("insufficient space in output buffer")]
    InsufficientSpace,
}

impl InflateError {
    pub fn is_format(&self) -> bool {
        matches!(self, InflateError::Format(_))
    }
}

impl From<io::Error> for InflateError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            InflateError::UnexpectedEof
        } else {
            InflateError::Io(Arc::new(err))
        }
    }
}

impl From<InflateError> for io::Error {
    fn from(err: InflateError) -> Self {
        let kind = match &err {
            InflateError::Format(_) => io::ErrorKind::InvalidData,
            InflateError::UnexpectedEof => io::ErrorKind::UnexpectedEof,
            InflateError::Io(inner) => inner.kind(),
            InflateError::Usage(_) | InflateError::InsufficientSpace => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

pub type Result<T, E = InflateError> = std::result::Result<T, E>;
