//! Streaming decoder for raw DEFLATE (RFC 1951) data with detachable input.

pub mod api;
pub mod batch;
pub mod common;
pub mod decompress;
pub mod error;
pub mod stream;

pub use api::Decompressor;
pub use error::{FormatError, InflateError, UsageError};
pub use stream::{DecoderOptions, DeflateDecoder};
