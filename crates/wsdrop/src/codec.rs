// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary upload header codec.
//!
//! Wire layout (all integers big-endian, unsigned):
//!
//! ```text
//! [ filename_len: u32 ][ filename: utf8 bytes ][ content_len: u64 ]
//! ```

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

/// Size of the `filename_len` prefix.
const NAME_LEN_BYTES: usize = 4;

/// Size of the trailing `content_len` field.
const CONTENT_LEN_BYTES: usize = 8;

/// Smallest possible header: empty filename plus both length fields.
pub const MIN_HEADER_LEN: usize = NAME_LEN_BYTES + CONTENT_LEN_BYTES;

/// Decoded upload header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadHeader {
    pub filename: String,
    pub content_length: u64,
}

impl UploadHeader {
    /// Number of bytes this header occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        MIN_HEADER_LEN + self.filename.len()
    }

    /// Encode the header into its wire form.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u32(self.filename.len() as u32);
        buf.put_slice(self.filename.as_bytes());
        buf.put_u64(self.content_length);
        buf.freeze()
    }
}

/// Structural header failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// Fewer than [`MIN_HEADER_LEN`] bytes in the frame.
    TooShort { len: usize },
    /// `filename_len` claims more bytes than the frame holds.
    Truncated { filename_len: u32, available: usize },
    /// Filename bytes are not valid UTF-8.
    InvalidEncoding,
    /// Filename has no usable basename once sanitized.
    InvalidFilename,
    /// A text frame arrived where the binary header was expected.
    UnexpectedFrame,
}

impl HeaderError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooShort { .. } => "header_too_short",
            Self::Truncated { .. } => "header_truncated",
            Self::InvalidEncoding => "invalid_encoding",
            Self::InvalidFilename => "invalid_filename",
            Self::UnexpectedFrame => "expected_binary_header",
        }
    }
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len } => {
                write!(f, "header too short: {len} bytes (min {MIN_HEADER_LEN})")
            }
            Self::Truncated { filename_len, available } => write!(
                f,
                "header truncated: filename_len {filename_len} needs {} bytes, got {available}",
                (*filename_len as u64) + MIN_HEADER_LEN as u64,
            ),
            Self::InvalidEncoding => f.write_str("filename is not valid UTF-8"),
            Self::InvalidFilename => f.write_str("filename has no usable basename"),
            Self::UnexpectedFrame => f.write_str("expected a binary header frame"),
        }
    }
}

impl std::error::Error for HeaderError {}

/// Parse an upload header from the front of `data`.
///
/// Bytes after the header are not inspected; use [`UploadHeader::encoded_len`]
/// to locate them.
pub fn parse_header(data: &[u8]) -> Result<UploadHeader, HeaderError> {
    if data.len() < MIN_HEADER_LEN {
        return Err(HeaderError::TooShort { len: data.len() });
    }

    let (len_field, rest) = data.split_at(NAME_LEN_BYTES);
    let filename_len = u32::from_be_bytes([len_field[0], len_field[1], len_field[2], len_field[3]]);

    let name_end = filename_len as usize;
    let needed = name_end.checked_add(CONTENT_LEN_BYTES);
    let Some(needed) = needed.filter(|n| *n <= rest.len()) else {
        return Err(HeaderError::Truncated { filename_len, available: data.len() });
    };

    let filename = std::str::from_utf8(&rest[..name_end])
        .map_err(|_| HeaderError::InvalidEncoding)?
        .to_owned();

    let mut content_len = [0u8; CONTENT_LEN_BYTES];
    content_len.copy_from_slice(&rest[name_end..needed]);

    Ok(UploadHeader { filename, content_length: u64::from_be_bytes(content_len) })
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
