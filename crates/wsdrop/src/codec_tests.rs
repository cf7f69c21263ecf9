// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{parse_header, HeaderError, UploadHeader, MIN_HEADER_LEN};

fn raw_header(filename_len: u32, name: &[u8], content_len: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&filename_len.to_be_bytes());
    buf.extend_from_slice(name);
    buf.extend_from_slice(&content_len.to_be_bytes());
    buf
}

#[test]
fn parses_well_formed_header() -> anyhow::Result<()> {
    let header = parse_header(&raw_header(5, b"a.txt", 5))?;
    assert_eq!(header, UploadHeader { filename: "a.txt".to_owned(), content_length: 5 });
    assert_eq!(header.encoded_len(), 17);
    Ok(())
}

#[test]
fn empty_filename_is_legal_at_codec_layer() -> anyhow::Result<()> {
    let header = parse_header(&raw_header(0, b"", 42))?;
    assert_eq!(header.filename, "");
    assert_eq!(header.content_length, 42);
    Ok(())
}

#[test]
fn content_length_is_big_endian_u64() -> anyhow::Result<()> {
    let header = parse_header(&raw_header(1, b"x", u64::MAX - 1))?;
    assert_eq!(header.content_length, u64::MAX - 1);
    Ok(())
}

#[test]
fn multibyte_filename_decodes() -> anyhow::Result<()> {
    let name = "résumé.pdf";
    let header = parse_header(&raw_header(name.len() as u32, name.as_bytes(), 3))?;
    assert_eq!(header.filename, name);
    Ok(())
}

#[test]
fn trailing_bytes_are_ignored() -> anyhow::Result<()> {
    let mut data = raw_header(3, b"f.b", 4);
    data.extend_from_slice(b"data");
    let header = parse_header(&data)?;
    assert_eq!(header.filename, "f.b");
    assert_eq!(&data[header.encoded_len()..], b"data");
    Ok(())
}

#[yare::parameterized(
    empty     = { 0 },
    one       = { 1 },
    eleven    = { 11 },
)]
fn short_frames_are_rejected(len: usize) {
    let data = vec![0u8; len];
    assert_eq!(parse_header(&data), Err(HeaderError::TooShort { len }));
}

#[test]
fn filename_len_past_end_is_truncated() {
    // Claims a 100-byte filename but only carries 5.
    let data = raw_header(100, b"a.txt", 5);
    assert_eq!(
        parse_header(&data),
        Err(HeaderError::Truncated { filename_len: 100, available: data.len() })
    );
}

#[test]
fn missing_content_length_is_truncated() {
    // Filename fits, but the 8-byte content length is cut short.
    let mut data = Vec::new();
    data.extend_from_slice(&8u32.to_be_bytes());
    data.extend_from_slice(b"file.bin");
    data.extend_from_slice(&[0, 0, 0]);
    assert!(matches!(parse_header(&data), Err(HeaderError::Truncated { filename_len: 8, .. })));
}

#[test]
fn max_filename_len_does_not_overflow() {
    let data = raw_header(u32::MAX, b"", 0);
    assert!(matches!(parse_header(&data), Err(HeaderError::Truncated { .. })));
}

#[test]
fn invalid_utf8_filename_is_rejected() {
    let data = raw_header(2, &[0xC3, 0x28], 1);
    assert_eq!(parse_header(&data), Err(HeaderError::InvalidEncoding));
}

#[test]
fn encode_then_parse_preserves_fields() -> anyhow::Result<()> {
    let header = UploadHeader { filename: "report.csv".to_owned(), content_length: 1024 };
    let wire = header.encode();
    assert_eq!(wire.len(), MIN_HEADER_LEN + 10);
    assert_eq!(parse_header(&wire)?, header);
    Ok(())
}

#[test]
fn error_display_names_the_problem() {
    let err = HeaderError::Truncated { filename_len: 10, available: 12 };
    assert_eq!(err.to_string(), "header truncated: filename_len 10 needs 22 bytes, got 12");
    assert_eq!(err.as_str(), "header_truncated");
}
