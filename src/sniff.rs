//! Content-type sniffing for response bodies.
//!
//! A pragmatic subset of the WHATWG mime-sniffing rules: magic numbers for
//! common binary formats, markup tag detection, then a UTF-8 text check.

/// How many leading bytes participate in sniffing.
const SNIFF_LEN: usize = 512;

/// Best-effort content type for a response body.
pub fn detect(data: &[u8]) -> &'static str {
    if data.is_empty() {
        return "text/plain; charset=utf-8";
    }
    let data = &data[..data.len().min(SNIFF_LEN)];

    if let Some(ct) = match_magic(data) {
        return ct;
    }
    if let Some(ct) = match_markup(data) {
        return ct;
    }
    if is_text(data) {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

fn match_magic(data: &[u8]) -> Option<&'static str> {
    const MAGICS: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1f\x8b\x08", "application/x-gzip"),
        (b"OggS", "application/ogg"),
        (b"\x00\x00\x01\x00", "image/x-icon"),
    ];
    MAGICS
        .iter()
        .find(|(magic, _)| data.starts_with(magic))
        .map(|(_, ct)| *ct)
}

fn match_markup(data: &[u8]) -> Option<&'static str> {
    const TAGS: &[(&str, &str)] = &[
        ("<!DOCTYPE HTML", "text/html; charset=utf-8"),
        ("<HTML", "text/html; charset=utf-8"),
        ("<HEAD", "text/html; charset=utf-8"),
        ("<BODY", "text/html; charset=utf-8"),
        ("<SCRIPT", "text/html; charset=utf-8"),
        ("<DIV", "text/html; charset=utf-8"),
        ("<!--", "text/html; charset=utf-8"),
        ("<?XML", "text/xml; charset=utf-8"),
    ];

    let start = data.iter().position(|b| !b.is_ascii_whitespace())?;
    let head: String = data[start..]
        .iter()
        .take(16)
        .map(|b| b.to_ascii_uppercase() as char)
        .collect();
    TAGS.iter()
        .find(|(tag, _)| head.starts_with(tag))
        .map(|(_, ct)| *ct)
}

/// Treat the prefix as text when it decodes as UTF-8 (allowing a split
/// multi-byte sequence at the cut) and carries no control bytes other than
/// whitespace and escape.
fn is_text(data: &[u8]) -> bool {
    let valid_to = match std::str::from_utf8(data) {
        Ok(_) => data.len(),
        Err(err) if err.error_len().is_none() => err.valid_up_to(),
        Err(_) => return false,
    };
    data[..valid_to]
        .iter()
        .all(|&b| b >= 0x20 || matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | 0x1b))
}
