//! C-style escaping of string and bytes values in the text format.

use std::fmt::Write as _;

/// Escapes raw bytes: quotes, backslash and common control characters get a
/// backslash escape, every other byte outside printable ASCII becomes a
/// three-digit octal escape.
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        push_escaped(&mut out, byte);
    }
    out
}

/// Escapes a UTF-8 string like [`escape_bytes`] but keeps non-ASCII characters intact.
pub fn escape_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii() {
            push_escaped(&mut out, ch as u8);
        } else {
            out.push(ch);
        }
    }
    out
}

fn push_escaped(out: &mut String, byte: u8) {
    match byte {
        b'\n' => out.push_str("\\n"),
        b'\r' => out.push_str("\\r"),
        b'\t' => out.push_str("\\t"),
        b'"' => out.push_str("\\\""),
        b'\'' => out.push_str("\\'"),
        b'\\' => out.push_str("\\\\"),
        0x20..=0x7e => out.push(byte as char),
        _ => {
            let _ = write!(out, "\\{byte:03o}");
        }
    }
}

/// Reverses [`escape_bytes`]; also accepts `\xHH`, `\a`, `\b`, `\f`, `\v`, `\?`
/// and octal escapes of one to three digits. Returns the offending escape on failure.
pub fn unescape(body: &str) -> Result<Vec<u8>, String> {
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        let byte = bytes[idx];
        idx += 1;
        if byte != b'\\' {
            out.push(byte);
            continue;
        }
        let Some(&code) = bytes.get(idx) else {
            return Err("\\".to_owned());
        };
        idx += 1;
        match code {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'\\' | b'\'' | b'"' | b'?' => out.push(code),
            b'0'..=b'7' => {
                let mut value = u32::from(code - b'0');
                let mut digits = 1;
                while digits < 3 {
                    match bytes.get(idx) {
                        Some(&next @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(next - b'0');
                            idx += 1;
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                let value = u8::try_from(value).map_err(|_| format!("\\{value:o}"))?;
                out.push(value);
            }
            b'x' | b'X' => {
                let mut value = 0u8;
                let mut digits = 0;
                while digits < 2 {
                    match bytes.get(idx).and_then(|next| (*next as char).to_digit(16)) {
                        Some(digit) => {
                            value = value * 16 + digit as u8;
                            idx += 1;
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    return Err("\\x".to_owned());
                }
                out.push(value);
            }
            other => return Err(format!("\\{}", other as char)),
        }
    }
    Ok(out)
}
