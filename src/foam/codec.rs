//! Payload codec.
//!
//! Detects the payload encoding from header lines, decodes a payload of known
//! length from a byte stream and encodes one back. Text and binary payloads
//! are handled for both scalar and vector entries; the only difference between
//! the two entry kinds is the number of components per entry.

use std::io::{BufRead, ErrorKind, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};
use tracing::trace;

use super::format::*;
use crate::field::{Encoding, FieldKind, Payload};
use crate::util::{Error, Result};

// ============================================================================
// Encoding detection
// ============================================================================

/// Find the `format <token>;` declaration in the header and map it to an encoding.
pub fn detect_encoding<L: AsRef<[u8]>>(header_lines: &[L]) -> Result<Encoding> {
    for line in header_lines {
        let line = String::from_utf8_lossy(line.as_ref());
        if let Some(token) = format_token(&line) {
            trace!(token, "found format declaration");
            return Ok(Encoding::from_token(token));
        }
    }
    Err(Error::header("no `format <binary|ascii>;` declaration before internalField"))
}

/// Token of a `format <token>;` declaration on this line, if any.
fn format_token(line: &str) -> Option<&str> {
    let mut rest = line;
    while let Some(idx) = rest.find(FORMAT_KEYWORD) {
        let before = rest[..idx].chars().next_back();
        let after = &rest[idx + FORMAT_KEYWORD.len()..];
        rest = after;

        // whole word only: `format` preceded by start, whitespace or `{`
        if before.is_some_and(|c| !(c.is_whitespace() || c == '{')) {
            continue;
        }
        if !after.starts_with(char::is_whitespace) {
            continue;
        }
        let value = after.trim_start();
        let end = value
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(value.len());
        let (token, tail) = value.split_at(end);
        if !token.is_empty() && tail.trim_start().starts_with(';') {
            return Some(token);
        }
    }
    None
}

// ============================================================================
// Decoding
// ============================================================================

/// Values decoded per read; buffers grow by at most this much ahead of the input.
const DECODE_CHUNK: usize = 8192;

/// Decode `count` entries of `kind` from a stream positioned just after the
/// opening delimiter.
///
/// The declared count is untrusted: storage grows with the data actually
/// read, so an oversized count fails with `MalformedPayload` at end of input.
pub fn decode<R: BufRead>(
    r: &mut R,
    count: usize,
    kind: FieldKind,
    encoding: Encoding,
) -> Result<Payload> {
    let total = value_count(count, kind)?;
    let values = match encoding {
        Encoding::Binary => decode_binary(r, count, total, kind)?,
        Encoding::Text => decode_text(r, count, total, kind)?,
    };
    Payload::new(kind, values)
}

/// Number of doubles in `count` entries of `kind`.
pub fn value_count(count: usize, kind: FieldKind) -> Result<usize> {
    count
        .checked_mul(kind.components())
        .ok_or_else(|| Error::payload(format!("point count {} is out of range", count)))
}

/// Bytes taken by the binary payload of `count` entries of `kind`.
pub fn binary_len(count: usize, kind: FieldKind) -> Result<u64> {
    value_count(count, kind)?
        .checked_mul(DOUBLE_SIZE)
        .map(|n| n as u64)
        .ok_or_else(|| Error::payload(format!("point count {} is out of range", count)))
}

fn decode_binary<R: BufRead>(
    r: &mut R,
    count: usize,
    total: usize,
    kind: FieldKind,
) -> Result<Vec<f64>> {
    let mut values = Vec::with_capacity(total.min(DECODE_CHUNK));
    while values.len() < total {
        let start = values.len();
        values.resize(start + (total - start).min(DECODE_CHUNK), 0.0);
        r.read_f64_into::<PayloadOrder>(&mut values[start..]).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                Error::payload(format!(
                    "binary payload truncated: expected {} {} entries ({} bytes)",
                    count,
                    kind,
                    total.saturating_mul(DOUBLE_SIZE)
                ))
            } else {
                Error::Io(e)
            }
        })?;
    }
    Ok(values)
}

fn decode_text<R: BufRead>(
    r: &mut R,
    count: usize,
    total: usize,
    kind: FieldKind,
) -> Result<Vec<f64>> {
    let mut values = Vec::with_capacity(total.min(DECODE_CHUNK));
    let mut literal = String::new();

    for entry in 0..count {
        match kind {
            FieldKind::Scalar => {
                values.push(read_number(r, &mut literal, entry, count)?);
            }
            FieldKind::Vector3 => {
                skip_whitespace(r)?;
                expect_byte(r, b'(', "at start of vector entry")?;
                for _ in 0..3 {
                    values.push(read_number(r, &mut literal, entry, count)?);
                }
                skip_whitespace(r)?;
                expect_byte(r, b')', "at end of vector entry")?;
            }
        }
    }
    Ok(values)
}

/// Read one numeric literal, skipping leading whitespace.
fn read_number<R: BufRead>(
    r: &mut R,
    literal: &mut String,
    entry: usize,
    count: usize,
) -> Result<f64> {
    skip_whitespace(r)?;
    literal.clear();
    loop {
        let (taken, hit_delimiter) = {
            let buf = r.fill_buf()?;
            if buf.is_empty() {
                break;
            }
            let n = buf.iter().take_while(|b| !is_delimiter(**b)).count();
            literal.extend(buf[..n].iter().map(|&b| b as char));
            (n, n < buf.len())
        };
        r.consume(taken);
        if hit_delimiter {
            break;
        }
    }
    if literal.is_empty() {
        return Err(Error::payload(format!(
            "text payload ended after {} of {} entries",
            entry, count
        )));
    }
    literal
        .parse::<f64>()
        .map_err(|_| Error::payload(format!("invalid numeric literal `{}` in entry {}", literal, entry)))
}

#[inline]
fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'(' | b')' | b';')
}

fn skip_whitespace<R: BufRead>(r: &mut R) -> Result<()> {
    loop {
        let (skip, done) = {
            let buf = r.fill_buf()?;
            if buf.is_empty() {
                return Ok(());
            }
            let n = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
            (n, n < buf.len())
        };
        r.consume(skip);
        if done {
            return Ok(());
        }
    }
}

fn expect_byte<R: BufRead>(r: &mut R, expected: u8, context: &str) -> Result<()> {
    let found = r.fill_buf()?.first().copied();
    match found {
        Some(b) if b == expected => {
            r.consume(1);
            Ok(())
        }
        Some(b) => Err(Error::payload(format!(
            "expected `{}` {}, found `{}`",
            expected as char,
            context,
            b.escape_ascii()
        ))),
        None => Err(Error::payload(format!(
            "expected `{}` {}, found end of file",
            expected as char, context
        ))),
    }
}

/// Consume the opening delimiter of the payload list.
pub fn expect_open<R: BufRead>(r: &mut R) -> Result<()> {
    expect_byte(r, OPEN_DELIMITER, "opening the payload list")
}

/// Consume the closing delimiter after the last entry.
///
/// Binary payloads must be followed directly by `);`. Text payloads may have
/// whitespace before `)` and between `)` and `;`.
pub fn expect_close<R: BufRead>(r: &mut R, encoding: Encoding) -> Result<()> {
    match encoding {
        Encoding::Binary => {
            let mut delim = [0u8; 2];
            let mut filled = 0;
            while filled < delim.len() {
                let n = r.read(&mut delim[filled..])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            if delim[..filled] != CLOSE_DELIMITER[..] {
                return Err(Error::payload(format!(
                    "expected closing `);` after payload, found `{}` (wrong point count or corrupt file)",
                    delim[..filled].escape_ascii()
                )));
            }
            Ok(())
        }
        Encoding::Text => {
            skip_whitespace(r)?;
            expect_byte(r, CLOSE_DELIMITER[0], "closing the payload list (wrong point count?)")?;
            skip_whitespace(r)?;
            expect_byte(r, CLOSE_DELIMITER[1], "after the payload list")
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a payload. Binary output mirrors `decode`; text output puts each
/// entry on its own line.
pub fn encode<W: Write>(w: &mut W, payload: &Payload, encoding: Encoding) -> Result<()> {
    match encoding {
        Encoding::Binary => {
            for &v in payload.values() {
                w.write_f64::<PayloadOrder>(v)?;
            }
        }
        Encoding::Text => {
            w.write_all(b"\n")?;
            for entry in payload.entries() {
                match payload.kind() {
                    FieldKind::Scalar => writeln!(w, "{}", format_literal(entry[0]))?,
                    FieldKind::Vector3 => writeln!(
                        w,
                        "({} {} {})",
                        format_literal(entry[0]),
                        format_literal(entry[1]),
                        format_literal(entry[2])
                    )?,
                }
            }
        }
    }
    Ok(())
}

/// Shortest decimal form that parses back to the same double.
/// Integral values drop the trailing `.0`; extreme magnitudes use exponent form.
pub fn format_literal(v: f64) -> String {
    let s = format!("{:?}", v);
    match s.strip_suffix(".0") {
        Some(integral) => integral.to_string(),
        None => s,
    }
}
