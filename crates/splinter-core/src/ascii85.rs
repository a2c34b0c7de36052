//! btoa-style ASCII85 codec (spec §4.1).
//!
//! 85-character alphabet starting at `!` (0x21). No Adobe `<~ ~>` framing.
//! All-zero 4-byte words are folded to the single digit `z` on encode; `y`
//! (four-space fold) is accepted on decode when `foldspaces` is set, but
//! this crate never emits it.

use crate::error::{Error, Result};

const FIRST_CHAR: u8 = b'!';
const LAST_CHAR: u8 = b'u';
const IGNORED_WHITESPACE: &[u8] = b" \t\n\r\x0b";

/// Encode `data` as ASCII85 text (no framing, no line wrapping).
pub fn encode(data: &[u8]) -> String {
    let padding = (4 - data.len() % 4) % 4;
    let mut padded = Vec::with_capacity(data.len() + padding);
    padded.extend_from_slice(data);
    padded.extend(std::iter::repeat(0u8).take(padding));

    let mut out = Vec::with_capacity(padded.len() / 4 * 5);
    let word_count = padded.len() / 4;
    for (idx, chunk) in padded.chunks_exact(4).enumerate() {
        let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let is_last = idx + 1 == word_count;
        if word == 0 && !(is_last && padding > 0) {
            out.push(b'z');
            continue;
        }
        let mut digits = [0u8; 5];
        let mut remainder = word;
        for slot in digits.iter_mut().rev() {
            *slot = FIRST_CHAR + (remainder % 85) as u8;
            remainder /= 85;
        }
        if is_last && padding > 0 {
            out.extend_from_slice(&digits[..5 - padding]);
        } else {
            out.extend_from_slice(&digits);
        }
    }

    // SAFETY-free: every byte pushed is in the printable ASCII range.
    String::from_utf8(out).expect("ascii85 output is always ASCII")
}

/// Decode ASCII85 text back to bytes.
///
/// Accepts and discards ASCII whitespace (space, tab, LF, CR, VT) anywhere
/// in the input. Accepts the `y` short form for four-space words only when
/// `foldspaces` is true; this system never emits it but some readers may.
pub fn decode(text: &str, foldspaces: bool) -> Result<Vec<u8>> {
    if !text.is_ascii() {
        return Err(Error::InvalidInput("ascii85 input must be ASCII".into()));
    }

    let mut decoded = Vec::new();
    let mut group: Vec<u8> = Vec::with_capacity(5);

    let filler = [b'u'; 4];
    for &byte in text.as_bytes().iter().chain(filler.iter()) {
        if (FIRST_CHAR..=LAST_CHAR).contains(&byte) {
            group.push(byte);
            if group.len() == 5 {
                decoded.extend_from_slice(&decode_group(&group)?);
                group.clear();
            }
        } else if byte == b'z' {
            if !group.is_empty() {
                return Err(Error::Corrupt("'z' shorthand inside an ascii85 group".into()));
            }
            decoded.extend_from_slice(&[0, 0, 0, 0]);
        } else if foldspaces && byte == b'y' {
            if !group.is_empty() {
                return Err(Error::Corrupt("'y' shorthand inside an ascii85 group".into()));
            }
            decoded.extend_from_slice(&[0x20, 0x20, 0x20, 0x20]);
        } else if IGNORED_WHITESPACE.contains(&byte) {
            continue;
        } else {
            return Err(Error::Corrupt(format!("non-ascii85 digit: {:#04x}", byte)));
        }
    }

    let trim = 4 - group.len();
    if trim > 0 {
        let new_len = decoded.len().saturating_sub(trim);
        decoded.truncate(new_len);
    }
    Ok(decoded)
}

fn decode_group(group: &[u8]) -> Result<[u8; 4]> {
    let mut acc: u64 = 0;
    for &digit in group {
        acc = acc * 85 + u64::from(digit - FIRST_CHAR);
    }
    let word = u32::try_from(acc).map_err(|_| Error::Corrupt("ascii85 word overflow".into()))?;
    Ok(word.to_be_bytes())
}
