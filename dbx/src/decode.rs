//! Binary DBX -> XML decoding (spec §4.3, §6.1, §6.2).

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::leb128;
use crate::numeric::{self, VectorElement};

const MAGIC: &[u8; 8] = b"{binary}";
const XML_HEADER: &str = "<?xml version=\"1.0\"?>\r\n";

/// Decode a DBX binary blob into its XML text form.
///
/// Returns `Ok(None)` when `input` does not start with the DBX magic —
/// spec §7 treats that as "not a DBX file," not an error. Any other
/// failure (truncation, a string-pool index out of range, a malformed
/// offset table) aborts the whole decode and returns `Err`, leaving no
/// partial output.
pub fn decode_dbx(input: &[u8]) -> Result<Option<Vec<u8>>> {
    if input.len() < 8 || &input[0..8] != MAGIC {
        return Ok(None);
    }

    let mut header = Cursor::new(&input[8..]);
    let total_offset = header
        .read_u32::<BigEndian>()
        .map_err(|_| truncated(8, input.len()))?;
    let zero = header
        .read_u32::<BigEndian>()
        .map_err(|_| truncated(12, input.len()))?;
    let rel_offset = header
        .read_u32::<BigEndian>()
        .map_err(|_| truncated(16, input.len()))?;
    let num_strings = header
        .read_u32::<BigEndian>()
        .map_err(|_| truncated(20, input.len()))?;
    if zero != 0 {
        log::debug!("DBX header reserved word is {zero}, not 0 (ignored)");
    }
    let _ = total_offset;

    let offsets_start = 24usize;
    let offsets_len = 4usize
        .checked_mul(num_strings as usize)
        .ok_or(Error::MalformedStringPool)?;
    let strings_start = offsets_start
        .checked_add(offsets_len)
        .ok_or(Error::MalformedStringPool)?;
    let strings_len = (rel_offset as usize)
        .checked_sub(offsets_len)
        .ok_or(Error::MalformedStringPool)?;
    let payload_start = strings_start
        .checked_add(strings_len)
        .ok_or(Error::MalformedStringPool)?;

    if input.len() < payload_start {
        return Err(truncated(payload_start, input.len()));
    }

    let mut offsets = Vec::with_capacity(num_strings as usize + 1);
    let mut cur = Cursor::new(&input[offsets_start..strings_start]);
    for _ in 0..num_strings {
        let off = cur
            .read_u32::<BigEndian>()
            .map_err(|_| truncated(strings_start, input.len()))?;
        offsets.push(off as usize);
    }
    offsets.push(strings_len);

    let strings_block = &input[strings_start..payload_start];
    let mut strings = Vec::with_capacity(num_strings as usize);
    for w in offsets.windows(2) {
        let (start, end) = (w[0], w[1]);
        if end < start || end > strings_block.len() {
            return Err(Error::MalformedStringPool);
        }
        let mut raw = &strings_block[start..end];
        if raw.last() == Some(&0u8) {
            raw = &raw[..raw.len() - 1];
        }
        strings.push(String::from_utf8_lossy(raw).into_owned());
    }

    let mut pos = payload_start;
    let mut out = String::from(XML_HEADER);
    let mut stack: Vec<String> = Vec::new();

    while pos < input.len() {
        let tag_idx = leb128::decode(input, &mut pos)?;
        if tag_idx == 0 {
            match stack.pop() {
                Some(tag) => {
                    out.push_str(&indent(stack.len()));
                    out.push_str("</");
                    out.push_str(&tag);
                    out.push_str(">\r\n");
                }
                None => break,
            }
            continue;
        }

        let tag = lookup(&strings, tag_idx)?;
        let type_byte = read_byte(input, &mut pos)?;
        let num_attribs = (type_byte & 0x0F) as usize;
        let mut attribs = Vec::with_capacity(num_attribs);
        for _ in 0..num_attribs {
            let key_idx = leb128::decode(input, &mut pos)?;
            let val_idx = leb128::decode(input, &mut pos)?;
            attribs.push((lookup(&strings, key_idx)?, lookup(&strings, val_idx)?));
        }

        let level = stack.len();
        let open = open_tag(level, &tag, &attribs);

        match type_byte >> 4 {
            0xA => {
                read_byte(input, &mut pos)?; // padding
                stack.push(tag.clone());
                out.push_str(&open);
                out.push_str(">\r\n");
            }
            0x2 => {
                let content_idx = leb128::decode(input, &mut pos)?;
                let content = lookup(&strings, content_idx)?;
                out.push_str(&open);
                if content.is_empty() {
                    out.push_str(" />\r\n");
                } else {
                    out.push('>');
                    out.push_str(&content);
                    out.push_str("</");
                    out.push_str(&tag);
                    out.push_str(">\r\n");
                }
            }
            0x7 => {
                let n = leb128::decode(input, &mut pos)? as usize;
                let w = leb128::decode(input, &mut pos)? as usize;
                let field = attribs.first().map(|(_, v)| v.as_str()).unwrap_or("");
                let text = decode_numeric_vector(input, &mut pos, n, w, field)?;
                out.push_str(&open);
                out.push('>');
                out.push_str(&text);
                out.push_str("</");
                out.push_str(&tag);
                out.push_str(">\r\n");
            }
            _ => {
                read_byte(input, &mut pos)?; // padding
                let value = read_byte(input, &mut pos)?;
                let content = match value {
                    0x01 => "true".to_string(),
                    0x00 => "false".to_string(),
                    other => other.to_string(),
                };
                out.push_str(&open);
                out.push('>');
                out.push_str(&content);
                out.push_str("</");
                out.push_str(&tag);
                out.push_str(">\r\n");
            }
        }
    }

    Ok(Some(out.into_bytes()))
}

fn decode_numeric_vector(
    input: &[u8],
    pos: &mut usize,
    n: usize,
    w: usize,
    field: &str,
) -> Result<String> {
    match w {
        8 => {
            let mut parts = Vec::with_capacity(n);
            for _ in 0..n {
                let bytes = read_n(input, pos, 8)?;
                let v = f64::from_be_bytes(bytes.try_into().unwrap());
                parts.push(VectorElement::Float64(v).to_text());
            }
            Ok(parts.join("/"))
        }
        2 => {
            let mut parts = Vec::with_capacity(n);
            for _ in 0..n {
                let bytes = read_n(input, pos, 2)?;
                let v = u16::from_be_bytes(bytes.try_into().unwrap());
                parts.push(VectorElement::UInt16(v).to_text());
            }
            Ok(parts.join("/"))
        }
        _ => {
            let mut slots = Vec::with_capacity(n);
            for _ in 0..n {
                let bytes = read_n(input, pos, 4)?;
                slots.push(<[u8; 4]>::try_from(bytes).unwrap());
            }
            let elements = numeric::decode_vector_w4(&slots, field);
            Ok(elements
                .into_iter()
                .map(VectorElement::to_text)
                .collect::<Vec<_>>()
                .join("/"))
        }
    }
}

fn open_tag(level: usize, tag: &str, attribs: &[(String, String)]) -> String {
    let mut s = indent(level);
    s.push('<');
    s.push_str(tag);
    if !attribs.is_empty() {
        s.push(' ');
        let parts: Vec<String> = attribs
            .iter()
            .map(|(k, v)| format!("{k}=\"{v}\""))
            .collect();
        s.push_str(&parts.join(" "));
    }
    s
}

fn indent(level: usize) -> String {
    "\t".repeat(level)
}

fn lookup(strings: &[String], idx: u64) -> Result<String> {
    strings
        .get(idx as usize)
        .cloned()
        .ok_or(Error::StringIndexOutOfRange(idx))
}

fn read_byte(input: &[u8], pos: &mut usize) -> Result<u8> {
    let b = *input
        .get(*pos)
        .ok_or_else(|| truncated(*pos + 1, input.len()))?;
    *pos += 1;
    Ok(b)
}

fn read_n<'a>(input: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8]> {
    let end = pos
        .checked_add(n)
        .ok_or_else(|| truncated(*pos + n, input.len()))?;
    if end > input.len() {
        return Err(truncated(end, input.len()));
    }
    let slice = &input[*pos..end];
    *pos = end;
    Ok(slice)
}

fn truncated(expected: usize, actual: usize) -> Error {
    Error::Truncated { expected, actual }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_simple_dbx(tag: &str) -> Vec<u8> {
        // strings: "" (index 0), tag (index 1)
        let mut strings_bytes = Vec::new();
        strings_bytes.push(0u8); // empty string's terminator
        let tag_offset = strings_bytes.len() as u32;
        strings_bytes.extend_from_slice(tag.as_bytes());
        strings_bytes.push(0);

        let num_strings = 2u32;
        let offsets = [0u32, tag_offset];
        let offsets_bytes_len = 4 * num_strings;
        let rel_offset = offsets_bytes_len + strings_bytes.len() as u32;

        let mut payload = Vec::new();
        leb128::encode(1, &mut payload); // tag index 1
        payload.push(0x20); // type 2, 0 attribs
        payload.push(0); // empty content index 0 -> self closing

        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&(rel_offset + 24).to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&rel_offset.to_be_bytes());
        out.extend_from_slice(&num_strings.to_be_bytes());
        for off in offsets {
            out.extend_from_slice(&off.to_be_bytes());
        }
        out.extend_from_slice(&strings_bytes);
        out.extend_from_slice(&payload);
        out
    }

    #[test]
    fn non_magic_returns_none() {
        assert_eq!(decode_dbx(b"not a dbx file").unwrap(), None);
    }

    #[test]
    fn short_input_returns_none() {
        assert_eq!(decode_dbx(b"short").unwrap(), None);
    }

    #[test]
    fn self_closing_string_element() {
        let dbx = build_simple_dbx("tag0");
        let xml = decode_dbx(&dbx).unwrap().unwrap();
        let text = String::from_utf8(xml).unwrap();
        assert_eq!(text, "<?xml version=\"1.0\"?>\r\n<tag0 />\r\n");
    }

    #[test]
    fn truncated_header_is_error() {
        let err = decode_dbx(b"{binary}\x00\x00").unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));
    }

    #[test]
    fn container_open_and_close() {
        // strings: "" , "Root"
        let mut strings_bytes = vec![0u8];
        let tag_off = strings_bytes.len() as u32;
        strings_bytes.extend_from_slice(b"Root\x00");
        let num_strings = 2u32;
        let rel_offset = 4 * num_strings + strings_bytes.len() as u32;

        let mut payload = Vec::new();
        leb128::encode(1, &mut payload);
        payload.push(0xA0); // container, 0 attribs
        payload.push(0); // padding
        payload.push(0); // close

        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&(rel_offset + 24).to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&rel_offset.to_be_bytes());
        out.extend_from_slice(&num_strings.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&tag_off.to_be_bytes());
        out.extend_from_slice(&strings_bytes);
        out.extend_from_slice(&payload);

        let xml = decode_dbx(&out).unwrap().unwrap();
        let text = String::from_utf8(xml).unwrap();
        assert_eq!(
            text,
            "<?xml version=\"1.0\"?>\r\n<Root>\r\n</Root>\r\n"
        );
    }
}
