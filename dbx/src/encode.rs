//! XML -> binary DBX encoding (spec §4.4, §6.1).

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::leb128;
use crate::numeric::{DOUBLES, EMPTYNUMS, HALVES, HASHES};

const XML_HEADER: &str = "<?xml version=\"1.0\"?>\r\n";

/// Field-attribute values that force a value element to encode as a plain
/// string rather than a typed value, even when it's the sole `name="..."`
/// attribute (spec §4.4 step 5).
const TYPE2: &[&str] = &["Name", "TextureFile", "LocationName"];

/// Ordered string interning table, insertion-order indexed, with index 0
/// reserved for the empty string (spec §9 "dictionary with insertion-order
/// semantics").
struct StringPool {
    order: Vec<String>,
    index: HashMap<String, u32>,
}

impl StringPool {
    fn new() -> Self {
        let mut pool = StringPool {
            order: Vec::new(),
            index: HashMap::new(),
        };
        pool.intern("");
        pool
    }

    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.order.len() as u32;
        self.order.push(s.to_string());
        self.index.insert(s.to_string(), idx);
        idx
    }

    fn intern_bytes(&mut self, s: &str, out: &mut Vec<u8>) {
        leb128::encode(u64::from(self.intern(s)), out);
    }
}

/// Encode an XML text blob produced by [`crate::decode::decode_dbx`] back
/// into the binary DBX form. Returns `Ok(None)` if `input` does not start
/// with the exact expected XML declaration (spec §7). Any parse error
/// aborts the whole encode with no partial output.
pub fn encode_dbx(input: &[u8]) -> Result<Option<Vec<u8>>> {
    if !input.starts_with(XML_HEADER.as_bytes()) {
        return Ok(None);
    }
    let text = String::from_utf8_lossy(&input[XML_HEADER.len()..]);

    let mut pool = StringPool::new();
    let mut payload = Vec::new();

    for line in text.lines() {
        encode_line(line, &mut pool, &mut payload)?;
    }

    Ok(Some(serialize(&pool, &payload)))
}

fn serialize(pool: &StringPool, payload: &[u8]) -> Vec<u8> {
    let mut strings_bytes = Vec::new();
    let mut offsets = Vec::with_capacity(pool.order.len());
    let mut offset = 0u32;
    for s in &pool.order {
        offsets.push(offset);
        strings_bytes.extend_from_slice(s.as_bytes());
        strings_bytes.push(0);
        offset += s.len() as u32 + 1;
    }

    let num_strings = pool.order.len() as u32;
    let rel_offset = 4 * num_strings + strings_bytes.len() as u32;

    let mut out = Vec::new();
    out.extend_from_slice(b"{binary}");
    out.extend_from_slice(&(rel_offset + 24).to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&rel_offset.to_be_bytes());
    out.extend_from_slice(&num_strings.to_be_bytes());
    for off in offsets {
        out.extend_from_slice(&off.to_be_bytes());
    }
    out.extend_from_slice(&strings_bytes);
    out.extend_from_slice(payload);
    out
}

fn malformed(line: &str) -> Error {
    Error::MalformedLine(line.to_string())
}

fn encode_line(line: &str, pool: &mut StringPool, payload: &mut Vec<u8>) -> Result<()> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.trim().is_empty() {
        return Ok(());
    }

    let lt = trimmed.find('<').ok_or_else(|| malformed(trimmed))?;
    let tag_start = lt + 1;
    if trimmed.as_bytes().get(tag_start) == Some(&b'/') {
        payload.push(0);
        return Ok(());
    }
    let tag_end = trimmed[tag_start..]
        .find('>')
        .map(|i| tag_start + i)
        .ok_or_else(|| malformed(trimmed))?;

    let tag_text = &trimmed[tag_start..tag_end];
    let (prefix, attribs) = match tag_text.find(' ') {
        None => (tag_text.trim_matches(|c| c == ' ' || c == '/'), Vec::new()),
        Some(sp) => {
            let prefix = &tag_text[..sp];
            let attribs = parse_attribs(&tag_text[sp + 1..]);
            (prefix, attribs)
        }
    };

    let mut prefix_bytes = Vec::new();
    pool.intern_bytes(prefix, &mut prefix_bytes);
    let num_attribs = attribs.len();
    let mut attrib_bytes = Vec::new();
    for (k, v) in &attribs {
        pool.intern_bytes(k, &mut attrib_bytes);
        pool.intern_bytes(v, &mut attrib_bytes);
    }

    // Self-closing: the character right before '>' is '/'.
    if trimmed.as_bytes().get(tag_end - 1) == Some(&b'/') {
        payload.extend_from_slice(&prefix_bytes);
        payload.push(0x20 | num_attribs as u8);
        payload.extend_from_slice(&attrib_bytes);
        payload.push(0);
        return Ok(());
    }

    let content_end = trimmed[tag_end + 1..].rfind('<').map(|i| tag_end + 1 + i);
    let Some(content_end) = content_end else {
        // Container open: no further '<' on this line.
        payload.extend_from_slice(&prefix_bytes);
        payload.push(0xA0 | num_attribs as u8);
        payload.extend_from_slice(&attrib_bytes);
        payload.push(0);
        return Ok(());
    };

    let content = &trimmed[tag_end + 1..content_end];
    let is_named_value = num_attribs == 1
        && attribs[0].0 == "name"
        && !TYPE2.contains(&attribs[0].1.as_str());

    if !is_named_value {
        payload.extend_from_slice(&prefix_bytes);
        payload.push(0x20 | num_attribs as u8);
        payload.extend_from_slice(&attrib_bytes);
        pool.intern_bytes(content, payload);
        return Ok(());
    }

    let field = attribs[0].1.as_str();

    if content == "true" {
        payload.extend_from_slice(&prefix_bytes);
        payload.push(0x61);
        payload.extend_from_slice(&attrib_bytes);
        payload.extend_from_slice(&[0x01, 0x01]);
        return Ok(());
    }
    if content == "false" {
        payload.extend_from_slice(&prefix_bytes);
        payload.push(0x61);
        payload.extend_from_slice(&attrib_bytes);
        payload.extend_from_slice(&[0x01, 0x00]);
        return Ok(());
    }
    if field == "ChannelCount" {
        let byte: u8 = content
            .parse()
            .map_err(|_| numeric_err(field, content))?;
        payload.extend_from_slice(&prefix_bytes);
        payload.push(0x61);
        payload.extend_from_slice(&attrib_bytes);
        payload.push(0x01);
        payload.push(byte);
        return Ok(());
    }

    if content.is_empty() {
        if EMPTYNUMS.contains(&field) {
            payload.extend_from_slice(&prefix_bytes);
            payload.push(0x70 | num_attribs as u8);
            payload.extend_from_slice(&attrib_bytes);
            payload.extend_from_slice(&[0x00, 0x04]);
        } else {
            payload.extend_from_slice(&prefix_bytes);
            payload.push(0x20 | num_attribs as u8);
            payload.extend_from_slice(&attrib_bytes);
            pool.intern_bytes("", payload);
        }
        return Ok(());
    }

    encode_numeric_vector(field, content, &prefix_bytes, num_attribs, &attrib_bytes, pool, payload)
}

fn parse_attribs(rest: &str) -> Vec<(String, String)> {
    let parts: Vec<&str> = rest.split('"').collect();
    let mut attribs = Vec::new();
    let mut i = 0;
    while i + 1 < parts.len() {
        let left = parts[i].trim();
        let key = left.strip_suffix('=').unwrap_or(left).trim().to_string();
        let val = parts[i + 1].to_string();
        attribs.push((key, val));
        i += 2;
    }
    attribs
}

fn numeric_err(field: &str, token: &str) -> Error {
    Error::NumericParse {
        field: field.to_string(),
        token: token.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn encode_numeric_vector(
    field: &str,
    content: &str,
    prefix_bytes: &[u8],
    num_attribs: usize,
    attrib_bytes: &[u8],
    pool: &mut StringPool,
    payload: &mut Vec<u8>,
) -> Result<()> {
    let tokens: Vec<&str> = content.split('/').collect();

    if HALVES.contains(&field) {
        let mut nums = Vec::with_capacity(tokens.len());
        for t in &tokens {
            let v: u16 = t.parse().map_err(|_| numeric_err(field, t))?;
            nums.push(v);
        }
        write_vector_header(payload, prefix_bytes, num_attribs, attrib_bytes, nums.len(), 2);
        for v in nums {
            payload.extend_from_slice(&v.to_be_bytes());
        }
        return Ok(());
    }

    if DOUBLES.contains(&field) {
        let mut nums = Vec::with_capacity(tokens.len());
        for t in &tokens {
            let v: f64 = t.parse().map_err(|_| numeric_err(field, t))?;
            nums.push(v);
        }
        write_vector_header(payload, prefix_bytes, num_attribs, attrib_bytes, nums.len(), 8);
        for v in nums {
            payload.extend_from_slice(&v.to_be_bytes());
        }
        return Ok(());
    }

    if HASHES.contains(&field) {
        let mut nums = Vec::with_capacity(tokens.len());
        let mut all_ok = true;
        for t in &tokens {
            match parse_hash_i32(t) {
                Some(v) => nums.push(v),
                None => {
                    all_ok = false;
                    break;
                }
            }
        }
        if all_ok {
            write_vector_header(payload, prefix_bytes, num_attribs, attrib_bytes, nums.len(), 4);
            for v in nums {
                payload.extend_from_slice(&v.to_be_bytes());
            }
            return Ok(());
        }
        if field == "Id" {
            payload.extend_from_slice(prefix_bytes);
            payload.push(0x20 | num_attribs as u8);
            payload.extend_from_slice(attrib_bytes);
            pool.intern_bytes(content, payload);
            return Ok(());
        }
        return Err(numeric_err(field, content));
    }

    // Plain vector: mixed int/float with *zero*/*nonzero* markers.
    let mut slots: Vec<[u8; 4]> = Vec::with_capacity(tokens.len());
    for t in &tokens {
        match t {
            &"*zero*" => slots.push([0, 0, 0, 0]),
            &"*nonzero*" => slots.push([0xCD; 4]),
            token => match parse_plain_token(field, token)? {
                PlainToken::Bytes(b) => slots.push(b),
                PlainToken::StringFallback => {
                    payload.extend_from_slice(prefix_bytes);
                    payload.push(0x20 | num_attribs as u8);
                    payload.extend_from_slice(attrib_bytes);
                    pool.intern_bytes(content, payload);
                    return Ok(());
                }
            },
        }
    }
    write_vector_header(payload, prefix_bytes, num_attribs, attrib_bytes, slots.len(), 4);
    for s in slots {
        payload.extend_from_slice(&s);
    }
    Ok(())
}

fn write_vector_header(
    payload: &mut Vec<u8>,
    prefix_bytes: &[u8],
    num_attribs: usize,
    attrib_bytes: &[u8],
    n: usize,
    width: u8,
) {
    payload.extend_from_slice(prefix_bytes);
    payload.push(0x70 | num_attribs as u8);
    payload.extend_from_slice(attrib_bytes);
    leb128::encode(n as u64, payload);
    payload.push(width);
}

/// A `HASHES` token must parse as a plain 32-bit integer (no marker, no
/// range heuristic); Python's `pack(">i", int(x))` only raises for
/// non-integer text or magnitudes outside `i32`, which is exactly
/// `str::parse::<i32>`.
fn parse_hash_i32(token: &str) -> Option<i32> {
    token.parse::<i32>().ok()
}

enum PlainToken {
    Bytes([u8; 4]),
    StringFallback,
}

/// Classify one token of a plain (non `HASHES`/`HALVES`/`DOUBLES`) numeric
/// vector per spec §4.4's final bullet / §13's three-way ordering: an
/// integer-shaped token either encodes or aborts the file outright (it
/// never falls back to a string); only a token that isn't integer-shaped
/// at all gets a float attempt, which itself either encodes, aborts (the
/// "top byte zero but not exactly zero" denormal-reject rule), or falls
/// back to an interned string if it isn't a float either.
///
/// Integer-shapedness is checked against `i128` rather than `i32` so that
/// a token like `99999999999` takes the same "invalid integer, abort" path
/// Python's arbitrary-precision `int()` does, rather than being treated as
/// "not an integer" and retried as a float.
fn parse_plain_token(field: &str, token: &str) -> Result<PlainToken> {
    if let Ok(big) = token.parse::<i128>() {
        let top24 = big >> 24;
        let top23 = big >> 23;
        if top24 == 0 || top23 == 255 || top23 == -1 {
            if let Ok(n) = i32::try_from(big) {
                return Ok(PlainToken::Bytes(n.to_be_bytes()));
            }
        }
        return Err(numeric_err(field, token));
    }

    match token.parse::<f32>() {
        Ok(f) => {
            let bytes = f.to_be_bytes();
            if bytes[0] == 0 && bytes != [0, 0, 0, 0] {
                return Err(numeric_err(field, token));
            }
            Ok(PlainToken::Bytes(bytes))
        }
        Err(_) => Ok(PlainToken::StringFallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_header_returns_none() {
        assert_eq!(encode_dbx(b"not xml").unwrap(), None);
    }

    #[test]
    fn self_closing_string_roundtrip() {
        let xml = b"<?xml version=\"1.0\"?>\r\n<tag0 />\r\n";
        let dbx = encode_dbx(xml).unwrap().unwrap();
        let back = crate::decode::decode_dbx(&dbx).unwrap().unwrap();
        assert_eq!(back, xml);
    }

    #[test]
    fn container_roundtrip() {
        let xml = b"<?xml version=\"1.0\"?>\r\n<Root>\r\n\t<Item name=\"Flag\">true</Item>\r\n</Root>\r\n";
        let dbx = encode_dbx(xml).unwrap().unwrap();
        let back = crate::decode::decode_dbx(&dbx).unwrap().unwrap();
        assert_eq!(back, xml);
    }

    #[test]
    fn boolean_true_false_payload_bytes() {
        let xml = b"<?xml version=\"1.0\"?>\r\n<Root>\r\n\t<Item name=\"Flag\">true</Item>\r\n</Root>\r\n";
        let dbx = encode_dbx(xml).unwrap().unwrap();
        // payload begins with tag idx 1 (Root), 0xa0, pad 0, tag idx 2 (Item),
        // 0x61, 2 attrib idx (3=name,4=Flag), 0x01 0x01 (true), close, close.
        assert!(dbx.windows(4).any(|w| w == [0x61, 0x03, 0x04, 0x01]));
    }

    #[test]
    fn numeric_vector_with_zero_marker_roundtrip() {
        let xml = b"<?xml version=\"1.0\"?>\r\n<V name=\"OffsetXYZ\">1.0/2.0/3.0/*zero*</V>\r\n";
        let dbx = encode_dbx(xml).unwrap().unwrap();
        let back = crate::decode::decode_dbx(&dbx).unwrap().unwrap();
        assert_eq!(back, xml);
    }

    #[test]
    fn empty_emptynums_field_is_zero_length_vector() {
        let xml = b"<?xml version=\"1.0\"?>\r\n<V name=\"LeftCurve\"></V>\r\n";
        let dbx = encode_dbx(xml).unwrap().unwrap();
        assert!(dbx.windows(2).any(|w| w == [0x00, 0x04]));
        let back = crate::decode::decode_dbx(&dbx).unwrap().unwrap();
        assert_eq!(back, xml);
    }

    #[test]
    fn invalid_hash_falls_back_to_string_for_id() {
        let xml = b"<?xml version=\"1.0\"?>\r\n<V name=\"Id\">not-a-number</V>\r\n";
        let dbx = encode_dbx(xml).unwrap().unwrap();
        let back = crate::decode::decode_dbx(&dbx).unwrap().unwrap();
        assert_eq!(back, xml);
    }

    #[test]
    fn invalid_hash_for_other_field_aborts() {
        let xml = b"<?xml version=\"1.0\"?>\r\n<V name=\"Hash\">not-a-number</V>\r\n";
        assert!(matches!(encode_dbx(xml), Err(Error::NumericParse { .. })));
    }

    #[test]
    fn channel_count_byte_roundtrip() {
        let xml = b"<?xml version=\"1.0\"?>\r\n<Item name=\"ChannelCount\">4</Item>\r\n";
        let dbx = encode_dbx(xml).unwrap().unwrap();
        let back = crate::decode::decode_dbx(&dbx).unwrap().unwrap();
        assert_eq!(back, xml);
    }
}
