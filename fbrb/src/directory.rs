//! The FBRB directory blob: string table + entry array (spec §3.3, §6.3).

use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

use crate::error::{Error, Result};

pub const ENTRY_SIZE: usize = 24;

/// One directory entry, mid-level between the raw 24-byte record and a
/// fully resolved (path, bytes) pair.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub path_offset: u32,
    pub delete_flag: [u8; 4],
    pub payload_offset: u32,
    pub payload_len: u32,
    pub ext_offset: u32,
}

pub fn delete_flag_for_len(len: u32) -> [u8; 4] {
    if len == 0 {
        [0, 0, 0, 0]
    } else {
        [0, 1, 0, 0]
    }
}

/// Parse the gunzipped directory blob (spec §6.3 `dir_blob`).
pub fn parse_dir_blob(blob: &[u8]) -> Result<(Vec<u8>, Vec<RawEntry>, u8, u32)> {
    let mut cur = Cursor::new(blob);
    let _version = cur
        .read_u32::<BigEndian>()
        .map_err(|_| truncated(4, blob.len()))?;
    let strlen = cur
        .read_u32::<BigEndian>()
        .map_err(|_| truncated(8, blob.len()))? as usize;

    let string_table_start = 8usize;
    let string_table_end = string_table_start
        .checked_add(strlen)
        .ok_or(Error::StringOffsetOutOfRange(strlen as u32))?;
    if blob.len() < string_table_end {
        return Err(truncated(string_table_end, blob.len()));
    }
    // Keep the raw bytes uninterpreted: `string_at` slices by offset before
    // lossy-decoding, so a non-UTF-8 byte earlier in the table can't shift
    // the byte offsets of strings that come after it.
    let string_table = blob[string_table_start..string_table_end].to_vec();

    let mut cur = Cursor::new(&blob[string_table_end..]);
    let num_entries = cur
        .read_u32::<BigEndian>()
        .map_err(|_| truncated(string_table_end + 4, blob.len()))?;

    let entries_start = string_table_end + 4;
    let mut entries = Vec::with_capacity(num_entries as usize);
    for i in 0..num_entries {
        let base = entries_start + i as usize * ENTRY_SIZE;
        if blob.len() < base + ENTRY_SIZE {
            return Err(truncated(base + ENTRY_SIZE, blob.len()));
        }
        let mut c = Cursor::new(&blob[base..base + ENTRY_SIZE]);
        let path_offset = c.read_u32::<BigEndian>().unwrap();
        let mut delete_flag = [0u8; 4];
        c.read_exact(&mut delete_flag).unwrap();
        let payload_offset = c.read_u32::<BigEndian>().unwrap();
        let payload_len_a = c.read_u32::<BigEndian>().unwrap();
        let payload_len_b = c.read_u32::<BigEndian>().unwrap();
        if payload_len_a != payload_len_b {
            return Err(Error::MismatchedLength {
                index: i as usize,
                a: payload_len_a,
                b: payload_len_b,
            });
        }
        let ext_offset = c.read_u32::<BigEndian>().unwrap();
        entries.push(RawEntry {
            path_offset,
            delete_flag,
            payload_offset,
            payload_len: payload_len_a,
            ext_offset,
        });
    }

    let trailer_start = entries_start + num_entries as usize * ENTRY_SIZE;
    if blob.len() < trailer_start + 5 {
        return Err(truncated(trailer_start + 5, blob.len()));
    }
    let zipped_flag = blob[trailer_start];
    let total_payload_len = BigEndian::read_u32(&blob[trailer_start + 1..trailer_start + 5]);

    Ok((string_table, entries, zipped_flag, total_payload_len))
}

/// Read a null-terminated string out of the raw string table at byte
/// offset `offset`. Slices the raw bytes first and only lossy-decodes the
/// located slice, so a non-UTF-8 byte in an earlier string can't shift the
/// offsets of strings that come after it (cf. `dbx::decode`'s string pool).
pub fn string_at(string_table: &[u8], offset: u32) -> Result<String> {
    let start = offset as usize;
    if start >= string_table.len() {
        return Err(Error::StringOffsetOutOfRange(offset));
    }
    let end = string_table[start..]
        .iter()
        .position(|&b| b == 0)
        .map(|i| start + i)
        .unwrap_or(string_table.len());
    Ok(String::from_utf8_lossy(&string_table[start..end]).into_owned())
}

/// Build the gunzipped directory blob from scratch (spec §4.6 step 3).
pub fn build_dir_blob(
    string_table: &[u8],
    entries: &[RawEntry],
    zipped_flag: u8,
    total_payload_len: u32,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u32::<BigEndian>(0x0000_0002).unwrap();
    out.write_u32::<BigEndian>(string_table.len() as u32).unwrap();
    out.extend_from_slice(string_table);
    out.write_u32::<BigEndian>(entries.len() as u32).unwrap();
    for e in entries {
        out.write_u32::<BigEndian>(e.path_offset).unwrap();
        out.extend_from_slice(&e.delete_flag);
        out.write_u32::<BigEndian>(e.payload_offset).unwrap();
        out.write_u32::<BigEndian>(e.payload_len).unwrap();
        out.write_u32::<BigEndian>(e.payload_len).unwrap();
        out.write_u32::<BigEndian>(e.ext_offset).unwrap();
    }
    out.push(zipped_flag);
    out.write_u32::<BigEndian>(total_payload_len).unwrap();
    out
}

fn truncated(expected: usize, actual: usize) -> Error {
    Error::Truncated { expected, actual }
}
