//! FBRB archive -> list of (path, bytes) (spec §4.5, §6.3).

use std::io::Read;

use flate2::read::GzDecoder;

use crate::directory::{self, parse_dir_blob};
use crate::error::{Error, Result};
use crate::resource_type;

const MAGIC: &[u8; 4] = b"FbRB";

/// One file recovered from an archive, with its final on-disk path (the
/// resource-type -> extension mapping already applied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedFile {
    pub path: String,
    pub data: Vec<u8>,
}

/// Unpack an FBRB archive into its entries. An input that doesn't start
/// with the `FbRB` magic yields `Ok(vec![])` — not an error (spec §7).
pub fn unpack_fbrb(input: &[u8]) -> Result<Vec<UnpackedFile>> {
    if input.len() < 4 || &input[0..4] != MAGIC {
        return Ok(Vec::new());
    }
    if input.len() < 8 {
        return Err(Error::Truncated {
            expected: 8,
            actual: input.len(),
        });
    }
    let dir_len = u32::from_be_bytes(input[4..8].try_into().unwrap()) as usize;
    let dir_end = 8usize
        .checked_add(dir_len)
        .ok_or(Error::Truncated { expected: dir_len, actual: input.len() })?;
    if input.len() < dir_end {
        return Err(Error::Truncated {
            expected: dir_end,
            actual: input.len(),
        });
    }

    let mut dir_blob = Vec::new();
    GzDecoder::new(&input[8..dir_end])
        .read_to_end(&mut dir_blob)
        .map_err(Error::Io)?;
    let (string_table, entries, zipped_flag, total_payload_len) = parse_dir_blob(&dir_blob)?;

    let payload_raw = &input[dir_end..];
    let payload: Vec<u8> = if zipped_flag == 1 {
        let mut buf = Vec::with_capacity(total_payload_len as usize);
        GzDecoder::new(payload_raw).read_to_end(&mut buf).map_err(Error::Io)?;
        buf
    } else {
        payload_raw.to_vec()
    };

    let mut out = Vec::with_capacity(entries.len());
    for entry in &entries {
        let stored_path = directory::string_at(&string_table, entry.path_offset)?;
        let ext_name = directory::string_at(&string_table, entry.ext_offset)?;

        let start = entry.payload_offset as usize;
        let end = start
            .checked_add(entry.payload_len as usize)
            .ok_or(Error::PayloadOutOfBounds {
                offset: entry.payload_offset,
                len: entry.payload_len,
                total: payload.len(),
            })?;
        if end > payload.len() {
            return Err(Error::PayloadOutOfBounds {
                offset: entry.payload_offset,
                len: entry.payload_len,
                total: payload.len(),
            });
        }
        let data = payload[start..end].to_vec();

        let final_path = final_path_for(&stored_path, &ext_name);
        if is_unsafe_path(&final_path) {
            return Err(Error::UnsafePath(final_path));
        }
        out.push(UnpackedFile { path: final_path, data });
    }

    Ok(out)
}

fn final_path_for(stored_path: &str, ext_name: &str) -> String {
    let new_ext = resource_type::extension_for_type(ext_name, stored_path);
    let stem = match stored_path.rfind('.') {
        Some(i) if !stored_path[i + 1..].contains('/') => &stored_path[..i],
        _ => stored_path,
    };
    if new_ext.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{new_ext}")
    }
}

fn is_unsafe_path(path: &str) -> bool {
    path.starts_with('/') || path.split('/').any(|seg| seg == "..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{build_dir_blob, delete_flag_for_len, RawEntry};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8], level: u32) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::new(level));
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn build_archive(path: &str, ext: &str, content: &[u8], zipped: bool) -> Vec<u8> {
        let mut string_table = Vec::new();
        string_table.extend_from_slice(path.as_bytes());
        string_table.push(0);
        let ext_offset = string_table.len() as u32;
        string_table.extend_from_slice(ext.as_bytes());
        string_table.push(0);

        let entry = RawEntry {
            path_offset: 0,
            delete_flag: delete_flag_for_len(content.len() as u32),
            payload_offset: 0,
            payload_len: content.len() as u32,
            ext_offset,
        };
        let zipped_flag = if zipped { 1 } else { 0 };
        let dir_blob = build_dir_blob(&string_table, &[entry], zipped_flag, content.len() as u32);
        let dir_gz = gzip(&dir_blob, 1);

        let payload = if zipped { gzip(content, 1) } else { content.to_vec() };

        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&(dir_gz.len() as u32).to_be_bytes());
        out.extend_from_slice(&dir_gz);
        out.extend_from_slice(&payload);
        out
    }

    #[test]
    fn non_magic_returns_empty() {
        assert_eq!(unpack_fbrb(b"not fbrb").unwrap(), Vec::new());
    }

    #[test]
    fn unpacks_one_raw_entry() {
        let archive = build_archive("level/map.res", "<non-resource>", b"AB", false);
        let files = unpack_fbrb(&archive).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "level/map.nonres");
        assert_eq!(files[0].data, b"AB");
    }

    #[test]
    fn unpacks_one_zipped_entry() {
        let archive = build_archive("sound/foo.wave", "Wave", b"hello world", true);
        let files = unpack_fbrb(&archive).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "sound/foo.wave");
        assert_eq!(files[0].data, b"hello world");
    }

    #[test]
    fn deleted_dbx_roundtrips_extension() {
        let archive = build_archive("level/map.dbx", "*deleted*", b"", false);
        let files = unpack_fbrb(&archive).unwrap();
        assert_eq!(files[0].path, "level/map.dbxdeleted");
    }

    #[test]
    fn unsafe_path_is_rejected() {
        let archive = build_archive("../escape.res", "<non-resource>", b"x", false);
        assert!(matches!(unpack_fbrb(&archive), Err(Error::UnsafePath(_))));
    }
}
