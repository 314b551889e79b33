//! List of (path, ext, bytes) -> FBRB archive (spec §4.6, §6.3).

use std::collections::HashMap;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::directory::{build_dir_blob, delete_flag_for_len, RawEntry};
use crate::error::Result;
use crate::resource_type;

/// One file to pack, mirroring the reference tool's walk over a
/// `*.fbrb`-source folder: a virtual forward-slash path (including the
/// file's own extension), the lowercase extension used to look up its
/// resource-type name, and its content.
pub struct PackInput<'a> {
    pub path: &'a str,
    pub extension: &'a str,
    pub content: &'a [u8],
}

/// Packer options. `compression_level` drives both the payload gzip
/// stream and the `zipped_flag`; `0` means the payload is stored raw
/// (spec §13's pinned reference-tool default is `1`).
#[derive(Debug, Clone, Copy)]
pub struct PackOptions {
    pub compression_level: u32,
}

impl Default for PackOptions {
    fn default() -> Self {
        PackOptions { compression_level: 1 }
    }
}

/// Pack a list of files into an FBRB archive. Files whose extension is
/// not in the closed extension table (spec §3.4) are silently skipped
/// (spec §7).
pub fn pack_fbrb(inputs: &[PackInput], options: PackOptions) -> Result<Vec<u8>> {
    let mut string_table = Vec::new();
    let mut ext_dedup: HashMap<&str, u32> = HashMap::new();
    let mut entries = Vec::new();
    let mut raw_payload = Vec::new();
    let mut payload_offset = 0u32;

    for input in inputs {
        let Some(type_name) = resource_type::type_for_extension(input.extension) else {
            log::debug!("skipping {:?}: unknown extension {:?}", input.path, input.extension);
            continue;
        };

        let stored_path = stored_path_for(input.path, input.extension);

        let path_offset = string_table.len() as u32;
        string_table.extend_from_slice(stored_path.as_bytes());
        string_table.push(0);

        let ext_offset = *ext_dedup.entry(type_name).or_insert_with(|| {
            let offset = string_table.len() as u32;
            string_table.extend_from_slice(type_name.as_bytes());
            string_table.push(0);
            offset
        });

        let len = input.content.len() as u32;
        entries.push(RawEntry {
            path_offset,
            delete_flag: delete_flag_for_len(len),
            payload_offset,
            payload_len: len,
            ext_offset,
        });

        raw_payload.extend_from_slice(input.content);
        payload_offset += len;
    }

    let zipped_flag = if options.compression_level > 0 { 1 } else { 0 };
    let payload_bytes = if options.compression_level > 0 {
        gzip(&raw_payload, options.compression_level)?
    } else {
        raw_payload
    };

    let dir_blob = build_dir_blob(&string_table, &entries, zipped_flag, payload_offset);
    let dir_bytes = gzip(&dir_blob, 1)?;

    let mut out = Vec::new();
    out.extend_from_slice(b"FbRB");
    out.extend_from_slice(&(dir_bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(&dir_bytes);
    out.extend_from_slice(&payload_bytes);
    Ok(out)
}

fn gzip(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::new(level));
    enc.write_all(data).map_err(crate::error::Error::Io)?;
    enc.finish().map_err(crate::error::Error::Io)
}

/// Compute the stored (virtual) path for one input file, per spec §4.6
/// step 2's three cases: a `dbxdeleted` marker strips only the trailing
/// `deleted` suffix (restoring the original `.dbx` extension); `dbx`,
/// `bin`, and `dbmanifest` keep their own extension; everything else is
/// renamed to `.res`.
fn stored_path_for(path: &str, extension_lower: &str) -> String {
    if extension_lower.eq_ignore_ascii_case("dbxdeleted") {
        let cut = path.len().saturating_sub("deleted".len());
        return path[..cut].to_string();
    }
    if matches!(extension_lower, "dbx" | "bin" | "dbmanifest") {
        return path.to_string();
    }
    let stem = match path.rfind('.') {
        Some(i) if !path[i + 1..].contains('/') => &path[..i],
        _ => path,
    };
    format!("{stem}.res")
}
