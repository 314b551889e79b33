//! Umbrella crate over the [`dbx`] and [`fbrb`] codecs: the four
//! driver-level operations of spec §6.4 behind one `Error`/`Result` type,
//! the same way `dpp` composed the teacher workspace's format crates.

pub mod error;

pub use error::{Error, Result};

pub use dbx;
pub use fbrb;

/// Decode a DBX binary blob to its XML text form. `None` when `input`
/// doesn't start with the DBX magic.
pub fn decode_dbx(input: &[u8]) -> Result<Option<Vec<u8>>> {
    Ok(dbx::decode_dbx(input)?)
}

/// Encode an XML text blob (as produced by [`decode_dbx`]) back to DBX.
/// `None` when `input` doesn't start with the expected XML declaration.
pub fn encode_dbx(input: &[u8]) -> Result<Option<Vec<u8>>> {
    Ok(dbx::encode_dbx(input)?)
}

/// Unpack an FBRB archive into its entries. Empty when `input` doesn't
/// start with the `FbRB` magic.
pub fn unpack_fbrb(input: &[u8]) -> Result<Vec<fbrb::UnpackedFile>> {
    Ok(fbrb::unpack_fbrb(input)?)
}

/// Pack a list of files into an FBRB archive.
pub fn pack_fbrb(inputs: &[fbrb::PackInput], options: fbrb::PackOptions) -> Result<Vec<u8>> {
    Ok(fbrb::pack_fbrb(inputs, options)?)
}
