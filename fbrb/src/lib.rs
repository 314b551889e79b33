//! FBRB resource archive codec: an indexed directory of entries with a
//! gzip-compressed directory section and an optionally gzip-compressed
//! payload stream (spec §3.3, §4.5, §4.6, §6.3).

pub mod directory;
pub mod error;
pub mod pack;
pub mod resource_type;
pub mod unpack;

pub use error::{Error, Result};
pub use pack::{pack_fbrb, PackInput, PackOptions};
pub use unpack::{unpack_fbrb, UnpackedFile};
