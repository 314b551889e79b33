//! Binary tagged-tree property format (DBX) <-> XML codec.
//!
//! DBX encodes a tree of tagged elements with an interned string pool
//! (see [`numeric`] for the ambiguous int/float vector payloads). This
//! crate provides the two directions of the codec as pure byte-blob
//! transforms: [`decode::decode_dbx`] and [`encode::encode_dbx`].

pub mod decode;
pub mod encode;
pub mod error;
pub mod float_fmt;
pub mod leb128;
pub mod numeric;

pub use decode::decode_dbx;
pub use encode::encode_dbx;
pub use error::{Error, Result};
pub use numeric::VectorElement;
