//! Codec primitives for splinter: ASCII85 text encoding, an RC4 stream
//! cipher with IV-derived skip, pass-phrase key derivation, and content
//! hashing. `splinter-store` builds the fragment format on top of these.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod ascii85;
pub mod error;
pub mod hash;
pub mod hex;
pub mod kdf;
pub mod rc4;

pub use error::{Error, Result};
pub use hash::HashAlgorithm;
pub use rc4::Rc4;
