//! Pass-phrase key derivation (spec §4.3).
//!
//! Two variants are described in the distilled design; this crate locks in
//! the iterated SHA3-512 construction and tags it `ver3` in the fragment
//! magic string (see `splinter-store::fragment`). The scrypt+HMAC variant
//! is documented but not implemented — see DESIGN.md.

use sha3::{Digest, Sha3_512};

/// Size, in bytes, of the salt carried in every fragment header.
pub const SALT_LEN: usize = 256;

/// Size, in bytes, of the derived key (matches RC4's maximum key length).
pub const KEY_LEN: usize = 256;

/// Derive a `length`-byte key from `passphrase` and `salt` by hashing
/// successive `salt || ascii(counter) || passphrase` blocks with SHA3-512
/// and concatenating, then truncating to `length`.
pub fn derive_key(passphrase: &str, salt: &[u8], length: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(length + 64);
    let mut counter: usize = 0;
    while out.len() < length {
        let mut hasher = Sha3_512::new();
        hasher.update(salt);
        hasher.update(counter.to_string().as_bytes());
        hasher.update(passphrase.as_bytes());
        out.extend_from_slice(&hasher.finalize());
        counter += 64;
    }
    out.truncate(length);
    out
}
