//! Content hashing (spec §4.1): a closed set of digest algorithms, all
//! producing uppercase hex, with a bounded-memory file reader.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use digest::Digest as _;

use crate::error::{Error, Result};

const BLOCK_SIZE: usize = 64 * 1024;

/// Digest algorithm selectable for `file_hash`/`fragment_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// MD5 (legacy interop only).
    Md5,
    /// SHA-1 — the on-disk default (spec.md §4.1).
    Sha1,
    /// SHA-224.
    Sha224,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha1
    }
}

impl HashAlgorithm {
    /// Parse a case-insensitive algorithm name (`"sha1"`, `"SHA-256"`, ...).
    pub fn parse(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "").replace('_', "");
        match normalized.as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha224" => Ok(HashAlgorithm::Sha224),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(Error::InvalidInput(format!("unknown hash function: {other}"))),
        }
    }

    /// Hash an in-memory byte slice, returning uppercase hex.
    pub fn hash_bytes(self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Md5 => hex::encode_upper(md5::Md5::digest(data)),
            HashAlgorithm::Sha1 => hex::encode_upper(sha1::Sha1::digest(data)),
            HashAlgorithm::Sha224 => hex::encode_upper(sha2::Sha224::digest(data)),
            HashAlgorithm::Sha256 => hex::encode_upper(sha2::Sha256::digest(data)),
            HashAlgorithm::Sha384 => hex::encode_upper(sha2::Sha384::digest(data)),
            HashAlgorithm::Sha512 => hex::encode_upper(sha2::Sha512::digest(data)),
        }
    }

    /// Hash a file's contents, streaming in fixed-size blocks to bound memory.
    pub fn hash_file(self, path: &Path) -> Result<String> {
        let mut file = File::open(path)?;
        let mut buf = vec![0u8; BLOCK_SIZE];
        macro_rules! stream {
            ($hasher:expr) => {{
                let mut hasher = $hasher;
                loop {
                    let n = read_block(&mut file, &mut buf)?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
                hex::encode_upper(hasher.finalize())
            }};
        }
        let hex = match self {
            HashAlgorithm::Md5 => stream!(md5::Md5::new()),
            HashAlgorithm::Sha1 => stream!(sha1::Sha1::new()),
            HashAlgorithm::Sha224 => stream!(sha2::Sha224::new()),
            HashAlgorithm::Sha256 => stream!(sha2::Sha256::new()),
            HashAlgorithm::Sha384 => stream!(sha2::Sha384::new()),
            HashAlgorithm::Sha512 => stream!(sha2::Sha512::new()),
        };
        Ok(hex)
    }
}

fn read_block(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = file.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sha1_matches_known_vector() {
        let digest = HashAlgorithm::Sha1.hash_bytes(b"abc");
        assert_eq!(digest, "A9993E364706816ABA3E25717850C26C9CD0D89");
    }

    #[test]
    fn parse_is_case_and_dash_insensitive() {
        assert_eq!(HashAlgorithm::parse("SHA-256").unwrap(), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::parse("sha256").unwrap(), HashAlgorithm::Sha256);
        assert!(HashAlgorithm::parse("crc32").is_err());
    }

    #[test]
    fn hash_file_matches_hash_bytes() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"hello world").unwrap();
        tmp.flush().unwrap();
        let from_file = HashAlgorithm::Sha256.hash_file(tmp.path()).unwrap();
        let from_bytes = HashAlgorithm::Sha256.hash_bytes(b"hello world");
        assert_eq!(from_file, from_bytes);
    }
}
