//! On-disk fragment format (spec.md §3, §4.4): a three-line ASCII file —
//! magic string, JSON header, ASCII85 payload.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use splinter_core::{ascii85, hex, kdf, Error, HashAlgorithm, Rc4, Result};

/// Line 1 of every fragment this crate emits or accepts. The trailing `ver3`
/// tags the key-derivation variant from `splinter_core::kdf`.
pub const MAGIC: &str = "text/fragment+a85+rc4+ver3";

const IV_LEN: usize = 16;
const REMOVE_RETRIES: u32 = 3;
const REMOVE_BACKOFF: Duration = Duration::from_secs(1);

/// The JSON object on line 2 of a fragment file (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FragmentHeader {
    /// ASCII85 encoding of the original file's basename, UTF-8 bytes.
    pub file_name: String,
    /// Uppercase hex hash of the entire original file.
    pub file_hash: String,
    /// Original file size in bytes.
    pub file_size: u64,
    /// Byte offset of this fragment within the original file.
    pub fragment_start: u64,
    /// Uppercase hex hash of the plaintext fragment bytes.
    pub fragment_hash: String,
    /// Fragment plaintext length in bytes.
    pub fragment_size: u64,
    /// Uppercase hex, 16-byte IV used for the RC4 keystream skip.
    pub initialization_vector: String,
    /// Uppercase hex, 256-byte salt fed to key derivation.
    pub password_salt: String,
}

impl FragmentHeader {
    /// ASCII85-encode `name` for storage in `file_name`.
    pub fn encode_file_name(name: &str) -> String {
        ascii85::encode(name.as_bytes())
    }

    /// Decode a stored `file_name` back to the original basename.
    pub fn decode_file_name(&self) -> Result<String> {
        let bytes = ascii85::decode(&self.file_name, false)?;
        String::from_utf8(bytes).map_err(|e| Error::Malformed(format!("file_name is not valid UTF-8: {e}")))
    }
}

/// A parsed fragment: header plus the on-disk location of its payload line.
///
/// Lines 1 and 2 are parsed eagerly by [`FragmentRecord::open`]; line 3 is
/// not read until [`FragmentRecord::read`] is called.
#[derive(Debug, Clone)]
pub struct FragmentRecord {
    path: PathBuf,
    header: FragmentHeader,
    payload_offset: u64,
    iv: Vec<u8>,
    salt: Vec<u8>,
}

impl FragmentRecord {
    /// Parse `path` as a fragment, raising [`Error::Malformed`] if line 1
    /// does not match [`MAGIC`] or line 2 fails to parse.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut line1 = String::new();
        reader.read_line(&mut line1)?;
        if line1.trim_end_matches('\n') != MAGIC {
            return Err(Error::Malformed(format!("{}: wrong magic line", path.display())));
        }

        let mut line2 = String::new();
        reader.read_line(&mut line2)?;
        let header: FragmentHeader = serde_json::from_str(line2.trim_end_matches('\n'))
            .map_err(|e| Error::Malformed(format!("{}: {e}", path.display())))?;

        let iv = hex::decode("initialization_vector", &header.initialization_vector)
            .map_err(|_| Error::Malformed(format!("{}: bad initialization_vector", path.display())))?;
        if iv.len() != IV_LEN {
            return Err(Error::Malformed(format!(
                "{}: initialization_vector must be {IV_LEN} bytes, got {}",
                path.display(),
                iv.len()
            )));
        }
        let salt = hex::decode("password_salt", &header.password_salt)
            .map_err(|_| Error::Malformed(format!("{}: bad password_salt", path.display())))?;
        if salt.len() != kdf::SALT_LEN {
            return Err(Error::Malformed(format!(
                "{}: password_salt must be {} bytes, got {}",
                path.display(),
                kdf::SALT_LEN,
                salt.len()
            )));
        }

        let payload_offset = (line1.len() + line2.len()) as u64;

        Ok(FragmentRecord { path: path.to_path_buf(), header, payload_offset, iv, salt })
    }

    /// Like [`FragmentRecord::open`], but returns `Ok(None)` instead of an
    /// error when the file is not a fragment at all (wrong magic or
    /// malformed header) — used by the directory scan, which must ignore
    /// foreign files rather than abort (spec.md §4.4, §4.6).
    pub fn try_open(path: &Path) -> Result<Option<Self>> {
        match FragmentRecord::open(path) {
            Ok(record) => Ok(Some(record)),
            Err(Error::Malformed(_)) => Ok(None),
            Err(other) => Err(other),
        }
    }

    /// The fragment's parsed header.
    pub fn header(&self) -> &FragmentHeader {
        &self.header
    }

    /// The path this fragment was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode, optionally decrypt, and verify the payload, returning its
    /// first `len` bytes. `len` must not exceed `fragment_size`.
    pub fn read(&self, password: Option<&str>, hash_func: HashAlgorithm, len: usize) -> Result<Vec<u8>> {
        if len as u64 > self.header.fragment_size {
            return Err(Error::InvalidInput(format!(
                "requested {len} bytes but fragment only has {}",
                self.header.fragment_size
            )));
        }

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.payload_offset))?;
        let mut reader = BufReader::new(file);
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let trimmed = line.trim_end();

        let mut plaintext = ascii85::decode(trimmed, false)?;

        if let Some(password) = password {
            let key = kdf::derive_key(password, &self.salt, kdf::KEY_LEN);
            Rc4::apply_keystream_static(&key, &self.iv, &mut plaintext);
        }

        if plaintext.len() as u64 != self.header.fragment_size {
            return Err(Error::Corrupt(format!(
                "{}: decoded {} bytes, header declares fragment_size {}",
                self.path.display(),
                plaintext.len(),
                self.header.fragment_size
            )));
        }
        let actual_hash = hash_func.hash_bytes(&plaintext);
        if actual_hash != self.header.fragment_hash {
            return Err(Error::Corrupt(format!(
                "{}: fragment_hash mismatch (expected {}, computed {actual_hash})",
                self.path.display(),
                self.header.fragment_hash
            )));
        }

        plaintext.truncate(len);
        Ok(plaintext)
    }

    /// Best-effort unlink: up to three retries with a one-second backoff.
    /// A file that has already vanished is treated as success; a
    /// persistent permission failure is logged and swallowed (spec.md
    /// §4.4, §7).
    pub fn remove(&self) -> Result<()> {
        let mut attempt = 0;
        loop {
            match fs::remove_file(&self.path) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(e) => {
                    attempt += 1;
                    if attempt >= REMOVE_RETRIES {
                        tracing::warn!(path = %self.path.display(), error = %e, "giving up removing fragment after {REMOVE_RETRIES} attempts");
                        return Ok(());
                    }
                    thread::sleep(REMOVE_BACKOFF);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fragment(
        dir: &Path,
        name: &str,
        header: &FragmentHeader,
        payload: &str,
    ) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        writeln!(f, "{MAGIC}").unwrap();
        writeln!(f, "{}", serde_json::to_string(header).unwrap()).unwrap();
        writeln!(f, "{payload}").unwrap();
        path
    }

    fn sample_header(plaintext: &[u8]) -> FragmentHeader {
        FragmentHeader {
            file_name: FragmentHeader::encode_file_name("example.bin"),
            file_hash: HashAlgorithm::Sha1.hash_bytes(b"whole file contents"),
            file_size: 100,
            fragment_start: 0,
            fragment_hash: HashAlgorithm::Sha1.hash_bytes(plaintext),
            fragment_size: plaintext.len() as u64,
            initialization_vector: hex::encode([0u8; IV_LEN]),
            password_salt: hex::encode(vec![0u8; kdf::SALT_LEN]),
        }
    }

    #[test]
    fn open_reads_header_and_read_returns_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let plaintext = b"hello fragment";
        let header = sample_header(plaintext);
        let payload = ascii85::encode(plaintext);
        let path = write_fragment(dir.path(), "frag.txt", &header, &payload);

        let record = FragmentRecord::open(&path).unwrap();
        let got = record.read(None, HashAlgorithm::Sha1, plaintext.len()).unwrap();
        assert_eq!(got, plaintext);
        assert_eq!(record.header().decode_file_name().unwrap(), "example.bin");
    }

    #[test]
    fn try_open_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_fragment.txt");
        fs::write(&path, "just some text\nmore text\n").unwrap();
        assert!(FragmentRecord::try_open(&path).unwrap().is_none());
    }

    #[test]
    fn open_rejects_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_fragment.txt");
        fs::write(&path, "just some text\nmore text\n").unwrap();
        assert!(matches!(FragmentRecord::open(&path), Err(Error::Malformed(_))));
    }

    #[test]
    fn wrong_password_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let plaintext = b"encrypted payload";
        let salt = vec![9u8; kdf::SALT_LEN];
        let iv = vec![1u8; IV_LEN];
        let key = kdf::derive_key("correct horse battery staple", &salt, kdf::KEY_LEN);
        let mut ciphertext = plaintext.to_vec();
        Rc4::apply_keystream_static(&key, &iv, &mut ciphertext);

        let mut header = sample_header(plaintext);
        header.initialization_vector = hex::encode(&iv);
        header.password_salt = hex::encode(&salt);
        let payload = ascii85::encode(&ciphertext);
        let path = write_fragment(dir.path(), "frag.txt", &header, &payload);

        let record = FragmentRecord::open(&path).unwrap();
        let good = record.read(Some("correct horse battery staple"), HashAlgorithm::Sha1, plaintext.len());
        assert_eq!(good.unwrap(), plaintext);
        let bad = record.read(Some("wrong password"), HashAlgorithm::Sha1, plaintext.len());
        assert!(matches!(bad, Err(Error::Corrupt(_))));
    }

    #[test]
    fn remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let plaintext = b"x";
        let header = sample_header(plaintext);
        let payload = ascii85::encode(plaintext);
        let path = write_fragment(dir.path(), "frag.txt", &header, &payload);
        let record = FragmentRecord::open(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(record.remove().is_ok());
    }
}
