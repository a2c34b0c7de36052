//! Splits a file into fragment records (spec.md §4.5).

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use splinter_core::{ascii85, hex, kdf, Error, HashAlgorithm, Rc4, Result};

use crate::fragment::{FragmentHeader, MAGIC};

const IV_LEN: usize = 16;

/// Parameters for [`split_file`]. Defaults match spec.md §6's Configuration
/// table.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Maximum fragment size in bytes.
    pub max_size: u64,
    /// Width of the fragment size distribution `[max_size - size_range, max_size]`.
    pub size_range: u64,
    /// Pass-phrase enabling RC4 encryption; `None` disables encryption.
    pub password: Option<String>,
    /// Digest algorithm used for `file_hash` and `fragment_hash`.
    pub hash_func: HashAlgorithm,
    /// Emit `tracing::debug!` progress messages while splitting.
    pub verbose: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        SplitOptions {
            max_size: 22_000_000,
            size_range: 4_000_000,
            password: None,
            hash_func: HashAlgorithm::Sha1,
            verbose: false,
        }
    }
}

/// Split `input` into fragment files under `output_dir`, using `rng` to
/// randomize fragment sizes and their assignment order. Returns the fragment
/// paths in the order they were written.
pub fn split_file(
    input: &Path,
    output_dir: &Path,
    opts: &SplitOptions,
    rng: &mut impl RngCore,
) -> Result<Vec<PathBuf>> {
    if opts.size_range >= opts.max_size {
        return Err(Error::InvalidInput(format!(
            "size_range ({}) must be less than max_size ({})",
            opts.size_range, opts.max_size
        )));
    }
    if let Some(password) = &opts.password {
        if password.is_empty() {
            return Err(Error::InvalidInput("password must not be empty when supplied".into()));
        }
    }
    if !input.exists() {
        return Err(Error::InvalidInput(format!("input file does not exist: {}", input.display())));
    }

    let file_size = fs::metadata(input)?.len();
    let sizes = fragment_sizes(file_size, opts.max_size, opts.size_range, rng);

    let file_hash = opts.hash_func.hash_file(input)?;
    fs::create_dir_all(output_dir)?;

    let original_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut source = File::open(input)?;
    let mut written = Vec::with_capacity(sizes.len());
    let mut offset: u64 = 0;

    for size in sizes {
        let mut plaintext = vec![0u8; size as usize];
        source.read_exact(&mut plaintext)?;

        let fragment_hash = opts.hash_func.hash_bytes(&plaintext);

        let mut iv = vec![0u8; IV_LEN];
        rng.fill_bytes(&mut iv);
        let mut salt = vec![0u8; kdf::SALT_LEN];
        rng.fill_bytes(&mut salt);

        let mut ciphertext = plaintext;
        if let Some(password) = &opts.password {
            let key = kdf::derive_key(password, &salt, kdf::KEY_LEN);
            Rc4::apply_keystream_static(&key, &iv, &mut ciphertext);
        }
        let payload = ascii85::encode(&ciphertext);

        let header = FragmentHeader {
            file_name: FragmentHeader::encode_file_name(&original_name),
            file_hash: file_hash.clone(),
            file_size,
            fragment_start: offset,
            fragment_hash: fragment_hash.clone(),
            fragment_size: size,
            initialization_vector: hex::encode(&iv),
            password_salt: hex::encode(&salt),
        };

        let final_path = output_dir.join(format!("{fragment_hash}.txt"));
        let tmp_path = output_dir.join(format!("{fragment_hash}.txt.tempfile"));
        if let Err(e) = write_fragment_tmp(&tmp_path, &header, &payload).and_then(|()| {
            fs::rename(&tmp_path, &final_path)?;
            Ok(())
        }) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        if opts.verbose {
            tracing::debug!(fragment = %final_path.display(), start = offset, size, "wrote fragment");
        }

        written.push(final_path);
        offset += size;
    }

    Ok(written)
}

fn write_fragment_tmp(tmp_path: &Path, header: &FragmentHeader, payload: &str) -> Result<()> {
    let mut tmp = File::create(tmp_path)?;
    writeln!(tmp, "{MAGIC}")?;
    writeln!(
        tmp,
        "{}",
        serde_json::to_string(header)
            .map_err(|e| Error::Malformed(format!("failed to serialize fragment header: {e}")))?
    )?;
    writeln!(tmp, "{payload}")?;
    tmp.sync_all()?;
    Ok(())
}

/// [`split_file`] with `rand::thread_rng()`.
pub fn split_file_default(input: &Path, output_dir: &Path, opts: &SplitOptions) -> Result<Vec<PathBuf>> {
    split_file(input, output_dir, opts, &mut rand::thread_rng())
}

/// Build the shuffled list of fragment sizes summing to `file_size`
/// (spec.md §4.5 step 1). An empty input produces one zero-length entry.
fn fragment_sizes(file_size: u64, max_size: u64, size_range: u64, rng: &mut impl RngCore) -> Vec<u64> {
    if file_size == 0 {
        return vec![0];
    }

    let mut sizes = Vec::new();
    let mut remaining = file_size;
    let low = max_size - size_range;
    while remaining > max_size {
        let sample = rng.gen_range(low..=max_size);
        sizes.push(sample);
        remaining -= sample;
    }
    sizes.push(remaining);
    sizes.shuffle(rng);
    sizes
}
