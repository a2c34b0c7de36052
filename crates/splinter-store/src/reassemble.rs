//! Writes a restored file from a planned fragment group (spec.md §4.6
//! Writing).

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use splinter_core::{Error, HashAlgorithm, Result};

use crate::group::FragmentGroup;

/// Parameters for [`FragmentGroup::reassemble`]. Defaults match spec.md
/// §6's Configuration table.
#[derive(Debug, Clone)]
pub struct JoinOptions {
    /// Pass-phrase used to decrypt fragments; `None` expects plaintext fragments.
    pub password: Option<String>,
    /// Unlink every fragment referenced by a group after a successful reassembly.
    pub remove_originals: bool,
    /// Overwrite an existing output file that does not already match `file_hash`.
    pub overwrite: bool,
    /// Digest algorithm used to verify fragment and whole-file hashes.
    pub hash_func: HashAlgorithm,
    /// Emit `tracing::debug!` progress messages while reassembling.
    pub verbose: bool,
}

impl Default for JoinOptions {
    fn default() -> Self {
        JoinOptions {
            password: None,
            remove_originals: true,
            overwrite: false,
            hash_func: HashAlgorithm::Sha1,
            verbose: false,
        }
    }
}

impl FragmentGroup {
    /// Reassemble this group's fragments into `output_dir/file_name`,
    /// verifying the whole-file hash before the final atomic rename.
    /// Returns `Ok(None)` when the output already exists and does not match
    /// (and `overwrite=false`), a skip-with-warning rather than an error
    /// (spec.md §4.6 Writing step 2, §7 `AlreadyExists`).
    pub fn reassemble(&self, output_dir: &Path, opts: &JoinOptions) -> Result<Option<PathBuf>> {
        let file_name = self
            .file_name()
            .ok_or_else(|| Error::InvalidInput("cannot reassemble an empty group".into()))?;
        let file_hash = self.file_hash().unwrap();
        let file_size = self.file_size().unwrap();

        let out_path = output_dir.join(file_name);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if out_path.exists() {
            let existing_hash = opts.hash_func.hash_file(&out_path)?;
            if existing_hash == file_hash {
                if opts.remove_originals {
                    self.remove_all();
                }
                return Ok(Some(out_path));
            }
            if !opts.overwrite {
                tracing::warn!(path = %out_path.display(), "output exists and does not match file_hash; skipping");
                return Ok(None);
            }
        }

        let plan = self.plan()?;
        let fragments = self.fragments();

        let partial_path = out_path.with_extension("partial");
        let result = write_partial(&partial_path, &plan, &fragments, opts, file_size, file_hash);

        match result {
            Ok(()) => {
                fs::rename(&partial_path, &out_path)?;
                if opts.verbose {
                    tracing::debug!(path = %out_path.display(), "reassembled file");
                }
                if opts.remove_originals {
                    self.remove_all();
                }
                Ok(Some(out_path))
            }
            Err(e) => {
                let _ = fs::remove_file(&partial_path);
                Err(e)
            }
        }
    }

    fn remove_all(&self) {
        for record in self.fragments() {
            if let Err(e) = record.remove() {
                tracing::warn!(path = %record.path().display(), error = %e, "failed to remove fragment");
            }
        }
    }
}

fn write_partial(
    partial_path: &Path,
    plan: &[(u64, usize)],
    fragments: &[&crate::fragment::FragmentRecord],
    opts: &JoinOptions,
    file_size: u64,
    file_hash: &str,
) -> Result<()> {
    let mut out = File::create(partial_path)?;
    let mut offset: u64 = 0;
    let mut written: u64 = 0;

    for &(len, index) in plan {
        let record = fragments[index];
        if offset != record.header().fragment_start {
            return Err(Error::Corrupt(format!(
                "reassembly offset {offset} does not match fragment_start {}",
                record.header().fragment_start
            )));
        }
        let bytes = record.read(opts.password.as_deref(), opts.hash_func, len as usize)?;
        out.write_all(&bytes)?;
        offset += len;
        written += bytes.len() as u64;
    }

    out.flush()?;
    out.sync_all()?;
    drop(out);

    if written != file_size {
        return Err(Error::Corrupt(format!(
            "reassembled {written} bytes but file_size declares {file_size}"
        )));
    }
    let actual_hash = opts.hash_func.hash_file(partial_path)?;
    if actual_hash != file_hash {
        return Err(Error::Corrupt(format!(
            "reassembled file_hash mismatch (expected {file_hash}, computed {actual_hash})"
        )));
    }
    Ok(())
}
