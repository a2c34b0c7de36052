//! Directory scan driver (spec.md §4.6 Driver): discovers fragments in a
//! directory, groups them by `file_hash`, and reassembles each group.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use splinter_core::{Error, Result};

use crate::fragment::FragmentRecord;
use crate::group::FragmentGroup;
use crate::reassemble::JoinOptions;

/// Walk `input_dir` once, group every valid fragment by `file_hash`, and
/// reassemble each group in turn into `output_dir`. Foreign files (wrong
/// magic or unparseable header) are silently ignored; groups whose plan
/// cannot be completed are logged and skipped rather than aborting the
/// scan (spec.md §4.6, §7). Returns an iterator rather than a `Vec` so a
/// caller can act on each restored path as soon as it is produced.
pub fn scan_and_reassemble(
    input_dir: &Path,
    output_dir: &Path,
    opts: JoinOptions,
) -> Result<impl Iterator<Item = Result<PathBuf>>> {
    let groups = discover_groups(input_dir)?;
    let output_dir = output_dir.to_path_buf();

    Ok(groups.into_values().filter_map(move |group| match group.reassemble(&output_dir, &opts) {
        Ok(Some(path)) => Some(Ok(path)),
        Ok(None) => None,
        Err(Error::Incomplete { original_hash, missing_at }) => {
            tracing::warn!(file_hash = %original_hash, missing_at, "fragment group is incomplete, skipping");
            None
        }
        Err(e) => Some(Err(e)),
    }))
}

/// Walk `input_dir` and group its valid fragments by `file_hash`, without
/// reassembling anything. Backs `scan_and_reassemble` and the read-only
/// `splinter scan` CLI subcommand.
pub fn discover_groups(input_dir: &Path) -> Result<BTreeMap<String, FragmentGroup>> {
    let mut groups: BTreeMap<String, FragmentGroup> = BTreeMap::new();

    for entry in fs::read_dir(input_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(record) = FragmentRecord::try_open(&path)? else {
            continue;
        };
        let file_hash = record.header().file_hash.clone();
        groups.entry(file_hash).or_default().insert(record)?;
    }

    Ok(groups)
}
