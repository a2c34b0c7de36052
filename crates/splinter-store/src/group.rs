//! Groups fragment records by original-file identity and computes the
//! greedy longest-reach extraction plan (spec.md §4.6 Grouping, Planning).

use std::collections::BTreeMap;

use splinter_core::{Error, Result};

use crate::fragment::FragmentRecord;

/// All fragment records claiming to be part of the same original file,
/// keyed by `fragment_start`. Multiple records may share a start (duplicates
/// or overlaps); all are retained.
#[derive(Debug, Default)]
pub struct FragmentGroup {
    file_hash: Option<String>,
    file_name: Option<String>,
    file_size: Option<u64>,
    by_start: BTreeMap<u64, Vec<FragmentRecord>>,
}

/// An ordered list of (bytes-to-read, fragment-index) pairs. `fragment_index`
/// indexes into the flattened, insertion-ordered list returned by
/// [`FragmentGroup::fragments`].
pub type ExtractionPlan = Vec<(u64, usize)>;

impl FragmentGroup {
    /// An empty group.
    pub fn new() -> Self {
        FragmentGroup::default()
    }

    /// Add a record to the group. The first record establishes the group's
    /// `file_hash`/`file_name`/`file_size`; later records must agree, or
    /// this returns `Error::Malformed` (a corrupt or foreign fragment must
    /// not silently poison a group).
    pub fn insert(&mut self, record: FragmentRecord) -> Result<()> {
        let header = record.header();
        match (&self.file_hash, &self.file_name, self.file_size) {
            (None, None, None) => {
                self.file_hash = Some(header.file_hash.clone());
                self.file_name = Some(header.decode_file_name()?);
                self.file_size = Some(header.file_size);
            }
            (Some(hash), Some(name), Some(size)) => {
                if *hash != header.file_hash {
                    return Err(Error::Malformed(format!(
                        "fragment {} claims file_hash {} but group expects {hash}",
                        record.path().display(),
                        header.file_hash
                    )));
                }
                let decoded_name = header.decode_file_name()?;
                if *name != decoded_name || size != header.file_size {
                    return Err(Error::Malformed(format!(
                        "fragment {} has inconsistent file_name/file_size for file_hash {hash}",
                        record.path().display()
                    )));
                }
            }
            _ => unreachable!("group fields are set together"),
        }

        self.by_start.entry(header.fragment_start).or_default().push(record);
        Ok(())
    }

    /// The `file_hash` shared by every record in the group.
    pub fn file_hash(&self) -> Option<&str> {
        self.file_hash.as_deref()
    }

    /// The decoded original basename shared by every record in the group.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The original file size shared by every record in the group.
    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    /// All records in the group, in `fragment_start` order, then insertion
    /// order within a start. Index into this slice is what
    /// [`ExtractionPlan`] entries refer to.
    pub fn fragments(&self) -> Vec<&FragmentRecord> {
        self.by_start.values().flatten().collect()
    }

    /// Compute the greedy longest-reach extraction plan covering
    /// `[0, file_size)` (spec.md §4.6 Planning). Tolerates duplicate and
    /// overlapping fragments; fails with `Error::Incomplete` if coverage
    /// cannot be extended past some byte.
    pub fn plan(&self) -> Result<ExtractionPlan> {
        let file_size = self.file_size.unwrap_or(0);

        if file_size == 0 {
            return Ok(Vec::new());
        }

        // Global index of each record, matching the flattened, by-start
        // order `fragments()` returns, so `ExtractionPlan` entries still
        // index into that slice.
        let mut start_offset: BTreeMap<u64, usize> = BTreeMap::new();
        let mut next_index = 0usize;
        for (&start, records) in &self.by_start {
            start_offset.insert(start, next_index);
            next_index += records.len();
        }

        let mut prev: u64 = 0;
        let mut curr: u64 = 0;
        let mut chosen_indices = Vec::new();
        let mut starts = Vec::new();

        while curr < file_size {
            let mut best: Option<(u64, usize, u64)> = None;
            for (&start, records) in self.by_start.range(prev..=curr) {
                let base = start_offset[&start];
                for (slot, record) in records.iter().enumerate() {
                    let end = start + record.header().fragment_size;
                    if best.map_or(true, |(best_end, ..)| end > best_end) {
                        best = Some((end, base + slot, start));
                    }
                }
            }

            // A candidate that doesn't reach past `curr` (e.g. the same
            // fragment chosen again because nothing else starts in range)
            // is indistinguishable from having no candidate at all.
            let Some((end, index, start)) = best.filter(|&(end, ..)| end > curr) else {
                return Err(Error::Incomplete {
                    original_hash: self.file_hash.clone().unwrap_or_default(),
                    missing_at: curr,
                });
            };

            chosen_indices.push(index);
            starts.push(start);
            prev = curr;
            curr = end;
        }

        starts.push(file_size);
        let plan = chosen_indices
            .into_iter()
            .enumerate()
            .map(|(i, index)| (starts[i + 1] - starts[i], index))
            .collect();
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{FragmentHeader, MAGIC};
    use splinter_core::HashAlgorithm;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;

    fn write_fragment(dir: &Path, name: &str, start: u64, size: u64, file_size: u64) -> FragmentRecord {
        let plaintext = vec![0x42u8; size as usize];
        let header = FragmentHeader {
            file_name: FragmentHeader::encode_file_name("whole.bin"),
            file_hash: "DEADBEEF".to_string(),
            file_size,
            fragment_start: start,
            fragment_hash: HashAlgorithm::Sha1.hash_bytes(&plaintext),
            fragment_size: size,
            initialization_vector: hex::encode_upper([0u8; 16]),
            password_salt: hex::encode_upper(vec![0u8; 256]),
        };
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        writeln!(f, "{MAGIC}").unwrap();
        writeln!(f, "{}", serde_json::to_string(&header).unwrap()).unwrap();
        writeln!(f, "{}", splinter_core::ascii85::encode(&plaintext)).unwrap();
        FragmentRecord::open(&path).unwrap()
    }

    #[test]
    fn plan_covers_contiguous_non_overlapping_fragments() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = FragmentGroup::new();
        group.insert(write_fragment(dir.path(), "a.txt", 0, 10, 30)).unwrap();
        group.insert(write_fragment(dir.path(), "b.txt", 10, 10, 30)).unwrap();
        group.insert(write_fragment(dir.path(), "c.txt", 20, 10, 30)).unwrap();

        let plan = group.plan().unwrap();
        assert_eq!(plan.len(), 3);
        let total: u64 = plan.iter().map(|(len, _)| len).sum();
        assert_eq!(total, 30);
    }

    #[test]
    fn plan_picks_longest_reach_among_overlaps() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = FragmentGroup::new();
        group.insert(write_fragment(dir.path(), "short.txt", 0, 5, 20)).unwrap();
        group.insert(write_fragment(dir.path(), "long.txt", 0, 20, 20)).unwrap();

        let plan = group.plan().unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].0, 20);
    }

    #[test]
    fn plan_reports_incomplete_on_a_gap() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = FragmentGroup::new();
        group.insert(write_fragment(dir.path(), "a.txt", 0, 10, 30)).unwrap();
        group.insert(write_fragment(dir.path(), "c.txt", 20, 10, 30)).unwrap();

        match group.plan() {
            Err(Error::Incomplete { missing_at, .. }) => assert_eq!(missing_at, 10),
            other => panic!("expected Incomplete, got {other:?}"),
        }
    }

    #[test]
    fn insert_rejects_inconsistent_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut group = FragmentGroup::new();
        group.insert(write_fragment(dir.path(), "a.txt", 0, 10, 30)).unwrap();
        let result = group.insert(write_fragment(dir.path(), "b.txt", 10, 10, 999));
        assert!(matches!(result, Err(Error::Malformed(_))));
    }
}
