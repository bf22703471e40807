//! Cross-file detection of string ids defined by more than one file.
//!
//! Mods override each other's string tables, so the same id in two files is
//! expected; what matters is whether the texts agree. Nothing here merges or
//! deletes entries.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{codepage::read_document, error::Error, parser::parse, report::Report};

/// One definition of an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub file: PathBuf,
    /// Trimmed `<text>` content, empty if the entry has none.
    pub text: String,
    /// 1-based line of the first occurrence of the id in the file.
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKind {
    /// Every definition has the same text.
    Identical,
    /// At least two definitions differ.
    Conflicting,
}

impl DuplicateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DuplicateKind::Identical => "identical",
            DuplicateKind::Conflicting => "conflicting",
        }
    }
}

/// Classifies two definitions of the same id.
pub fn classify_pair(a: &Occurrence, b: &Occurrence) -> DuplicateKind {
    if a.text == b.text {
        DuplicateKind::Identical
    } else {
        DuplicateKind::Conflicting
    }
}

/// An id defined by two or more files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRecord {
    pub id: String,
    pub kind: DuplicateKind,
    pub occurrences: Vec<Occurrence>,
}

impl DuplicateRecord {
    /// Every unordered pair of occurrences with its classification.
    pub fn pairs(&self) -> Vec<(&Occurrence, &Occurrence, DuplicateKind)> {
        let mut pairs = Vec::new();
        for (i, a) in self.occurrences.iter().enumerate() {
            for b in &self.occurrences[i + 1..] {
                pairs.push((a, b, classify_pair(a, b)));
            }
        }
        pairs
    }
}

/// All ids of a batch with their occurrences, in file processing order.
#[derive(Debug, Clone, Default)]
pub struct DuplicateIndex {
    entries: BTreeMap<String, Vec<Occurrence>>,
    files: Vec<PathBuf>,
    /// Files that could not be read or parsed. They are not indexed.
    pub report: Report,
}

/// Reads and indexes every file. Failures are recorded in
/// [`DuplicateIndex::report`] and the file is skipped.
pub fn index<P: AsRef<Path>>(files: &[P]) -> DuplicateIndex {
    let mut index = DuplicateIndex::default();
    for path in files {
        let path = path.as_ref();
        let outcome = read_document(path).and_then(|raw| index.add_document(path, &raw));
        match outcome {
            Ok(count) => log::debug!("Indexed {count} id(s) from {}", path.display()),
            Err(err) => index.report.record_error(path, &err),
        }
    }
    index
}

impl DuplicateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `raw` and adds its entries. Returns the number of distinct ids.
    ///
    /// A repeated id inside one document replaces the earlier definition. A
    /// path that is already indexed is skipped and counts zero ids.
    pub fn add_document(&mut self, path: &Path, raw: &str) -> Result<usize, Error> {
        if self.files.iter().any(|file| file == path) {
            log::warn!("{} is already indexed, skipping", path.display());
            return Ok(0);
        }
        let table = parse(raw)?;

        let mut own: Vec<(String, Occurrence)> = Vec::new();
        for entry in table.entries() {
            let occurrence = Occurrence {
                file: path.to_path_buf(),
                text: entry.text.unwrap_or_default().trim().to_string(),
                line: line_of(raw, entry.id),
            };
            match own.iter_mut().find(|(id, _)| id.as_str() == entry.id) {
                Some((_, existing)) => {
                    log::warn!(
                        "'{}' is defined more than once in {}, the last definition wins",
                        entry.id,
                        path.display()
                    );
                    *existing = occurrence;
                }
                None => own.push((entry.id.to_string(), occurrence)),
            }
        }

        let count = own.len();
        for (id, occurrence) in own {
            self.entries.entry(id).or_default().push(occurrence);
        }
        self.files.push(path.to_path_buf());
        Ok(count)
    }

    /// Files indexed successfully, in order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn occurrences(&self, id: &str) -> Option<&[Occurrence]> {
        self.entries.get(id).map(Vec::as_slice)
    }

    pub fn id_count(&self) -> usize {
        self.entries.len()
    }

    /// Ids defined by two or more files, sorted by id.
    pub fn duplicates(&self) -> Vec<DuplicateRecord> {
        self.entries
            .iter()
            .filter(|(_, occurrences)| occurrences.len() > 1)
            .map(|(id, occurrences)| {
                let first = &occurrences[0].text;
                let kind = if occurrences.iter().all(|o| &o.text == first) {
                    DuplicateKind::Identical
                } else {
                    DuplicateKind::Conflicting
                };
                DuplicateRecord {
                    id: id.clone(),
                    kind,
                    occurrences: occurrences.clone(),
                }
            })
            .collect()
    }
}

/// Line of the quoted id, or of its first bare occurrence.
fn line_of(raw: &str, id: &str) -> usize {
    let offset = raw
        .find(&format!("\"{id}\""))
        .or_else(|| raw.find(&format!("'{id}'")))
        .or_else(|| raw.find(id))
        .unwrap_or(0);
    raw[..offset].matches('\n').count() + 1
}

/// Ids one file shares with another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOverlap {
    pub file: PathBuf,
    pub match_count: usize,
    pub ids: BTreeSet<String>,
    /// Number of distinct ids in `file`.
    pub other_total: usize,
}

impl FileOverlap {
    /// Share of `file`'s ids that are also in the owning file, in percent.
    pub fn percentage(&self) -> f64 {
        if self.other_total == 0 {
            return 0.0;
        }
        self.match_count as f64 / self.other_total as f64 * 100.0
    }
}

/// Every file one file shares ids with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOverlaps {
    pub file: PathBuf,
    pub total_ids: usize,
    pub total_matches: usize,
    pub overlaps: Vec<FileOverlap>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlapReport {
    pub files: Vec<FileOverlaps>,
}

impl OverlapReport {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Per-file overlap summary derived from the duplicate records.
///
/// Inner lists are sorted by descending match count, files by descending
/// total matches, ties by path. Files sharing nothing are omitted.
pub fn overlaps(index: &DuplicateIndex) -> OverlapReport {
    let mut file_ids: BTreeMap<&Path, BTreeSet<&str>> = BTreeMap::new();
    for (id, occurrences) in &index.entries {
        for occurrence in occurrences {
            file_ids
                .entry(occurrence.file.as_path())
                .or_default()
                .insert(id.as_str());
        }
    }

    let mut shared: BTreeMap<&Path, BTreeMap<&Path, BTreeSet<String>>> = BTreeMap::new();
    for record in index.duplicates() {
        for a in &record.occurrences {
            for b in &record.occurrences {
                if a.file == b.file {
                    continue;
                }
                let (Some((a_path, _)), Some((b_path, _))) = (
                    file_ids.get_key_value(a.file.as_path()),
                    file_ids.get_key_value(b.file.as_path()),
                ) else {
                    continue;
                };
                shared
                    .entry(*a_path)
                    .or_default()
                    .entry(*b_path)
                    .or_default()
                    .insert(record.id.clone());
            }
        }
    }

    let mut files: Vec<FileOverlaps> = shared
        .into_iter()
        .map(|(file, others)| {
            let mut overlaps: Vec<FileOverlap> = others
                .into_iter()
                .map(|(other, ids)| FileOverlap {
                    file: other.to_path_buf(),
                    match_count: ids.len(),
                    ids,
                    other_total: file_ids.get(other).map_or(0, BTreeSet::len),
                })
                .collect();
            overlaps.sort_by(|a, b| {
                b.match_count
                    .cmp(&a.match_count)
                    .then_with(|| a.file.cmp(&b.file))
            });
            FileOverlaps {
                file: file.to_path_buf(),
                total_ids: file_ids.get(file).map_or(0, BTreeSet::len),
                total_matches: overlaps.iter().map(|o| o.match_count).sum(),
                overlaps,
            }
        })
        .collect();
    files.sort_by(|a, b| {
        b.total_matches
            .cmp(&a.total_matches)
            .then_with(|| a.file.cmp(&b.file))
    });

    OverlapReport { files }
}
