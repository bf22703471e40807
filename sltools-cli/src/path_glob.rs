use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use rayon::prelude::*;

fn has_glob_meta(s: &str) -> bool {
    s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
}

/// Static directory prefix before the first glob meta-character.
fn static_prefix_dir(pattern: &str) -> PathBuf {
    let idx = pattern
        .bytes()
        .position(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
        .unwrap_or(pattern.len());
    let p = Path::new(&pattern[..idx]);
    if p.is_dir() {
        p.to_path_buf()
    } else {
        p.parent()
            .filter(|pp| !pp.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

/// Every file under `root`, .gitignore-aware, in file name order.
fn walk_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .hidden(false)
        .ignore(true)
        .parents(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    walker
        .filter_map(|dent| match dent {
            Ok(dent) => Some(dent),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|dent| dent.file_type().is_some_and(|t| t.is_file()))
        .map(|dent| dent.into_path())
        .collect()
}

fn matching_files(root: &Path, matcher: &GlobMatcher) -> Vec<PathBuf> {
    walk_files(root)
        .into_iter()
        .filter(|path| {
            matcher.is_match(path) || path.strip_prefix(".").is_ok_and(|p| matcher.is_match(p))
        })
        .collect()
}

fn expand_one(input: &str) -> Result<Vec<PathBuf>, String> {
    if has_glob_meta(input) {
        let matcher = GlobBuilder::new(input)
            .literal_separator(true)
            .build()
            .map_err(|e| format!("Invalid glob pattern '{}': {}", input, e))?
            .compile_matcher();
        return Ok(matching_files(&static_prefix_dir(input), &matcher));
    }

    let path = Path::new(input);
    if path.is_dir() {
        Ok(walk_files(path).into_iter().filter(|p| is_xml(p)).collect())
    } else if path.is_file() {
        Ok(vec![path.to_path_buf()])
    } else {
        log::warn!("Skipping '{input}': no such file or directory");
        Ok(Vec::new())
    }
}

/// Expands inputs into string table paths.
///
/// Directories expand to every `*.xml` below them, glob patterns are matched
/// with globset, explicit files are kept as given. Roots are walked in
/// parallel; the result keeps input order without duplicates. Finding no file
/// at all is an error.
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>, String> {
    let expanded: Vec<Vec<PathBuf>> = inputs
        .par_iter()
        .map(|input| expand_one(input))
        .collect::<Result<_, String>>()?;

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let results: Vec<PathBuf> = expanded
        .into_iter()
        .flatten()
        .filter(|path| seen.insert(path.clone()))
        .collect();

    if results.is_empty() {
        return Err(sltools::Error::NoFilesFound(inputs.join(", ")).to_string());
    }
    Ok(results)
}
