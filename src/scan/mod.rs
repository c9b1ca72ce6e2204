pub mod filesystem;

use crate::error::{ReadflowError, Result};
use filesystem::{absolutize, find_named_files};
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which files to pick up and how to name their flattened copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRule {
    pub match_name: String,
    pub suffix: String,
}

impl PairRule {
    pub fn new(match_name: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            match_name: match_name.into(),
            suffix: suffix.into(),
        }
    }

    /// `<sample><suffix>` where the sample is the basename of the directory
    /// holding the matched file.
    pub fn destination_name(&self, sample: &OsStr) -> OsString {
        let mut name = sample.to_os_string();
        name.push(&self.suffix);
        name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Walks `input_dir` and pairs every file named `rule.match_name` with
/// `output_dir/<parent basename><rule.suffix>`. Both paths are absolute.
pub fn find_pairs(input_dir: &Path, output_dir: &Path, rule: &PairRule) -> Result<Vec<PathPair>> {
    if !input_dir.exists() {
        return Err(ReadflowError::PathNotFound(input_dir.display().to_string()));
    }
    if !input_dir.is_dir() {
        return Err(ReadflowError::NotADirectory(input_dir.display().to_string()));
    }

    let root = absolutize(input_dir)?;
    let output_root = absolutize(output_dir)?;

    let mut pairs = Vec::new();
    for source in find_named_files(&root, &rule.match_name)? {
        let destination = output_root.join(rule.destination_name(sample_name(&source)?));
        debug!(source = %source.display(), destination = %destination.display(), "matched");
        pairs.push(PathPair {
            source,
            destination,
        });
    }
    Ok(pairs)
}

fn sample_name(file: &Path) -> Result<&OsStr> {
    file.parent()
        .and_then(Path::file_name)
        .ok_or_else(|| ReadflowError::NoSampleName(file.display().to_string()))
}

/// Destinations claimed by more than one pair, in first-seen order.
pub fn duplicate_destinations(pairs: &[PathPair]) -> Vec<&Path> {
    let mut counts: HashMap<&Path, usize> = HashMap::new();
    let mut order = Vec::new();
    for pair in pairs {
        let count = counts.entry(pair.destination.as_path()).or_insert(0);
        *count += 1;
        if *count == 2 {
            order.push(pair.destination.as_path());
        }
    }
    order
}
