//! Line-oriented list files (blocklist and censor wordlist).
//!
//! Both files hold one entry per line. They are read once at startup; a
//! missing or unreadable file is a startup error rather than an empty list.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::filter::{Blocklist, WordCensor};

#[derive(Error, Debug)]
#[error("cannot read {kind} file {path:?}: {source}")]
pub struct ListError {
    kind: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

/// Trimmed, non-blank lines of a list file.
pub fn read_entries(path: &Path) -> std::io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

pub fn load_blocklist(path: &Path) -> Result<Blocklist, ListError> {
    let entries = read_entries(path).map_err(|source| ListError {
        kind: "blocklist",
        path: path.to_path_buf(),
        source,
    })?;
    let blocklist = Blocklist::new(entries);
    tracing::info!(path = ?path, hosts = blocklist.len(), "Blocklist loaded");
    Ok(blocklist)
}

pub fn load_censor(path: &Path, marker: &str) -> Result<WordCensor, ListError> {
    let entries = read_entries(path).map_err(|source| ListError {
        kind: "wordlist",
        path: path.to_path_buf(),
        source,
    })?;
    let censor = WordCensor::new(entries, marker);
    tracing::info!(path = ?path, words = censor.word_count(), "Censor wordlist loaded");
    Ok(censor)
}
