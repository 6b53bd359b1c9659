//! Submission file discovery.
//!
//! Classifies files by extension into primary sources (`.c`) and auxiliary
//! headers (`.h`). Both lists are sorted so contexts are reproducible.

use crate::error::ValidationError;
use glob::glob;
use std::path::{Component, Path, PathBuf};

const SOURCE_EXTS: &[&str] = &["c"];
const HEADER_EXTS: &[&str] = &["h"];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiscoveredFiles {
    pub sources: Vec<PathBuf>,
    pub headers: Vec<PathBuf>,
}

/// Discover sources under `path`, or classify `path` itself when it is a file.
pub fn discover_sources(path: &Path) -> Result<DiscoveredFiles, ValidationError> {
    if !path.exists() {
        return Err(ValidationError::FileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        });
    }
    let mut found = DiscoveredFiles::default();
    if path.is_file() {
        classify(path.to_path_buf(), &mut found);
        return Ok(found);
    }

    let root = glob::Pattern::escape(&path.to_string_lossy());
    for ext in SOURCE_EXTS.iter().chain(HEADER_EXTS.iter()) {
        let pattern = format!("{}/**/*.{}", root, ext);
        let entries = glob(&pattern).map_err(|e| ValidationError::Config(e.to_string()))?;
        for entry in entries.flatten() {
            if is_hidden(path, &entry) || !entry.is_file() {
                continue;
            }
            classify(entry, &mut found);
        }
    }
    found.sources.sort();
    found.sources.dedup();
    found.headers.sort();
    found.headers.dedup();
    Ok(found)
}

fn classify(p: PathBuf, found: &mut DiscoveredFiles) {
    let ext = p
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if SOURCE_EXTS.contains(&ext.as_str()) {
        found.sources.push(p);
    } else if HEADER_EXTS.contains(&ext.as_str()) {
        found.headers.push(p);
    }
}

fn is_hidden(root: &Path, p: &Path) -> bool {
    let rel = p.strip_prefix(root).unwrap_or(p);
    rel.components().any(|c| match c {
        Component::Normal(s) => s.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
