use crate::video::{SelectionPolicy, VideoFile};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// First `(N)` group in a file name.
static SEQUENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([0-9]+)\)").unwrap());

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to read directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Sequence number from the first parenthesized digit group.
///
/// Digit runs too long for `u64` saturate, so they still count as numbered.
pub fn sequence_number(filename: &str) -> Option<u64> {
    let digits = SEQUENCE_PATTERN.captures(filename)?.get(1)?.as_str();
    Some(digits.parse().unwrap_or(u64::MAX))
}

/// Read `dir` once and return its eligible videos in upload order.
pub fn select_ordered(dir: &Path, policy: &SelectionPolicy) -> Result<Vec<VideoFile>, SelectorError> {
    let unreadable = |source: std::io::Error| SelectorError::Unreadable {
        path: dir.to_path_buf(),
        source,
    };

    if !std::fs::metadata(dir).map_err(unreadable)?.is_dir() {
        return Err(SelectorError::NotADirectory(dir.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        // Follows symlinks; dangling links are skipped.
        let is_file = std::fs::metadata(entry.path())
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => log::warn!("Skipping non UTF-8 file name {:?}", raw),
        }
    }

    let selected = order_candidates(dir, names, policy);
    log::debug!("Selected {} video(s) from {}", selected.len(), dir.display());
    Ok(selected)
}

/// Order file names (given in enumeration order) by category priority, then
/// by sequence number. Names with an unaccepted extension or no category
/// prefix are dropped.
pub fn order_candidates<I, S>(dir: &Path, names: I, policy: &SelectionPolicy) -> Vec<VideoFile>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut groups: Vec<Vec<VideoFile>> = vec![Vec::new(); policy.categories.len()];

    for name in names {
        let name: String = name.into();
        if !policy.accepts_extension(&name) {
            continue;
        }
        let Some((rank, tag)) = policy.category_of(&name) else {
            log::debug!("Skipping {}: no known category prefix", name);
            continue;
        };
        groups[rank].push(VideoFile {
            full_path: dir.join(&name),
            category: tag.to_string(),
            sequence_number: sequence_number(&name),
            filename: name,
        });
    }

    for group in &mut groups {
        // Stable: unnumbered files keep enumeration order at the end.
        group.sort_by_key(|f| (f.sequence_number.is_none(), f.sequence_number));
    }

    groups.into_iter().flatten().collect()
}
