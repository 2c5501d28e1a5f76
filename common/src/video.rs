use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A video file picked up from the upload folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFile {
    pub filename: String,
    pub full_path: PathBuf,
    pub category: String,
    /// `None` when the name carries no `(N)` marker; sorts after every number.
    pub sequence_number: Option<u64>,
}

impl VideoFile {
    /// File name without its extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.filename)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VideoId(pub String);

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform visibility, serialized as the `privacyStatus` value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Unlisted,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Unlisted => "unlisted",
            Visibility::Public => "public",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which files are eligible and in what order their categories go out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Filename prefixes, highest priority first.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_categories() -> Vec<String> {
    crate::DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
}

fn default_extensions() -> Vec<String> {
    crate::DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            extensions: default_extensions(),
        }
    }
}

impl SelectionPolicy {
    /// Exact, case-sensitive extension match. Entries may be written with or
    /// without the leading dot.
    pub fn accepts_extension(&self, filename: &str) -> bool {
        let Some(ext) = Path::new(filename).extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|accepted| accepted.trim_start_matches('.') == ext)
    }

    /// Priority rank and tag of the first category that prefixes `filename`.
    pub fn category_of(&self, filename: &str) -> Option<(usize, &str)> {
        self.categories
            .iter()
            .enumerate()
            .find(|(_, tag)| filename.starts_with(tag.as_str()))
            .map(|(rank, tag)| (rank, tag.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_match_is_case_sensitive() {
        let policy = SelectionPolicy::default();
        assert!(policy.accepts_extension("ACE_clip.mp4"));
        assert!(policy.accepts_extension("ACE_clip.mkv"));
        assert!(policy.accepts_extension("ACE_clip.mov"));
        assert!(!policy.accepts_extension("ACE_clip.MP4"));
        assert!(!policy.accepts_extension("ACE_clip.txt"));
        assert!(!policy.accepts_extension("ACE_clip"));
    }

    #[test]
    fn test_extension_with_leading_dot() {
        let policy = SelectionPolicy {
            categories: vec!["ACE".into()],
            extensions: vec![".webm".into()],
        };
        assert!(policy.accepts_extension("ACE.webm"));
    }

    #[test]
    fn test_first_matching_category_wins() {
        let policy = SelectionPolicy {
            categories: vec!["4K60".into(), "4K".into()],
            extensions: vec!["mp4".into()],
        };
        assert_eq!(policy.category_of("4K60_x.mp4"), Some((0, "4K60")));
        assert_eq!(policy.category_of("4K_x.mp4"), Some((1, "4K")));
        assert_eq!(policy.category_of("ace_x.mp4"), None);
    }

    #[test]
    fn test_stem() {
        let file = VideoFile {
            filename: "ACE_clip(3).mp4".into(),
            full_path: PathBuf::from("/videos/ACE_clip(3).mp4"),
            category: "ACE".into(),
            sequence_number: Some(3),
        };
        assert_eq!(file.stem(), "ACE_clip(3)");
    }

    #[test]
    fn test_visibility_display() {
        assert_eq!(Visibility::default().to_string(), "private");
        assert_eq!(Visibility::Public.to_string(), "public");
    }
}
