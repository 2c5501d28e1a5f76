pub mod release;
pub mod selector;
pub mod video;

pub use release::{release_time, ReleaseQueue, ScheduledRelease};
pub use selector::{order_candidates, select_ordered, sequence_number, SelectorError};
pub use video::{SelectionPolicy, VideoFile, VideoId, Visibility};

/// Category prefixes, highest priority first.
pub const DEFAULT_CATEGORIES: &[&str] = &["ACE", "4K", "3K", "1v5", "1v4", "1v3", "1v2"];
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov"];

// Upload metadata
pub const DEFAULT_TITLE_TEMPLATE: &str = "{filename}";
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str = "Description for {filename}";
pub const DEFAULT_TAGS: &[&str] = &["gaming", "video", "valorant", "clutch", "shooter", "fps", "highlights"];
/// Platform category "Gaming".
pub const DEFAULT_CATEGORY_ID: &str = "20";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

// Paths, relative to the working directory or the user config dir
pub const DEFAULT_CLIENT_SECRETS: &str = "client_secrets.json";
pub const CONFIG_DIR_NAME: &str = "clipdrop";
pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const TOKEN_CACHE_FILE_NAME: &str = "token.json";
