use crate::auth::AuthError;
use crate::config::UploadConfig;
use async_trait::async_trait;
use common::{VideoFile, VideoId, Visibility};
use std::path::PathBuf;
use thiserror::Error;

/// Titles longer than this are rejected by the platform.
pub const MAX_TITLE_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} rejected with status {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub visibility: Visibility,
}

impl UploadRequest {
    pub fn for_video(video: &VideoFile, config: &UploadConfig) -> Self {
        let title: String = render(&config.title, video).chars().take(MAX_TITLE_CHARS).collect();
        Self {
            path: video.full_path.clone(),
            title,
            description: render(&config.description, video),
            tags: config.tags.clone(),
            category_id: config.category_id.clone(),
            visibility: config.visibility,
        }
    }
}

fn render(template: &str, video: &VideoFile) -> String {
    template
        .replace("{filename}", &video.filename)
        .replace("{stem}", video.stem())
}

/// The hosting platform as seen by the scheduler.
#[async_trait]
pub trait VideoHost: Send {
    async fn upload(&mut self, request: &UploadRequest) -> Result<VideoId, HostError>;
    async fn set_public(&mut self, video_id: &VideoId) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(name: &str) -> VideoFile {
        VideoFile {
            filename: name.into(),
            full_path: PathBuf::from("/videos").join(name),
            category: "ACE".into(),
            sequence_number: common::sequence_number(name),
        }
    }

    #[test]
    fn test_default_metadata() {
        let request = UploadRequest::for_video(&video("ACE_clip(1).mp4"), &UploadConfig::default());
        assert_eq!(request.title, "ACE_clip(1).mp4");
        assert_eq!(request.description, "Description for ACE_clip(1).mp4");
        assert_eq!(request.category_id, "20");
        assert_eq!(request.visibility, Visibility::Private);
        assert_eq!(request.tags.len(), 7);
        assert_eq!(request.path, PathBuf::from("/videos/ACE_clip(1).mp4"));
    }

    #[test]
    fn test_templates_and_title_limit() {
        let config = UploadConfig {
            title: "{stem} | highlights".into(),
            description: "{filename}".into(),
            ..UploadConfig::default()
        };
        let request = UploadRequest::for_video(&video("4K_shot.mov"), &config);
        assert_eq!(request.title, "4K_shot | highlights");
        assert_eq!(request.description, "4K_shot.mov");

        let long = format!("ACE_{}.mp4", "x".repeat(200));
        let request = UploadRequest::for_video(&video(&long), &UploadConfig::default());
        assert_eq!(request.title.chars().count(), MAX_TITLE_CHARS);
    }
}
