use crate::auth::Session;
use crate::host::{HostError, UploadRequest, VideoHost};
use async_trait::async_trait;
use common::{VideoId, Visibility};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use serde::Deserialize;
use std::path::Path;

pub const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/youtube/v3";

/// YouTube Data API v3 client using the resumable upload protocol.
pub struct YouTubeClient {
    session: Session,
    api_base: String,
    upload_base: String,
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
}

impl YouTubeClient {
    pub fn new(session: Session) -> Self {
        Self::with_base_urls(session, API_BASE, UPLOAD_BASE)
    }

    pub fn with_base_urls(session: Session, api_base: impl Into<String>, upload_base: impl Into<String>) -> Self {
        Self {
            session,
            api_base: api_base.into(),
            upload_base: upload_base.into(),
        }
    }
}

#[async_trait]
impl VideoHost for YouTubeClient {
    async fn upload(&mut self, request: &UploadRequest) -> Result<VideoId, HostError> {
        let io_error = |source: std::io::Error| HostError::Io {
            path: request.path.clone(),
            source,
        };
        let file = tokio::fs::File::open(&request.path).await.map_err(io_error)?;
        let length = file.metadata().await.map_err(io_error)?.len();
        let mime = mime_for(&request.path);

        let token = self.session.access_token().await?;
        let http = self.session.http().clone();

        log::debug!("Opening upload session for {} ({} bytes)", request.path.display(), length);
        let response = http
            .post(format!("{}/videos", self.upload_base))
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&token)
            .header("X-Upload-Content-Length", length)
            .header("X-Upload-Content-Type", mime)
            .json(&video_resource(request))
            .send()
            .await?;
        let response = check(response, "upload session").await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| HostError::InvalidResponse("upload session response has no Location header".into()))?
            .to_string();

        let response = http
            .put(&location)
            .bearer_auth(&token)
            .header(CONTENT_LENGTH, length)
            .header(CONTENT_TYPE, mime)
            .body(reqwest::Body::from(file))
            .send()
            .await?;
        let response = check(response, "upload").await?;

        let video: VideoResource = response.json().await?;
        Ok(VideoId(video.id))
    }

    async fn set_public(&mut self, video_id: &VideoId) -> Result<(), HostError> {
        let token = self.session.access_token().await?;
        let response = self
            .session
            .http()
            .put(format!("{}/videos", self.api_base))
            .query(&[("part", "status")])
            .bearer_auth(&token)
            .json(&status_resource(video_id, Visibility::Public))
            .send()
            .await?;
        check(response, "visibility update").await?;
        Ok(())
    }
}

async fn check(response: reqwest::Response, operation: &'static str) -> Result<reqwest::Response, HostError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(HostError::Rejected { operation, status, body })
}

fn video_resource(request: &UploadRequest) -> serde_json::Value {
    serde_json::json!({
        "snippet": {
            "title": request.title,
            "description": request.description,
            "tags": request.tags,
            "categoryId": request.category_id,
        },
        "status": {
            "privacyStatus": request.visibility,
        }
    })
}

fn status_resource(video_id: &VideoId, visibility: Visibility) -> serde_json::Value {
    serde_json::json!({
        "id": video_id.0,
        "status": {
            "privacyStatus": visibility,
        }
    })
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp4") => "video/mp4",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_video_resource_shape() {
        let request = UploadRequest {
            path: PathBuf::from("/videos/ACE(1).mp4"),
            title: "ACE(1).mp4".into(),
            description: "Description for ACE(1).mp4".into(),
            tags: vec!["fps".into(), "clutch".into()],
            category_id: "20".into(),
            visibility: Visibility::Private,
        };
        let body = video_resource(&request);
        assert_eq!(body["snippet"]["title"], "ACE(1).mp4");
        assert_eq!(body["snippet"]["categoryId"], "20");
        assert_eq!(body["snippet"]["tags"][1], "clutch");
        assert_eq!(body["status"]["privacyStatus"], "private");
    }

    #[test]
    fn test_status_resource_shape() {
        let body = status_resource(&VideoId("dQw4w9WgXcQ".into()), Visibility::Public);
        assert_eq!(body, serde_json::json!({"id": "dQw4w9WgXcQ", "status": {"privacyStatus": "public"}}));
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for(Path::new("a.mp4")), "video/mp4");
        assert_eq!(mime_for(Path::new("a.mkv")), "video/x-matroska");
        assert_eq!(mime_for(Path::new("a.mov")), "video/quicktime");
        assert_eq!(mime_for(Path::new("a.MP4")), "application/octet-stream");
    }

    const CLIP: &[u8] = b"not really an mp4";

    fn client(server: &MockServer) -> YouTubeClient {
        YouTubeClient::with_base_urls(
            Session::with_token("ya29.test"),
            format!("{}/youtube/v3", server.uri()),
            format!("{}/upload/youtube/v3", server.uri()),
        )
    }

    fn clip_request(dir: &Path) -> UploadRequest {
        let path = dir.join("ACE_clip(1).mp4");
        std::fs::write(&path, CLIP).unwrap();
        UploadRequest {
            path,
            title: "ACE_clip(1).mp4".into(),
            description: "Description for ACE_clip(1).mp4".into(),
            tags: vec!["fps".into()],
            category_id: "20".into(),
            visibility: Visibility::Private,
        }
    }

    #[tokio::test]
    async fn test_resumable_upload() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let session_uri = format!("{}/upload/session/abc", server.uri());

        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .and(query_param("uploadType", "resumable"))
            .and(query_param("part", "snippet,status"))
            .and(header("authorization", "Bearer ya29.test"))
            .and(header("x-upload-content-length", CLIP.len().to_string().as_str()))
            .and(header("x-upload-content-type", "video/mp4"))
            .and(body_partial_json(serde_json::json!({
                "snippet": {"title": "ACE_clip(1).mp4", "categoryId": "20"},
                "status": {"privacyStatus": "private"}
            })))
            .respond_with(ResponseTemplate::new(200).insert_header("Location", session_uri.as_str()))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/upload/session/abc"))
            .and(header("authorization", "Bearer ya29.test"))
            .and(header("content-type", "video/mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "vid123", "kind": "youtube#video"})))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).upload(&clip_request(dir.path())).await.unwrap();
        assert_eq!(id, VideoId("vid123".into()));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[1].body, CLIP);
    }

    #[tokio::test]
    async fn test_upload_session_without_location() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server).upload(&clip_request(dir.path())).await.unwrap_err();
        assert!(matches!(err, HostError::InvalidResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_upload_rejected() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/upload/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(403).set_body_string(r#"{"error": {"errors": [{"reason": "quotaExceeded"}]}}"#))
            .mount(&server)
            .await;

        match client(&server).upload(&clip_request(dir.path())).await {
            Err(HostError::Rejected { operation, status, body }) => {
                assert_eq!(operation, "upload session");
                assert_eq!(status, 403);
                assert!(body.contains("quotaExceeded"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_missing_file_sends_nothing() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let mut request = clip_request(dir.path());
        request.path = dir.path().join("gone.mp4");

        let err = client(&server).upload(&request).await.unwrap_err();
        assert!(matches!(err, HostError::Io { .. }), "{err:?}");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_public() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/youtube/v3/videos"))
            .and(query_param("part", "status"))
            .and(header("authorization", "Bearer ya29.test"))
            .and(body_json(serde_json::json!({"id": "vid123", "status": {"privacyStatus": "public"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "vid123"})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).set_public(&VideoId("vid123".into())).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_public_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/youtube/v3/videos"))
            .respond_with(ResponseTemplate::new(404).set_body_string("videoNotFound"))
            .mount(&server)
            .await;

        match client(&server).set_public(&VideoId("missing".into())).await {
            Err(HostError::Rejected { operation, status, body }) => {
                assert_eq!(operation, "visibility update");
                assert_eq!(status, 404);
                assert_eq!(body, "videoNotFound");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
