use anyhow::Result;
use common::VideoId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotificationChannel {
    Webhook {
        url: String,
        #[serde(default)]
        headers: Option<HashMap<String, String>>,
    },
    Discord {
        webhook_url: String,
    },
    Slack {
        webhook_url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseEvent {
    Scheduled,
    Published,
    PublishFailed,
    UploadFailed,
}

impl ReleaseEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseEvent::Scheduled => "scheduled",
            ReleaseEvent::Published => "published",
            ReleaseEvent::PublishFailed => "publish_failed",
            ReleaseEvent::UploadFailed => "upload_failed",
        }
    }

    fn is_failure(&self) -> bool {
        matches!(self, ReleaseEvent::PublishFailed | ReleaseEvent::UploadFailed)
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub event: ReleaseEvent,
    pub filename: String,
    pub video_id: Option<VideoId>,
    pub message: String,
}

pub struct Notifier {
    client: reqwest::Client,
    channels: Vec<NotificationChannel>,
}

impl Notifier {
    pub fn new(channels: Vec<NotificationChannel>) -> Self {
        Self {
            client: reqwest::Client::new(),
            channels,
        }
    }

    pub fn disabled() -> Self {
        Self::new(Vec::new())
    }

    /// Send to every configured channel. Failures are logged only.
    pub async fn notify(&self, notification: &Notification) {
        for channel in &self.channels {
            if let Err(e) = self.send_notification(notification, channel).await {
                log::error!("Failed to send notification via {:?}: {}", channel, e);
            }
        }
    }

    async fn send_notification(&self, notification: &Notification, channel: &NotificationChannel) -> Result<()> {
        let (url, payload, headers) = match channel {
            NotificationChannel::Webhook { url, headers } => (url, webhook_payload(notification), headers.as_ref()),
            NotificationChannel::Discord { webhook_url } => (webhook_url, discord_payload(notification), None),
            NotificationChannel::Slack { webhook_url } => (webhook_url, slack_payload(notification), None),
        };

        let mut request = self.client.post(url);
        if let Some(headers_map) = headers {
            for (key, value) in headers_map {
                request = request.header(key, value);
            }
        }

        let response = request.json(&payload).send().await?;

        if response.status().is_success() {
            log::debug!("Notification {} sent for {}", notification.event.as_str(), notification.filename);
        } else {
            log::error!("Notification webhook failed with status: {}", response.status());
        }

        Ok(())
    }
}

fn webhook_payload(n: &Notification) -> serde_json::Value {
    serde_json::json!({
        "event": n.event.as_str(),
        "filename": n.filename,
        "video_id": n.video_id.as_ref().map(|id| id.0.clone()),
        "message": n.message,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
}

fn discord_payload(n: &Notification) -> serde_json::Value {
    let color = match n.event {
        ReleaseEvent::Published => 0x00ff00, // Green
        ReleaseEvent::Scheduled => 0x0000ff, // Blue
        _ => 0xff0000,                       // Red
    };

    let video = n.video_id.as_ref().map(|id| id.0.as_str()).unwrap_or("-");
    serde_json::json!({
        "embeds": [{
            "title": format!("{} - {}", n.filename, n.event.as_str()),
            "description": n.message,
            "color": color,
            "fields": [
                {"name": "Video ID", "value": video, "inline": true},
            ],
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }]
    })
}

fn slack_payload(n: &Notification) -> serde_json::Value {
    let emoji = match n.event {
        ReleaseEvent::Published => ":white_check_mark:",
        ReleaseEvent::Scheduled => ":calendar:",
        _ if n.event.is_failure() => ":x:",
        _ => ":grey_question:",
    };

    serde_json::json!({
        "text": format!("{} {} - {}", emoji, n.filename, n.event.as_str()),
        "blocks": [{
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("*File:* {}\n*Event:* {}\n\n{}", n.filename, n.event.as_str(), n.message)
            }
        }]
    })
}
