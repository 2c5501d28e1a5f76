use crate::config::UploadConfig;
use crate::host::{HostError, UploadRequest, VideoHost};
use crate::notifier::{Notification, Notifier, ReleaseEvent};
use chrono::{DateTime, Local};
use common::{release_time, ReleaseQueue, ScheduledRelease, VideoFile};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

#[derive(Debug)]
pub struct UploadFailure {
    pub position: usize,
    pub filename: String,
    pub error: HostError,
}

#[derive(Debug, Default)]
pub struct UploadReport {
    pub scheduled: Vec<ScheduledRelease>,
    pub failures: Vec<UploadFailure>,
}

#[derive(Debug)]
pub enum PublishOutcome {
    Published(ScheduledRelease),
    Failed {
        release: ScheduledRelease,
        error: HostError,
    },
}

/// Uploads videos one at a time and flips each to public on its release day.
pub struct ReleaseScheduler {
    queue: ReleaseQueue,
    upload: UploadConfig,
    notifier: Notifier,
}

impl ReleaseScheduler {
    pub fn new(upload: UploadConfig, notifier: Notifier) -> Self {
        Self {
            queue: ReleaseQueue::new(),
            upload,
            notifier,
        }
    }

    pub fn queue(&self) -> &ReleaseQueue {
        &self.queue
    }

    /// Upload `files` in order and queue a release for each success.
    ///
    /// `clock` is read right after each upload; the file at position `idx`
    /// goes public `idx + 1` days after that moment. A failed upload is
    /// reported and the next file is still attempted.
    pub async fn schedule_releases<H, C>(&mut self, files: &[VideoFile], host: &mut H, clock: C) -> UploadReport
    where
        H: VideoHost + ?Sized,
        C: Fn() -> DateTime<Local>,
    {
        let mut report = UploadReport::default();

        for (idx, file) in files.iter().enumerate() {
            let request = UploadRequest::for_video(file, &self.upload);
            log::info!("Uploading {} ({}/{})", file.filename, idx + 1, files.len());

            let video_id = match host.upload(&request).await {
                Ok(id) => id,
                Err(error) => {
                    log::error!("Upload of {} failed: {}", file.filename, error);
                    self.notifier
                        .notify(&Notification {
                            event: ReleaseEvent::UploadFailed,
                            filename: file.filename.clone(),
                            video_id: None,
                            message: error.to_string(),
                        })
                        .await;
                    report.failures.push(UploadFailure {
                        position: idx,
                        filename: file.filename.clone(),
                        error,
                    });
                    continue;
                }
            };
            log::info!("Uploaded {} as {}", file.filename, video_id);

            let release_at = release_time(&clock(), idx);
            let release = ScheduledRelease::new(video_id, file.filename.clone(), idx, release_at);
            log::info!(
                "Scheduled {} to go public at {}",
                file.filename,
                release_at.format("%Y-%m-%d %H:%M:%S")
            );
            self.notifier
                .notify(&Notification {
                    event: ReleaseEvent::Scheduled,
                    filename: release.filename.clone(),
                    video_id: Some(release.video_id.clone()),
                    message: format!("Goes public at {}", release_at.to_rfc3339()),
                })
                .await;

            self.queue.push(release.clone());
            report.scheduled.push(release);
        }

        report
    }

    /// Publish every release due at `now`. Each release is consumed whether
    /// or not the visibility update succeeds.
    pub async fn fire_due<H>(&mut self, host: &mut H, now: DateTime<Local>) -> Vec<PublishOutcome>
    where
        H: VideoHost + ?Sized,
    {
        let mut outcomes = Vec::new();

        for release in self.queue.take_due(&now) {
            match host.set_public(&release.video_id).await {
                Ok(()) => {
                    log::info!("Video {} ({}) is now public", release.video_id, release.filename);
                    self.notifier
                        .notify(&Notification {
                            event: ReleaseEvent::Published,
                            filename: release.filename.clone(),
                            video_id: Some(release.video_id.clone()),
                            message: format!("Video {} is now public", release.video_id),
                        })
                        .await;
                    outcomes.push(PublishOutcome::Published(release));
                }
                Err(error) => {
                    log::error!("Failed to publish {} ({}): {}", release.video_id, release.filename, error);
                    self.notifier
                        .notify(&Notification {
                            event: ReleaseEvent::PublishFailed,
                            filename: release.filename.clone(),
                            video_id: Some(release.video_id.clone()),
                            message: error.to_string(),
                        })
                        .await;
                    outcomes.push(PublishOutcome::Failed { release, error });
                }
            }
        }

        outcomes
    }

    /// Poll every `poll_interval` until nothing is pending or Ctrl-C.
    pub async fn run<H>(&mut self, host: &mut H, poll_interval: Duration)
    where
        H: VideoHost + ?Sized,
    {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if let Some(next) = self.queue.next_due() {
            log::info!(
                "Waiting for {} release(s), next at {}",
                self.queue.len(),
                next.format("%Y-%m-%d %H:%M:%S")
            );
        }

        // Registered once; a Ctrl-C that arrives during a publish is seen on the next pass.
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            if self.queue.is_empty() {
                log::info!("All scheduled releases processed");
                break;
            }

            tokio::select! {
                _ = interval.tick() => {
                    self.fire_due(host, Local::now()).await;
                }
                _ = &mut ctrl_c => {
                    log::warn!("Interrupted with {} release(s) still pending", self.queue.len());
                    break;
                }
            }
        }
    }
}
