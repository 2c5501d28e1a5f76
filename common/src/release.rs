use crate::video::VideoId;
use chrono::{DateTime, Days, Duration, Local, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Release moment for the file at `position`: `position + 1` calendar days
/// after `now`, at the same wall-clock time.
pub fn release_time<Tz: TimeZone>(now: &DateTime<Tz>, position: usize) -> DateTime<Tz> {
    let days = position as u64 + 1;
    now.clone()
        .checked_add_days(Days::new(days))
        // Wall-clock time skipped by a DST jump on the target day.
        .unwrap_or_else(|| now.clone() + Duration::days(days as i64))
}

/// An uploaded video waiting to be flipped to public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledRelease {
    pub id: Uuid,
    pub video_id: VideoId,
    pub filename: String,
    /// Index in the selection order, not in the list of successful uploads.
    pub position: usize,
    pub release_at: DateTime<Local>,
}

impl ScheduledRelease {
    pub fn new(video_id: VideoId, filename: impl Into<String>, position: usize, release_at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            video_id,
            filename: filename.into(),
            position,
            release_at,
        }
    }
}

/// Pending releases owned by a single scheduler.
///
/// Polling takes the current time as an argument so callers decide the clock.
#[derive(Debug, Default)]
pub struct ReleaseQueue {
    pending: Vec<ScheduledRelease>,
}

impl ReleaseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, release: ScheduledRelease) {
        self.pending.push(release);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &[ScheduledRelease] {
        &self.pending
    }

    /// Earliest pending release time.
    pub fn next_due(&self) -> Option<DateTime<Local>> {
        self.pending.iter().map(|r| r.release_at).min()
    }

    /// Remove and return every release due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: &DateTime<Local>) -> Vec<ScheduledRelease> {
        let (mut due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|r| r.release_at <= *now);
        self.pending = waiting;
        due.sort_by_key(|r| r.release_at);
        due
    }
}
