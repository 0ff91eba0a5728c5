// ODM Core - OverDrive loan acquisition
// Copyright (C) 2025 ODM Core contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Part download progress tracking and reporting
//!
//! Each part download owns one [`ProgressTracker`]. The tracker turns raw
//! byte counts into [`PartProgress`] reports and throttles how often the
//! optional [`ProgressCallback`] fires. The expected size comes from the
//! manifest, not from `Content-Length`.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum interval between two callbacks for the same part
const UPDATE_INTERVAL: Duration = Duration::from_millis(200);

/// Speed samples kept (~2 seconds at the update interval)
const MAX_SPEED_SAMPLES: usize = 10;

/// Progress of one part download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartProgress {
    /// Part label from the manifest
    pub part_name: String,

    /// Bytes written to disk so far
    pub bytes_received: u64,

    /// Size declared by the manifest
    pub total_bytes: u64,

    /// Progress as a percentage (0.0 - 100.0)
    pub progress_percentage: f64,

    /// Average speed over the recent samples
    pub bytes_per_second: u64,

    /// Estimated time remaining until completion
    pub time_remaining: Option<Duration>,

    pub state: DownloadState,

    /// Error message if the download failed
    pub error_message: Option<String>,
}

impl PartProgress {
    pub fn new(part_name: String, bytes_received: u64, total_bytes: u64) -> Self {
        Self {
            part_name,
            bytes_received,
            total_bytes,
            progress_percentage: percentage(bytes_received, total_bytes),
            bytes_per_second: 0,
            time_remaining: None,
            state: DownloadState::Pending,
            error_message: None,
        }
    }

    /// Update with speed and time remaining estimates
    pub fn with_estimates(mut self, bytes_per_second: u64) -> Self {
        self.bytes_per_second = bytes_per_second;
        self.time_remaining = match bytes_per_second {
            0 => None,
            bps if self.bytes_received < self.total_bytes => Some(Duration::from_secs(
                (self.total_bytes - self.bytes_received) / bps,
            )),
            _ => Some(Duration::ZERO),
        };
        self
    }

    /// Check if the declared size has been reached
    pub fn is_complete(&self) -> bool {
        self.total_bytes > 0 && self.bytes_received >= self.total_bytes
    }

    /// Get progress as a fraction (0.0 - 1.0)
    pub fn as_fraction(&self) -> f64 {
        self.progress_percentage / 100.0
    }
}

fn percentage(received: u64, total: u64) -> f64 {
    if total > 0 {
        (received as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Callback invoked with progress reports
///
/// Uses Arc instead of Box so one callback can be shared by every part.
pub type ProgressCallback = Arc<dyn Fn(PartProgress) + Send + Sync>;

/// Part download state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadState {
    /// Request not sent yet
    Pending,
    /// Body is streaming to disk
    Downloading,
    /// Written and size matches the manifest
    Verified,
    /// Written but size differs from the manifest
    SizeMismatch,
    /// Request or write failed
    Failed,
}

impl DownloadState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Verified | Self::SizeMismatch | Self::Failed)
    }
}

/// Progress tracker for one part download
pub struct ProgressTracker {
    progress: PartProgress,
    speed: AverageSpeed,
    callback: Option<ProgressCallback>,
    last_report: Option<Instant>,
}

impl ProgressTracker {
    pub fn new(part_name: String, total_bytes: u64, callback: Option<ProgressCallback>) -> Self {
        Self {
            progress: PartProgress::new(part_name, 0, total_bytes),
            speed: AverageSpeed::new(),
            callback,
            last_report: None,
        }
    }

    /// Record a new byte count; reports if the throttle interval has passed
    pub fn update(&mut self, bytes_received: u64) {
        self.speed.add_position(bytes_received);
        self.progress.bytes_received = bytes_received;
        self.progress.progress_percentage =
            percentage(bytes_received, self.progress.total_bytes);
        self.progress = self.progress.clone().with_estimates(self.speed.average());

        if self.should_report() {
            self.report();
        }
    }

    /// Move to a new state and report immediately
    pub fn set_state(&mut self, state: DownloadState) {
        self.progress.state = state;
        self.report();
    }

    /// Mark as failed with a message and report immediately
    pub fn set_error(&mut self, error: String) {
        self.progress.error_message = Some(error);
        self.set_state(DownloadState::Failed);
    }

    pub fn progress(&self) -> &PartProgress {
        &self.progress
    }

    fn should_report(&self) -> bool {
        self.last_report
            .map_or(true, |at| at.elapsed() >= UPDATE_INTERVAL)
    }

    fn report(&mut self) {
        self.last_report = Some(Instant::now());
        if let Some(callback) = &self.callback {
            callback(self.progress.clone());
        }
    }
}

/// Average speed over a sliding window of position samples
pub struct AverageSpeed {
    samples: VecDeque<(u64, Instant)>,
}

impl AverageSpeed {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(MAX_SPEED_SAMPLES + 1),
        }
    }

    pub fn add_position(&mut self, position: u64) {
        self.samples.push_back((position, Instant::now()));
        if self.samples.len() > MAX_SPEED_SAMPLES {
            self.samples.pop_front();
        }
    }

    /// Bytes per second between the oldest and newest sample
    pub fn average(&self) -> u64 {
        let (Some(&(first_pos, first_at)), Some(&(last_pos, last_at))) =
            (self.samples.front(), self.samples.back())
        else {
            return 0;
        };

        let elapsed = last_at.duration_since(first_at).as_secs_f64();
        if elapsed > 0.0 {
            (last_pos.saturating_sub(first_pos) as f64 / elapsed) as u64
        } else {
            0
        }
    }
}

impl Default for AverageSpeed {
    fn default() -> Self {
        Self::new()
    }
}
