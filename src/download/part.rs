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


//! Single part download and verification
//!
//! # Request
//! `GET {baseurl}/{escaped filename}` with headers:
//! - `License`: raw license text
//! - `ClientID`: identifier the license was issued to
//! - `User-Agent`: emulated client
//!
//! The body is streamed straight to the destination file, replacing any file
//! already there. Afterwards the file length is compared with the manifest's
//! `filesize`. A mismatch is reported as [`Verification::Mismatch`] and the
//! file is kept.

use crate::api::client::OverDriveClient;
use crate::api::license::License;
use crate::download::progress::{DownloadState, ProgressCallback, ProgressTracker};
use crate::error::{OdmError, Result};
use crate::manifest::Part;
use futures_util::StreamExt;
use reqwest::header::{HeaderValue, USER_AGENT};
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Outcome of comparing a downloaded file with its declared size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Verified { size: u64 },
    Mismatch { expected: u64, actual: u64 },
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// Compare the file at `path` with the part's declared size
pub async fn verify_part(part: &Part, path: &Path) -> Result<Verification> {
    let actual = tokio::fs::metadata(path).await?.len();

    Ok(if actual == part.file_size {
        Verification::Verified { size: actual }
    } else {
        Verification::Mismatch {
            expected: part.file_size,
            actual,
        }
    })
}

/// Downloads parts with the headers the content server requires
#[derive(Clone)]
pub struct PartFetcher {
    client: OverDriveClient,
    progress: Option<ProgressCallback>,
}

impl PartFetcher {
    pub fn new(client: OverDriveClient) -> Self {
        Self {
            client,
            progress: None,
        }
    }

    /// Report per-part progress to `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Download one part to `destination` and verify its size
    ///
    /// # Arguments
    /// * `part` - Part from the manifest
    /// * `base_url` - The manifest's `Protocol@baseurl`
    /// * `license` - License for this loan
    /// * `client_id` - Client identifier; must be the one the license names
    /// * `destination` - Output file, overwritten
    ///
    /// # Errors
    /// - `ClientIdMismatch` - `client_id` is not the license's client
    /// - `LicenseMalformed` - license text cannot be sent as a header
    /// - `PartDownload` - non-2xx response
    /// - `Timeout` - the server stalled
    /// - `Http` / `Io` - transport or write failure
    pub async fn fetch(
        &self,
        part: &Part,
        base_url: &str,
        license: &License,
        client_id: &str,
        destination: &Path,
    ) -> Result<Verification> {
        let mut tracker =
            ProgressTracker::new(part.name.clone(), part.file_size, self.progress.clone());

        let result = self
            .download(part, base_url, license, client_id, destination, &mut tracker)
            .await;

        match &result {
            Ok(Verification::Verified { .. }) => {
                info!(part = %part.name, "downloaded part... verified");
                tracker.set_state(DownloadState::Verified);
            }
            Ok(Verification::Mismatch { expected, actual }) => {
                warn!(
                    part = %part.name,
                    expected,
                    actual,
                    "downloaded part... not verified, size differs from manifest"
                );
                tracker.set_state(DownloadState::SizeMismatch);
            }
            Err(e) => {
                warn!(part = %part.name, error = %e, "part download failed");
                tracker.set_error(e.to_string());
            }
        }

        result
    }

    async fn download(
        &self,
        part: &Part,
        base_url: &str,
        license: &License,
        client_id: &str,
        destination: &Path,
        tracker: &mut ProgressTracker,
    ) -> Result<Verification> {
        if client_id != license.client_id() {
            return Err(OdmError::ClientIdMismatch {
                expected: client_id.to_string(),
                actual: license.client_id().to_string(),
            });
        }

        let client_id = HeaderValue::from_str(client_id).map_err(|_| {
            OdmError::InvalidInput(format!("client id '{client_id}' is not a valid header"))
        })?;

        let server_url = part.server_url(base_url);
        debug!(url = %server_url, path = %destination.display(), "requesting part");

        let request = self
            .client
            .http()
            .get(&server_url)
            .header("License", license.header_value()?)
            .header("ClientID", client_id)
            .header(USER_AGENT, &self.client.config().user_agent)
            .send();
        let response = self.client.idle_limited(request).await??;

        let status = response.status();
        if !status.is_success() {
            return Err(OdmError::PartDownload {
                part: part.name.clone(),
                status: status.as_u16(),
            });
        }

        remove_existing(destination).await?;
        tracker.set_state(DownloadState::Downloading);

        let mut file = tokio::fs::File::create(destination).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = self.client.idle_limited(stream.next()).await? {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            tracker.update(written);
        }
        file.flush().await?;
        drop(file);

        verify_part(part, destination).await
    }
}

/// Remove a previous download so stale bytes never survive
async fn remove_existing(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
