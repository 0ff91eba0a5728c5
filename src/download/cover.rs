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


//! Cover art download

use crate::api::client::OverDriveClient;
use crate::error::{OdmError, Result};
use futures_util::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::info;

impl OverDriveClient {
    /// Download the cover image to `path`, replacing any existing file
    ///
    /// # Returns
    /// Bytes written
    ///
    /// # Errors
    /// - `Cover` - non-2xx response
    /// - `Http` / `Io` - transport or write failure
    pub async fn download_cover(&self, cover_url: &str, path: &Path) -> Result<u64> {
        let response = self.get(cover_url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OdmError::Cover {
                status: status.as_u16(),
            });
        }

        // File::create truncates, so an older cover never leaks through
        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = self.idle_limited(stream.next()).await? {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(path = %path.display(), bytes = written, "downloaded cover");
        Ok(written)
    }
}
