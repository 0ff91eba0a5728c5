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


//! Concurrent download of every part of a loan
//!
//! All parts are started together, in manifest order, and the manager waits
//! for every one of them to finish before returning. A failing part never
//! cancels its siblings. Files are named by part number, so the order in
//! which downloads complete does not matter.
//!
//! The license and client identifier are the only shared state and are only
//! read during the fan-out.

use crate::api::license::License;
use crate::download::part::{PartFetcher, Verification};
use crate::error::Result;
use crate::file::PathBuilder;
use crate::manifest::Manifest;
use futures_util::future::join_all;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Result of one part download
#[derive(Debug)]
pub struct PartOutcome {
    pub name: String,
    pub path: PathBuf,
    pub result: Result<Verification>,
}

impl PartOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(&self.result, Ok(v) if v.is_verified())
    }
}

/// Aggregate of all part downloads, in manifest order
#[derive(Debug, Default)]
pub struct PartsReport {
    pub outcomes: Vec<PartOutcome>,
}

impl PartsReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Parts downloaded and verified
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded() == self.total()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PartOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}

impl fmt::Display for PartsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} succeeded", self.succeeded(), self.total())
    }
}

/// Fans part downloads out and joins them
pub struct DownloadManager {
    fetcher: PartFetcher,
}

impl DownloadManager {
    pub fn new(fetcher: PartFetcher) -> Self {
        Self { fetcher }
    }

    /// Download every part of `manifest` into the book folder of `paths`
    ///
    /// Never fails as a whole; each part's outcome is in the report.
    pub async fn download_parts(
        &self,
        manifest: &Manifest,
        license: &License,
        client_id: &str,
        paths: &PathBuilder,
    ) -> PartsReport {
        let width = manifest.part_number_width();
        info!(parts = manifest.parts.len(), "downloading parts");

        let downloads = manifest.parts.iter().map(|part| {
            let path = paths.part_path(part, width);
            async move {
                let result = self
                    .fetcher
                    .fetch(part, &manifest.base_content_url, license, client_id, &path)
                    .await;
                PartOutcome {
                    name: part.name.clone(),
                    path,
                    result,
                }
            }
        });

        let report = PartsReport {
            outcomes: join_all(downloads).await,
        };
        info!("downloaded {} parts: {}", report.total(), report);
        report
    }
}
