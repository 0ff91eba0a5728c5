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


//! Single loan acquisition
//!
//! The failure policy lives in [`Acquisition::run`]: steps through
//! `SaveLicense` propagate their error wrapped in [`OdmError::StepFailed`];
//! parts are collected in a [`PartsReport`]; cover and return failures become
//! [`StepOutcome::Failed`].
//!
//! A license is acquired for `save_license` as well as for `download_parts`,
//! so a loan can be kept as a license file without downloading its parts.

use crate::acquisition::{AcquisitionOptions, AcquisitionStep};
use crate::api::client::OverDriveClient;
use crate::api::license::{License, LicenseAgent};
use crate::download::{DownloadManager, PartFetcher, PartsReport, ProgressCallback};
use crate::error::{OdmError, Result};
use crate::file::PathBuilder;
use crate::manifest::{Manifest, Metadata};
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span, warn, Instrument};

/// Outcome of a non-fatal step
#[derive(Debug)]
pub enum StepOutcome {
    Skipped,
    Done,
    Failed(OdmError),
}

impl StepOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// What one run did
#[derive(Debug)]
pub struct AcquisitionReport {
    pub media_id: String,

    /// Book folder, when any output step was enabled
    pub book_dir: Option<PathBuf>,

    /// Steps that ran, in order
    pub steps: Vec<AcquisitionStep>,

    /// Part results, when parts were downloaded
    pub parts: Option<PartsReport>,

    pub cover: StepOutcome,
    pub loan_return: StepOutcome,
}

impl AcquisitionReport {
    /// True unless some part failed to download or verify
    pub fn is_success(&self) -> bool {
        self.parts.as_ref().map_or(true, PartsReport::all_succeeded)
    }
}

/// Metadata and output paths, resolved once the book folder exists
struct BookLayout {
    metadata: Metadata,
    paths: PathBuilder,
}

/// Runs the acquisition state machine for one manifest at a time
#[derive(Clone)]
pub struct Acquisition {
    client: OverDriveClient,
    options: AcquisitionOptions,
    progress: Option<ProgressCallback>,
}

impl Acquisition {
    pub fn new(client: OverDriveClient, options: AcquisitionOptions) -> Self {
        Self {
            client,
            options,
            progress: None,
        }
    }

    /// Report part download progress to `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn options(&self) -> &AcquisitionOptions {
        &self.options
    }

    /// Acquire the loan described by the manifest at `manifest_path`
    ///
    /// # Errors
    /// `StepFailed` when a fatal step fails. Part, cover and return failures
    /// are in the report instead.
    pub async fn run(&self, manifest_path: &Path) -> Result<AcquisitionReport> {
        let span = info_span!(
            "loan",
            manifest = %manifest_path.display(),
            media_id = tracing::field::Empty
        );
        self.run_steps(manifest_path).instrument(span).await
    }

    async fn run_steps(&self, manifest_path: &Path) -> Result<AcquisitionReport> {
        let options = self.options;
        let mut steps = Vec::new();

        // ParseManifest
        let manifest = Manifest::from_file(manifest_path).map_err(|e| {
            e.in_step(manifest_path.display().to_string(), AcquisitionStep::ParseManifest)
        })?;
        tracing::Span::current().record("media_id", manifest.media_id.as_str());
        steps.push(AcquisitionStep::ParseManifest);
        let media_id = manifest.media_id.as_str();

        // CreateBookDirectory
        let layout = if options.write_to_disk() {
            let layout = self
                .create_book_dir(manifest_path, &manifest)
                .await
                .map_err(|e| e.in_step(media_id, AcquisitionStep::CreateBookDirectory))?;
            steps.push(AcquisitionStep::CreateBookDirectory);
            Some(layout)
        } else {
            None
        };

        // SaveMetadata
        if let Some(book) = layout.as_ref().filter(|_| options.save_metadata) {
            let path = book.paths.metadata_path();
            info!(path = %path.display(), "saving metadata");
            tokio::fs::write(&path, &book.metadata.raw)
                .await
                .map_err(|e| OdmError::from(e).in_step(media_id, AcquisitionStep::SaveMetadata))?;
            steps.push(AcquisitionStep::SaveMetadata);
        }

        // AcquireLicense
        let license = match layout.as_ref().filter(|_| options.needs_license()) {
            Some(book) => {
                let license = LicenseAgent::new(self.client.clone())
                    .persist_cache(false)
                    .acquire(&manifest, &book.paths.license_path())
                    .await
                    .map_err(|e| e.in_step(media_id, AcquisitionStep::AcquireLicense))?;
                steps.push(AcquisitionStep::AcquireLicense);
                Some(license)
            }
            None => None,
        };

        // SaveLicense
        if let (Some(book), Some(license)) = (&layout, &license) {
            if options.save_license {
                license
                    .save(&book.paths.license_path())
                    .await
                    .map_err(|e| e.in_step(media_id, AcquisitionStep::SaveLicense))?;
                steps.push(AcquisitionStep::SaveLicense);
            }
        }

        // DownloadParts
        let parts = match (&layout, &license) {
            (Some(book), Some(license)) if options.download_parts => {
                let report = self.download_parts(&manifest, license, &book.paths).await;
                steps.push(AcquisitionStep::DownloadParts);
                Some(report)
            }
            _ => None,
        };

        // DownloadCover
        let cover = match layout.as_ref().filter(|_| options.download_cover) {
            Some(book) => {
                steps.push(AcquisitionStep::DownloadCover);
                let result = self.download_cover(book).await;
                non_fatal(AcquisitionStep::DownloadCover, result)
            }
            None => StepOutcome::Skipped,
        };

        // ReturnLoan
        let loan_return = if options.return_loan {
            steps.push(AcquisitionStep::ReturnLoan);
            let result = self.client.return_loan(&manifest.return_url).await;
            non_fatal(AcquisitionStep::ReturnLoan, result)
        } else {
            StepOutcome::Skipped
        };

        let report = AcquisitionReport {
            media_id: manifest.media_id.clone(),
            book_dir: layout.map(|book| book.paths.book_dir().to_path_buf()),
            steps,
            parts,
            cover,
            loan_return,
        };

        match &report.parts {
            Some(parts) if !parts.all_succeeded() => {
                error!("acquisition incomplete: {parts}");
            }
            _ => info!("acquisition complete"),
        }

        Ok(report)
    }

    async fn create_book_dir(
        &self,
        manifest_path: &Path,
        manifest: &Manifest,
    ) -> Result<BookLayout> {
        let metadata = manifest.metadata()?;
        let paths = PathBuilder::new(manifest_path, &metadata);

        info!(path = %paths.book_dir().display(), "book folder");
        tokio::fs::create_dir_all(paths.book_dir()).await?;

        Ok(BookLayout { metadata, paths })
    }

    async fn download_parts(
        &self,
        manifest: &Manifest,
        license: &License,
        paths: &PathBuilder,
    ) -> PartsReport {
        let mut fetcher = PartFetcher::new(self.client.clone());
        if let Some(callback) = &self.progress {
            fetcher = fetcher.with_progress(callback.clone());
        }

        // The license names the client it was issued to; parts must present that same id
        DownloadManager::new(fetcher)
            .download_parts(manifest, license, license.client_id(), paths)
            .await
    }

    async fn download_cover(&self, book: &BookLayout) -> Result<()> {
        let cover_url = book.metadata.require_cover_url()?;
        let path = book.paths.cover_path();
        info!(path = %path.display(), "cover path");

        self.client.download_cover(cover_url, &path).await?;
        Ok(())
    }
}

fn non_fatal(step: AcquisitionStep, result: Result<()>) -> StepOutcome {
    match result {
        Ok(()) => StepOutcome::Done,
        Err(e) => {
            warn!(%step, error = %e, "step failed, continuing");
            StepOutcome::Failed(e)
        }
    }
}
