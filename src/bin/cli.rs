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


//! `odm-dl`: download OverDrive loans from `.odm` files
//!
//! ```bash
//! odm-dl book.odm
//! odm-dl ~/Downloads/loans --save-license --no-return
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use odm_core::download::{DownloadState, PartProgress, ProgressCallback};
use odm_core::logging::{init_logging, LogConfig};
use odm_core::{Acquisition, BatchRunner, Config, OverDriveClient};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "odm-dl", version, about = "Download OverDrive loans from .odm manifests")]
struct Cli {
    /// An .odm file or a directory of .odm files
    path: PathBuf,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip downloading the audio parts
    #[arg(long)]
    no_parts: bool,

    /// Skip downloading the cover image
    #[arg(long)]
    no_cover: bool,

    /// Keep the loan instead of returning it
    #[arg(long)]
    no_return: bool,

    /// Save the license next to the parts
    #[arg(long)]
    save_license: bool,

    /// Save the embedded metadata document
    #[arg(long)]
    save_metadata: bool,

    /// Seconds to wait for a response or the next chunk of data
    #[arg(long)]
    timeout: Option<u64>,

    /// Debug output, including part progress
    #[arg(short, long)]
    verbose: bool,

    /// Write JSON logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("loading config '{}'", path.display()))?,
            None => Config::default(),
        };

        let options = &mut config.options;
        options.download_parts &= !self.no_parts;
        options.download_cover &= !self.no_cover;
        options.return_loan &= !self.no_return;
        options.save_license |= self.save_license;
        options.save_metadata |= self.save_metadata;

        if let Some(secs) = self.timeout {
            anyhow::ensure!(secs > 0, "--timeout must be at least one second");
            config.client.request_timeout_secs = secs;
        }

        Ok(config)
    }
}

fn progress_logger() -> ProgressCallback {
    Arc::new(|progress: PartProgress| {
        if progress.state == DownloadState::Downloading {
            tracing::debug!(
                part = %progress.part_name,
                percent = format_args!("{:.1}", progress.progress_percentage),
                bytes_per_second = progress.bytes_per_second,
                "downloading"
            );
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogConfig {
        verbose: cli.verbose,
        log_file: cli.log_file.clone(),
    })?;

    let config = cli.config()?;
    let client = OverDriveClient::new(config.client).context("creating HTTP client")?;
    let acquisition = Acquisition::new(client, config.options).with_progress(progress_logger());

    let summary = BatchRunner::new(acquisition)
        .run(&cli.path)
        .await
        .with_context(|| format!("reading '{}'", cli.path.display()))?;

    for loan in &summary.loans {
        match &loan.outcome {
            Ok(report) => {
                let parts = report
                    .parts
                    .as_ref()
                    .map_or_else(|| "skipped".to_string(), |p| p.to_string());
                let manifest = loan.manifest.display();
                println!("[DONE] {} ({manifest}): parts {parts}", report.media_id);
            }
            Err(e) => println!("[ERROR] {}: {e}", loan.manifest.display()),
        }
    }

    Ok(())
}
