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


//! Logging initialization
//!
//! `RUST_LOG` takes precedence over the configured level.

use crate::error::{OdmError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Debug output, including per-part progress
    pub verbose: bool,

    /// Write JSON lines here instead of compact stdout output
    pub log_file: Option<PathBuf>,
}

impl LogConfig {
    fn level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

/// Install the global subscriber
///
/// # Errors
/// - `InvalidConfig` - bad filter, unwritable log file, or a subscriber is
///   already installed
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let level = config.level();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("odm_core={level},odm_dl={level}")))
        .map_err(|e| OdmError::InvalidConfig(format!("failed to create log filter: {e}")))?;

    match &config.log_file {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                let path = path.display();
                OdmError::InvalidConfig(format!("failed to create log file '{path}': {e}"))
            })?;
            let fmt_layer = fmt::layer()
                .with_writer(file)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(false)
                .json();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
        None => {
            let fmt_layer = fmt::layer()
                .with_target(false)
                .with_span_events(FmtSpan::NONE)
                .compact();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
    }
    .map_err(|e| OdmError::InvalidConfig(format!("logging already initialized: {e}")))
}

/// Route logs through the test harness
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("odm_core=debug"));
        let fmt_layer = fmt::layer().with_test_writer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok();
    });
}
