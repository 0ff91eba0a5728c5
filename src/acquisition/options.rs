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


//! Acquisition configuration
//!
//! ```json
//! {
//!   "client": { "request_timeout_secs": 900 },
//!   "options": { "save_license": true, "return_loan": false }
//! }
//! ```
//!
//! Missing keys take their defaults.

use crate::api::client::ClientConfig;
use crate::error::{OdmError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which optional steps of an acquisition run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionOptions {
    pub download_parts: bool,
    pub download_cover: bool,
    pub save_license: bool,
    pub save_metadata: bool,
    pub return_loan: bool,
}

impl Default for AcquisitionOptions {
    fn default() -> Self {
        Self {
            download_parts: true,
            download_cover: true,
            save_license: false,
            save_metadata: false,
            return_loan: true,
        }
    }
}

impl AcquisitionOptions {
    /// Whether any step writes into the book folder
    pub fn write_to_disk(&self) -> bool {
        self.download_parts || self.download_cover || self.save_license || self.save_metadata
    }

    /// Whether a license must be acquired
    pub fn needs_license(&self) -> bool {
        self.download_parts || self.save_license
    }

    /// Load options from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Config::from_file(path)?.options)
    }
}

/// Full configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub options: AcquisitionOptions,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            OdmError::InvalidConfig(format!("cannot read '{}': {e}", path.display()))
        })?;
        let config: Config = serde_json::from_str(&text)?;

        if config.client.request_timeout_secs == 0 || config.client.connect_timeout_secs == 0 {
            return Err(OdmError::InvalidConfig("timeouts must be at least one second".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = AcquisitionOptions::default();
        assert!(options.download_parts);
        assert!(options.download_cover);
        assert!(options.return_loan);
        assert!(!options.save_license);
        assert!(!options.save_metadata);
        assert!(options.write_to_disk());
        assert!(options.needs_license());
    }

    #[test]
    fn test_return_only_writes_nothing() {
        let options = AcquisitionOptions {
            download_parts: false,
            download_cover: false,
            save_license: false,
            save_metadata: false,
            return_loan: true,
        };
        assert!(!options.write_to_disk());
        assert!(!options.needs_license());
    }

    #[test]
    fn test_save_license_needs_license() {
        let options = AcquisitionOptions {
            download_parts: false,
            save_license: true,
            ..Default::default()
        };
        assert!(options.needs_license());
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "client": { "request_timeout_secs": 900 }, "options": { "save_license": true, "return_loan": false } }"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.client.request_timeout_secs, 900);
        assert_eq!(config.client.user_agent, "OverDrive Media Console");
        assert!(config.options.save_license);
        assert!(!config.options.return_loan);
        assert!(config.options.download_parts);

        assert_eq!(AcquisitionOptions::from_file(&path).unwrap(), config.options);
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "client": { "connect_timeout_secs": 0 } }"#).unwrap();

        assert!(matches!(Config::from_file(&path), Err(OdmError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::from_file(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, OdmError::InvalidConfig(_)));
    }
}
