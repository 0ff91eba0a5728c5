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


//! HTTP client for the lending service
//!
//! The service only talks to its own desktop client, so every request
//! identifies itself as OverDrive Media Console. The version values are part
//! of the license hash and must match what that client sends.

use crate::error::{OdmError, Result};
use std::future::Future;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// `User-Agent` of the emulated client
pub const USER_AGENT: &str = "OverDrive Media Console";

/// Emulated client version (`OMC` query parameter)
pub const OMC_VERSION: &str = "1.2.0";

/// Emulated OS version (`OS` query parameter)
pub const OS_VERSION: &str = "10.11.6";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Longest wait for a response or for the next body chunk
///
/// Not a whole-request limit: a large part on a slow link keeps going as long
/// as bytes keep arriving.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Client configuration
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub omc_version: String,
    pub os_version: String,
    pub connect_timeout_secs: u64,

    /// Idle limit for a response or body chunk, in seconds
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            omc_version: OMC_VERSION.to_string(),
            os_version: OS_VERSION.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Shared HTTP client
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct OverDriveClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl OverDriveClient {
    /// Build a client from configuration
    ///
    /// # Errors
    /// - `Http` - the TLS backend could not be initialised
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Await `future` for at most the request timeout
    ///
    /// Wraps each wait separately (response headers, then every body chunk).
    ///
    /// # Errors
    /// - `Timeout` - nothing arrived in time
    pub(crate) async fn idle_limited<F: Future>(&self, future: F) -> Result<F::Output> {
        let limit = Duration::from_secs(self.config.request_timeout_secs);
        tokio::time::timeout(limit, future)
            .await
            .map_err(|_| OdmError::Timeout(limit))
    }

    /// Plain GET carrying only the `User-Agent` header
    ///
    /// The status code is left for the caller to judge.
    pub(crate) async fn get(&self, url: &str) -> Result<reqwest::Response> {
        debug!(url, "GET");
        let request = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .send();
        Ok(self.idle_limited(request).await??)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_emulated_client() {
        let config = ClientConfig::default();
        assert_eq!(config.user_agent, "OverDrive Media Console");
        assert_eq!(config.omc_version, "1.2.0");
        assert_eq!(config.os_version, "10.11.6");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{ "request_timeout_secs": 60 }"#).unwrap();

        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert_eq!(config.user_agent, USER_AGENT);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        crate::logging::init_test_logging();
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client = OverDriveClient::new(ClientConfig {
            request_timeout_secs: 1,
            ..ClientConfig::default()
        })
        .unwrap();

        let err = client.get(&server.uri()).await.unwrap_err();
        assert!(matches!(err, OdmError::Timeout(limit) if limit == Duration::from_secs(1)));
    }

    #[test]
    fn test_client_builds() {
        let client = OverDriveClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.config().omc_version, OMC_VERSION);
    }
}
