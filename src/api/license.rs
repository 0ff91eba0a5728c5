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


//! License acquisition
//!
//! Every part download must present a signed license issued to the client
//! identifier that requested it. A license is obtained once per loan, either
//! from a cache file or from the acquisition server.
//!
//! # License Request Flow
//!
//! 1. Generate a fresh client identifier (UUID v4, canonical text form)
//! 2. Build the signing payload
//!    `{clientId}|{omcVersion}|{osVersion}|ELOSNOC*AIDEM*EVIRDREVO`
//! 3. Encode the payload as UTF-16LE, SHA-1 it, base64 the digest (`Hash`)
//! 4. `GET {acquisitionUrl}?MediaID=..&ClientID=..&OMC=..&OS=..&Hash=..`
//! 5. The response body is the license, stored verbatim
//!
//! The trailing marker is `OVERDRIVE*MEDIA*CONSOLE` written backwards. The
//! server expects exactly that string.
//!
//! # License Document
//! ```xml
//! <License xmlns="http://license.overdrive.com/2008/03/License.xsd">
//!   <SignedInfo>
//!     <Version>..</Version>
//!     <ContentID>..</ContentID>
//!     <ClientID>..</ClientID>
//!   </SignedInfo>
//!   <Signature>..</Signature>
//! </License>
//! ```

use crate::api::client::OverDriveClient;
use crate::error::{OdmError, Result};
use crate::manifest::Manifest;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::HeaderValue;
use roxmltree::{Document, Node};
use sha1::{Digest, Sha1};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// XML namespace of license documents
pub const LICENSE_NAMESPACE: &str = "http://license.overdrive.com/2008/03/License.xsd";

/// `OVERDRIVE*MEDIA*CONSOLE`, reversed
const REVERSED_MARKER: &str = "ELOSNOC*AIDEM*EVIRDREVO";

/// Compute the `Hash` query parameter of a license request
///
/// Pure function of its inputs: base64(SHA-1(UTF-16LE(payload))).
pub fn auth_hash(client_id: &str, omc_version: &str, os_version: &str) -> String {
    let payload = format!("{client_id}|{omc_version}|{os_version}|{REVERSED_MARKER}");
    let utf16le: Vec<u8> = payload.encode_utf16().flat_map(u16::to_le_bytes).collect();

    general_purpose::STANDARD.encode(Sha1::digest(&utf16le))
}

/// Generate a new client identifier
pub fn generate_client_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// LICENSE DOCUMENT
// ============================================================================

/// A signed license
///
/// `raw_xml` is the canonical form: it is what gets cached and what is sent
/// in the `License` header. Only `ClientID` is required, since parts must be
/// requested with it; the other signed fields are read when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    raw_xml: String,
    client_id: String,
    version: Option<String>,
    content_id: Option<String>,
    signature: Option<String>,
}

impl License {
    /// Build a license from its raw text
    ///
    /// # Errors
    /// - `Xml` - not well-formed XML
    /// - `LicenseMalformed` - `SignedInfo/ClientID` is missing
    pub fn from_xml(raw_xml: impl Into<String>) -> Result<Self> {
        let raw_xml = raw_xml.into();
        let (client_id, version, content_id, signature) = {
            let doc = Document::parse(&raw_xml)?;
            let root = doc.root_element();
            let signed_info = ns_child(root, "SignedInfo");
            let signed = |name: &'static str| signed_info.and_then(|n| ns_text(n, name));

            let client_id = signed("ClientID").ok_or_else(|| {
                OdmError::LicenseMalformed("missing 'SignedInfo/ClientID'".to_string())
            })?;

            (
                client_id,
                signed("Version"),
                signed("ContentID"),
                ns_text(root, "Signature"),
            )
        };

        Ok(Self {
            raw_xml,
            client_id,
            version,
            content_id,
            signature,
        })
    }

    pub fn raw_xml(&self) -> &str {
        &self.raw_xml
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    /// Client identifier the license was issued to
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// License text as a `License` header value
    ///
    /// Surrounding whitespace is dropped. Interior line breaks cannot travel
    /// in a header and are rejected.
    pub fn header_value(&self) -> Result<HeaderValue> {
        HeaderValue::from_str(self.raw_xml.trim()).map_err(|_| {
            OdmError::LicenseMalformed(
                "license text contains characters not allowed in an HTTP header".to_string(),
            )
        })
    }

    /// Write the raw text to `path`
    pub async fn save(&self, path: &Path) -> Result<()> {
        info!(path = %path.display(), "saving license");
        tokio::fs::write(path, &self.raw_xml).await?;
        Ok(())
    }
}

fn ns_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.has_tag_name((LICENSE_NAMESPACE, name)))
}

/// Trimmed, non-empty text of a namespaced child element
fn ns_text(node: Node, name: &str) -> Option<String> {
    ns_child(node, name)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

// ============================================================================
// API FUNCTIONS
// ============================================================================

impl OverDriveClient {
    /// Request a license from the acquisition server
    ///
    /// # Endpoint
    /// `GET {acquisitionUrl}?MediaID={mediaId}&ClientID={clientId}&OMC={omc}&OS={os}&Hash={hash}`
    ///
    /// The query is concatenated as-is; the server expects the base64 hash
    /// unescaped.
    ///
    /// # Returns
    /// Response body, verbatim
    ///
    /// # Errors
    /// - `LicenseStatus` - non-2xx response
    /// - `Http` - transport failure
    pub async fn request_license(&self, manifest: &Manifest, client_id: &str) -> Result<String> {
        let config = self.config();
        let hash = auth_hash(client_id, &config.omc_version, &config.os_version);
        let request_url = format!(
            "{}?MediaID={}&ClientID={}&OMC={}&OS={}&Hash={}",
            manifest.acquisition_url,
            manifest.media_id,
            client_id,
            config.omc_version,
            config.os_version,
            hash
        );

        let response = self.get(&request_url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OdmError::LicenseStatus {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

// ============================================================================
// LICENSE AGENT
// ============================================================================

/// Obtains the license for a loan, from cache or from the server
#[derive(Debug, Clone)]
pub struct LicenseAgent {
    client: OverDriveClient,
    persist: bool,
}

impl LicenseAgent {
    /// Agent that writes server-issued licenses to the cache path
    pub fn new(client: OverDriveClient) -> Self {
        Self {
            client,
            persist: true,
        }
    }

    /// Whether a license fetched from the server is written to the cache path
    pub fn persist_cache(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Acquire the license for `manifest`
    ///
    /// If `cache_path` exists its contents are used as-is: no network call,
    /// and no check that the cached license belongs to this manifest.
    /// Otherwise one request goes to the acquisition server, and the issued
    /// license must name the client identifier that was sent.
    ///
    /// # Errors
    /// - `LicenseStatus` / `Http` - the server request failed
    /// - `LicenseMalformed` / `Xml` - the license text is unusable
    /// - `ClientIdMismatch` - the server issued the license to another client
    /// - `Io` - the cache file could not be read or written
    pub async fn acquire(&self, manifest: &Manifest, cache_path: &Path) -> Result<License> {
        if cache_path.is_file() {
            let raw = tokio::fs::read_to_string(cache_path).await?;
            info!(path = %cache_path.display(), "license read from file");
            return License::from_xml(raw);
        }

        info!(media_id = %manifest.media_id, "no license found, requesting one from the server");
        let client_id = generate_client_id();
        debug!(%client_id, "generated client id");

        let raw = self.client.request_license(manifest, &client_id).await?;
        let license = License::from_xml(raw)?;

        if license.client_id() != client_id {
            return Err(OdmError::ClientIdMismatch {
                expected: client_id,
                actual: license.client_id().to_string(),
            });
        }
        info!("license acquired from server");

        if self.persist {
            license.save(cache_path).await?;
        }

        Ok(license)
    }
}

// ============================================================================
// TESTS
// ============================================================================
