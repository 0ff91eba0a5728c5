//! Test helpers for acquisition integration tests
//!
//! A `wiremock` server stands in for all three lending servers. Paths:
//! - `/license/acquire` - license server
//! - `/x/{filename}` - content server
//! - `/cover.jpg` - cover image
//! - `/loan/return` - early return

#![allow(dead_code)]

use odm_core::api::license::LICENSE_NAMESPACE;
use odm_core::{ClientConfig, OverDriveClient};
use std::path::{Path, PathBuf};
use wiremock::{Request, Respond, ResponseTemplate};

pub const MEDIA_ID: &str = "0A1B2C3D-0000-4E5F-A6B7-C8D9E0F1A2B3";

/// Folder name derived from the sample metadata
pub const BOOK_FOLDER: &str = "Jane Doe - The Test Book";

pub const METADATA: &str = "<Metadata><Title>The Test Book</Title><Creators><Creator role=\"Narrator\">Sam Reader</Creator><Creator role=\"Author\">Jane Doe</Creator></Creators><CoverUrl>{uri}/cover.jpg</CoverUrl></Metadata>";

/// One `Part` element: server file name and declared size
pub struct PartFixture<'a> {
    pub file_name: &'a str,
    pub file_size: u64,
}

pub fn part(file_name: &str, file_size: u64) -> PartFixture<'_> {
    PartFixture {
        file_name,
        file_size,
    }
}

/// Manifest pointing every endpoint at `uri`
pub fn sample_manifest_xml(uri: &str, parts: &[PartFixture]) -> String {
    let parts_xml: String = parts
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                r#"<Part number="{n}" filesize="{size}" name="Part {n}" filename="{file}" duration="05:00" />"#,
                n = i + 1,
                size = p.file_size,
                file = p.file_name
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<OverDriveMedia id="{MEDIA_ID}" ODMVersion="1.2" OverDriveMediaConsole="2.0">
<License><AcquisitionUrl>{uri}/license/acquire</AcquisitionUrl></License>
<![CDATA[{metadata}]]>
<EarlyReturnURL>{uri}/loan/return</EarlyReturnURL>
<Formats>
  <Format name="MP3 Format">
    <Protocols><Protocol method="download" baseurl="{uri}/x" /></Protocols>
    <Parts count="{count}">{parts_xml}</Parts>
  </Format>
</Formats>
</OverDriveMedia>"#,
        metadata = METADATA.replace("{uri}", uri),
        count = parts.len(),
    )
}

/// License document issued to `client_id`
pub fn sample_license_xml(client_id: &str) -> String {
    format!(
        r#"<License xmlns="{LICENSE_NAMESPACE}"><SignedInfo><Version>2.0</Version><ContentID>{MEDIA_ID}</ContentID><ClientID>{client_id}</ClientID></SignedInfo><Signature>U2lnbmF0dXJl</Signature></License>"#
    )
}

/// Write `xml` as `book.odm` in `dir`
pub fn write_manifest(dir: &Path, xml: &str) -> PathBuf {
    let path = dir.join("book.odm");
    std::fs::write(&path, xml).expect("write manifest");
    path
}

pub fn client() -> OverDriveClient {
    let config = ClientConfig {
        connect_timeout_secs: 5,
        request_timeout_secs: 30,
        ..ClientConfig::default()
    };
    OverDriveClient::new(config).expect("build client")
}

/// Issues a license to whatever `ClientID` the request carries
pub struct EchoLicense;

impl Respond for EchoLicense {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let client_id = query_value(request, "ClientID").unwrap_or_default();
        ResponseTemplate::new(200).set_body_string(sample_license_xml(&client_id))
    }
}

/// Issues a license carrying nothing but the requested `ClientID`
pub struct BareLicense;

impl Respond for BareLicense {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let client_id = query_value(request, "ClientID").unwrap_or_default();
        ResponseTemplate::new(200).set_body_string(format!(
            r#"<License xmlns="{LICENSE_NAMESPACE}"><SignedInfo><ClientID>{client_id}</ClientID></SignedInfo></License>"#
        ))
    }
}

/// Raw (undecoded) query parameter value
pub fn query_value(request: &Request, key: &str) -> Option<String> {
    request
        .url
        .query()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}

/// First value of a request header
pub fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
