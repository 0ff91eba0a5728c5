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


//! Title metadata embedded in the manifest
//!
//! The metadata block is its own XML document. Only three values are read:
//! - `//Title`
//! - the first `//Creator` whose `role` starts with `Author`
//! - `//CoverUrl` (optional here; the cover step reports its absence)

use super::inner_text;
use crate::error::{OdmError, Result};
use roxmltree::Document;

#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub creator: String,
    pub cover_url: Option<String>,

    /// Document text, written verbatim to `{name}.metadata`
    pub raw: String,
}

impl Metadata {
    pub fn parse(raw: &str) -> Result<Self> {
        let doc = Document::parse(raw)?;

        let title = doc
            .descendants()
            .find(|n| n.has_tag_name("Title"))
            .map(inner_text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| OdmError::missing_metadata_field("Title"))?;

        let creator = doc
            .descendants()
            .filter(|n| n.has_tag_name("Creator"))
            .find(|n| n.attribute("role").is_some_and(|r| r.starts_with("Author")))
            .map(inner_text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| OdmError::missing_metadata_field("Creator[@role^='Author']"))?;

        let cover_url = doc
            .descendants()
            .find(|n| n.has_tag_name("CoverUrl"))
            .map(inner_text)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        Ok(Self {
            title: title.trim().to_string(),
            creator: creator.trim().to_string(),
            cover_url,
            raw: raw.to_string(),
        })
    }

    /// Cover URL, or a `Metadata` error when the document has none
    pub fn require_cover_url(&self) -> Result<&str> {
        self.cover_url
            .as_deref()
            .ok_or_else(|| OdmError::missing_metadata_field("CoverUrl"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata() {
        let raw = r#"<Metadata>
            <Title>The Book</Title>
            <Creators>
              <Creator role="Narrator">Sam Reader</Creator>
              <Creator role="Author">Jane Doe</Creator>
              <Creator role="Author">John Roe</Creator>
            </Creators>
            <CoverUrl>https://img.example/cover.jpg</CoverUrl>
        </Metadata>"#;

        let metadata = Metadata::parse(raw).unwrap();
        assert_eq!(metadata.title, "The Book");
        assert_eq!(metadata.creator, "Jane Doe");
        assert_eq!(metadata.cover_url.as_deref(), Some("https://img.example/cover.jpg"));
        assert_eq!(metadata.raw, raw);
    }

    #[test]
    fn test_author_role_prefix() {
        let raw = r#"<Metadata><Title>T</Title><Creator role="Author (Foreword)">A</Creator></Metadata>"#;
        assert_eq!(Metadata::parse(raw).unwrap().creator, "A");
    }

    #[test]
    fn test_missing_author() {
        let raw = r#"<Metadata><Title>T</Title><Creator role="Narrator">N</Creator></Metadata>"#;
        assert!(matches!(
            Metadata::parse(raw),
            Err(OdmError::Metadata { field: "Creator[@role^='Author']", .. })
        ));
    }

    #[test]
    fn test_cover_is_optional() {
        let raw = r#"<Metadata><Title>T</Title><Creator role="Author">A</Creator></Metadata>"#;
        let metadata = Metadata::parse(raw).unwrap();

        assert!(metadata.cover_url.is_none());
        assert!(matches!(
            metadata.require_cover_url(),
            Err(OdmError::Metadata { field: "CoverUrl", .. })
        ));
    }
}
