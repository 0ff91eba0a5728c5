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


//! Loan manifest (`.odm`) parsing
//!
//! A manifest is read once and parsed eagerly into a [`Manifest`]. Every
//! required node is checked in one place and a missing node produces an
//! [`OdmError::Manifest`] naming that node.
//!
//! # Document shape
//! ```xml
//! <OverDriveMedia id="{media id}">
//!   <License><AcquisitionUrl>https://...</AcquisitionUrl></License>
//!   <![CDATA[<Metadata>...</Metadata>]]>
//!   <EarlyReturnURL>https://...</EarlyReturnURL>
//!   <Formats><Format>
//!     <Protocols><Protocol baseurl="https://..."/></Protocols>
//!     <Parts>
//!       <Part number="1" filesize="1000" name="Part 1" filename="{...}.mp3" duration="10:00"/>
//!     </Parts>
//!   </Format></Formats>
//! </OverDriveMedia>
//! ```
//!
//! No URL validation or size plausibility checks happen here; those surface
//! later as network and verification results.

pub mod metadata;
pub mod part;

pub use metadata::Metadata;
pub use part::Part;

use crate::error::{OdmError, Result};
use roxmltree::{Document, Node};
use std::path::Path;

/// Field names reported in [`OdmError::Manifest`]
pub mod fields {
    pub const MEDIA_ID: &str = "id";
    pub const ACQUISITION_URL: &str = "License/AcquisitionUrl";
    pub const BASE_URL: &str = "Protocol@baseurl";
    pub const RETURN_URL: &str = "EarlyReturnURL";
    pub const METADATA: &str = "Metadata";
    pub const PARTS: &str = "Part";
}

/// Parsed, read-only view of a loan manifest
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Identifier of the loaned title (root `id` attribute)
    pub media_id: String,

    /// License request endpoint
    pub acquisition_url: String,

    /// Base URL parts are downloaded from
    pub base_content_url: String,

    /// Early return endpoint
    pub return_url: String,

    /// Embedded metadata XML, kept verbatim
    pub metadata_block: String,

    /// Parts in document order
    pub parts: Vec<Part>,
}

impl Manifest {
    /// Parse manifest text
    ///
    /// # Errors
    /// - `Xml` - the text is not well-formed XML
    /// - `Manifest` - a required node or attribute is missing or empty
    pub fn parse(manifest_text: &str) -> Result<Self> {
        let doc = Document::parse(manifest_text)?;
        let root = doc.root_element();

        let media_id = non_empty(root.attribute("id"), fields::MEDIA_ID)?;

        let license = doc
            .descendants()
            .find(|n| n.has_tag_name("License") && child_element(*n, "AcquisitionUrl").is_some())
            .ok_or_else(|| OdmError::missing_manifest_field(fields::ACQUISITION_URL))?;
        let acquisition_url = child_element(license, "AcquisitionUrl")
            .map(inner_text)
            .unwrap_or_default();
        let acquisition_url = non_empty(Some(acquisition_url.as_str()), fields::ACQUISITION_URL)?;

        let base_content_url = non_empty(
            find_element(&doc, "Protocol").and_then(|n| n.attribute("baseurl")),
            fields::BASE_URL,
        )?;

        let return_url = find_element(&doc, "EarlyReturnURL").map(inner_text);
        let return_url = non_empty(return_url.as_deref(), fields::RETURN_URL)?;

        let metadata_block = metadata_sibling(license);
        let metadata_block = non_empty(metadata_block.as_deref(), fields::METADATA)?;

        let parts = doc
            .descendants()
            .filter(|n| n.has_tag_name("Part"))
            .map(Part::from_node)
            .collect::<Result<Vec<_>>>()?;

        if parts.is_empty() {
            return Err(OdmError::missing_manifest_field(fields::PARTS));
        }

        Ok(Self {
            media_id,
            acquisition_url,
            base_content_url,
            return_url,
            metadata_block,
            parts,
        })
    }

    /// Read and parse a manifest file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse the embedded metadata block
    pub fn metadata(&self) -> Result<Metadata> {
        Metadata::parse(&self.metadata_block)
    }

    /// Decimal width of the part count, used to zero-pad part file names
    pub fn part_number_width(&self) -> usize {
        self.parts.len().to_string().len()
    }
}

fn non_empty(value: Option<&str>, field: &'static str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        Some(_) => Err(OdmError::Manifest {
            field,
            reason: "is empty".to_string(),
        }),
        None => Err(OdmError::missing_manifest_field(field)),
    }
}

fn find_element<'a, 'input>(doc: &'a Document<'input>, name: &str) -> Option<Node<'a, 'input>> {
    doc.descendants().find(|n| n.has_tag_name(name))
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

/// Concatenated text of all descendant text nodes
pub(crate) fn inner_text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// First non-blank text node following the `License` element
///
/// The metadata document is embedded as CDATA right after `License`, so it
/// surfaces as a sibling text node rather than an element.
fn metadata_sibling(license: Node) -> Option<String> {
    std::iter::successors(license.next_sibling(), |n| n.next_sibling())
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}
