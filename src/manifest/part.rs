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


//! A single downloadable media segment

use crate::error::{OdmError, Result};
use roxmltree::Node;

/// One `Part` element of the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// Part number as written in the manifest (decimal, not assumed integral)
    pub number: f64,

    /// Expected size in bytes, used to verify the download
    pub file_size: u64,

    /// Human readable label
    pub name: String,

    /// Server-side file name, unescaped
    pub file_name: String,

    /// Opaque duration text
    pub duration: String,
}

impl Part {
    pub(crate) fn from_node(node: Node) -> Result<Self> {
        let number = attribute(node, "Part@number")?;
        let number = number.trim().parse::<f64>().map_err(|e| OdmError::Manifest {
            field: "Part@number",
            reason: format!("is not a decimal number ('{number}'): {e}"),
        })?;

        let file_size = attribute(node, "Part@filesize")?;
        let file_size = file_size.trim().parse::<u64>().map_err(|e| OdmError::Manifest {
            field: "Part@filesize",
            reason: format!("is not a byte count ('{file_size}'): {e}"),
        })?;

        Ok(Self {
            number,
            file_size,
            name: attribute(node, "Part@name")?.to_string(),
            file_name: attribute(node, "Part@filename")?.to_string(),
            duration: attribute(node, "Part@duration")?.to_string(),
        })
    }

    /// Server file name with `{` and `}` percent-escaped for use in a URL path
    pub fn escaped_file_name(&self) -> String {
        escape_braces(&self.file_name)
    }

    /// URL this part is served from
    pub fn server_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.escaped_file_name())
    }

    /// Part number as text, without a trailing `.0` for whole numbers
    pub fn number_label(&self) -> String {
        self.number.to_string()
    }
}

/// Escape the braces found in server-issued file names
///
/// Only `{` and `}` are touched; everything else is already URL-safe in the
/// names the content server hands out.
pub fn escape_braces(file_name: &str) -> String {
    file_name.replace('{', "%7B").replace('}', "%7D")
}

fn attribute<'a>(node: Node<'a, '_>, field: &'static str) -> Result<&'a str> {
    let name = field.rsplit('@').next().unwrap_or(field);
    node.attribute(name)
        .ok_or_else(|| OdmError::missing_manifest_field(field))
}
