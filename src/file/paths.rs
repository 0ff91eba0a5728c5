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


//! Book folder layout
//!
//! ```text
//! {manifest dir}/{creator} - {title}/
//!     {creator} - {title}.metadata
//!     {creator} - {title}.license
//!     cover.jpg
//!     Part 01.mp3 .. Part 12.mp3
//! ```

use crate::manifest::{Metadata, Part};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const COVER_FILE_NAME: &str = "cover.jpg";

/// Replace characters unsafe in a folder name with `-`
///
/// Keeps ASCII letters, digits, whitespace, `.`, `_` and `-`, then trims
/// leading and trailing `-` and spaces.
pub fn sanitize_component(input: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| {
        Regex::new(r"[^a-zA-Z0-9\s\._-]").expect("static regex is valid")
    });

    unsafe_chars
        .replace_all(input, "-")
        .trim_matches(|c| c == '-' || c == ' ')
        .to_string()
}

/// Paths of everything produced for one loan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathBuilder {
    name: String,
    book_dir: PathBuf,
}

impl PathBuilder {
    /// Layout for the book described by `metadata`, next to `manifest_path`
    pub fn new(manifest_path: &Path, metadata: &Metadata) -> Self {
        let name = format!(
            "{} - {}",
            sanitize_component(&metadata.creator),
            sanitize_component(&metadata.title)
        );
        let parent = manifest_path.parent().unwrap_or_else(|| Path::new(""));

        Self {
            book_dir: parent.join(&name),
            name,
        }
    }

    /// `{creator} - {title}`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn book_dir(&self) -> &Path {
        &self.book_dir
    }

    pub fn license_path(&self) -> PathBuf {
        self.book_dir.join(format!("{}.license", self.name))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.book_dir.join(format!("{}.metadata", self.name))
    }

    pub fn cover_path(&self) -> PathBuf {
        self.book_dir.join(COVER_FILE_NAME)
    }

    pub fn part_path(&self, part: &Part, width: usize) -> PathBuf {
        self.book_dir.join(Self::part_file_name(part, width))
    }

    /// `Part {number}.mp3`, number left-padded with `0` to `width`
    pub fn part_file_name(part: &Part, width: usize) -> String {
        format!("Part {:0>width$}.mp3", part.number_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(creator: &str, title: &str) -> Metadata {
        Metadata {
            title: title.to_string(),
            creator: creator.to_string(),
            cover_url: None,
            raw: String::new(),
        }
    }

    fn part(number: f64) -> Part {
        Part {
            number,
            file_size: 1,
            name: format!("Part {number}"),
            file_name: "p.mp3".to_string(),
            duration: "1".to_string(),
        }
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("Plain Title"), "Plain Title");
        assert_eq!(sanitize_component("What? Why: Now!"), "What- Why- Now");
        assert_eq!(sanitize_component("\"Quoted\""), "Quoted");
        assert_eq!(sanitize_component("Vol. 2_b-side"), "Vol. 2_b-side");
        assert_eq!(sanitize_component("Café"), "Caf");
    }

    #[test]
    fn test_layout() {
        let paths = PathBuilder::new(
            Path::new("/loans/book.odm"),
            &metadata("Jane Doe", "The Book: Part/One"),
        );

        assert_eq!(paths.name(), "Jane Doe - The Book- Part-One");
        assert_eq!(paths.book_dir(), Path::new("/loans/Jane Doe - The Book- Part-One"));
        assert_eq!(
            paths.license_path(),
            Path::new("/loans/Jane Doe - The Book- Part-One/Jane Doe - The Book- Part-One.license")
        );
        assert_eq!(
            paths.metadata_path(),
            Path::new("/loans/Jane Doe - The Book- Part-One/Jane Doe - The Book- Part-One.metadata")
        );
        assert_eq!(
            paths.cover_path(),
            Path::new("/loans/Jane Doe - The Book- Part-One/cover.jpg")
        );
    }

    #[test]
    fn test_relative_manifest_path() {
        let paths = PathBuilder::new(Path::new("book.odm"), &metadata("A", "B"));
        assert_eq!(paths.book_dir(), Path::new("A - B"));
    }

    #[test]
    fn test_part_file_name_padding() {
        assert_eq!(PathBuilder::part_file_name(&part(1.0), 1), "Part 1.mp3");
        assert_eq!(PathBuilder::part_file_name(&part(3.0), 2), "Part 03.mp3");
        assert_eq!(PathBuilder::part_file_name(&part(12.0), 2), "Part 12.mp3");
        assert_eq!(PathBuilder::part_file_name(&part(7.0), 3), "Part 007.mp3");
    }

    #[test]
    fn test_part_path_is_inside_book_dir() {
        let paths = PathBuilder::new(Path::new("/loans/book.odm"), &metadata("A", "B"));
        assert_eq!(
            paths.part_path(&part(4.0), 2),
            Path::new("/loans/A - B/Part 04.mp3")
        );
    }
}
