// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions to handle image sequences in the TUM RGB-D format.
//!
//! Image lists (`rgb.txt`, `depth.txt`) have one image per line,
//! `timestamp file_path`, and comment lines starting with `#`.
//! File paths are relative to the directory of the list.

use std::path::{Path, PathBuf};

/// Timestamp and file path of an image of the sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    /// Timestamp of the image, in seconds.
    pub timestamp: f64,
    /// File path of the image.
    pub file_path: PathBuf,
}

impl ImageEntry {
    /// Make the file path relative to `dir` (usually the directory of the list).
    pub fn relative_to<P: AsRef<Path>>(&self, dir: P) -> Self {
        Self {
            timestamp: self.timestamp,
            file_path: dir.as_ref().join(&self.file_path),
        }
    }
}

/// Parse useful files in a dataset using the TUM RGB-D format.
pub mod parse {
    use super::*;
    use nom::{alt, anychar, do_parse, double, is_not, many0, map, named, space, tag, types::CompleteStr};

    /// Parse an image list file into a vector of `ImageEntry`.
    pub fn images(file_content: &str) -> Result<Vec<ImageEntry>, String> {
        let mut entries = Vec::new();
        for line in file_content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match image_line(CompleteStr(line)) {
                Ok((_, Some(entry))) => entries.push(entry),
                Ok(_) => (),
                Err(_) => return Err(format!("Parsing error: {}", line)),
            }
        }
        Ok(entries)
    }

    // nom parsers #############################################################

    // Image line is either a comment or a timestamp and a file path.
    named!(image_line<CompleteStr, Option<ImageEntry> >,
        alt!( map!(comment, |_| None) | map!(image_entry, Some) )
    );

    // Parse a comment.
    named!(comment<CompleteStr, ()>,
        do_parse!( tag!("#") >> many0!(anychar) >> () )
    );

    // Parse a timestamp and a file path.
    named!(image_entry<CompleteStr, ImageEntry>,
        do_parse!(
            timestamp: double >> space >>
            file_path: path >>
            (ImageEntry { timestamp, file_path })
        )
    );

    named!(path<CompleteStr, PathBuf>,
        map!(is_not!(" \t\r\n"), |s| PathBuf::from(*s))
    );
} // pub mod parse

// TESTS #############################################################
