// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parse `key = value` parameter lines.
//!
//! Blank lines and lines starting with `#` are skipped.
//! Values end at the first space or `#`, only a comment may follow them.

use nom::{alt, anychar, do_parse, eof, is_not, many0, map, named, opt, space, tag, types::CompleteStr};

/// Parse parameter lines into `(key, value)` pairs, in file order.
pub fn parse(content: &str) -> Result<Vec<(String, String)>, String> {
    let mut params = Vec::new();
    for (line_number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match param_line(CompleteStr(line)) {
            Ok((_, Some((key, value)))) => {
                params.push((key.0.to_string(), value.0.to_string()));
            }
            Ok(_) => (),
            Err(_) => {
                return Err(format!(
                    "Parsing error at line {}: {}",
                    line_number + 1,
                    line
                ));
            }
        }
    }
    Ok(params)
}

// nom parsers #############################################################

// Parameter line is either a comment or a key value pair.
named!(param_line<CompleteStr, Option<(CompleteStr, CompleteStr)> >,
    alt!( map!(comment, |_| None) | map!(key_value, Some) )
);

// Parse a comment.
named!(comment<CompleteStr, ()>,
    do_parse!( tag!("#") >> many0!(anychar) >> () )
);

// Parse a key value pair.
named!(key_value<CompleteStr, (CompleteStr, CompleteStr)>,
    do_parse!(
        key: is_not!(" \t=#") >> opt!(space) >>
        tag!("=") >> opt!(space) >>
        value: is_not!(" \t#") >> opt!(space) >>
        opt!(comment) >> eof!() >>
        (key, value)
    )
);

// TESTS #############################################################
