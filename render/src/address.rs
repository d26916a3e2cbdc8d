//! Stable addressing for rendered nodes.
//!
//! Two conventions, both deterministic and collision-free among siblings:
//!
//! - **Table**: 1-based `R{row}C{col}` cell coordinates, with a parser for
//!   the inverse direction. Malformed input parses to `None`, never an
//!   error — callers are expected to check.
//! - **List**: a dotted chain of keys and indices. Keys containing the
//!   separator or the escape character are escaped (`\` doubles, `.`
//!   becomes `\.`), which keeps the mapping total without reserving any
//!   key characters. Only the table convention is required to round-trip.

use std::fmt;

/// The character joining list path segments.
pub const SEPARATOR: char = '.';

const ESCAPE: char = '\\';

/// One step in a path through nested input data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A key into a keyed map.
    Key(String),
    /// An index into a sequence.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(&escape_key(key)),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A parsed 1-based table cell reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    /// Row number, starting at 1.
    pub row: usize,
    /// Column number, starting at 1.
    pub col: usize,
}

/// Formats the table address for a 1-based row/column pair.
#[must_use]
pub fn cell_address(row: usize, col: usize) -> String {
    format!("R{row}C{col}")
}

/// Parses a table address back into its cell reference.
///
/// Returns `None` for anything that is not exactly `R{row}C{col}` with
/// positive numbers — malformed addresses are a caller-checked condition,
/// not a failure.
#[must_use]
pub fn parse_cell_address(address: &str) -> Option<CellRef> {
    let rest = address.strip_prefix('R')?;
    let c_pos = rest.find('C')?;
    let (row_digits, col_part) = rest.split_at(c_pos);
    let col_digits = &col_part[1..];
    if row_digits.is_empty() || col_digits.is_empty() {
        return None;
    }
    if !row_digits.bytes().all(|b| b.is_ascii_digit())
        || !col_digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let row = row_digits.parse().ok()?;
    let col = col_digits.parse().ok()?;
    if row == 0 || col == 0 {
        return None;
    }
    Some(CellRef { row, col })
}

/// Escapes a map key for use inside a dotted list address.
#[must_use]
pub fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for ch in key.chars() {
        if ch == ESCAPE || ch == SEPARATOR {
            escaped.push(ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

/// Formats the dotted list address for a path of keys and indices.
#[must_use]
pub fn list_address(path: &[PathSegment]) -> String {
    let mut address = String::new();
    for (position, segment) in path.iter().enumerate() {
        if position > 0 {
            address.push(SEPARATOR);
        }
        address.push_str(&segment.to_string());
    }
    address
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_addresses_round_trip() {
        for row in 1..=12 {
            for col in 1..=8 {
                let address = cell_address(row, col);
                assert_eq!(parse_cell_address(&address), Some(CellRef { row, col }));
            }
        }
    }

    #[test]
    fn malformed_cell_addresses_parse_to_none() {
        for bad in ["", "R", "RC", "R1", "C1", "R0C1", "R1C0", "r1c1", "R1C2x", "R-1C2", "R1.5C2"] {
            assert_eq!(parse_cell_address(bad), None, "{bad:?} should not parse");
        }
    }

    #[test]
    fn list_addresses_chain_keys_and_indices() {
        let path = [
            PathSegment::from("rows"),
            PathSegment::from(2usize),
            PathSegment::from("label"),
        ];
        assert_eq!(list_address(&path), "rows.2.label");
    }

    #[test]
    fn separator_characters_in_keys_are_escaped() {
        let path = [PathSegment::from("a.b"), PathSegment::from("c\\d")];
        assert_eq!(list_address(&path), "a\\.b.c\\\\d");
        // Sibling keys that would collide unescaped stay distinct.
        let plain = [PathSegment::from("a"), PathSegment::from("b")];
        assert_ne!(list_address(&path[..1]), list_address(&plain));
    }
}
