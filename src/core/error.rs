// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for rootcodec.
//!
//! Provides the closed error taxonomy of the decoder:
//! - Schema-to-plan failures (unknown types, inconsistent streamer records)
//! - Wire framing violations (byte counts, entry boundaries, object spans)
//! - Serialization-mode conflicts (object-wise vs. member-wise)
//! - Buffer underruns
//!
//! All errors are fatal for the branch being decoded; there is no retry
//! policy at this layer. Framing and mode errors carry the reader-name path
//! from the root of the reader tree down to the offending node, built up as
//! the error propagates outward.

use std::fmt;

/// Errors that can occur while planning or decoding a branch.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// No factory matched a streamer record
    UnknownType {
        /// Type name that could not be matched
        type_name: String,
        /// Dotted path of the item being planned
        item_path: String,
    },

    /// Wire framing violation: a read did not land where the stream said
    /// it should, or a byte-count header is malformed
    Framing {
        /// Reader-name path from root to the offending reader
        reader: String,
        /// Entry index, when the violation was detected at an entry boundary
        entry: Option<usize>,
        /// What was being checked (e.g. "entry boundary", "object span")
        what: &'static str,
        /// Expected byte span or value
        expected: u64,
        /// Observed byte span or value
        actual: u64,
        /// Cursor position when the error was raised
        cursor: u64,
    },

    /// A container was planned with one serialization mode but the wire
    /// version word indicates the other
    ModeMismatch {
        /// Reader-name path from root to the offending reader
        reader: String,
        /// Mode fixed by the plan
        planned: &'static str,
        /// Mode indicated by the version word
        wire: &'static str,
    },

    /// Streamer records that cannot describe a valid payload
    SchemaInconsistency {
        /// Dotted path of the item, when known
        item_path: String,
        /// What was wrong
        reason: String,
    },

    /// Buffer too short for the requested read
    BufferTooShort {
        /// Reader-name path, filled in as the error propagates
        reader: String,
        /// Requested bytes
        requested: usize,
        /// Available bytes
        available: usize,
        /// Cursor position when the error occurred
        cursor: u64,
    },
}

impl DecodeError {
    /// Create an "unknown type" error.
    pub fn unknown_type(type_name: impl Into<String>, item_path: impl Into<String>) -> Self {
        DecodeError::UnknownType {
            type_name: type_name.into(),
            item_path: item_path.into(),
        }
    }

    /// Create a framing error.
    pub fn framing(what: &'static str, expected: u64, actual: u64, cursor: u64) -> Self {
        DecodeError::Framing {
            reader: String::new(),
            entry: None,
            what,
            expected,
            actual,
            cursor,
        }
    }

    /// Create a mode-mismatch error.
    pub fn mode_mismatch(planned: &'static str, wire: &'static str) -> Self {
        DecodeError::ModeMismatch {
            reader: String::new(),
            planned,
            wire,
        }
    }

    /// Create a schema-inconsistency error.
    pub fn schema(item_path: impl Into<String>, reason: impl Into<String>) -> Self {
        DecodeError::SchemaInconsistency {
            item_path: item_path.into(),
            reason: reason.into(),
        }
    }

    /// Create a buffer-too-short error.
    pub fn buffer_too_short(requested: usize, available: usize, cursor: u64) -> Self {
        DecodeError::BufferTooShort {
            reader: String::new(),
            requested,
            available,
            cursor,
        }
    }

    /// Prepend a reader name to the error's reader path.
    ///
    /// Container readers call this as an error propagates upward, so the
    /// final report names the path from the root reader down to the node
    /// that failed.
    pub fn in_reader(mut self, name: &str) -> Self {
        match &mut self {
            DecodeError::Framing { reader, .. }
            | DecodeError::ModeMismatch { reader, .. }
            | DecodeError::BufferTooShort { reader, .. } => {
                if reader.is_empty() {
                    *reader = name.to_string();
                } else {
                    *reader = format!("{name}.{reader}");
                }
            }
            _ => {}
        }
        self
    }

    /// Attach an entry index to a framing error.
    pub fn at_entry(mut self, index: usize) -> Self {
        if let DecodeError::Framing { entry, .. } = &mut self {
            *entry = Some(index);
        }
        self
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            DecodeError::UnknownType {
                type_name,
                item_path,
            } => vec![
                ("type", type_name.clone()),
                ("item_path", item_path.clone()),
            ],
            DecodeError::Framing {
                reader,
                entry,
                what,
                expected,
                actual,
                cursor,
            } => {
                let mut fields = vec![
                    ("reader", reader.clone()),
                    ("what", what.to_string()),
                    ("expected", expected.to_string()),
                    ("actual", actual.to_string()),
                    ("cursor", cursor.to_string()),
                ];
                if let Some(i) = entry {
                    fields.push(("entry", i.to_string()));
                }
                fields
            }
            DecodeError::ModeMismatch {
                reader,
                planned,
                wire,
            } => vec![
                ("reader", reader.clone()),
                ("planned", planned.to_string()),
                ("wire", wire.to_string()),
            ],
            DecodeError::SchemaInconsistency { item_path, reason } => vec![
                ("item_path", item_path.clone()),
                ("reason", reason.clone()),
            ],
            DecodeError::BufferTooShort {
                reader,
                requested,
                available,
                cursor,
            } => vec![
                ("reader", reader.clone()),
                ("requested", requested.to_string()),
                ("available", available.to_string()),
                ("cursor", cursor.to_string()),
            ],
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownType {
                type_name,
                item_path,
            } => {
                write!(f, "Unknown type '{type_name}' for item '{item_path}'")
            }
            DecodeError::Framing {
                reader,
                entry,
                what,
                expected,
                actual,
                cursor,
            } => {
                write!(
                    f,
                    "Framing error in '{reader}': {what} expected {expected} but got {actual} (cursor {cursor}"
                )?;
                if let Some(i) = entry {
                    write!(f, ", entry {i}")?;
                }
                write!(f, ")")
            }
            DecodeError::ModeMismatch {
                reader,
                planned,
                wire,
            } => write!(
                f,
                "Mode mismatch in '{reader}': planned {planned} but wire indicates {wire}"
            ),
            DecodeError::SchemaInconsistency { item_path, reason } => {
                if item_path.is_empty() {
                    write!(f, "Inconsistent schema: {reason}")
                } else {
                    write!(f, "Inconsistent schema at '{item_path}': {reason}")
                }
            }
            DecodeError::BufferTooShort {
                reader,
                requested,
                available,
                cursor,
            } => write!(
                f,
                "Buffer too short in '{reader}': requested {requested} bytes at position {cursor}, but only {available} bytes available"
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Result type for rootcodec operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_display() {
        let err = DecodeError::unknown_type("TMystery", "/events/branch.field");
        let msg = err.to_string();
        assert!(msg.contains("TMystery"));
        assert!(msg.contains("/events/branch.field"));
    }

    #[test]
    fn test_framing_display_with_entry() {
        let err = DecodeError::framing("entry boundary", 24, 20, 20).at_entry(3);
        let msg = err.to_string();
        assert!(msg.contains("entry boundary"));
        assert!(msg.contains("entry 3"));
    }

    #[test]
    fn test_in_reader_builds_path() {
        let err = DecodeError::buffer_too_short(4, 0, 12)
            .in_reader("x")
            .in_reader("vec")
            .in_reader("event");
        match err {
            DecodeError::BufferTooShort { reader, .. } => {
                assert_eq!(reader, "event.vec.x");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_in_reader_ignores_schema_errors() {
        let err = DecodeError::schema("a.b", "fArrayDim without fMaxIndex").in_reader("r");
        assert!(matches!(err, DecodeError::SchemaInconsistency { .. }));
    }

    #[test]
    fn test_mode_mismatch_display() {
        let err = DecodeError::mode_mismatch("object-wise", "member-wise").in_reader("m");
        let msg = err.to_string();
        assert!(msg.contains("object-wise"));
        assert!(msg.contains("member-wise"));
        assert!(msg.contains('m'));
    }

    #[test]
    fn test_log_fields_framing() {
        let err = DecodeError::framing("object span", 10, 8, 30).at_entry(1);
        let fields = err.log_fields();
        assert!(fields.iter().any(|(k, v)| *k == "expected" && v == "10"));
        assert!(fields.iter().any(|(k, v)| *k == "entry" && v == "1"));
    }
}
