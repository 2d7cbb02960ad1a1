// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Columnar content type system.
//!
//! Provides the value types emitted by the assembler: flat numeric columns,
//! list-offset (ragged) columns, fixed-shape regular columns, and record
//! columns. All variants are serde-serializable so downstream tooling can
//! consume decoded branches without linking against this crate's internals.
//!
//! A parallel, data-less description of the same taxonomy ([`Form`]) is
//! available for schema-only consumers that need to know the shape of a
//! branch before any bytes are decoded.

use serde::{Deserialize, Serialize};

/// Primitive column element type.
///
/// The closed dtype set of the decoder. Booleans are decoded as single
/// bytes and only re-typed to `Bool` at assembly time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl PrimitiveType {
    /// Canonical dtype name, as used by columnar analysis libraries.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt8 => "uint8",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
        }
    }

    /// On-the-wire width of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            PrimitiveType::Bool | PrimitiveType::Int8 | PrimitiveType::UInt8 => 1,
            PrimitiveType::Int16 | PrimitiveType::UInt16 => 2,
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float32 => 4,
            PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Float64 => 8,
        }
    }
}

/// A flat, typed buffer of primitive values.
///
/// Used both as reader output (append-only, native endianness) and as the
/// payload of [`Content::Numeric`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NumericData {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl NumericData {
    /// Create an empty buffer for decoding values of `ctype`.
    ///
    /// Booleans are stored as raw bytes during decoding; the assembler
    /// re-types them.
    pub fn for_ctype(ctype: PrimitiveType) -> Self {
        match ctype {
            PrimitiveType::Bool | PrimitiveType::UInt8 => NumericData::UInt8(Vec::new()),
            PrimitiveType::Int8 => NumericData::Int8(Vec::new()),
            PrimitiveType::Int16 => NumericData::Int16(Vec::new()),
            PrimitiveType::Int32 => NumericData::Int32(Vec::new()),
            PrimitiveType::Int64 => NumericData::Int64(Vec::new()),
            PrimitiveType::UInt16 => NumericData::UInt16(Vec::new()),
            PrimitiveType::UInt32 => NumericData::UInt32(Vec::new()),
            PrimitiveType::UInt64 => NumericData::UInt64(Vec::new()),
            PrimitiveType::Float32 => NumericData::Float32(Vec::new()),
            PrimitiveType::Float64 => NumericData::Float64(Vec::new()),
        }
    }

    /// Number of elements in the buffer.
    pub fn len(&self) -> usize {
        match self {
            NumericData::Bool(v) => v.len(),
            NumericData::Int8(v) => v.len(),
            NumericData::Int16(v) => v.len(),
            NumericData::Int32(v) => v.len(),
            NumericData::Int64(v) => v.len(),
            NumericData::UInt8(v) => v.len(),
            NumericData::UInt16(v) => v.len(),
            NumericData::UInt32(v) => v.len(),
            NumericData::UInt64(v) => v.len(),
            NumericData::Float32(v) => v.len(),
            NumericData::Float64(v) => v.len(),
        }
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dtype of the stored values.
    pub fn dtype(&self) -> PrimitiveType {
        match self {
            NumericData::Bool(_) => PrimitiveType::Bool,
            NumericData::Int8(_) => PrimitiveType::Int8,
            NumericData::Int16(_) => PrimitiveType::Int16,
            NumericData::Int32(_) => PrimitiveType::Int32,
            NumericData::Int64(_) => PrimitiveType::Int64,
            NumericData::UInt8(_) => PrimitiveType::UInt8,
            NumericData::UInt16(_) => PrimitiveType::UInt16,
            NumericData::UInt32(_) => PrimitiveType::UInt32,
            NumericData::UInt64(_) => PrimitiveType::UInt64,
            NumericData::Float32(_) => PrimitiveType::Float32,
            NumericData::Float64(_) => PrimitiveType::Float64,
        }
    }
}

/// A ragged column: `offsets[i]..offsets[i+1]` addresses element `i` of the
/// inner content. Offsets start at 0 and are monotone non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListOffsetArray {
    pub offsets: Vec<i64>,
    pub content: Box<Content>,
    /// Whether the column carries character data and should be presented
    /// as strings rather than byte lists
    pub is_string: bool,
}

impl ListOffsetArray {
    /// Number of lists in the column.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Check if the column has no lists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialize the column as strings, when it carries character data.
    pub fn strings(&self) -> Option<Vec<String>> {
        if !self.is_string {
            return None;
        }
        let bytes = match self.content.as_ref() {
            Content::Numeric(NumericData::UInt8(b)) => b,
            _ => return None,
        };
        let mut out = Vec::with_capacity(self.len());
        for w in self.offsets.windows(2) {
            let (start, end) = (w[0] as usize, w[1] as usize);
            out.push(String::from_utf8_lossy(&bytes[start..end]).into_owned());
        }
        Some(out)
    }
}

/// A fixed-shape column: every element of the outer axis holds exactly
/// `size` elements of the inner content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularArray {
    pub size: usize,
    pub content: Box<Content>,
}

impl RegularArray {
    /// Number of fixed-size groups in the column.
    pub fn len(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            self.content.len() / self.size
        }
    }
}

/// A record column: parallel named field columns of equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordArray {
    pub fields: Vec<String>,
    pub contents: Vec<Content>,
}

impl RecordArray {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.contents.first().map_or(0, Content::len)
    }

    /// Look up a field column by name.
    pub fn field(&self, name: &str) -> Option<&Content> {
        self.fields
            .iter()
            .position(|f| f == name)
            .map(|i| &self.contents[i])
    }
}

/// Columnar content emitted by the assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Content {
    /// Flat numeric column
    Numeric(NumericData),
    /// Ragged column addressed by offsets
    ListOffset(ListOffsetArray),
    /// Fixed-shape column
    Regular(RegularArray),
    /// Record of named field columns
    Record(RecordArray),
    /// Zero-length placeholder column
    Empty,
}

impl Content {
    /// Outer length of the column.
    pub fn len(&self) -> usize {
        match self {
            Content::Numeric(data) => data.len(),
            Content::ListOffset(list) => list.len(),
            Content::Regular(reg) => reg.len(),
            Content::Record(rec) => rec.len(),
            Content::Empty => 0,
        }
    }

    /// Check if the column has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Access the flat numeric payload, if this is a numeric column.
    pub fn as_numeric(&self) -> Option<&NumericData> {
        match self {
            Content::Numeric(data) => Some(data),
            _ => None,
        }
    }

    /// Access the list-offset payload, if this is a ragged column.
    pub fn as_list(&self) -> Option<&ListOffsetArray> {
        match self {
            Content::ListOffset(list) => Some(list),
            _ => None,
        }
    }

    /// Access the regular payload, if this is a fixed-shape column.
    pub fn as_regular(&self) -> Option<&RegularArray> {
        match self {
            Content::Regular(reg) => Some(reg),
            _ => None,
        }
    }

    /// Access the record payload, if this is a record column.
    pub fn as_record(&self) -> Option<&RecordArray> {
        match self {
            Content::Record(rec) => Some(rec),
            _ => None,
        }
    }
}

/// Data-less description of a column's shape.
///
/// Mirrors [`Content`] variant for variant; produced from a plan alone so
/// callers can know a branch's layout without decoding any bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Form {
    Numeric(PrimitiveType),
    ListOffset {
        content: Box<Form>,
        is_string: bool,
    },
    Regular {
        size: usize,
        content: Box<Form>,
    },
    Record {
        fields: Vec<String>,
        contents: Vec<Form>,
    },
    Empty,
}
