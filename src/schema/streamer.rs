// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Streamer-element records and the per-file streamer registry.
//!
//! The host file reader hands the decoder one [`StreamerElement`] per class
//! member, keyed by class name in a [`StreamerRegistry`]. Records keep the
//! on-file field names (`fName`, `fTypeName`, ...) through serde renames so
//! a registry can be loaded directly from JSON-ified streamer info.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::{DecodeError, Result};

/// Storage-category codes (`fType`) with special meaning to the planner.
///
/// Primitive codes 1-18 are mapped by the planner's primitive table.
pub mod ftype {
    /// Embedded base-class object
    pub const BASE_EMBEDDED: i32 = 0;
    /// Base `TObject`
    pub const BASE_TOBJECT: i32 = 66;
    /// STL container stored inside a fixed-size array
    pub const FIXED_STL: i32 = 82;
    /// Pointer-to-STL container
    pub const POINTER_TO_STL: i32 = 500;
}

fn default_ftype() -> i32 {
    -1
}

/// One member record of a streamed class description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamerElement {
    /// Member name
    #[serde(rename = "fName")]
    pub name: String,

    /// Member type name; may end with `[]` for a jagged trailing dimension.
    /// Absent for synthetic records.
    #[serde(rename = "fTypeName", default)]
    pub type_name: Option<String>,

    /// Storage-category code (see [`ftype`])
    #[serde(rename = "fType", default = "default_ftype")]
    pub ftype: i32,

    /// Number of fixed array dimensions
    #[serde(rename = "fArrayDim", default)]
    pub array_dim: u32,

    /// Fixed dimension sizes; meaningful for the first `fArrayDim` entries
    #[serde(rename = "fMaxIndex", default)]
    pub max_index: Vec<u32>,

    /// Byte width of one entry, when the whole entry is a fixed-width
    /// record; used to synthesize entry offsets
    #[serde(rename = "fSize", default)]
    pub size: Option<usize>,
}

impl StreamerElement {
    /// Create a record with just a name and a type name, as the planner
    /// does when it synthesizes container-element records.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        StreamerElement {
            name: name.into(),
            type_name: Some(type_name.into()),
            ftype: -1,
            array_dim: 0,
            max_index: Vec::new(),
            size: None,
        }
    }

    /// Set the storage-category code.
    pub fn with_ftype(mut self, ftype: i32) -> Self {
        self.ftype = ftype;
        self
    }

    /// Set the fixed array dimensions.
    pub fn with_dims(mut self, max_index: Vec<u32>) -> Self {
        self.array_dim = max_index.len() as u32;
        self.max_index = max_index;
        self
    }

    /// Set the per-entry byte width.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }
}

/// Mapping from class name to the ordered member records of that class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamerRegistry {
    classes: HashMap<String, Vec<StreamerElement>>,
}

impl StreamerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the member records of a class.
    pub fn insert(&mut self, class: impl Into<String>, members: Vec<StreamerElement>) {
        self.classes.insert(class.into(), members);
    }

    /// Look up the member records of a class.
    pub fn get(&self, class: &str) -> Option<&[StreamerElement]> {
        self.classes.get(class).map(Vec::as_slice)
    }

    /// Check if a class is registered.
    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Load a registry from JSON-ified streamer info: an object mapping
    /// class names to arrays of member records.
    pub fn from_json(json: &str) -> Result<Self> {
        let classes: HashMap<String, Vec<StreamerElement>> = serde_json::from_str(json)
            .map_err(|e| DecodeError::schema("", format!("invalid streamer info JSON: {e}")))?;
        Ok(StreamerRegistry { classes })
    }
}
