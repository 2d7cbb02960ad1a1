// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Streamer schema input model.
//!
//! This module provides the schema side of the decoder:
//! - Streamer-element records and the per-file class registry
//! - C++ type-name munging used by the planner's factory dispatch

pub mod streamer;
pub mod typename;

pub use streamer::{ftype, StreamerElement, StreamerRegistry};
pub use typename::{
    is_jagged_type, is_stl_container, map_key_val_types, regularize_object_path,
    sequence_element_type, strip_array_suffix, title_dims, top_type_name,
};
