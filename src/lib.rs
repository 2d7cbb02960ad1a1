// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Rootcodec
//!
//! Streamer-driven decoder for ROOT TTree branch payloads.
//!
//! The on-disk format is schema-driven: for every user class the file
//! embeds a streamer description (member names, type names, storage
//! categories, array dimensions) from which a reader must be synthesized
//! at runtime. This library builds that reader and turns flat big-endian
//! basket bytes into columnar, possibly-ragged arrays:
//!
//! - **[`plan`]** - walk a streamer schema into an immutable decode plan
//! - **[`read_branch`]** - decode one basket of a branch end to end
//! - **[`read_baskets`]** - decode independent baskets in parallel
//! - **[`form_of`]** - derive the output shape without decoding bytes
//!
//! ## Example: decoding a flat branch
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use rootcodec::{read_branch, FactorySet, StreamerElement, StreamerRegistry};
//!
//! // two entries of a uint32 branch
//! let data = [0x00, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x2B];
//! let offsets = [0u64, 4, 8];
//! let element = StreamerElement::new("x", "uint32_t").with_ftype(13);
//!
//! let content = read_branch(
//!     &data,
//!     Some(&offsets),
//!     &element,
//!     &StreamerRegistry::new(),
//!     "/events/x",
//!     &FactorySet::new(),
//! )?;
//! assert_eq!(content.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom readers
//!
//! Branches with bespoke on-disk layouts register a [`UserFactory`] in a
//! [`FactorySet`]; the factory matches by item path or class name, plans a
//! [`CustomPlan`] node, and owns reader construction and assembly for it.

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{
    Content, DecodeError, Form, ListOffsetArray, NumericData, PrimitiveType, RecordArray,
    RegularArray, Result,
};

// Streamer schema input
pub mod schema;

pub use schema::{ftype, title_dims, StreamerElement, StreamerRegistry};

// Plan / build / decode pipeline
pub mod decode;

pub use decode::{
    build, decode as decode_entries, plan, read_branch, read_branch_with, read_baskets, Basket,
    Cursor, CustomPlan, FactorySet, Mode, Plan, PlanContext, RawData, Reader, UserFactory,
};

// Raw buffers to columnar content
pub mod assemble;

pub use assemble::{assemble, form_of};
