// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decode plan trees.
//!
//! A plan is an immutable value tree describing how to decode one branch:
//! each node names a reader kind and carries kind-specific parameters plus
//! child plans. Plans are a pure function of the streamer schema, cheap to
//! clone, comparable, serializable, and cacheable; the mutable reader tree
//! is built from them per basket.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::PrimitiveType;

/// Serialization mode fixed by a plan for an STL container.
///
/// `Auto` defers to the wire's version word; the other two are checked
/// against it and conflict is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Auto,
    ObjectWise,
    MemberWise,
}

impl Mode {
    /// Human-readable name, as used in mode-mismatch reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::ObjectWise => "object-wise",
            Mode::MemberWise => "member-wise",
        }
    }
}

/// Context threaded through planning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanContext {
    /// True only for the outermost call; factories use it to suppress
    /// leading per-entry framing when the entry itself is the framing
    /// boundary
    pub called_from_top: bool,
    /// True when the host branch declares a jagged trailing dimension in
    /// its title (see [`crate::schema::title_dims`])
    pub branch_jagged: bool,
}

impl PlanContext {
    /// Context for the outermost planning call of a branch.
    pub fn top() -> Self {
        PlanContext {
            called_from_top: true,
            branch_jagged: false,
        }
    }

    /// Mark the branch as jagged.
    pub fn jagged(mut self) -> Self {
        self.branch_jagged = true;
        self
    }
}

/// A user-override plan node.
///
/// Recognized only by the [`UserFactory`](crate::decode::UserFactory) whose
/// `id` it records; the factory builds its reader and assembles its content.
/// `params` is an opaque parameter bag and `children` may hold builtin
/// plans the factory composes with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPlan {
    pub factory_id: String,
    pub name: String,
    pub params: serde_json::Value,
    pub children: Vec<Plan>,
}

/// One node of a decode plan tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Plan {
    /// Fixed-width numeric leaf
    Primitive { name: String, ctype: PrimitiveType },

    /// `TString`: length-prefixed character data
    TString { name: String },

    /// `std::string`, optionally preceded by a byte-count + version header
    StlString { name: String, with_header: bool },

    /// Sequence-like STL container (`vector`, `set`, ...)
    StlSeq {
        name: String,
        with_header: bool,
        mode: Mode,
        element: Box<Plan>,
    },

    /// Mapping-like STL container (`map`, `unordered_map`, ...)
    StlMap {
        name: String,
        with_header: bool,
        mode: Mode,
        key: Box<Plan>,
        val: Box<Plan>,
    },

    /// `TArray*`: u32 count followed by that many primitives
    TArray { name: String, ctype: PrimitiveType },

    /// Base `TObject`; payload is kept only for configured item paths
    TObject { name: String, keep_data: bool },

    /// C-style array; `flat_size < 0` marks a jagged trailing dimension
    CArray {
        name: String,
        flat_size: i64,
        array_dim: u32,
        max_index: Vec<u32>,
        element: Box<Plan>,
    },

    /// Byte-count + version header in front of an element
    NBytesVersion { name: String, element: Box<Plan> },

    /// Sequence of sub-readers with no framing of its own
    Group { name: String, subs: Vec<Plan> },

    /// Embedded base-class object: header + members, span unchecked
    BaseObject { name: String, subs: Vec<Plan> },

    /// User-class fallback: header + members, span checked
    AnyClass { name: String, subs: Vec<Plan> },

    /// Polymorphic object header (byte-count + tag + optional class name)
    /// in front of an element
    ObjectHeader { name: String, element: Box<Plan> },

    /// Consumes no bytes, yields an empty column
    Empty { name: String },

    /// User-override node
    Custom(CustomPlan),
}

impl Plan {
    /// Diagnostic name of this node.
    pub fn name(&self) -> &str {
        match self {
            Plan::Primitive { name, .. }
            | Plan::TString { name }
            | Plan::StlString { name, .. }
            | Plan::StlSeq { name, .. }
            | Plan::StlMap { name, .. }
            | Plan::TArray { name, .. }
            | Plan::TObject { name, .. }
            | Plan::CArray { name, .. }
            | Plan::NBytesVersion { name, .. }
            | Plan::Group { name, .. }
            | Plan::BaseObject { name, .. }
            | Plan::AnyClass { name, .. }
            | Plan::ObjectHeader { name, .. }
            | Plan::Empty { name } => name,
            Plan::Custom(custom) => &custom.name,
        }
    }

    /// Toggle the leading byte-count + version header of an STL node.
    /// No-op for other kinds.
    pub fn set_with_header(&mut self, value: bool) {
        match self {
            Plan::StlString { with_header, .. }
            | Plan::StlSeq { with_header, .. }
            | Plan::StlMap { with_header, .. } => *with_header = value,
            _ => {}
        }
    }

    /// Fix the serialization mode of an STL container node. No-op for
    /// other kinds.
    pub fn force_mode(&mut self, value: Mode) {
        match self {
            Plan::StlSeq { mode, .. } | Plan::StlMap { mode, .. } => *mode = value,
            _ => {}
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            Plan::Primitive { name, ctype } => {
                writeln!(f, "{pad}Primitive '{name}' ({})", ctype.name())
            }
            Plan::TString { name } => writeln!(f, "{pad}TString '{name}'"),
            Plan::StlString { name, with_header } => {
                writeln!(f, "{pad}StlString '{name}' (header: {with_header})")
            }
            Plan::StlSeq {
                name,
                with_header,
                mode,
                element,
            } => {
                writeln!(
                    f,
                    "{pad}StlSeq '{name}' (header: {with_header}, mode: {})",
                    mode.as_str()
                )?;
                element.fmt_indented(f, indent + 1)
            }
            Plan::StlMap {
                name,
                with_header,
                mode,
                key,
                val,
            } => {
                writeln!(
                    f,
                    "{pad}StlMap '{name}' (header: {with_header}, mode: {})",
                    mode.as_str()
                )?;
                key.fmt_indented(f, indent + 1)?;
                val.fmt_indented(f, indent + 1)
            }
            Plan::TArray { name, ctype } => {
                writeln!(f, "{pad}TArray '{name}' ({})", ctype.name())
            }
            Plan::TObject { name, keep_data } => {
                writeln!(f, "{pad}TObject '{name}' (keep: {keep_data})")
            }
            Plan::CArray {
                name,
                flat_size,
                element,
                ..
            } => {
                writeln!(f, "{pad}CArray '{name}' (flat_size: {flat_size})")?;
                element.fmt_indented(f, indent + 1)
            }
            Plan::NBytesVersion { name, element } => {
                writeln!(f, "{pad}NBytesVersion '{name}'")?;
                element.fmt_indented(f, indent + 1)
            }
            Plan::Group { name, subs } => {
                writeln!(f, "{pad}Group '{name}'")?;
                for sub in subs {
                    sub.fmt_indented(f, indent + 1)?;
                }
                Ok(())
            }
            Plan::BaseObject { name, subs } => {
                writeln!(f, "{pad}BaseObject '{name}'")?;
                for sub in subs {
                    sub.fmt_indented(f, indent + 1)?;
                }
                Ok(())
            }
            Plan::AnyClass { name, subs } => {
                writeln!(f, "{pad}AnyClass '{name}'")?;
                for sub in subs {
                    sub.fmt_indented(f, indent + 1)?;
                }
                Ok(())
            }
            Plan::ObjectHeader { name, element } => {
                writeln!(f, "{pad}ObjectHeader '{name}'")?;
                element.fmt_indented(f, indent + 1)
            }
            Plan::Empty { name } => writeln!(f, "{pad}Empty '{name}'"),
            Plan::Custom(custom) => {
                writeln!(
                    f,
                    "{pad}Custom '{}' (factory: {})",
                    custom.name, custom.factory_id
                )?;
                for child in &custom.children {
                    child.fmt_indented(f, indent + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
