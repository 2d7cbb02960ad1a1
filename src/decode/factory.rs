// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Plan generation: factory dispatch over streamer records.
//!
//! The planner walks a streamer schema recursively and produces a [`Plan`]
//! tree. Factories are tried in decreasing priority (user overrides 50 by
//! default, the C-array factory 20, the builtin set 10, the any-class
//! fallback 0); the first one that recognizes a record wins. Ties are
//! broken by registration order, builtins before user factories.
//!
//! Builtin factories are a closed set dispatched over an enum; user
//! overrides attach through the [`UserFactory`] trait and match by item
//! path or class name, whatever predicate they choose.

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::{Content, DecodeError, Form, PrimitiveType, Result};
use crate::decode::plan::{CustomPlan, Mode, Plan, PlanContext};
use crate::decode::readers::{RawData, Reader};
use crate::schema::{
    ftype, is_jagged_type, is_stl_container, map_key_val_types, sequence_element_type,
    strip_array_suffix, top_type_name, StreamerElement, StreamerRegistry,
};

/// Sequence-like STL containers handled by the sequence factory.
const SEQ_TYPES: &[&str] = &[
    "vector",
    "array",
    "list",
    "set",
    "multiset",
    "unordered_set",
    "unordered_multiset",
];

/// Mapping-like STL containers handled by the map factory.
const MAP_TYPES: &[&str] = &["map", "multimap", "unordered_map", "unordered_multimap"];

/// Map a primitive storage-category code to its element type.
pub fn primitive_from_ftype(code: i32) -> Option<PrimitiveType> {
    match code {
        1 => Some(PrimitiveType::Int8),
        2 => Some(PrimitiveType::Int16),
        3 => Some(PrimitiveType::Int32),
        4 => Some(PrimitiveType::Int64),
        5 => Some(PrimitiveType::Float32),
        8 => Some(PrimitiveType::Float64),
        11 => Some(PrimitiveType::UInt8),
        12 => Some(PrimitiveType::UInt16),
        13 => Some(PrimitiveType::UInt32),
        14 => Some(PrimitiveType::UInt64),
        18 => Some(PrimitiveType::Bool),
        _ => None,
    }
}

/// Map a primitive type keyword (C, cstdint, or ROOT spelling) to its
/// element type.
pub fn primitive_from_keyword(name: &str) -> Option<PrimitiveType> {
    match name {
        "bool" | "Bool_t" => Some(PrimitiveType::Bool),
        "char" | "signed char" | "int8_t" | "Char_t" => Some(PrimitiveType::Int8),
        "short" | "signed short" | "int16_t" | "Short_t" => Some(PrimitiveType::Int16),
        "int" | "signed int" | "int32_t" | "Int_t" => Some(PrimitiveType::Int32),
        "long" | "long long" | "signed long" | "signed long long" | "int64_t" | "Long_t" => {
            Some(PrimitiveType::Int64)
        }
        "unsigned char" | "uint8_t" | "UChar_t" => Some(PrimitiveType::UInt8),
        "unsigned short" | "uint16_t" | "UShort_t" => Some(PrimitiveType::UInt16),
        "unsigned int" | "uint32_t" | "UInt_t" => Some(PrimitiveType::UInt32),
        "unsigned long" | "unsigned long long" | "uint64_t" | "ULong_t" => {
            Some(PrimitiveType::UInt64)
        }
        "float" | "Float_t" => Some(PrimitiveType::Float32),
        "double" | "Double_t" => Some(PrimitiveType::Float64),
        _ => None,
    }
}

/// Map a `TArray*` class name to its element type.
pub fn tarray_ctype(top: &str) -> Option<PrimitiveType> {
    match top {
        "TArrayC" => Some(PrimitiveType::Int8),
        "TArrayS" => Some(PrimitiveType::Int16),
        "TArrayI" => Some(PrimitiveType::Int32),
        "TArrayL" | "TArrayL64" => Some(PrimitiveType::Int64),
        "TArrayF" => Some(PrimitiveType::Float32),
        "TArrayD" => Some(PrimitiveType::Float64),
        _ => None,
    }
}

/// A user-supplied reader factory.
///
/// Implementations recognize their own [`CustomPlan`] nodes by the
/// `factory_id` they stamp into them, and own all three stages for those
/// nodes: planning, reader construction, and content assembly.
pub trait UserFactory: Send + Sync {
    /// Stable identity stamped into the plans this factory produces.
    fn id(&self) -> &str;

    /// Dispatch priority; higher factories are tried first.
    fn priority(&self) -> i32 {
        50
    }

    /// Produce a plan when this factory recognizes the record, `None`
    /// otherwise. `planner` allows recursing into child records.
    fn try_plan(
        &self,
        planner: &Planner<'_>,
        top: Option<&str>,
        element: &StreamerElement,
        item_path: &str,
        ctx: &PlanContext,
    ) -> Result<Option<Plan>>;

    /// Build the reader for one of this factory's plan nodes.
    fn build(&self, plan: &CustomPlan) -> Result<Box<dyn Reader>>;

    /// Assemble columnar content from the reader's raw buffers.
    fn assemble(&self, plan: &CustomPlan, raw: RawData) -> Result<Content>;

    /// Shape of the assembled content, for schema-only consumers.
    fn form(&self, _plan: &CustomPlan) -> Option<Form> {
        None
    }
}

/// The configured factory set: registered user overrides plus the item
/// paths whose `TObject` payload is kept.
///
/// Configured at startup and shared read-only across decoding threads.
#[derive(Default)]
pub struct FactorySet {
    users: Vec<Arc<dyn UserFactory>>,
    target_paths: HashSet<String>,
    keep_data_itempaths: HashSet<String>,
}

impl FactorySet {
    /// Create an empty set (builtin factories only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user factory.
    pub fn register(&mut self, factory: Arc<dyn UserFactory>) {
        self.users.push(factory);
    }

    /// Mark a branch path as using this interpretation.
    pub fn target_branch(&mut self, branch_path: impl Into<String>) {
        self.target_paths
            .insert(crate::schema::regularize_object_path(&branch_path.into()));
    }

    /// Check whether a branch path was registered, ignoring cycle
    /// suffixes. The host dispatcher consults this before routing a
    /// branch here.
    pub fn is_target(&self, branch_path: &str) -> bool {
        self.target_paths
            .contains(&crate::schema::regularize_object_path(branch_path))
    }

    /// Keep the `TObject` payload for an item path.
    pub fn keep_tobject_data(&mut self, item_path: impl Into<String>) {
        self.keep_data_itempaths.insert(item_path.into());
    }

    /// Check whether a `TObject` at this path keeps its payload.
    pub fn keeps_data(&self, item_path: &str) -> bool {
        self.keep_data_itempaths.contains(item_path)
    }

    /// Look up a registered factory by id.
    pub fn find(&self, id: &str) -> Option<&Arc<dyn UserFactory>> {
        self.users.iter().find(|f| f.id() == id)
    }
}

/// Builtin factory kinds, dispatched in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    CArray,
    Primitive,
    StlSeq,
    StlMap,
    StlString,
    TArray,
    TString,
    TObject,
    BaseObject,
    AnyClass,
}

const BUILTINS: &[(i32, Builtin)] = &[
    (20, Builtin::CArray),
    (10, Builtin::Primitive),
    (10, Builtin::StlSeq),
    (10, Builtin::StlMap),
    (10, Builtin::StlString),
    (10, Builtin::TArray),
    (10, Builtin::TString),
    (10, Builtin::TObject),
    (10, Builtin::BaseObject),
    (0, Builtin::AnyClass),
];

enum Dispatch<'f> {
    Builtin(Builtin),
    User(&'f Arc<dyn UserFactory>),
}

/// The planner: streamer registry plus configured factory set.
pub struct Planner<'a> {
    pub registry: &'a StreamerRegistry,
    pub factories: &'a FactorySet,
}

impl<'a> Planner<'a> {
    /// Create a planner over a registry and factory set.
    pub fn new(registry: &'a StreamerRegistry, factories: &'a FactorySet) -> Self {
        Planner {
            registry,
            factories,
        }
    }

    /// Plan one streamer record.
    ///
    /// `item_path` is the dotted path of the parent; the record's own name
    /// is appended unless this is the outermost call.
    pub fn plan(
        &self,
        element: &StreamerElement,
        item_path: &str,
        ctx: &PlanContext,
    ) -> Result<Plan> {
        let item_path = if ctx.called_from_top {
            item_path.to_string()
        } else {
            format!("{item_path}.{}", element.name)
        };

        let top = element.type_name.as_deref().map(top_type_name);

        let mut order: Vec<(i32, Dispatch<'_>)> = BUILTINS
            .iter()
            .map(|&(p, b)| (p, Dispatch::Builtin(b)))
            .collect();
        order.extend(self.factories.users.iter().map(|f| (f.priority(), Dispatch::User(f))));
        order.sort_by_key(|(p, _)| std::cmp::Reverse(*p));

        for (_, dispatch) in &order {
            let planned = match dispatch {
                Dispatch::Builtin(builtin) => {
                    self.try_builtin(*builtin, top, element, &item_path, ctx)?
                }
                Dispatch::User(factory) => {
                    factory.try_plan(self, top, element, &item_path, ctx)?
                }
            };
            if let Some(plan) = planned {
                return Ok(plan);
            }
        }

        Err(DecodeError::unknown_type(
            element.type_name.clone().unwrap_or_default(),
            item_path,
        ))
    }

    fn try_builtin(
        &self,
        builtin: Builtin,
        top: Option<&str>,
        element: &StreamerElement,
        item_path: &str,
        ctx: &PlanContext,
    ) -> Result<Option<Plan>> {
        match builtin {
            Builtin::CArray => self.try_carray(element, item_path, ctx),
            Builtin::Primitive => Ok(self.try_primitive(top, element)),
            Builtin::StlSeq => self.try_stl_seq(top, element, item_path),
            Builtin::StlMap => self.try_stl_map(top, element, item_path),
            Builtin::StlString => Ok(self.try_stl_string(top, element, ctx)),
            Builtin::TArray => Ok(self.try_tarray(top, element)),
            Builtin::TString => Ok(self.try_tstring(top, element)),
            Builtin::TObject => Ok(self.try_tobject(top, element, item_path)),
            Builtin::BaseObject => self.try_base_object(top, element, item_path),
            Builtin::AnyClass => self.try_any_class(top, item_path),
        }
    }

    fn try_primitive(&self, top: Option<&str>, element: &StreamerElement) -> Option<Plan> {
        let ctype = primitive_from_ftype(element.ftype)
            .or_else(|| top.and_then(primitive_from_keyword))?;
        Some(Plan::Primitive {
            name: element.name.clone(),
            ctype,
        })
    }

    fn try_stl_seq(
        &self,
        top: Option<&str>,
        element: &StreamerElement,
        item_path: &str,
    ) -> Result<Option<Plan>> {
        let Some(top) = top else { return Ok(None) };
        if !SEQ_TYPES.contains(&top) {
            return Ok(None);
        }

        let type_name = element.type_name.as_deref().unwrap_or_default();
        let element_type = sequence_element_type(type_name)
            .map_err(|_| DecodeError::schema(item_path, format!("malformed sequence type '{type_name}'")))?;

        let element_info = StreamerElement::new(element.name.clone(), element_type);
        let mut element_plan = self.plan(&element_info, item_path, &PlanContext::default())?;

        // Elements that are themselves STL containers are serialized
        // without their own headers.
        if is_stl_container(top_type_name(element_type)) {
            element_plan.set_with_header(false);
        }

        Ok(Some(Plan::StlSeq {
            name: element.name.clone(),
            with_header: true,
            mode: Mode::Auto,
            element: Box::new(element_plan),
        }))
    }

    fn try_stl_map(
        &self,
        top: Option<&str>,
        element: &StreamerElement,
        item_path: &str,
    ) -> Result<Option<Plan>> {
        let Some(top) = top else { return Ok(None) };
        if !MAP_TYPES.contains(&top) {
            return Ok(None);
        }

        let type_name = element.type_name.as_deref().unwrap_or_default();
        let (key_type, val_type) = map_key_val_types(type_name)
            .map_err(|_| DecodeError::schema(item_path, format!("malformed map type '{type_name}'")))?;

        let key_info = StreamerElement::new("key", key_type);
        let val_info = StreamerElement::new("val", val_type);
        let key_plan = self.plan(&key_info, item_path, &PlanContext::default())?;
        let val_plan = self.plan(&val_info, item_path, &PlanContext::default())?;

        Ok(Some(Plan::StlMap {
            name: element.name.clone(),
            with_header: true,
            mode: Mode::Auto,
            key: Box::new(key_plan),
            val: Box::new(val_plan),
        }))
    }

    fn try_stl_string(
        &self,
        top: Option<&str>,
        element: &StreamerElement,
        ctx: &PlanContext,
    ) -> Option<Plan> {
        if top != Some("string") {
            return None;
        }
        // At the top, the entry itself is the framing boundary.
        Some(Plan::StlString {
            name: element.name.clone(),
            with_header: !ctx.called_from_top,
        })
    }

    fn try_tarray(&self, top: Option<&str>, element: &StreamerElement) -> Option<Plan> {
        let ctype = tarray_ctype(top?)?;
        Some(Plan::TArray {
            name: element.name.clone(),
            ctype,
        })
    }

    fn try_tstring(&self, top: Option<&str>, element: &StreamerElement) -> Option<Plan> {
        if top != Some("TString") {
            return None;
        }
        Some(Plan::TString {
            name: element.name.clone(),
        })
    }

    fn try_tobject(
        &self,
        top: Option<&str>,
        element: &StreamerElement,
        item_path: &str,
    ) -> Option<Plan> {
        if top != Some("BASE") || element.ftype != ftype::BASE_TOBJECT {
            return None;
        }
        Some(Plan::TObject {
            name: element.name.clone(),
            keep_data: self.factories.keeps_data(item_path),
        })
    }

    fn try_base_object(
        &self,
        top: Option<&str>,
        element: &StreamerElement,
        item_path: &str,
    ) -> Result<Option<Plan>> {
        if top != Some("BASE") || element.ftype != ftype::BASE_EMBEDDED {
            return Ok(None);
        }

        let members = self
            .registry
            .get(&element.name)
            .ok_or_else(|| DecodeError::unknown_type(element.name.clone(), item_path))?;

        let subs = members
            .iter()
            .map(|m| self.plan(m, item_path, &PlanContext::default()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Plan::BaseObject {
            name: element.name.clone(),
            subs,
        }))
    }

    fn try_any_class(&self, top: Option<&str>, item_path: &str) -> Result<Option<Plan>> {
        let Some(top) = top else { return Ok(None) };
        let Some(members) = self.registry.get(top) else {
            return Ok(None);
        };

        let subs = members
            .iter()
            .map(|m| self.plan(m, item_path, &PlanContext::default()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Plan::AnyClass {
            name: top.to_string(),
            subs,
        }))
    }

    fn try_carray(
        &self,
        element: &StreamerElement,
        item_path: &str,
        ctx: &PlanContext,
    ) -> Result<Option<Plan>> {
        let mut type_name = element.type_name.clone().unwrap_or_default();
        if ctx.called_from_top && ctx.branch_jagged && !is_jagged_type(&type_name) {
            type_name.push_str("[]");
        }

        if !is_jagged_type(&type_name) && element.array_dim == 0 {
            return Ok(None);
        }

        let flat_size: i64 = if is_jagged_type(&type_name) {
            -1
        } else {
            let dim = element.array_dim as usize;
            if element.max_index.len() < dim {
                return Err(DecodeError::schema(
                    item_path,
                    "fArrayDim is set but fMaxIndex is missing or short",
                ));
            }
            let product: i64 = element.max_index[..dim].iter().map(|&v| v as i64).product();
            if product == 0 {
                return Err(DecodeError::schema(item_path, "fixed array flat size is zero"));
            }
            product
        };

        let element_type_name = strip_array_suffix(&type_name).to_string();
        let mut element_info = element.clone();
        element_info.array_dim = 0;
        element_info.type_name = Some(element_type_name.clone());

        let mut element_plan = self.plan(&element_info, item_path, &PlanContext::default())?;

        let element_top = top_type_name(&element_type_name);
        // STL containers stored inside a std::array carry no per-element
        // header; the payload is member-wise.
        if is_stl_container(element_top) && element.ftype == ftype::FIXED_STL {
            element_plan.set_with_header(false);
            element_plan.force_mode(Mode::MemberWise);
        }

        let carray = Plan::CArray {
            name: element.name.clone(),
            flat_size,
            array_dim: element.array_dim,
            max_index: element.max_index.clone(),
            element: Box::new(element_plan),
        };

        // Fixed arrays of TString are preceded by one shared header.
        if element.array_dim != 0 && element_top == "TString" {
            return Ok(Some(Plan::NBytesVersion {
                name: element.name.clone(),
                element: Box::new(carray),
            }));
        }

        Ok(Some(carray))
    }
}

/// Plan one streamer record against a registry and factory set.
///
/// Pure function of its inputs: planning the same record twice yields
/// equal plans.
pub fn plan(
    element: &StreamerElement,
    registry: &StreamerRegistry,
    item_path: &str,
    ctx: &PlanContext,
    factories: &FactorySet,
) -> Result<Plan> {
    Planner::new(registry, factories).plan(element, item_path, ctx)
}
