// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Reader trees.
//!
//! A reader tree is the mutable counterpart of a plan tree: isomorphic in
//! shape, built fresh per basket, each node owning append-only output
//! buffers. Readers are single-use; [`Reader::into_data`] moves the
//! buffers out exactly once.
//!
//! Container readers override the loop-wrapper defaults of `read_many` /
//! `read_until` to hoist their outer framing out of the loop, and the
//! composite readers implement `read_many_memberwise`, the column-first
//! transpose used by member-wise STL payloads.

mod carray;
mod object;
mod primitive;
mod string;
mod stl;

pub use carray::CStyleArrayReader;
pub use object::{
    AnyClassReader, EmptyReader, GroupReader, NBytesVersionReader, ObjectHeaderReader,
    TObjectReader,
};
pub use primitive::{PrimitiveReader, TArrayReader};
pub use string::{StlStringReader, TStringReader};
pub use stl::{StlMapReader, StlSeqReader};

use crate::core::{DecodeError, NumericData, Result};
use crate::decode::cursor::Cursor;
use crate::decode::factory::FactorySet;
use crate::decode::plan::Plan;

/// Raw decoded buffers, one node per reader in the tree.
///
/// The assembler consumes this in a recursion parallel to the plan.
#[derive(Debug, Clone, PartialEq)]
pub enum RawData {
    /// No output (empty readers, discarded `TObject` payloads)
    None,
    /// Flat primitive buffer
    Numeric(NumericData),
    /// Character data addressed by offsets (strings)
    Chars { offsets: Vec<i64>, bytes: Vec<u8> },
    /// Ragged element data addressed by offsets
    List {
        offsets: Vec<i64>,
        element: Box<RawData>,
    },
    /// Ragged key/value pairs (maps)
    Pairs {
        offsets: Vec<i64>,
        keys: Box<RawData>,
        vals: Box<RawData>,
    },
    /// Kept `TObject` payload
    TObject {
        unique_ids: Vec<i32>,
        bits: Vec<u32>,
        pidf: Vec<u16>,
        pidf_offsets: Vec<i64>,
    },
    /// One buffer per sub-reader (groups, user classes)
    Fields(Vec<RawData>),
}

/// One node of a reader tree.
pub trait Reader {
    /// Diagnostic name, used in error reports.
    fn name(&self) -> &str;

    /// Decode exactly one logical element from the cursor and append it to
    /// the internal buffers.
    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()>;

    /// Decode `count` consecutive elements.
    ///
    /// A negative `count` asks the reader to discover the element count
    /// from its own byte-count header; only headered container readers
    /// support that. Returns the number of elements decoded.
    fn read_many(&mut self, cur: &mut Cursor<'_>, count: i64) -> Result<i64> {
        if count < 0 {
            return Err(DecodeError::schema(
                self.name(),
                "negative element count requires a byte-count header",
            ));
        }
        for _ in 0..count {
            self.read(cur)?;
        }
        Ok(count)
    }

    /// Decode elements until the cursor reaches `end_pos` exactly; returns
    /// the number of elements decoded.
    fn read_until(&mut self, cur: &mut Cursor<'_>, end_pos: u64) -> Result<i64> {
        let mut count = 0;
        while cur.position() < end_pos {
            self.read(cur)?;
            count += 1;
        }
        Ok(count)
    }

    /// Decode `count` elements column-first: every descendant decodes all
    /// its values before the next one starts.
    ///
    /// Composite readers override this; leaf readers are their own single
    /// column, so the default falls through to [`Reader::read_many`].
    fn read_many_memberwise(&mut self, cur: &mut Cursor<'_>, count: i64) -> Result<i64> {
        self.read_many(cur, count)
    }

    /// Move the accumulated buffers out of the reader.
    fn into_data(self: Box<Self>) -> RawData;
}

/// Materialize the reader tree for a plan.
pub fn build(plan: &Plan, factories: &FactorySet) -> Result<Box<dyn Reader>> {
    Ok(match plan {
        Plan::Primitive { name, ctype } => Box::new(PrimitiveReader::new(name.clone(), *ctype)),
        Plan::TString { name } => Box::new(TStringReader::new(name.clone())),
        Plan::StlString { name, with_header } => {
            Box::new(StlStringReader::new(name.clone(), *with_header))
        }
        Plan::StlSeq {
            name,
            with_header,
            mode,
            element,
        } => Box::new(StlSeqReader::new(
            name.clone(),
            *with_header,
            *mode,
            build(element, factories)?,
        )),
        Plan::StlMap {
            name,
            with_header,
            mode,
            key,
            val,
        } => Box::new(StlMapReader::new(
            name.clone(),
            *with_header,
            *mode,
            build(key, factories)?,
            build(val, factories)?,
        )),
        Plan::TArray { name, ctype } => Box::new(TArrayReader::new(name.clone(), *ctype)),
        Plan::TObject { name, keep_data } => {
            Box::new(TObjectReader::new(name.clone(), *keep_data))
        }
        Plan::CArray {
            name,
            flat_size,
            element,
            ..
        } => Box::new(CStyleArrayReader::new(
            name.clone(),
            *flat_size,
            build(element, factories)?,
        )),
        Plan::NBytesVersion { name, element } => Box::new(NBytesVersionReader::new(
            name.clone(),
            build(element, factories)?,
        )),
        Plan::Group { name, subs } => {
            let readers = subs
                .iter()
                .map(|s| build(s, factories))
                .collect::<Result<Vec<_>>>()?;
            Box::new(GroupReader::new(name.clone(), readers))
        }
        // A base object is a header in front of its member group; the
        // advertised span is not independently re-checked here.
        Plan::BaseObject { name, subs } => {
            let readers = subs
                .iter()
                .map(|s| build(s, factories))
                .collect::<Result<Vec<_>>>()?;
            Box::new(NBytesVersionReader::new(
                name.clone(),
                Box::new(GroupReader::new(name.clone(), readers)),
            ))
        }
        Plan::AnyClass { name, subs } => {
            let readers = subs
                .iter()
                .map(|s| build(s, factories))
                .collect::<Result<Vec<_>>>()?;
            Box::new(AnyClassReader::new(name.clone(), readers))
        }
        Plan::ObjectHeader { name, element } => Box::new(ObjectHeaderReader::new(
            name.clone(),
            build(element, factories)?,
        )),
        Plan::Empty { name } => Box::new(EmptyReader::new(name.clone())),
        Plan::Custom(custom) => {
            let factory = factories.find(&custom.factory_id).ok_or_else(|| {
                DecodeError::schema(
                    custom.name.clone(),
                    format!("no registered factory with id '{}'", custom.factory_id),
                )
            })?;
            factory.build(custom)?
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PrimitiveType;
    use crate::decode::plan::Mode;

    #[test]
    fn test_build_mirrors_plan_shape() {
        let plan = Plan::StlSeq {
            name: "v".to_string(),
            with_header: true,
            mode: Mode::Auto,
            element: Box::new(Plan::Primitive {
                name: "v".to_string(),
                ctype: PrimitiveType::Int32,
            }),
        };
        let reader = build(&plan, &FactorySet::new()).unwrap();
        assert_eq!(reader.name(), "v");
    }

    #[test]
    fn test_build_unknown_custom_factory() {
        let plan = Plan::Custom(crate::decode::plan::CustomPlan {
            factory_id: "missing".to_string(),
            name: "c".to_string(),
            params: serde_json::Value::Null,
            children: Vec::new(),
        });
        assert!(build(&plan, &FactorySet::new()).is_err());
    }

    #[test]
    fn test_default_read_many_rejects_negative_count() {
        let mut reader = PrimitiveReader::new("x".to_string(), PrimitiveType::Int32);
        let offsets: &[u64] = &[];
        let mut cur = Cursor::new(&[], offsets);
        assert!(reader.read_many(&mut cur, -1).is_err());
    }
}
