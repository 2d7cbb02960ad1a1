// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Raw buffers to columnar content.
//!
//! [`assemble`] recurses over a plan in parallel with the raw buffers its
//! reader tree produced and emits [`Content`] values: flat numeric
//! columns, list-offset columns, regular (fixed-shape) columns, and
//! records. [`form_of`] is the data-less twin of the same recursion,
//! deriving the output shape from the plan alone.
//!
//! Two conventions carried by the record assembly: map entries become
//! `{key, val}` records, and `TObject` members whose payload was not kept
//! occupy no field in their enclosing record.

use crate::core::{
    Content, DecodeError, Form, ListOffsetArray, NumericData, PrimitiveType, RecordArray,
    RegularArray, Result,
};
use crate::decode::factory::FactorySet;
use crate::decode::plan::Plan;
use crate::decode::readers::RawData;

fn shape_err(plan: &Plan) -> DecodeError {
    DecodeError::schema(
        plan.name(),
        "decoded buffers do not match the plan shape",
    )
}

fn chars_content(offsets: Vec<i64>, bytes: Vec<u8>) -> Content {
    Content::ListOffset(ListOffsetArray {
        offsets,
        content: Box::new(Content::Numeric(NumericData::UInt8(bytes))),
        is_string: true,
    })
}

/// Fields of a kept `TObject` payload.
const TOBJECT_FIELDS: [&str; 3] = ["fUniqueID", "fBits", "pidf"];

fn tobject_content(
    unique_ids: Vec<i32>,
    bits: Vec<u32>,
    pidf: Vec<u16>,
    pidf_offsets: Vec<i64>,
) -> Content {
    Content::Record(RecordArray {
        fields: TOBJECT_FIELDS.iter().map(|s| s.to_string()).collect(),
        contents: vec![
            Content::Numeric(NumericData::Int32(unique_ids)),
            Content::Numeric(NumericData::UInt32(bits)),
            Content::ListOffset(ListOffsetArray {
                offsets: pidf_offsets,
                content: Box::new(Content::Numeric(NumericData::UInt16(pidf))),
                is_string: false,
            }),
        ],
    })
}

fn assemble_record(
    name: &str,
    subs: &[Plan],
    raws: Vec<RawData>,
    factories: &FactorySet,
) -> Result<Content> {
    if subs.len() != raws.len() {
        return Err(DecodeError::schema(
            name,
            "decoded buffers do not match the plan shape",
        ));
    }

    let mut fields = Vec::with_capacity(subs.len());
    let mut contents = Vec::with_capacity(subs.len());
    for (sub, raw) in subs.iter().zip(raws) {
        // discarded TObject payloads occupy no field
        if matches!(sub, Plan::TObject { keep_data: false, .. }) {
            continue;
        }
        fields.push(sub.name().to_string());
        contents.push(assemble(sub, raw, factories)?);
    }
    Ok(Content::Record(RecordArray { fields, contents }))
}

/// Wrap `content` in one regular layer per fixed dimension, innermost
/// dimension last.
fn wrap_regular(mut content: Content, shape: &[u32]) -> Content {
    for &size in shape.iter().rev() {
        content = Content::Regular(RegularArray {
            size: size as usize,
            content: Box::new(content),
        });
    }
    content
}

/// Convert a reader tree's raw buffers into columnar content.
pub fn assemble(plan: &Plan, raw: RawData, factories: &FactorySet) -> Result<Content> {
    match (plan, raw) {
        (Plan::Primitive { ctype, .. }, RawData::Numeric(data)) => {
            // booleans were buffered as bytes in the hot loop
            if *ctype == PrimitiveType::Bool {
                let NumericData::UInt8(bytes) = data else {
                    return Err(shape_err(plan));
                };
                let flags = bytes.into_iter().map(|b| b != 0).collect();
                return Ok(Content::Numeric(NumericData::Bool(flags)));
            }
            Ok(Content::Numeric(data))
        }

        (Plan::TString { .. }, RawData::Chars { offsets, bytes })
        | (Plan::StlString { .. }, RawData::Chars { offsets, bytes }) => {
            Ok(chars_content(offsets, bytes))
        }

        (Plan::TArray { .. }, RawData::List { offsets, element }) => {
            let RawData::Numeric(data) = *element else {
                return Err(shape_err(plan));
            };
            Ok(Content::ListOffset(ListOffsetArray {
                offsets,
                content: Box::new(Content::Numeric(data)),
                is_string: false,
            }))
        }

        (Plan::StlSeq { element, .. }, RawData::List { offsets, element: raw }) => {
            Ok(Content::ListOffset(ListOffsetArray {
                offsets,
                content: Box::new(assemble(element, *raw, factories)?),
                is_string: false,
            }))
        }

        (
            Plan::StlMap { key, val, .. },
            RawData::Pairs {
                offsets,
                keys,
                vals,
            },
        ) => {
            let record = RecordArray {
                fields: vec![key.name().to_string(), val.name().to_string()],
                contents: vec![
                    assemble(key, *keys, factories)?,
                    assemble(val, *vals, factories)?,
                ],
            };
            Ok(Content::ListOffset(ListOffsetArray {
                offsets,
                content: Box::new(Content::Record(record)),
                is_string: false,
            }))
        }

        (
            Plan::TObject { keep_data: true, .. },
            RawData::TObject {
                unique_ids,
                bits,
                pidf,
                pidf_offsets,
            },
        ) => Ok(tobject_content(unique_ids, bits, pidf, pidf_offsets)),

        (Plan::TObject { keep_data: false, .. }, RawData::None) => Ok(Content::Empty),

        (Plan::NBytesVersion { element, .. }, raw)
        | (Plan::ObjectHeader { element, .. }, raw) => assemble(element, raw, factories),

        (Plan::Group { name, subs }, RawData::Fields(raws))
        | (Plan::BaseObject { name, subs }, RawData::Fields(raws))
        | (Plan::AnyClass { name, subs }, RawData::Fields(raws)) => {
            assemble_record(name, subs, raws, factories)
        }

        (
            Plan::CArray {
                flat_size,
                array_dim,
                max_index,
                element,
                ..
            },
            raw,
        ) => {
            let shape = &max_index[..(*array_dim as usize).min(max_index.len())];

            if *flat_size < 0 {
                let RawData::List { offsets, element: raw } = raw else {
                    return Err(shape_err(plan));
                };
                let content = wrap_regular(assemble(element, *raw, factories)?, shape);
                // inner fixed dimensions make each counted element `scale`
                // primitives wide; offsets address the outer ragged shape
                let scale: i64 = shape.iter().map(|&s| s as i64).product();
                let offsets = if scale > 1 {
                    offsets.into_iter().map(|o| o / scale).collect()
                } else {
                    offsets
                };
                Ok(Content::ListOffset(ListOffsetArray {
                    offsets,
                    content: Box::new(content),
                    is_string: false,
                }))
            } else {
                Ok(wrap_regular(assemble(element, raw, factories)?, shape))
            }
        }

        (Plan::Empty { .. }, RawData::None) => Ok(Content::Empty),

        (Plan::Custom(custom), raw) => {
            let factory = factories.find(&custom.factory_id).ok_or_else(|| {
                DecodeError::schema(
                    custom.name.clone(),
                    format!("no registered factory with id '{}'", custom.factory_id),
                )
            })?;
            factory.assemble(custom, raw)
        }

        _ => Err(shape_err(plan)),
    }
}

/// Derive the output shape of a plan without decoding any bytes.
pub fn form_of(plan: &Plan, factories: &FactorySet) -> Result<Form> {
    Ok(match plan {
        Plan::Primitive { ctype, .. } => Form::Numeric(*ctype),

        Plan::TString { .. } | Plan::StlString { .. } => Form::ListOffset {
            content: Box::new(Form::Numeric(PrimitiveType::UInt8)),
            is_string: true,
        },

        Plan::TArray { ctype, .. } => Form::ListOffset {
            content: Box::new(Form::Numeric(*ctype)),
            is_string: false,
        },

        Plan::StlSeq { element, .. } => Form::ListOffset {
            content: Box::new(form_of(element, factories)?),
            is_string: false,
        },

        Plan::StlMap { key, val, .. } => Form::ListOffset {
            content: Box::new(Form::Record {
                fields: vec![key.name().to_string(), val.name().to_string()],
                contents: vec![form_of(key, factories)?, form_of(val, factories)?],
            }),
            is_string: false,
        },

        Plan::TObject { keep_data, .. } => {
            if !keep_data {
                return Ok(Form::Empty);
            }
            Form::Record {
                fields: TOBJECT_FIELDS.iter().map(|s| s.to_string()).collect(),
                contents: vec![
                    Form::Numeric(PrimitiveType::Int32),
                    Form::Numeric(PrimitiveType::UInt32),
                    Form::ListOffset {
                        content: Box::new(Form::Numeric(PrimitiveType::UInt16)),
                        is_string: false,
                    },
                ],
            }
        }

        Plan::NBytesVersion { element, .. } | Plan::ObjectHeader { element, .. } => {
            form_of(element, factories)?
        }

        Plan::Group { subs, .. } | Plan::BaseObject { subs, .. } | Plan::AnyClass { subs, .. } => {
            let mut fields = Vec::new();
            let mut contents = Vec::new();
            for sub in subs {
                if matches!(sub, Plan::TObject { keep_data: false, .. }) {
                    continue;
                }
                fields.push(sub.name().to_string());
                contents.push(form_of(sub, factories)?);
            }
            Form::Record { fields, contents }
        }

        Plan::CArray {
            flat_size,
            array_dim,
            max_index,
            element,
            ..
        } => {
            let shape = &max_index[..(*array_dim as usize).min(max_index.len())];
            let mut form = form_of(element, factories)?;
            for &size in shape.iter().rev() {
                form = Form::Regular {
                    size: size as usize,
                    content: Box::new(form),
                };
            }
            if *flat_size < 0 {
                Form::ListOffset {
                    content: Box::new(form),
                    is_string: false,
                }
            } else {
                form
            }
        }

        Plan::Empty { .. } => Form::Empty,

        Plan::Custom(custom) => {
            let factory = factories.find(&custom.factory_id).ok_or_else(|| {
                DecodeError::schema(
                    custom.name.clone(),
                    format!("no registered factory with id '{}'", custom.factory_id),
                )
            })?;
            factory.form(custom).ok_or_else(|| {
                DecodeError::schema(
                    custom.name.clone(),
                    format!("factory '{}' provides no form", custom.factory_id),
                )
            })?
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::plan::Mode;

    fn factories() -> FactorySet {
        FactorySet::new()
    }

    fn int_plan(name: &str) -> Plan {
        Plan::Primitive {
            name: name.to_string(),
            ctype: PrimitiveType::Int32,
        }
    }

    #[test]
    fn test_bool_retyped_at_assembly() {
        let plan = Plan::Primitive {
            name: "flag".to_string(),
            ctype: PrimitiveType::Bool,
        };
        let raw = RawData::Numeric(NumericData::UInt8(vec![1, 0, 2]));
        let content = assemble(&plan, raw, &factories()).unwrap();
        assert_eq!(
            content,
            Content::Numeric(NumericData::Bool(vec![true, false, true]))
        );
    }

    #[test]
    fn test_string_content_is_parameterized() {
        let plan = Plan::TString {
            name: "s".to_string(),
        };
        let raw = RawData::Chars {
            offsets: vec![0, 5],
            bytes: b"Hello".to_vec(),
        };
        let content = assemble(&plan, raw, &factories()).unwrap();
        let list = content.as_list().expect("list content");
        assert_eq!(list.strings(), Some(vec!["Hello".to_string()]));
    }

    #[test]
    fn test_map_becomes_key_val_records() {
        let plan = Plan::StlMap {
            name: "m".to_string(),
            with_header: true,
            mode: Mode::Auto,
            key: Box::new(int_plan("key")),
            val: Box::new(int_plan("val")),
        };
        let raw = RawData::Pairs {
            offsets: vec![0, 2],
            keys: Box::new(RawData::Numeric(NumericData::Int32(vec![1, 2]))),
            vals: Box::new(RawData::Numeric(NumericData::Int32(vec![10, 20]))),
        };
        let content = assemble(&plan, raw, &factories()).unwrap();
        let list = content.as_list().expect("list content");
        let record = list.content.as_record().expect("record content");
        assert_eq!(record.fields, vec!["key", "val"]);
    }

    #[test]
    fn test_group_omits_discarded_tobject() {
        let plan = Plan::Group {
            name: "g".to_string(),
            subs: vec![
                Plan::TObject {
                    name: "TObject".to_string(),
                    keep_data: false,
                },
                int_plan("x"),
            ],
        };
        let raw = RawData::Fields(vec![
            RawData::None,
            RawData::Numeric(NumericData::Int32(vec![5])),
        ]);
        let content = assemble(&plan, raw, &factories()).unwrap();
        let record = content.as_record().expect("record content");
        assert_eq!(record.fields, vec!["x"]);
    }

    #[test]
    fn test_fixed_carray_wraps_regular_layers() {
        let plan = Plan::CArray {
            name: "grid".to_string(),
            flat_size: 6,
            array_dim: 2,
            max_index: vec![2, 3],
            element: Box::new(int_plan("grid")),
        };
        let raw = RawData::Numeric(NumericData::Int32((0..6).collect()));
        let content = assemble(&plan, raw, &factories()).unwrap();

        // outermost layer is the first dimension
        let outer = content.as_regular().expect("regular content");
        assert_eq!(outer.size, 2);
        let inner = outer.content.as_regular().expect("inner regular");
        assert_eq!(inner.size, 3);
    }

    #[test]
    fn test_jagged_carray_scales_offsets_by_inner_dims() {
        let plan = Plan::CArray {
            name: "j".to_string(),
            flat_size: -1,
            array_dim: 1,
            max_index: vec![2],
            element: Box::new(int_plan("j")),
        };
        // 6 primitives = 3 pairs; first entry holds 2 pairs, second 1
        let raw = RawData::List {
            offsets: vec![0, 4, 6],
            element: Box::new(RawData::Numeric(NumericData::Int32((0..6).collect()))),
        };
        let content = assemble(&plan, raw, &factories()).unwrap();
        let list = content.as_list().expect("list content");
        assert_eq!(list.offsets, vec![0, 2, 3]);
        assert_eq!(list.content.as_regular().expect("regular").size, 2);
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let plan = int_plan("x");
        let raw = RawData::Chars {
            offsets: vec![0],
            bytes: Vec::new(),
        };
        assert!(assemble(&plan, raw, &factories()).is_err());
    }

    #[test]
    fn test_form_matches_assembled_shape() {
        let plan = Plan::StlSeq {
            name: "v".to_string(),
            with_header: true,
            mode: Mode::Auto,
            element: Box::new(int_plan("v")),
        };
        let form = form_of(&plan, &factories()).unwrap();
        assert_eq!(
            form,
            Form::ListOffset {
                content: Box::new(Form::Numeric(PrimitiveType::Int32)),
                is_string: false,
            }
        );
    }

    #[test]
    fn test_form_of_no_keep_tobject_is_empty() {
        let plan = Plan::TObject {
            name: "TObject".to_string(),
            keep_data: false,
        };
        assert_eq!(form_of(&plan, &factories()).unwrap(), Form::Empty);
    }
}
