// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Top-level decode drivers.
//!
//! `read_branch` runs the whole pipeline for one basket: plan the schema,
//! build the reader tree, iterate entries against the entry-offset table,
//! and assemble columnar content. `read_baskets` fans independent baskets
//! out across threads, sharing one plan but building a fresh reader tree
//! per basket.
//!
//! The entry loop enforces the boundary invariant: after entry `i` the
//! cursor must sit exactly on `entry_offsets[i + 1]`; any mismatch aborts
//! the basket.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::assemble::assemble;
use crate::core::{Content, DecodeError, Result};
use crate::decode::cursor::Cursor;
use crate::decode::factory::{FactorySet, Planner};
use crate::decode::plan::{Plan, PlanContext};
use crate::decode::readers::{build, RawData, Reader};
use crate::schema::{regularize_object_path, StreamerElement, StreamerRegistry};

/// One basket of a branch: raw bytes plus optional entry offsets.
///
/// When `entry_offsets` is absent the branch must declare a fixed
/// per-entry `fSize`, from which offsets are synthesized.
#[derive(Debug, Clone, Copy)]
pub struct Basket<'a> {
    pub data: &'a [u8],
    pub entry_offsets: Option<&'a [u64]>,
}

fn validate_offsets(entry_offsets: &[u64], data_len: usize) -> Result<()> {
    if entry_offsets.is_empty() {
        return Err(DecodeError::schema("", "entry offset table is empty"));
    }
    if entry_offsets[0] != 0 {
        return Err(DecodeError::schema(
            "",
            format!("entry offsets must start at 0, got {}", entry_offsets[0]),
        ));
    }
    if entry_offsets.windows(2).any(|w| w[0] > w[1]) {
        return Err(DecodeError::schema("", "entry offsets must be non-decreasing"));
    }
    let last = *entry_offsets.last().expect("non-empty table");
    if last > data_len as u64 {
        return Err(DecodeError::schema(
            "",
            format!("entry offsets end at {last} but the buffer holds {data_len} bytes"),
        ));
    }
    Ok(())
}

/// Decode every entry of a basket through a reader tree and return the
/// accumulated raw buffers.
pub fn decode(mut root: Box<dyn Reader>, data: &[u8], entry_offsets: &[u64]) -> Result<RawData> {
    validate_offsets(entry_offsets, data.len())?;

    let mut cur = Cursor::new(data, entry_offsets);
    let entries = cur.entries();
    debug!(reader = root.name(), entries, bytes = data.len(), "decoding basket");

    for i in 0..entries {
        let start = cur.position();
        root.read(&mut cur)?;
        let end = cur.position();

        let boundary = cur.entry_boundary(i);
        if end != boundary {
            warn!(
                reader = root.name(),
                entry = i,
                expected = boundary - start,
                actual = end - start,
                "entry boundary mismatch"
            );
            return Err(DecodeError::framing("entry boundary", boundary - start, end - start, end)
                .at_entry(i)
                .in_reader(root.name()));
        }
    }

    Ok(root.into_data())
}

fn synthesized_offsets(
    element: &StreamerElement,
    data_len: usize,
    item_path: &str,
) -> Result<Vec<u64>> {
    let size = element.size.unwrap_or(0);
    if size == 0 {
        return Err(DecodeError::schema(
            item_path,
            "entry offsets absent and the branch declares no fixed fSize",
        ));
    }
    if data_len % size != 0 {
        return Err(DecodeError::schema(
            item_path,
            format!("buffer length {data_len} is not a multiple of fSize {size}"),
        ));
    }
    Ok((0..=data_len / size).map(|i| (i * size) as u64).collect())
}

fn decode_with_plan(
    plan: &Plan,
    data: &[u8],
    entry_offsets: Option<&[u64]>,
    element: &StreamerElement,
    factories: &FactorySet,
    item_path: &str,
) -> Result<Content> {
    let reader = build(plan, factories)?;
    let raw = match entry_offsets {
        Some(offsets) => decode(reader, data, offsets)?,
        None => {
            let offsets = synthesized_offsets(element, data.len(), item_path)?;
            decode(reader, data, &offsets)?
        }
    };
    assemble(plan, raw, factories)
}

/// Decode one basket of a branch into columnar content.
///
/// `item_path` is the full branch path (cycle suffixes like `;1` are
/// stripped); it seeds the dotted item paths that user overrides and
/// `TObject` keep-data configuration match against.
pub fn read_branch(
    data: &[u8],
    entry_offsets: Option<&[u64]>,
    element: &StreamerElement,
    registry: &StreamerRegistry,
    item_path: &str,
    factories: &FactorySet,
) -> Result<Content> {
    read_branch_with(
        data,
        entry_offsets,
        element,
        registry,
        item_path,
        factories,
        &PlanContext::top(),
    )
}

/// [`read_branch`] with an explicit planning context, for branches whose
/// title declares dimensions (see [`crate::schema::title_dims`]).
#[allow(clippy::too_many_arguments)]
pub fn read_branch_with(
    data: &[u8],
    entry_offsets: Option<&[u64]>,
    element: &StreamerElement,
    registry: &StreamerRegistry,
    item_path: &str,
    factories: &FactorySet,
    ctx: &PlanContext,
) -> Result<Content> {
    let item_path = regularize_object_path(item_path);
    let mut ctx = *ctx;
    ctx.called_from_top = true;

    let plan = Planner::new(registry, factories).plan(element, &item_path, &ctx)?;
    debug!(item_path = %item_path, root = plan.name(), "planned branch");

    decode_with_plan(&plan, data, entry_offsets, element, factories, &item_path)
}

/// Decode independent baskets of one branch in parallel.
///
/// The plan is generated once and shared; every basket gets its own
/// reader tree, so no mutable state crosses threads.
pub fn read_baskets(
    baskets: &[Basket<'_>],
    element: &StreamerElement,
    registry: &StreamerRegistry,
    item_path: &str,
    factories: &FactorySet,
    ctx: &PlanContext,
) -> Result<Vec<Content>> {
    let item_path = regularize_object_path(item_path);
    let mut ctx = *ctx;
    ctx.called_from_top = true;

    let plan = Planner::new(registry, factories).plan(element, &item_path, &ctx)?;
    debug!(
        item_path = %item_path,
        baskets = baskets.len(),
        "decoding baskets in parallel"
    );

    baskets
        .par_iter()
        .map(|basket| {
            decode_with_plan(
                &plan,
                basket.data,
                basket.entry_offsets,
                element,
                factories,
                &item_path,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NumericData;

    fn uint32_element(name: &str) -> StreamerElement {
        StreamerElement::new(name, "uint32_t").with_ftype(13)
    }

    #[test]
    fn test_read_branch_flat_uint32() {
        let data = [0x00, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x2B];
        let offsets = [0u64, 4, 8];
        let registry = StreamerRegistry::new();
        let factories = FactorySet::new();

        let content = read_branch(
            &data,
            Some(&offsets),
            &uint32_element("x"),
            &registry,
            "/t/x;1",
            &factories,
        )
        .unwrap();
        assert_eq!(
            content,
            Content::Numeric(NumericData::UInt32(vec![42, 43]))
        );
    }

    #[test]
    fn test_boundary_mismatch_reports_entry() {
        let data = [0x00, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x2B];
        let offsets = [0u64, 6, 8]; // first entry claims 6 bytes
        let registry = StreamerRegistry::new();
        let factories = FactorySet::new();

        let err = read_branch(
            &data,
            Some(&offsets),
            &uint32_element("x"),
            &registry,
            "/t/x",
            &factories,
        )
        .unwrap_err();
        match err {
            DecodeError::Framing {
                entry, expected, actual, ..
            } => {
                assert_eq!(entry, Some(0));
                assert_eq!(expected, 6);
                assert_eq!(actual, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_offsets_synthesized_from_fsize() {
        let data = [0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02];
        let registry = StreamerRegistry::new();
        let factories = FactorySet::new();
        let element = uint32_element("x").with_size(4);

        let content =
            read_branch(&data, None, &element, &registry, "/t/x", &factories).unwrap();
        assert_eq!(content, Content::Numeric(NumericData::UInt32(vec![1, 2])));
    }

    #[test]
    fn test_missing_offsets_and_fsize() {
        let registry = StreamerRegistry::new();
        let factories = FactorySet::new();
        let err = read_branch(
            &[0u8; 4],
            None,
            &uint32_element("x"),
            &registry,
            "/t/x",
            &factories,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::SchemaInconsistency { .. }));
    }

    #[test]
    fn test_offset_table_validation() {
        let registry = StreamerRegistry::new();
        let factories = FactorySet::new();
        let element = uint32_element("x");

        let not_from_zero = [4u64, 8];
        assert!(read_branch(&[0u8; 8], Some(&not_from_zero), &element, &registry, "p", &factories)
            .is_err());

        let decreasing = [0u64, 8, 4];
        assert!(read_branch(&[0u8; 8], Some(&decreasing), &element, &registry, "p", &factories)
            .is_err());

        let past_end = [0u64, 16];
        assert!(
            read_branch(&[0u8; 8], Some(&past_end), &element, &registry, "p", &factories).is_err()
        );
    }

    #[test]
    fn test_read_baskets_parallel() {
        let basket1 = [0x00, 0x00, 0x00, 0x01];
        let basket2 = [0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03];
        let offsets1 = [0u64, 4];
        let offsets2 = [0u64, 4, 8];
        let baskets = [
            Basket {
                data: &basket1,
                entry_offsets: Some(&offsets1),
            },
            Basket {
                data: &basket2,
                entry_offsets: Some(&offsets2),
            },
        ];

        let registry = StreamerRegistry::new();
        let factories = FactorySet::new();
        let contents = read_baskets(
            &baskets,
            &uint32_element("x"),
            &registry,
            "/t/x",
            &factories,
            &PlanContext::top(),
        )
        .unwrap();

        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0], Content::Numeric(NumericData::UInt32(vec![1])));
        assert_eq!(
            contents[1],
            Content::Numeric(NumericData::UInt32(vec![2, 3]))
        );
    }
}
