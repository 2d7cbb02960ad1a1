// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Invariant tests: entry boundaries, offset monotonicity, header
//! hoisting, planning purity, and encode/decode round trips.

mod common;

use rootcodec::{
    build, decode_entries, form_of, ftype, plan, read_branch, Content, DecodeError, FactorySet,
    Form, Mode, NumericData, Plan, PlanContext, PrimitiveType, StreamerElement, StreamerRegistry,
};

use common::BeEncoder;

fn empty_registry() -> StreamerRegistry {
    StreamerRegistry::new()
}

fn no_overrides() -> FactorySet {
    FactorySet::new()
}

/// Encode one `vector<int32>` entry: byte count, version, size, values.
fn encode_vector_entry(enc: &mut BeEncoder, values: &[i32]) {
    let bc = enc.byte_count_placeholder();
    enc.version(9);
    enc.u32(values.len() as u32);
    for &v in values {
        enc.i32(v);
    }
    enc.patch_byte_count(bc);
}

fn vector_basket(entries: &[&[i32]]) -> (Vec<u8>, Vec<u64>) {
    let mut enc = BeEncoder::new();
    let mut offsets = vec![0u64];
    for values in entries {
        encode_vector_entry(&mut enc, values);
        offsets.push(enc.len() as u64);
    }
    (enc.into_bytes(), offsets)
}

// ============================================================================
// Entry boundaries
// ============================================================================

#[test]
fn test_every_entry_lands_on_its_boundary() {
    let (data, offsets) = vector_basket(&[&[1, 2, 3], &[], &[4]]);
    let element = StreamerElement::new("v", "vector<int>").with_ftype(ftype::POINTER_TO_STL);

    // a successful decode certifies every boundary; a short entry fails
    let content = read_branch(
        &data,
        Some(&offsets),
        &element,
        &empty_registry(),
        "/t/v",
        &no_overrides(),
    )
    .expect("decode basket");
    assert_eq!(content.len(), 3);

    let mut broken = offsets.clone();
    broken[1] += 2;
    broken[2] += 2;
    let err = read_branch(
        &data,
        Some(&broken),
        &element,
        &empty_registry(),
        "/t/v",
        &no_overrides(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Framing { entry: Some(0), .. }
    ));
}

// ============================================================================
// Offset monotonicity and length agreement
// ============================================================================

#[test]
fn test_list_offsets_are_monotone_and_agree_with_content() {
    let entries: &[&[i32]] = &[&[5], &[], &[6, 7, 8], &[]];
    let (data, offsets) = vector_basket(entries);
    let element = StreamerElement::new("v", "vector<int>").with_ftype(ftype::POINTER_TO_STL);

    let content = read_branch(
        &data,
        Some(&offsets),
        &element,
        &empty_registry(),
        "/t/v",
        &no_overrides(),
    )
    .expect("decode basket");

    let list = content.as_list().expect("list content");
    assert_eq!(list.offsets.len(), entries.len() + 1);
    assert_eq!(list.offsets[0], 0);
    assert!(list.offsets.windows(2).all(|w| w[0] <= w[1]));

    let last = *list.offsets.last().expect("non-empty offsets");
    assert_eq!(list.content.len() as i64, last);
}

// ============================================================================
// Fixed-array shape
// ============================================================================

#[test]
fn test_fixed_array_shape_multiplies_back() {
    let mut enc = BeEncoder::new();
    for v in 0..12 {
        enc.i32(v);
    }
    let data = enc.into_bytes();
    let offsets = [0u64, 24, 48];

    let element = StreamerElement::new("grid", "int32_t")
        .with_ftype(3)
        .with_dims(vec![2, 3]);
    let content = read_branch(
        &data,
        Some(&offsets),
        &element,
        &empty_registry(),
        "/t/grid",
        &no_overrides(),
    )
    .expect("decode grid branch");

    let outer = content.as_regular().expect("outer regular");
    let inner = outer.content.as_regular().expect("inner regular");
    assert_eq!(outer.size * inner.size, 6);
    assert_eq!(outer.len(), 2); // two entries
    assert_eq!(inner.content.len(), 12);
}

// ============================================================================
// Planning purity
// ============================================================================

#[test]
fn test_planning_is_idempotent() {
    let mut registry = StreamerRegistry::new();
    registry.insert(
        "Event",
        vec![
            StreamerElement::new("TObject", "BASE").with_ftype(ftype::BASE_TOBJECT),
            StreamerElement::new("tracks", "vector<float>").with_ftype(ftype::POINTER_TO_STL),
            StreamerElement::new("tag", "TString"),
        ],
    );
    let factories = no_overrides();
    let element = StreamerElement::new("evt", "Event");

    let first = plan(&element, &registry, "/t/evt", &PlanContext::top(), &factories)
        .expect("plan event");
    let second = plan(&element, &registry, "/t/evt", &PlanContext::top(), &factories)
        .expect("plan event again");
    assert_eq!(first, second);
}

// ============================================================================
// Header hoisting equivalence
// ============================================================================

#[test]
fn test_bulk_read_consumes_same_bytes_as_elementwise() {
    // one shared header, then three string bodies
    let mut enc = BeEncoder::new();
    let bc = enc.byte_count_placeholder();
    enc.version(1);
    for s in ["aa", "b", "cccc"] {
        enc.tstring(s);
    }
    enc.patch_byte_count(bc);
    let data = enc.into_bytes();
    let total = data.len() as u64;

    let headered = Plan::StlString {
        name: "s".to_string(),
        with_header: true,
    };
    let factories = no_overrides();
    let no_entries: &[u64] = &[];

    // bulk read through the headered reader
    let mut bulk = build(&headered, &factories).expect("build reader");
    let mut cur = rootcodec::Cursor::new(&data, no_entries);
    assert_eq!(bulk.read_many(&mut cur, 3).expect("bulk read"), 3);
    let bulk_end = cur.position();

    // manual header consumption, then three element-wise reads
    let headerless = Plan::StlString {
        name: "s".to_string(),
        with_header: false,
    };
    let mut elementwise = build(&headerless, &factories).expect("build reader");
    let mut cur = rootcodec::Cursor::new(&data, no_entries);
    cur.skip_byte_count().expect("byte count");
    cur.skip_version().expect("version");
    for _ in 0..3 {
        elementwise.read(&mut cur).expect("element read");
    }

    assert_eq!(bulk_end, cur.position());
    assert_eq!(bulk_end, total);
    assert_eq!(bulk.into_data(), elementwise.into_data());
}

// ============================================================================
// Round trip
// ============================================================================

/// Re-encode a decoded `vector<int32>` column with the reference encoder.
fn reencode_vector(content: &Content) -> Vec<u8> {
    let list = content.as_list().expect("list content");
    let values = match list.content.as_numeric().expect("numeric content") {
        NumericData::Int32(v) => v,
        other => panic!("unexpected dtype: {other:?}"),
    };

    let mut enc = BeEncoder::new();
    for w in list.offsets.windows(2) {
        let slice = &values[w[0] as usize..w[1] as usize];
        encode_vector_entry(&mut enc, slice);
    }
    enc.into_bytes()
}

#[test]
fn test_vector_round_trip_is_byte_identical() {
    let entries: &[&[i32]] = &[&[10, 20], &[], &[30], &[40, 50, 60]];
    let (data, offsets) = vector_basket(entries);
    let element = StreamerElement::new("v", "vector<int32_t>").with_ftype(ftype::POINTER_TO_STL);

    let content = read_branch(
        &data,
        Some(&offsets),
        &element,
        &empty_registry(),
        "/t/v",
        &no_overrides(),
    )
    .expect("decode basket");

    assert_eq!(reencode_vector(&content), data);
}

// ============================================================================
// Mode mismatch detection
// ============================================================================

#[test]
fn test_object_wise_plan_rejects_memberwise_wire_before_output() {
    let mut enc = BeEncoder::new();
    let bc = enc.byte_count_placeholder();
    enc.version(9 | (1 << 14));
    enc.bytes(&[0, 0]); // member-wise pad
    enc.u32(1);
    enc.i32(5);
    enc.patch_byte_count(bc);
    let data = enc.into_bytes();
    let offsets = [0u64, data.len() as u64];

    let element = StreamerElement::new("v", "vector<int>").with_ftype(ftype::POINTER_TO_STL);
    let registry = empty_registry();
    let factories = no_overrides();
    let mut planned = plan(&element, &registry, "/t/v", &PlanContext::top(), &factories)
        .expect("plan vector");
    planned.force_mode(Mode::ObjectWise);

    let reader = build(&planned, &factories).expect("build reader");
    let err = decode_entries(reader, &data, &offsets).unwrap_err();
    assert!(matches!(err, DecodeError::ModeMismatch { .. }));
}

// ============================================================================
// Forms
// ============================================================================

#[test]
fn test_form_predicts_decoded_shape() {
    let element =
        StreamerElement::new("m", "map<int32_t,double>").with_ftype(ftype::POINTER_TO_STL);
    let registry = empty_registry();
    let factories = no_overrides();

    let planned = plan(&element, &registry, "/t/m", &PlanContext::top(), &factories)
        .expect("plan map");
    let form = form_of(&planned, &factories).expect("form of map");

    assert_eq!(
        form,
        Form::ListOffset {
            content: Box::new(Form::Record {
                fields: vec!["key".to_string(), "val".to_string()],
                contents: vec![
                    Form::Numeric(PrimitiveType::Int32),
                    Form::Numeric(PrimitiveType::Float64),
                ],
            }),
            is_string: false,
        }
    );
}
