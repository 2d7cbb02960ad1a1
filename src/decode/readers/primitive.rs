// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Primitive and `TArray` readers.

use crate::core::{NumericData, PrimitiveType, Result};
use crate::decode::cursor::Cursor;

use super::{RawData, Reader};

/// Append one big-endian value of the buffer's type.
///
/// Booleans are buffered as raw bytes; re-typing happens at assembly.
fn append_value(buf: &mut NumericData, cur: &mut Cursor<'_>) -> Result<()> {
    match buf {
        NumericData::Bool(v) => v.push(cur.read_u8()? != 0),
        NumericData::Int8(v) => v.push(cur.read_i8()?),
        NumericData::Int16(v) => v.push(cur.read_i16()?),
        NumericData::Int32(v) => v.push(cur.read_i32()?),
        NumericData::Int64(v) => v.push(cur.read_i64()?),
        NumericData::UInt8(v) => v.push(cur.read_u8()?),
        NumericData::UInt16(v) => v.push(cur.read_u16()?),
        NumericData::UInt32(v) => v.push(cur.read_u32()?),
        NumericData::UInt64(v) => v.push(cur.read_u64()?),
        NumericData::Float32(v) => v.push(cur.read_f32()?),
        NumericData::Float64(v) => v.push(cur.read_f64()?),
    }
    Ok(())
}

/// Reads fixed-width numeric values into a flat buffer.
pub struct PrimitiveReader {
    name: String,
    buf: NumericData,
}

impl PrimitiveReader {
    pub fn new(name: String, ctype: PrimitiveType) -> Self {
        PrimitiveReader {
            name,
            buf: NumericData::for_ctype(ctype),
        }
    }
}

impl Reader for PrimitiveReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        append_value(&mut self.buf, cur).map_err(|e| e.in_reader(&self.name))
    }

    fn into_data(self: Box<Self>) -> RawData {
        RawData::Numeric(self.buf)
    }
}

/// Reads `TArray*` payloads: a u32 count followed by that many primitives.
/// No version word or byte count precedes the payload.
pub struct TArrayReader {
    name: String,
    buf: NumericData,
    offsets: Vec<i64>,
}

impl TArrayReader {
    pub fn new(name: String, ctype: PrimitiveType) -> Self {
        TArrayReader {
            name,
            buf: NumericData::for_ctype(ctype),
            offsets: vec![0],
        }
    }
}

impl Reader for TArrayReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        let result = (|| -> Result<()> {
            let fsize = cur.read_u32()? as i64;
            let last = *self.offsets.last().expect("offsets seeded with 0");
            self.offsets.push(last + fsize);
            for _ in 0..fsize {
                append_value(&mut self.buf, cur)?;
            }
            Ok(())
        })();
        result.map_err(|e: crate::core::DecodeError| e.in_reader(&self.name))
    }

    fn into_data(self: Box<Self>) -> RawData {
        RawData::List {
            offsets: self.offsets,
            element: Box::new(RawData::Numeric(self.buf)),
        }
    }
}
