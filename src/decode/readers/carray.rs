// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! C-style array reader.
//!
//! Fixed arrays decode a known flat element count per entry. Jagged
//! arrays carry no count of their own: they decode until the current
//! entry's end boundary, looked up in the cursor's entry-offset table,
//! and record the element count per entry in their own offset array.

use tracing::trace;

use crate::core::{DecodeError, Result};
use crate::decode::cursor::Cursor;

use super::{RawData, Reader};

/// Reads fixed (`flat_size >= 0`) or jagged (`flat_size < 0`) C-style
/// arrays of its element.
pub struct CStyleArrayReader {
    name: String,
    flat_size: i64,
    element: Box<dyn Reader>,
    offsets: Vec<i64>,
}

impl CStyleArrayReader {
    pub fn new(name: String, flat_size: i64, element: Box<dyn Reader>) -> Self {
        CStyleArrayReader {
            name,
            flat_size,
            element,
            offsets: vec![0],
        }
    }
}

impl Reader for CStyleArrayReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        let result = (|| -> Result<()> {
            if self.flat_size >= 0 {
                self.element.read_many(cur, self.flat_size)?;
                return Ok(());
            }

            let end_pos = cur.entry_end_after(cur.position())?;
            let count = self.element.read_until(cur, end_pos)?;
            let last = *self.offsets.last().expect("offsets seeded with 0");
            self.offsets.push(last + count);

            trace!(reader = %self.name, count, end_pos, "jagged array entry");
            Ok(())
        })();
        result.map_err(|e| e.in_reader(&self.name))
    }

    fn read_many(&mut self, cur: &mut Cursor<'_>, count: i64) -> Result<i64> {
        if self.flat_size < 0 {
            return Err(DecodeError::schema(
                self.name.clone(),
                "bulk read of a jagged array is not supported",
            ));
        }
        if count < 0 {
            return Err(DecodeError::schema(
                self.name.clone(),
                "negative element count requires a byte-count header",
            ));
        }
        for _ in 0..count {
            self.element
                .read_many(cur, self.flat_size)
                .map_err(|e| e.in_reader(&self.name))?;
        }
        Ok(count)
    }

    fn read_until(&mut self, _cur: &mut Cursor<'_>, _end_pos: u64) -> Result<i64> {
        Err(DecodeError::schema(
            self.name.clone(),
            "read_until is not supported for C-style arrays",
        ))
    }

    fn into_data(self: Box<Self>) -> RawData {
        if self.flat_size >= 0 {
            self.element.into_data()
        } else {
            RawData::List {
                offsets: self.offsets,
                element: Box::new(self.element.into_data()),
            }
        }
    }
}
