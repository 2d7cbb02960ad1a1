// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Object-shaped readers: `TObject`, header wrappers, groups, user
//! classes, and the empty placeholder.

use crate::core::{DecodeError, Result};
use crate::decode::cursor::{Cursor, IS_REFERENCED, NEW_CLASS_TAG};

use super::{RawData, Reader};

/// Reads a base `TObject`: version, `fUniqueID`, `fBits`, and a 2-byte
/// pid when the referenced flag is set. The payload is discarded unless
/// the item path was configured to keep it.
pub struct TObjectReader {
    name: String,
    keep_data: bool,
    unique_ids: Vec<i32>,
    bits: Vec<u32>,
    pidf: Vec<u16>,
    pidf_offsets: Vec<i64>,
}

impl TObjectReader {
    pub fn new(name: String, keep_data: bool) -> Self {
        TObjectReader {
            name,
            keep_data,
            unique_ids: Vec::new(),
            bits: Vec::new(),
            pidf: Vec::new(),
            pidf_offsets: vec![0],
        }
    }
}

impl Reader for TObjectReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        let result = (|| -> Result<()> {
            if !self.keep_data {
                return cur.skip_tobject();
            }

            cur.skip_version()?;
            let unique_id = cur.read_i32()?;
            let fbits = cur.read_u32()?;
            if fbits & IS_REFERENCED != 0 {
                self.pidf.push(cur.read_u16()?);
            }

            self.unique_ids.push(unique_id);
            self.bits.push(fbits);
            self.pidf_offsets.push(self.pidf.len() as i64);
            Ok(())
        })();
        result.map_err(|e| e.in_reader(&self.name))
    }

    fn into_data(self: Box<Self>) -> RawData {
        if !self.keep_data {
            return RawData::None;
        }
        RawData::TObject {
            unique_ids: self.unique_ids,
            bits: self.bits,
            pidf: self.pidf,
            pidf_offsets: self.pidf_offsets,
        }
    }
}

/// Consumes a byte-count and a version word, then delegates to its
/// element. The advertised length is not independently verified here.
pub struct NBytesVersionReader {
    name: String,
    element: Box<dyn Reader>,
}

impl NBytesVersionReader {
    pub fn new(name: String, element: Box<dyn Reader>) -> Self {
        NBytesVersionReader { name, element }
    }
}

impl Reader for NBytesVersionReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        let result = (|| -> Result<()> {
            cur.skip_byte_count()?;
            cur.skip_version()?;
            self.element.read(cur)
        })();
        result.map_err(|e| e.in_reader(&self.name))
    }

    fn into_data(self: Box<Self>) -> RawData {
        self.element.into_data()
    }
}

/// Reads a polymorphic object header: byte-count, u32 tag, and the
/// null-terminated class name behind a new-class tag; then the element.
/// The cursor must land exactly on the advertised span end.
pub struct ObjectHeaderReader {
    name: String,
    element: Box<dyn Reader>,
}

impl ObjectHeaderReader {
    pub fn new(name: String, element: Box<dyn Reader>) -> Self {
        ObjectHeaderReader { name, element }
    }
}

impl Reader for ObjectHeaderReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        let result = (|| -> Result<()> {
            let nbytes = cur.read_byte_count()? as u64;
            let start = cur.position();
            let end = start + nbytes;

            let tag = cur.read_u32()?;
            if tag == NEW_CLASS_TAG {
                cur.skip_cstring()?;
            }

            self.element.read(cur)?;

            if cur.position() != end {
                return Err(DecodeError::framing(
                    "object span",
                    nbytes,
                    cur.position() - start,
                    cur.position(),
                ));
            }
            Ok(())
        })();
        result.map_err(|e| e.in_reader(&self.name))
    }

    fn into_data(self: Box<Self>) -> RawData {
        self.element.into_data()
    }
}

/// Invokes each sub-reader once, in member order. Carries no framing of
/// its own.
pub struct GroupReader {
    name: String,
    subs: Vec<Box<dyn Reader>>,
}

impl GroupReader {
    pub fn new(name: String, subs: Vec<Box<dyn Reader>>) -> Self {
        GroupReader { name, subs }
    }
}

impl Reader for GroupReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        for sub in &mut self.subs {
            sub.read(cur).map_err(|e| e.in_reader(&self.name))?;
        }
        Ok(())
    }

    /// The column-first transpose: each sub-reader decodes all `count`
    /// of its values before the next one starts.
    fn read_many_memberwise(&mut self, cur: &mut Cursor<'_>, count: i64) -> Result<i64> {
        if count < 0 {
            return Err(DecodeError::schema(
                self.name.clone(),
                "member-wise read requires a non-negative count",
            ));
        }
        for sub in &mut self.subs {
            sub.read_many(cur, count).map_err(|e| e.in_reader(&self.name))?;
        }
        Ok(count)
    }

    fn into_data(self: Box<Self>) -> RawData {
        RawData::Fields(self.subs.into_iter().map(Reader::into_data).collect())
    }
}

/// Reads a user-class object: byte-count, version, then each member. The
/// cursor must land exactly on the advertised span end.
pub struct AnyClassReader {
    name: String,
    subs: Vec<Box<dyn Reader>>,
}

impl AnyClassReader {
    pub fn new(name: String, subs: Vec<Box<dyn Reader>>) -> Self {
        AnyClassReader { name, subs }
    }
}

impl Reader for AnyClassReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        let result = (|| -> Result<()> {
            let nbytes = cur.read_byte_count()? as u64;
            let start = cur.position();
            let end = start + nbytes;

            cur.skip_version()?;

            for sub in &mut self.subs {
                sub.read(cur)?;
            }

            if cur.position() != end {
                return Err(DecodeError::framing(
                    "object span",
                    nbytes,
                    cur.position() - start,
                    cur.position(),
                ));
            }
            Ok(())
        })();
        result.map_err(|e| e.in_reader(&self.name))
    }

    fn read_many_memberwise(&mut self, cur: &mut Cursor<'_>, count: i64) -> Result<i64> {
        if count < 0 {
            return Err(DecodeError::schema(
                self.name.clone(),
                "member-wise read requires a non-negative count",
            ));
        }
        for sub in &mut self.subs {
            sub.read_many(cur, count).map_err(|e| e.in_reader(&self.name))?;
        }
        Ok(count)
    }

    fn into_data(self: Box<Self>) -> RawData {
        RawData::Fields(self.subs.into_iter().map(Reader::into_data).collect())
    }
}

/// Consumes no bytes and yields no data.
pub struct EmptyReader {
    name: String,
}

impl EmptyReader {
    pub fn new(name: String) -> Self {
        EmptyReader { name }
    }
}

impl Reader for EmptyReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, _cur: &mut Cursor<'_>) -> Result<()> {
        Ok(())
    }

    fn into_data(self: Box<Self>) -> RawData {
        RawData::None
    }
}
