// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! `TString` and `std::string` readers.
//!
//! Both store length-prefixed character data (one byte, or an extended
//! u32 behind the 255 sentinel). The STL variant may additionally carry a
//! byte-count + version header, which the bulk operations hoist out of
//! their loops.

use crate::core::{DecodeError, Result};
use crate::decode::cursor::Cursor;

use super::{RawData, Reader};

/// Reads `TString` values: T-string length, then that many bytes.
pub struct TStringReader {
    name: String,
    bytes: Vec<u8>,
    offsets: Vec<i64>,
}

impl TStringReader {
    pub fn new(name: String) -> Self {
        TStringReader {
            name,
            bytes: Vec::new(),
            offsets: vec![0],
        }
    }
}

impl Reader for TStringReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        let result = (|| -> Result<()> {
            let len = cur.read_tstring_len()?;
            self.bytes.extend_from_slice(cur.read_bytes(len)?);
            self.offsets.push(self.bytes.len() as i64);
            Ok(())
        })();
        result.map_err(|e: DecodeError| e.in_reader(&self.name))
    }

    fn into_data(self: Box<Self>) -> RawData {
        RawData::Chars {
            offsets: self.offsets,
            bytes: self.bytes,
        }
    }
}

/// Reads `std::string` values, optionally behind a byte-count + version
/// header shared by all strings of one bulk read.
pub struct StlStringReader {
    name: String,
    with_header: bool,
    bytes: Vec<u8>,
    offsets: Vec<i64>,
}

impl StlStringReader {
    pub fn new(name: String, with_header: bool) -> Self {
        StlStringReader {
            name,
            with_header,
            bytes: Vec::new(),
            offsets: vec![0],
        }
    }

    fn read_body(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        let len = cur.read_tstring_len()?;
        let last = *self.offsets.last().expect("offsets seeded with 0");
        self.offsets.push(last + len as i64);
        self.bytes.extend_from_slice(cur.read_bytes(len)?);
        Ok(())
    }
}

impl Reader for StlStringReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        let result = (|| -> Result<()> {
            if self.with_header {
                cur.skip_byte_count()?;
                cur.skip_version()?;
            }
            self.read_body(cur)
        })();
        result.map_err(|e| e.in_reader(&self.name))
    }

    fn read_many(&mut self, cur: &mut Cursor<'_>, count: i64) -> Result<i64> {
        let result = (|| -> Result<i64> {
            if count == 0 {
                return Ok(0);
            }

            if count < 0 {
                if !self.with_header {
                    return Err(DecodeError::schema(
                        self.name.clone(),
                        "negative element count requires a byte-count header",
                    ));
                }
                let nbytes = cur.read_byte_count()? as u64;
                let end_pos = cur.position() + nbytes;
                cur.skip_version()?;

                let mut n = 0;
                while cur.position() < end_pos {
                    self.read_body(cur)?;
                    n += 1;
                }
                return Ok(n);
            }

            if self.with_header {
                cur.skip_byte_count()?;
                cur.skip_version()?;
            }
            for _ in 0..count {
                self.read_body(cur)?;
            }
            Ok(count)
        })();
        result.map_err(|e| e.in_reader(&self.name))
    }

    fn read_until(&mut self, cur: &mut Cursor<'_>, end_pos: u64) -> Result<i64> {
        let result = (|| -> Result<i64> {
            if cur.position() == end_pos {
                return Ok(0);
            }

            if self.with_header {
                cur.skip_byte_count()?;
                cur.skip_version()?;
            }

            let mut n = 0;
            while cur.position() < end_pos {
                self.read_body(cur)?;
                n += 1;
            }
            Ok(n)
        })();
        result.map_err(|e| e.in_reader(&self.name))
    }

    fn into_data(self: Box<Self>) -> RawData {
        RawData::Chars {
            offsets: self.offsets,
            bytes: self.bytes,
        }
    }
}
