// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! STL sequence and map readers.
//!
//! Both containers store a u32 element count followed by their payload.
//! The optional outer header is a byte-count plus a version word; bit 14
//! of the version marks the payload member-wise. Member-wise sequences
//! skip an extra 2 bytes after the version, maps always skip 6.
//!
//! When the plan fixes a serialization mode, a wire header that indicates
//! the other mode is fatal before any payload is decoded.

use tracing::trace;

use crate::core::{DecodeError, Result};
use crate::decode::cursor::{Cursor, STREAMED_MEMBERWISE};
use crate::decode::plan::Mode;

use super::{RawData, Reader};

/// Extra bytes after a member-wise sequence version word.
const MEMBERWISE_SEQ_PAD: usize = 2;

/// Extra bytes after a map version word.
const MAP_HEADER_PAD: usize = 6;

fn check_mode(mode: Mode, wire_memberwise: bool) -> Result<()> {
    match mode {
        Mode::ObjectWise if wire_memberwise => Err(DecodeError::mode_mismatch(
            Mode::ObjectWise.as_str(),
            Mode::MemberWise.as_str(),
        )),
        Mode::MemberWise if !wire_memberwise => Err(DecodeError::mode_mismatch(
            Mode::MemberWise.as_str(),
            Mode::ObjectWise.as_str(),
        )),
        _ => Ok(()),
    }
}

/// Reads sequence-like STL containers (`vector`, `set`, ...).
pub struct StlSeqReader {
    name: String,
    with_header: bool,
    mode: Mode,
    element: Box<dyn Reader>,
    offsets: Vec<i64>,
}

impl StlSeqReader {
    pub fn new(name: String, with_header: bool, mode: Mode, element: Box<dyn Reader>) -> Self {
        StlSeqReader {
            name,
            with_header,
            mode,
            element,
            offsets: vec![0],
        }
    }

    fn read_body(&mut self, cur: &mut Cursor<'_>, memberwise: bool) -> Result<()> {
        let fsize = cur.read_u32()? as i64;
        let last = *self.offsets.last().expect("offsets seeded with 0");
        self.offsets.push(last + fsize);

        trace!(reader = %self.name, fsize, memberwise, "sequence body");

        if memberwise {
            self.element.read_many_memberwise(cur, fsize)?;
        } else {
            self.element.read_many(cur, fsize)?;
        }
        Ok(())
    }
}

impl Reader for StlSeqReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        let result = (|| -> Result<()> {
            cur.skip_byte_count()?;
            let version = cur.read_version()?;
            let memberwise = version & STREAMED_MEMBERWISE != 0;
            check_mode(self.mode, memberwise)?;
            if memberwise {
                cur.skip(MEMBERWISE_SEQ_PAD)?;
            }
            self.read_body(cur, memberwise)
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

                let version = cur.read_version()?;
                let memberwise = version & STREAMED_MEMBERWISE != 0;
                check_mode(self.mode, memberwise)?;
                if memberwise {
                    cur.skip(MEMBERWISE_SEQ_PAD)?;
                }

                let mut n = 0;
                while cur.position() < end_pos {
                    self.read_body(cur, memberwise)?;
                    n += 1;
                }
                return Ok(n);
            }

            let mut memberwise = self.mode == Mode::MemberWise;
            if self.with_header {
                cur.skip_byte_count()?;
                let version = cur.read_version()?;
                memberwise = version & STREAMED_MEMBERWISE != 0;
                check_mode(self.mode, memberwise)?;
            }
            if memberwise {
                cur.skip(MEMBERWISE_SEQ_PAD)?;
            }

            for _ in 0..count {
                self.read_body(cur, memberwise)?;
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

            let mut memberwise = self.mode == Mode::MemberWise;
            if self.with_header {
                cur.skip_byte_count()?;
                let version = cur.read_version()?;
                memberwise = version & STREAMED_MEMBERWISE != 0;
                check_mode(self.mode, memberwise)?;
            }
            if memberwise {
                cur.skip(MEMBERWISE_SEQ_PAD)?;
            }

            let mut n = 0;
            while cur.position() < end_pos {
                self.read_body(cur, memberwise)?;
                n += 1;
            }
            Ok(n)
        })();
        result.map_err(|e| e.in_reader(&self.name))
    }

    fn into_data(self: Box<Self>) -> RawData {
        RawData::List {
            offsets: self.offsets,
            element: Box::new(self.element.into_data()),
        }
    }
}

/// Reads mapping-like STL containers (`map`, `unordered_map`, ...).
pub struct StlMapReader {
    name: String,
    with_header: bool,
    mode: Mode,
    key: Box<dyn Reader>,
    val: Box<dyn Reader>,
    offsets: Vec<i64>,
}

impl StlMapReader {
    pub fn new(
        name: String,
        with_header: bool,
        mode: Mode,
        key: Box<dyn Reader>,
        val: Box<dyn Reader>,
    ) -> Self {
        StlMapReader {
            name,
            with_header,
            mode,
            key,
            val,
            offsets: vec![0],
        }
    }

    fn read_body(&mut self, cur: &mut Cursor<'_>, memberwise: bool) -> Result<()> {
        let fsize = cur.read_u32()? as i64;
        let last = *self.offsets.last().expect("offsets seeded with 0");
        self.offsets.push(last + fsize);

        trace!(reader = %self.name, fsize, memberwise, "map body");

        if memberwise {
            // all keys first, then all values
            self.key.read_many(cur, fsize)?;
            self.val.read_many(cur, fsize)?;
        } else {
            for _ in 0..fsize {
                self.key.read(cur)?;
                self.val.read(cur)?;
            }
        }
        Ok(())
    }
}

impl Reader for StlMapReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        let result = (|| -> Result<()> {
            cur.skip_byte_count()?;
            let version = cur.read_version()?;
            cur.skip(MAP_HEADER_PAD)?;

            let memberwise = version & STREAMED_MEMBERWISE != 0;
            check_mode(self.mode, memberwise)?;
            self.read_body(cur, memberwise)
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

                let version = cur.read_version()?;
                cur.skip(MAP_HEADER_PAD)?;

                let memberwise = version & STREAMED_MEMBERWISE != 0;
                check_mode(self.mode, memberwise)?;

                let mut n = 0;
                while cur.position() < end_pos {
                    self.read_body(cur, memberwise)?;
                    n += 1;
                }
                return Ok(n);
            }

            let mut memberwise = self.mode == Mode::MemberWise;
            if self.with_header {
                cur.skip_byte_count()?;
                let version = cur.read_version()?;
                cur.skip(MAP_HEADER_PAD)?;

                memberwise = version & STREAMED_MEMBERWISE != 0;
                check_mode(self.mode, memberwise)?;
            }

            for _ in 0..count {
                self.read_body(cur, memberwise)?;
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

            let mut memberwise = self.mode == Mode::MemberWise;
            if self.with_header {
                cur.skip_byte_count()?;
                let version = cur.read_version()?;
                cur.skip(MAP_HEADER_PAD)?;

                memberwise = version & STREAMED_MEMBERWISE != 0;
                check_mode(self.mode, memberwise)?;
            }

            let mut n = 0;
            while cur.position() < end_pos {
                self.read_body(cur, memberwise)?;
                n += 1;
            }
            Ok(n)
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
        check_mode(self.mode, true).map_err(|e| e.in_reader(&self.name))?;
        self.read_many(cur, count)
    }

    fn into_data(self: Box<Self>) -> RawData {
        RawData::Pairs {
            offsets: self.offsets,
            keys: Box::new(self.key.into_data()),
            vals: Box::new(self.val.into_data()),
        }
    }
}
