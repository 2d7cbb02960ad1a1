// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests: a small big-endian reference
//! encoder for synthesizing basket payloads.

#![allow(dead_code)]

use byteorder::{BigEndian, WriteBytesExt};

/// Byte-count tag bit, mirrored here so encoded fixtures stay
/// self-contained.
pub const BYTE_COUNT_MASK: u32 = 0x4000_0000;

/// Append-only big-endian payload builder.
pub struct BeEncoder {
    buf: Vec<u8>,
}

impl BeEncoder {
    pub fn new() -> Self {
        BeEncoder { buf: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.write_u16::<BigEndian>(v).expect("vec write");
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.write_u32::<BigEndian>(v).expect("vec write");
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.write_u64::<BigEndian>(v).expect("vec write");
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.buf.write_i16::<BigEndian>(v).expect("vec write");
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.write_i32::<BigEndian>(v).expect("vec write");
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.buf.write_i64::<BigEndian>(v).expect("vec write");
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.buf.write_f32::<BigEndian>(v).expect("vec write");
        self
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.buf.write_f64::<BigEndian>(v).expect("vec write");
        self
    }

    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(v);
        self
    }

    /// Write a version word.
    pub fn version(&mut self, v: i16) -> &mut Self {
        self.i16(v)
    }

    /// Reserve a byte-count word; patch it later with
    /// [`BeEncoder::patch_byte_count`].
    pub fn byte_count_placeholder(&mut self) -> usize {
        let at = self.buf.len();
        self.u32(0);
        at
    }

    /// Patch a reserved byte-count word with the number of bytes written
    /// since, tag bit set.
    pub fn patch_byte_count(&mut self, at: usize) -> &mut Self {
        let span = (self.buf.len() - at - 4) as u32;
        let tagged = span | BYTE_COUNT_MASK;
        self.buf[at..at + 4].copy_from_slice(&tagged.to_be_bytes());
        self
    }

    /// Write a short T-string (length below the extended sentinel).
    pub fn tstring(&mut self, s: &str) -> &mut Self {
        assert!(s.len() < 255, "short-form strings only");
        self.u8(s.len() as u8);
        self.bytes(s.as_bytes())
    }

    /// Write a null-terminated string.
    pub fn cstring(&mut self, s: &str) -> &mut Self {
        self.bytes(s.as_bytes());
        self.u8(0)
    }
}
