// Copyright (C) 2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of journal-native.
//
// journal-native is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// journal-native is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with journal-native.  If
// not, see <http://www.gnu.org/licenses/>.

//! The journal's native field encoding.
//!
//! A journal record is a sequence of fields, each laid out as:
//!
//! ```text
//! FIELD_NAME '\n' <u64 little-endian length of value> <value> '\n'
//! ```
//!
//! The daemon also accepts a plain `NAME=value\n` form for values without newlines, but we always
//! use the length-prefixed form: it is binary-safe & doesn't require us to inspect the value.
//!
//! Field names are *not* validated. The journal wants them to be upper-case ASCII letters, digits
//! & underscores, not starting with an underscore; a name containing a newline will corrupt the
//! record. That is the caller's responsibility.

use crate::error::{Error, Result};

use backtrace::Backtrace;
use bytes::{BufMut, Bytes, BytesMut};

/// Framing overhead per field: the newline after the name, the length & the trailing newline.
pub const FIELD_OVERHEAD: usize = 1 + 8 + 1;

/// The exact number of bytes [`put_field`] will write for `name` & `value`.
pub fn encoded_len(name: &str, value: &[u8]) -> usize {
    name.len() + value.len() + FIELD_OVERHEAD
}

/// Append one encoded field to `buf`.
pub fn put_field<B: BufMut>(buf: &mut B, name: &str, value: &[u8]) {
    buf.put_slice(name.as_bytes());
    buf.put_u8(b'\n');
    buf.put_u64_le(value.len() as u64);
    buf.put_slice(value);
    buf.put_u8(b'\n');
}

/// Encode a single field into a freshly-allocated buffer.
pub fn encode(name: &str, value: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(encoded_len(name, value));
    put_field(&mut buf, name, value);
    buf.freeze()
}

/// Split an encoded record back into its fields.
///
/// This is the inverse of a sequence of [`put_field`] calls; it's what the daemon does on
/// receipt. Handy for tests & for inspecting records before they're sent.
pub fn decode(mut buf: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let total = buf.len();
    let malformed = |rest: &[u8]| Error::Malformed {
        offset: total - rest.len(),
        back: Backtrace::new(),
    };

    let mut fields = Vec::new();
    while !buf.is_empty() {
        let nl = buf
            .iter()
            .position(|&x| x == b'\n')
            .ok_or_else(|| malformed(buf))?;
        let name = String::from_utf8_lossy(&buf[..nl]).into_owned();
        buf = &buf[nl + 1..];

        if buf.len() < 8 {
            return Err(malformed(buf));
        }
        let mut len = [0u8; 8];
        len.copy_from_slice(&buf[..8]);
        buf = &buf[8..];
        let len = u64::from_le_bytes(len);

        // `len` comes off the wire; don't trust it to fit in memory (or in a `usize`).
        if len >= buf.len() as u64 {
            return Err(malformed(buf));
        }
        let len = len as usize;
        if buf[len] != b'\n' {
            return Err(malformed(&buf[len..]));
        }
        fields.push((name, buf[..len].to_vec()));
        buf = &buf[len + 1..];
    }
    Ok(fields)
}
