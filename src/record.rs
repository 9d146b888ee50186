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

//! Assembling complete journal records.
//!
//! A record is the priority field, the caller's location, any process-wide variables, any
//! per-record fields & finally the message, in that order. The daemon doesn't care about order,
//! but it keeps records reproducible.

use crate::{field, location::CallSite};

use bytes::{BufMut, Bytes, BytesMut};

/// Framing for the `MESSAGE` field itself
const MESSAGE_SLACK: usize = "MESSAGE".len() + field::FIELD_OVERHEAD;

/// Format `args` into the bytes of a `MESSAGE` field.
///
/// A `Display` implementation that fails part-way leaves us with whatever it managed to write;
/// that's logged as-is rather than reported.
pub fn format_message(args: std::fmt::Arguments<'_>) -> Vec<u8> {
    // Static messages (`info!("starting")`) needn't go through the formatting machinery
    if let Some(s) = args.as_str() {
        return s.as_bytes().to_vec();
    }
    // Not `std::io::Write`: its `write_fmt()` panics if the formatter fails on its own
    use std::fmt::Write;
    let mut msg = String::with_capacity(80);
    let _ = msg.write_fmt(args);
    msg.into_bytes()
}

/// Assemble a record from an encoded priority field, a call site, the encoded extra variables &
/// the message.
pub fn assemble(priority: &[u8], site: &CallSite, extra: &[u8], message: &[u8]) -> Bytes {
    assemble_with(priority, site, extra, &[], message)
}

/// Assemble a record that also carries per-record `fields`, written after the extra variables.
pub fn assemble_with(
    priority: &[u8],
    site: &CallSite,
    extra: &[u8],
    fields: &[(String, Vec<u8>)],
    message: &[u8],
) -> Bytes {
    let cb = priority.len()
        + site.fields().len()
        + extra.len()
        + fields
            .iter()
            .map(|(name, value)| field::encoded_len(name, value))
            .sum::<usize>()
        + message.len()
        + MESSAGE_SLACK;

    let mut buf = BytesMut::with_capacity(cb);
    buf.put_slice(priority);
    buf.put_slice(site.fields());
    buf.put_slice(extra);
    for (name, value) in fields {
        field::put_field(&mut buf, name, value);
    }
    field::put_field(&mut buf, "MESSAGE", message);
    debug_assert_eq!(buf.len(), cb);
    buf.freeze()
}
