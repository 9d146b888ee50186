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
//! A lightweight, asynchronous client for the [systemd journal]'s [native protocol]
//!
//! [systemd journal]: https://www.freedesktop.org/software/systemd/man/systemd-journald.service.html
//! [native protocol]: https://systemd.io/JOURNAL_NATIVE_PROTOCOL/
//!
//! # Introduction
//!
//! journald accepts log records as datagrams on a Unix socket at `/run/systemd/journal/socket`.
//! Each record is a sequence of named fields: `MESSAGE` & `PRIORITY` most obviously, but also
//! `CODE_FILE`, `CODE_LINE` & `CODE_FUNC` (which `journalctl` will happily filter on) along with
//! anything else the application cares to add. Values are length-prefixed binary, so multi-line
//! messages need no escaping.
//!
//! This crate produces such records without making the caller wait on the socket: records are
//! assembled on the calling thread & handed to a bounded queue, which a single background thread
//! drains. The caller's location is found by walking the stack, but each call site is only
//! symbolized once; after that, its encoded `CODE_*` fields come out of a cache.
//!
//! Finding the caller relies on debug information. In optimized builds the caller is frequently
//! inlined into its own caller, and without line tables there is no inline chain to recover it
//! from: `CODE_FUNC` will name whatever outer frame survived. If accurate `CODE_*` fields matter
//! in release builds, keep at least line tables in the profile:
//!
//! ```toml
//! [profile.release]
//! debug = "line-tables-only"
//! ```
//!
//! The crate speaks to journald over a Unix socket, so it builds on Unix only.
//!
//! The trade-off is in delivery: if journald goes away, records are silently dropped, & records
//! still queued when the process exits are lost unless the application calls
//! [`Client::flush`] first.
//!
//! # Usage
//!
//! ```no_run
//! use journal_native::{journal_error, journal_info, Client};
//!
//! // Fails only if journald can't be reached
//! let journal = Client::new().unwrap();
//! journal.add_variable("FOO", "bar"); // sent with every record from here on
//!
//! journal_info!(journal, "starting");
//! for i in 0..100 {
//!     journal_info!(journal, "log entry #{}", i);
//! }
//! journal_error!(journal, "failed: {}", "disk full");
//!
//! journal.flush().unwrap();
//! ```
//!
//! Applications using [`tracing`] can send their events to the journal through
//! [`layer::JournalLayer`] instead.
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//!
//! # Organization
//!
//! - [`field`]: the native field encoding (& decoding)
//! - [`priority`]: the `PRIORITY` levels
//! - [`location`]: finding & caching the caller's location
//! - [`record`]: assembling complete records
//! - [`transport`]: getting bytes to journald
//! - [`writer`]: the delivery queue & background writer
//! - [`client`]: the [`Client`] façade
//! - [`layer`]: the [`tracing-subscriber`] integration
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html

pub mod client;
pub mod error;
pub mod field;
pub mod layer;
pub mod location;
pub mod priority;
pub mod record;
pub mod transport;
pub mod writer;

pub use client::{Client, ClientBuilder};
pub use error::{Error, Result};
pub use priority::Priority;
