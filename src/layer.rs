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

//! A [`tracing-subscriber`] [`Layer`] that sends [`tracing`] [`Event`]s to the journal.
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//!
//! Events already know where they came from, so no stack walking is involved: `CODE_FILE` &
//! `CODE_LINE` come from the event's metadata, `CODE_FUNC` is its module path, and the encoded
//! fields are cached per callsite. The event's `message` becomes `MESSAGE`, its target `TARGET`,
//! and every other field is sent as a field of its own, its name upper-cased. An event field that
//! would collide with one of those (`priority`, say) or that starts with a digit is sent as
//! `FIELD_PRIORITY`, so each record carries exactly one `PRIORITY` & one `MESSAGE`.
//!
//! ```no_run
//! use journal_native::{layer::JournalLayer, Client};
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//! use tracing_subscriber::registry::Registry;
//!
//! let subscriber = Registry::default().with(JournalLayer::new(Client::new().unwrap()));
//! tracing::subscriber::set_global_default(subscriber).unwrap();
//!
//! tracing::info!(user = "sp1ff", "Hello, world!");
//! ```

use crate::{client::Client, location::CallSite, priority::Priority};

use tracing::Event;
use tracing_core::field::{Field, Visit};
use tracing_subscriber::layer::Context;

use std::path::Path;

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Forwards [`tracing`] events to a [`Client`].
///
/// Events at `TRACE` & `DEBUG` map to [`Priority::LOG_DEBUG`] & are only forwarded when the
/// client has debugging enabled. Events emitted by this crate itself are never forwarded.
///
/// [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
pub struct JournalLayer {
    client: Client,
}

impl JournalLayer {
    pub fn new(client: Client) -> JournalLayer {
        JournalLayer { client }
    }
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Fields every record sent from here already carries; event fields mustn't add second copies.
const RECORD_FIELDS: &[&str] = &[
    "PRIORITY",
    "MESSAGE",
    "CODE_FILE",
    "CODE_LINE",
    "CODE_FUNC",
    "TARGET",
];

/// Prefix for event field names that would otherwise clash with [`RECORD_FIELDS`] or that
/// journald would reject
const FIELD_PREFIX: &str = "FIELD_";

/// Turn a tracing field name into something journald will accept: upper-case ASCII letters,
/// digits & underscores, starting with a letter (leading underscores are reserved for the daemon,
/// and leading digits are refused). Names of fields the record already has are prefixed.
fn journal_field_name(name: &str) -> String {
    let name = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('_')
        .to_string();
    if name.starts_with(|c: char| c.is_ascii_digit()) || RECORD_FIELDS.contains(&name.as_str()) {
        format!("{}{}", FIELD_PREFIX, name)
    } else {
        name
    }
}

#[derive(Default)]
struct JournalVisitor {
    message: Option<String>,
    fields: Vec<(String, Vec<u8>)>,
}

impl JournalVisitor {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            let name = journal_field_name(field.name());
            if !name.is_empty() {
                self.fields.push((name, value.into_bytes()));
            }
        }
    }
}

impl Visit for JournalVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // The tracing macros "pre-format" the `message` field into a `std::fmt::Arguments`, whose
        // debug format has no enclosing double-quotes.
        self.push(field, format!("{:?}", value));
    }
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }
    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, value.to_string());
    }
}

impl<S> tracing_subscriber::layer::Layer<S> for JournalLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let target = meta.target();
        // Our own diagnostics (the writer thread's, say) would otherwise feed back into the queue.
        if target == CRATE_TARGET
            || (target.starts_with(CRATE_TARGET) && target[CRATE_TARGET.len()..].starts_with("::"))
        {
            return;
        }

        let priority = Priority::from(meta.level());
        if priority == Priority::LOG_DEBUG && !self.client.debug_enabled() {
            return;
        }

        let mut visitor = JournalVisitor::default();
        event.record(&mut visitor);
        visitor
            .fields
            .push(("TARGET".to_string(), target.as_bytes().to_vec()));

        // Callsite metadata is `'static`, so its address identifies the callsite for the life of
        // the process.
        let identity = meta as *const tracing::Metadata<'_> as usize;
        self.client.log_at(
            priority,
            identity,
            || {
                CallSite::new(
                    identity,
                    meta.file().map(Path::new),
                    meta.line(),
                    meta.module_path(),
                )
            },
            &visitor.fields,
            visitor.message.unwrap_or_default().as_bytes(),
        );
    }
}
