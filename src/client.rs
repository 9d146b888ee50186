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

//! The journal client.
//!
//! [`Client`] ties the pieces together: on each logging call it resolves the caller's location,
//! formats the message, assembles the record & hands it to the writer thread. Everything that can
//! be computed ahead of time (the `PRIORITY` fields, the extra variables, call-site locations)
//! is, so that the per-call work is a stack walk, a hash lookup, the formatting & a copy.

use crate::{
    error::Result,
    field,
    location::{CallSite, CallerResolver, StackWalker},
    priority::Priority,
    record,
    transport::{Transport, UnixSocket, JOURNAL_SOCKET},
    writer::{Writer, DEFAULT_CAPACITY},
};

use bytes::{Bytes, BytesMut};
use parking_lot::RwLock;

use std::{
    borrow::Cow,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

struct Inner {
    writer: Writer,
    /// Pre-encoded `PRIORITY` fields, indexed by [`Priority`]
    priorities: [Bytes; 8],
    /// Encoded fields added to every record
    extra: RwLock<BytesMut>,
    resolver: CallerResolver,
    debug: AtomicBool,
}

/// A handle on the journal.
///
/// Cheap to clone; all clones share the same queue, variables & call-site cache. When the last
/// one is dropped the writer thread sends whatever is still queued & exits. Delivery is
/// best-effort: records still queued when the _process_ exits are lost, so call [`Client::flush`]
/// before exiting if that matters.
///
/// ```no_run
/// use journal_native::{journal_info, Client};
///
/// let journal = Client::new().unwrap();
/// journal.add_variable("SESSION", "7e0a");
/// journal.info(format_args!("starting"));
/// journal_info!(journal, "log entry #{}", 1);
/// journal.flush().unwrap();
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Connect to journald at its well-known socket with default settings.
    ///
    /// This is the only operation that can fail; if journald isn't running (or we're not allowed
    /// to talk to it), you'll get [`Error::Connect`] here & will have to log some other way.
    ///
    /// [`Error::Connect`]: crate::error::Error::Connect
    pub fn new() -> Result<Client> {
        Client::builder().connect()
    }
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }
    /// Add `name=value` to every record logged from now on.
    ///
    /// Handy for session or instance identifiers. Records already assembled are unaffected, and
    /// there's no taking it back. `name` should follow journald's rules for field names
    /// (upper-case letters, digits & underscores); it is not checked.
    pub fn add_variable<V: AsRef<[u8]>>(&self, name: &str, value: V) {
        field::put_field(&mut *self.inner.extra.write(), name, value.as_ref());
    }
    /// Turn debug-level records on or off
    pub fn set_debug(&self, on: bool) {
        self.inner.debug.store(on, Ordering::Relaxed);
    }
    pub fn debug_enabled(&self) -> bool {
        self.inner.debug.load(Ordering::Relaxed)
    }
    /// Log at [`Priority::LOG_DEBUG`]; does nothing at all unless debugging is enabled.
    pub fn debug(&self, args: std::fmt::Arguments<'_>) {
        if self.debug_enabled() {
            self.entry(Priority::LOG_DEBUG, args);
        }
    }
    /// Log at [`Priority::LOG_INFO`]
    pub fn info(&self, args: std::fmt::Arguments<'_>) {
        self.entry(Priority::LOG_INFO, args);
    }
    /// Log at [`Priority::LOG_ERR`]
    pub fn error(&self, args: std::fmt::Arguments<'_>) {
        self.entry(Priority::LOG_ERR, args);
    }
    /// Log at an arbitrary priority. [`Priority::LOG_DEBUG`] is subject to the debug flag, as with
    /// [`Client::debug`].
    pub fn log(&self, priority: Priority, args: std::fmt::Arguments<'_>) {
        if priority != Priority::LOG_DEBUG || self.debug_enabled() {
            self.entry(priority, args);
        }
    }
    /// Block until everything logged (by any thread) before this call has been sent.
    pub fn flush(&self) -> Result<()> {
        self.inner.writer.flush()
    }
    /// Log a record whose location is already known; `identity` keys the location cache.
    ///
    /// Unlike the other logging methods this doesn't check the debug flag; that's up to the
    /// caller.
    pub(crate) fn log_at<F: FnOnce() -> CallSite>(
        &self,
        priority: Priority,
        identity: usize,
        make_site: F,
        fields: &[(String, Vec<u8>)],
        message: &[u8],
    ) {
        let site = self.inner.resolver.resolve_with(identity, make_site);
        let record = {
            let extra = self.inner.extra.read();
            record::assemble_with(
                &self.inner.priorities[priority as usize],
                &site,
                &extra,
                fields,
                message,
            )
        };
        self.inner.writer.send(record);
    }
    fn entry(&self, priority: Priority, args: std::fmt::Arguments<'_>) {
        let site = self.inner.resolver.resolve(0);
        let message = record::format_message(args);
        let record = {
            let extra = self.inner.extra.read();
            record::assemble(
                &self.inner.priorities[priority as usize],
                &site,
                &extra,
                &message,
            )
        };
        self.inner.writer.send(record);
    }
}

/// Configure & connect a [`Client`].
///
/// ```no_run
/// use journal_native::Client;
///
/// let journal = Client::builder()
///     .capacity(1000)
///     .debug(true)
///     .library_frames("myapp::logging::")
///     .connect()
///     .unwrap();
/// ```
pub struct ClientBuilder {
    socket_path: PathBuf,
    transport: Option<Box<dyn Transport + Send>>,
    capacity: usize,
    debug: bool,
    library_frames: Vec<Cow<'static, str>>,
    walker: Option<Box<dyn StackWalker>>,
}

impl std::default::Default for ClientBuilder {
    fn default() -> Self {
        ClientBuilder {
            socket_path: PathBuf::from(JOURNAL_SOCKET),
            transport: None,
            capacity: DEFAULT_CAPACITY,
            debug: false,
            library_frames: Vec::new(),
            walker: None,
        }
    }
}

impl ClientBuilder {
    /// Connect to a socket other than journald's usual one
    pub fn socket_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.socket_path = path.into();
        self
    }
    /// Send records on `transport` rather than connecting to a socket
    pub fn transport<T: Transport + Send + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }
    /// How many records may be queued before logging calls start to block
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
    /// Treat functions whose names begin with `prefix` as part of the logging library when
    /// looking for the caller; may be given more than once.
    pub fn library_frames<P: Into<Cow<'static, str>>>(mut self, prefix: P) -> Self {
        self.library_frames.push(prefix.into());
        self
    }
    /// Walk the stack with something other than [`BacktraceWalker`]
    ///
    /// [`BacktraceWalker`]: crate::location::BacktraceWalker
    pub fn stack_walker<W: StackWalker + 'static>(mut self, walker: W) -> Self {
        self.walker = Some(Box::new(walker));
        self
    }
    pub fn connect(self) -> Result<Client> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Box::new(UnixSocket::new(&self.socket_path)?),
        };
        let writer = Writer::spawn(transport, self.capacity)?;

        let mut resolver = match self.walker {
            Some(walker) => CallerResolver::with_walker(walker),
            None => CallerResolver::default(),
        };
        for prefix in self.library_frames {
            resolver.add_library_frames(prefix);
        }

        Ok(Client {
            inner: Arc::new(Inner {
                writer,
                priorities: Priority::ALL.map(|p| p.encode()),
                extra: RwLock::new(BytesMut::new()),
                resolver,
                debug: AtomicBool::new(self.debug),
            }),
        })
    }
}

/// Log at debug level through a [`Client`]: `journal_debug!(client, "x={}", x)`
#[macro_export]
macro_rules! journal_debug {
    ($client:expr, $($arg:tt)+) => {
        $client.debug(::std::format_args!($($arg)+))
    };
}

/// Log at info level through a [`Client`]: `journal_info!(client, "x={}", x)`
#[macro_export]
macro_rules! journal_info {
    ($client:expr, $($arg:tt)+) => {
        $client.info(::std::format_args!($($arg)+))
    };
}

/// Log at error level through a [`Client`]: `journal_error!(client, "x={}", x)`
#[macro_export]
macro_rules! journal_error {
    ($client:expr, $($arg:tt)+) => {
        $client.error(::std::format_args!($($arg)+))
    };
}
