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

//! Working out who called us.
//!
//! Every record carries `CODE_FILE`, `CODE_LINE` & `CODE_FUNC` fields naming the place in the
//! application that asked for the message to be logged. Finding that place means walking the
//! stack past our own frames, and turning an instruction address into a file, line & function
//! name ("symbolizing" it) is expensive: it means trawling through debug information.
//!
//! Walking the stack, on the other hand, is comparatively cheap, and the return address of a given
//! call site never changes during the life of the process. So [`CallerResolver`] captures the raw
//! return addresses on every call, but symbolizes each address at most once: the result
//! (including the verdict "this frame is one of ours, keep going") is cached, keyed by address.
//!
//! The two halves of that are abstracted behind the [`StackWalker`] trait so that tests can count
//! how often the expensive half runs. [`BacktraceWalker`] is the production implementation, built
//! on the [`backtrace`] crate.
//!
//! [`backtrace`]: https://docs.rs/backtrace

use crate::field;

use bytes::{Bytes, BytesMut};
use parking_lot::RwLock;

use std::{
    borrow::Cow,
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

/// The deepest we'll look for a frame that isn't ours.
///
/// Capturing the stack through [`BacktraceWalker`] takes the `backtrace` crate's process-wide
/// lock, so concurrent logging calls serialize on their stack walks (capped at this many frames)
/// in addition to waiting on a full queue.
pub const MAX_DEPTH: usize = 32;

/// Symbol-name prefixes of frames that belong to this crate's logging path (or to the stack
/// walker itself). Checked after stripping any leading `<`, so that trait impls
/// (`<Foo as Bar>::baz`) & v0-demangled inherent impls (`<Foo>::baz`) match too.
const LIBRARY_FRAMES: &[&str] = &[
    "backtrace::",
    "_Unwind_",
    concat!(env!("CARGO_CRATE_NAME"), "::client::Client"),
    concat!(env!("CARGO_CRATE_NAME"), "::location::BacktraceWalker"),
    concat!(env!("CARGO_CRATE_NAME"), "::location::CallerResolver"),
];

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          stack walking                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// One symbol found at an address.
///
/// An address can carry several: when functions have been inlined into one another, the debug
/// information records the whole chain, innermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Symbol {
    pub name: Option<String>,
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
}

/// Operations a stack walker must support.
pub trait StackWalker: Send + Sync {
    /// Capture the return addresses of the current call stack, innermost first, into `ips`;
    /// return the number captured (never more than `ips.len()`).
    fn trace(&self, ips: &mut [usize]) -> usize;
    /// Resolve `ip` to its symbols, innermost inline frame first. May return nothing (no debug
    /// information, say).
    fn symbolize(&self, ip: usize) -> Vec<Symbol>;
}

/// A [`StackWalker`] built on the [`backtrace`] crate.
///
/// [`backtrace`]: https://docs.rs/backtrace
#[derive(Clone, Copy, Debug, Default)]
pub struct BacktraceWalker;

impl StackWalker for BacktraceWalker {
    fn trace(&self, ips: &mut [usize]) -> usize {
        let mut n = 0;
        backtrace::trace(|frame| {
            if n == ips.len() {
                return false;
            }
            ips[n] = frame.ip() as usize;
            n += 1;
            true
        });
        n
    }
    fn symbolize(&self, ip: usize) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        // `resolve()` takes care of backing `ip` up into the call instruction itself.
        backtrace::resolve(ip as *mut std::ffi::c_void, |sym| {
            symbols.push(Symbol {
                // The alternate form drops the trailing hash from legacy-mangled names
                name: sym.name().map(|name| format!("{:#}", name)),
                file: sym.filename().map(Path::to_path_buf),
                line: sym.lineno(),
            })
        });
        symbols
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           call sites                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A resolved call site, along with its pre-encoded `CODE_*` fields.
#[derive(Clone, Debug, Default)]
pub struct CallSite {
    identity: usize,
    file: Option<PathBuf>,
    line: Option<u32>,
    function: Option<String>,
    fields: Bytes,
}

impl CallSite {
    /// Build a call site, encoding whichever of the location fields are known.
    pub fn new(
        identity: usize,
        file: Option<&Path>,
        line: Option<u32>,
        function: Option<&str>,
    ) -> CallSite {
        let file_bytes = file.map(bytes_from_path);
        let line_text = line.map(|line| line.to_string());

        let mut buf = BytesMut::with_capacity(
            file_bytes
                .as_ref()
                .map(|f| field::encoded_len("CODE_FILE", f))
                .unwrap_or(0)
                + line_text
                    .as_ref()
                    .map(|l| field::encoded_len("CODE_LINE", l.as_bytes()))
                    .unwrap_or(0)
                + function
                    .map(|f| field::encoded_len("CODE_FUNC", f.as_bytes()))
                    .unwrap_or(0),
        );
        if let Some(f) = &file_bytes {
            field::put_field(&mut buf, "CODE_FILE", f);
        }
        if let Some(l) = &line_text {
            field::put_field(&mut buf, "CODE_LINE", l.as_bytes());
        }
        if let Some(f) = function {
            field::put_field(&mut buf, "CODE_FUNC", f.as_bytes());
        }

        CallSite {
            identity,
            file: file.map(Path::to_path_buf),
            line,
            function: function.map(String::from),
            fields: buf.freeze(),
        }
    }
    /// A call site about which nothing is known; contributes no fields to a record.
    pub fn unknown() -> CallSite {
        CallSite::default()
    }
    /// The cache key under which this call site was (or will be) stored
    pub fn identity(&self) -> usize {
        self.identity
    }
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
    pub fn line(&self) -> Option<u32> {
        self.line
    }
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }
    /// The encoded `CODE_FILE`, `CODE_LINE` & `CODE_FUNC` fields, ready to be copied into a record
    pub fn fields(&self) -> &[u8] {
        &self.fields
    }
}

fn bytes_from_path(p: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    p.as_os_str().as_bytes().to_vec()
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         the resolver                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Cache key: stack-walked addresses & caller-supplied identities (`tracing` callsites, e.g.) live
/// in separate key spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Key {
    Frame(usize),
    Static(usize),
}

#[derive(Clone, Debug)]
enum Resolution {
    /// One of ours; keep walking. Retained in case we never find anything better.
    Library(Arc<CallSite>),
    Site(Arc<CallSite>),
}

/// Resolve & cache the call sites of logging calls.
pub struct CallerResolver {
    walker: Box<dyn StackWalker>,
    library_frames: Vec<Cow<'static, str>>,
    cache: RwLock<HashMap<Key, Resolution>>,
}

impl std::default::Default for CallerResolver {
    fn default() -> Self {
        CallerResolver::with_walker(Box::new(BacktraceWalker))
    }
}

impl CallerResolver {
    pub fn with_walker(walker: Box<dyn StackWalker>) -> CallerResolver {
        CallerResolver {
            walker,
            library_frames: LIBRARY_FRAMES.iter().map(|&s| Cow::Borrowed(s)).collect(),
            cache: RwLock::new(HashMap::new()),
        }
    }
    /// Treat frames whose symbol name begins with `prefix` as part of the logging library. Use
    /// this to hide an application's own logging wrappers so that records point at _their_
    /// callers.
    pub fn add_library_frames<P: Into<Cow<'static, str>>>(&mut self, prefix: P) {
        self.library_frames.push(prefix.into());
    }
    /// Does the function named `name` belong to the logging library?
    pub fn is_library_frame(&self, name: &str) -> bool {
        let name = name.trim_start_matches('<');
        self.library_frames
            .iter()
            .any(|prefix| name.starts_with(prefix.as_ref()))
    }
    /// The number of cached entries (library frames included).
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
    /// Find the first frame, `skip` frames or more up the stack from the walker, that doesn't
    /// belong to the logging library.
    ///
    /// If there is no such frame within [`MAX_DEPTH`], the last frame reached is returned
    /// instead. If the stack couldn't be walked at all, the result is [`CallSite::unknown`].
    pub fn resolve(&self, skip: usize) -> Arc<CallSite> {
        let mut ips = [0usize; MAX_DEPTH];
        let n = self.walker.trace(&mut ips);

        let mut last = None;
        for &ip in ips[..n].iter().skip(skip) {
            match self.lookup(ip) {
                Resolution::Site(site) => return site,
                Resolution::Library(site) => last = Some(site),
            }
        }
        last.unwrap_or_else(|| Arc::new(CallSite::unknown()))
    }
    /// Look-up the call site cached under `identity`, building it with `make` on a miss.
    ///
    /// For callers that already know where they were called from (`tracing` events carry their
    /// own file & line) but would still rather not re-encode the fields every time.
    pub fn resolve_with<F: FnOnce() -> CallSite>(&self, identity: usize, make: F) -> Arc<CallSite> {
        let key = Key::Static(identity);
        let cached = self.cache.read().get(&key).cloned();
        match cached {
            Some(Resolution::Site(site)) | Some(Resolution::Library(site)) => site,
            None => {
                let site = Arc::new(make());
                self.cache
                    .write()
                    .insert(key, Resolution::Site(site.clone()));
                site
            }
        }
    }
    fn lookup(&self, ip: usize) -> Resolution {
        let key = Key::Frame(ip);
        let cached = self.cache.read().get(&key).cloned();
        if let Some(res) = cached {
            return res;
        }
        // Another thread may be doing the same work right now; that's fine-- we'll both come up
        // with identical answers & the last insert wins.
        let res = self.classify(ip, self.walker.symbolize(ip));
        self.cache.write().insert(key, res.clone());
        res
    }
    fn classify(&self, ip: usize, symbols: Vec<Symbol>) -> Resolution {
        let mut last = None;
        for sym in symbols {
            let ours = sym
                .name
                .as_deref()
                .map(|name| self.is_library_frame(name))
                .unwrap_or(false);
            let site = Arc::new(CallSite::new(
                ip,
                sym.file.as_deref(),
                sym.line,
                sym.name.as_deref(),
            ));
            if !ours {
                return Resolution::Site(site);
            }
            last = Some(site);
        }
        match last {
            Some(site) => Resolution::Library(site),
            // Nothing to go on; can't rule it out.
            None => Resolution::Site(Arc::new(CallSite::new(ip, None, None, None))),
        }
    }
}
