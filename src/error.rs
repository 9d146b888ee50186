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
//! [journal-native](crate) errors

use backtrace::Backtrace;

use std::path::PathBuf;

/// [journal-native](crate) error type
///
/// [journal-native](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of
/// a straightforward enumeration with a few match arms chosen on the basis what the caller will
/// need to respond.
///
/// Note that the logging operations themselves never return an error: the only failures a caller
/// has to deal with are those at construction time (and, optionally, from [`flush`]).
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
/// [`flush`]: crate::client::Client::flush
#[non_exhaustive]
pub enum Error {
    /// Failed to open or connect the datagram socket at `path`
    Connect {
        path: PathBuf,
        source: std::io::Error,
        back: Backtrace,
    },
    /// A record could not be decoded; `offset` is where the decoder gave up
    Malformed { offset: usize, back: Backtrace },
    /// Failed to start the background writer thread
    Spawn {
        source: std::io::Error,
        back: Backtrace,
    },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// The background writer is no longer running
    WriterGone { back: Backtrace },
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Connect { path, source, .. } => write!(
                f,
                "Couldn't connect to the journal at {}: {}",
                path.display(),
                source
            ),
            Error::Malformed { offset, .. } => {
                write!(f, "Malformed journal record at byte offset {}", offset)
            }
            Error::Spawn { source, .. } => {
                write!(f, "Couldn't start the journal writer thread: {}", source)
            }
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            Error::WriterGone { .. } => write!(f, "The journal writer thread has exited"),
            _ => write!(f, "Other journal-native error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Connect { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Malformed { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Spawn { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Transport { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::WriterGone { back } => write!(f, "{}\n{:?}", self, back),
            err => write!(f, "journal-native error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connect { source, .. } => Some(source),
            Error::Spawn { source, .. } => Some(source),
            Error::Transport { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
