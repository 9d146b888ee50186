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

//! The journal transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, as well
//! as the Unix datagram socket implementation journald listens on.
//!
//! # Examples
//!
//! To connect to journald's native socket:
//!
//! ```no_run
//! use journal_native::transport::UnixSocket;
//! let transpo = UnixSocket::try_default().unwrap();
//! ```
//!
//! Somewhere else:
//!
//! ```rust
//! use journal_native::transport::UnixSocket;
//! let transpo = UnixSocket::new("/i/am/not/there.s");
//! assert!(transpo.is_err()); // no such socket, after all
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;

use std::{os::unix::net::UnixDatagram, path::Path};

/// Where journald listens for native-protocol datagrams
pub const JOURNAL_SOCKET: &str = "/run/systemd/journal/socket";

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Send one complete record on this transport mechanism.
    ///
    /// Each call corresponds to exactly one record, so datagram-oriented implementations must send
    /// `buf` as a single datagram.
    fn send(&self, buf: &[u8]) -> Result<usize>;
}

/// Sending records via Unix socket (datagram)
pub struct UnixSocket {
    socket: UnixDatagram,
}

impl UnixSocket {
    /// Construct a [`Transport`] implementation via Unix datagram sockets at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<UnixSocket> {
        let path = path.as_ref();
        let sock = UnixDatagram::unbound().map_err(|err| Error::Connect {
            path: path.to_path_buf(),
            source: err,
            back: Backtrace::new(),
        })?;
        sock.connect(path).map_err(|err| Error::Connect {
            path: path.to_path_buf(),
            source: err,
            back: Backtrace::new(),
        })?;
        Ok(UnixSocket { socket: sock })
    }
    /// Construct a [`Transport`] implementation connected to journald
    pub fn try_default() -> Result<UnixSocket> {
        UnixSocket::new(JOURNAL_SOCKET)
    }
    /// Wrap an already-connected socket (one half of [`UnixDatagram::pair`], say).
    pub fn from_datagram(socket: UnixDatagram) -> UnixSocket {
        UnixSocket { socket }
    }
}

impl Transport for UnixSocket {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        // NB. journald caps datagrams at its socket's buffer size; anything larger fails here with
        // EMSGSIZE.
        let cb_written = self.socket.send(buf).map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        Ok(cb_written)
    }
}
