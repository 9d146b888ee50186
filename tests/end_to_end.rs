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

//! Drive the public API against a stand-in for journald.
//!
//! These live outside the crate so that call sites are genuinely foreign: the caller resolution
//! has to find *these* functions, not something inside journal-native.

use journal_native::{
    field, journal_error, journal_info, transport::UnixSocket, Client, Priority,
};

use std::{os::unix::net::UnixDatagram, path::PathBuf, time::Duration};

/// A socket standing in for journald, removed on drop
struct FakeJournald {
    path: PathBuf,
    socket: UnixDatagram,
}

impl FakeJournald {
    fn bind(name: &str) -> FakeJournald {
        let path = std::env::temp_dir().join(format!(
            "journal-native-{}-{}.sock",
            std::process::id(),
            name
        ));
        let _ = std::fs::remove_file(&path);
        let socket = UnixDatagram::bind(&path).unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(10)))
            .unwrap();
        FakeJournald { path, socket }
    }
    fn recv(&self) -> Vec<(String, Vec<u8>)> {
        recv_record(&self.socket)
    }
}

impl Drop for FakeJournald {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn recv_record(socket: &UnixDatagram) -> Vec<(String, Vec<u8>)> {
    let mut buf = vec![0u8; 65536];
    let n = socket.recv(&mut buf).unwrap();
    field::decode(&buf[..n]).unwrap()
}

fn values<'a>(fields: &'a [(String, Vec<u8>)], name: &str) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(n, _)| n == name)
        .map(|(_, v)| std::str::from_utf8(v).unwrap())
        .collect()
}

/// Optimized builds may inline a caller away entirely, leaving nothing for `CODE_FUNC` to name
/// but an outer frame (see the crate docs); only the dev profile promises the real caller.
fn inlining_preserved() -> bool {
    cfg!(debug_assertions)
}

#[test]
fn error_reaches_daemon() {
    let journald = FakeJournald::bind("error");
    let journal = Client::builder()
        .socket_path(&journald.path)
        .connect()
        .unwrap();

    journal_error!(journal, "failed: {}", "disk full");
    journal.flush().unwrap();

    let fields = journald.recv();
    assert_eq!(values(&fields, "PRIORITY"), vec!["3"]);
    assert_eq!(values(&fields, "MESSAGE"), vec!["failed: disk full"]);
    let func = values(&fields, "CODE_FUNC");
    assert_eq!(func.len(), 1);
    if inlining_preserved() {
        assert!(func[0].contains("error_reaches_daemon"), "CODE_FUNC was {}", func[0]);
        assert!(values(&fields, "CODE_FILE")[0].ends_with("end_to_end.rs"));
    }
}

#[test]
fn variables_and_messages() {
    let journald = FakeJournald::bind("variables");
    let journal = Client::builder()
        .socket_path(&journald.path)
        .connect()
        .unwrap();

    journal.add_variable("FOO", "bar");
    journal.info(format_args!("x={}", 1));
    journal.log(Priority::LOG_WARNING, format_args!("two\nlines"));
    journal.flush().unwrap();

    let fields = journald.recv();
    assert_eq!(values(&fields, "PRIORITY"), vec!["6"]);
    assert_eq!(values(&fields, "FOO"), vec!["bar"]);
    assert_eq!(values(&fields, "MESSAGE"), vec!["x=1"]);

    let fields = journald.recv();
    assert_eq!(values(&fields, "PRIORITY"), vec!["4"]);
    assert_eq!(values(&fields, "MESSAGE"), vec!["two\nlines"]);
}

#[test]
fn no_daemon() {
    let path = std::env::temp_dir().join(format!(
        "journal-native-{}-absent.sock",
        std::process::id()
    ));
    assert!(Client::builder().socket_path(path).connect().is_err());
}

#[test]
fn concurrent_records_are_well_formed() {
    let (ours, theirs) = UnixDatagram::pair().unwrap();
    theirs
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    let journal = Client::builder()
        .transport(UnixSocket::from_datagram(ours))
        .capacity(16)
        .connect()
        .unwrap();

    const THREADS: usize = 4;
    const PER_THREAD: usize = 50;

    // Read as we go; the socket buffer won't hold everything
    let reader = std::thread::spawn(move || {
        (0..THREADS * PER_THREAD)
            .map(|_| recv_record(&theirs))
            .collect::<Vec<_>>()
    });

    let producers: Vec<_> = (0..THREADS)
        .map(|t| {
            let journal = journal.clone();
            std::thread::spawn(move || {
                for i in 0..PER_THREAD {
                    journal_info!(journal, "producer {} record {}\nwith a second line", t, i);
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }
    journal.flush().unwrap();

    let records = reader.join().unwrap();
    assert_eq!(records.len(), THREADS * PER_THREAD);
    let mut messages: Vec<String> = records
        .iter()
        .map(|fields| {
            assert_eq!(values(fields, "PRIORITY"), vec!["6"]);
            let msg = values(fields, "MESSAGE");
            assert_eq!(msg.len(), 1);
            msg[0].to_string()
        })
        .collect();
    messages.sort();
    messages.dedup();
    assert_eq!(messages.len(), THREADS * PER_THREAD);
}

mod wrappers {
    use journal_native::Client;

    /// An application's own logging helper
    #[inline(never)]
    pub fn note(journal: &Client, what: &str) {
        journal.info(format_args!("note: {}", what));
    }
}

#[test]
fn application_wrappers_are_skipped() {
    let (ours, theirs) = UnixDatagram::pair().unwrap();
    theirs
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    let journal = Client::builder()
        .transport(UnixSocket::from_datagram(ours))
        .library_frames("end_to_end::wrappers::")
        .connect()
        .unwrap();

    wrappers::note(&journal, "hello");
    journal.flush().unwrap();

    let fields = recv_record(&theirs);
    assert_eq!(values(&fields, "MESSAGE"), vec!["note: hello"]);
    let func = values(&fields, "CODE_FUNC");
    assert_eq!(func.len(), 1);
    if inlining_preserved() {
        assert!(
            func[0].contains("application_wrappers_are_skipped"),
            "CODE_FUNC was {}",
            func[0]
        );
    }
}

#[test]
#[cfg(feature = "journald")]
fn live_journald() {
    let journal = Client::new().unwrap();
    journal.add_variable("JOURNAL_NATIVE_TEST", "1");
    journal_info!(journal, "Hello, 世界!");
    journal_error!(journal, "Hello, {}!", "journald");
    journal.flush().unwrap();
}
