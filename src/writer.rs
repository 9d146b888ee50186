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

//! The delivery queue & its writer thread.
//!
//! Records are handed to a bounded queue & a single background thread takes them off the queue &
//! sends them on the [`Transport`]. Callers block only when the queue is full. Send failures are
//! swallowed: there's no one to report them to, and a journald restart mustn't take the
//! application down with it.

use crate::{
    error::{Error, Result},
    transport::Transport,
};

use backtrace::Backtrace;
use bytes::Bytes;
use tracing::{debug, trace};

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

/// Default number of records that may be waiting for the writer
pub const DEFAULT_CAPACITY: usize = 100;

enum Command {
    Record(Bytes),
    /// Acknowledge once everything ahead of this in the queue has been sent
    Flush(SyncSender<()>),
}

/// Producer handle on the delivery queue.
///
/// Dropping it closes the queue; the writer thread sends whatever is left & exits.
pub struct Writer {
    queue: SyncSender<Command>,
}

impl Writer {
    /// Start a writer thread sending on `transport`, behind a queue of `capacity` records (at
    /// least one).
    pub fn spawn(transport: Box<dyn Transport + Send>, capacity: usize) -> Result<Writer> {
        let (queue, records) = sync_channel(std::cmp::max(capacity, 1));
        std::thread::Builder::new()
            .name("journal-writer".to_string())
            .spawn(move || run(transport, records))
            .map_err(|err| Error::Spawn {
                source: err,
                back: Backtrace::new(),
            })?;
        Ok(Writer { queue })
    }
    /// Enqueue `record`, blocking while the queue is full.
    pub fn send(&self, record: Bytes) {
        if self.queue.send(Command::Record(record)).is_err() {
            // Only possible if the writer thread panicked
            trace!("journal writer gone; record dropped");
        }
    }
    /// Block until every record enqueued before this call has been handed to the transport.
    pub fn flush(&self) -> Result<()> {
        let (ack, acked) = sync_channel(1);
        self.queue
            .send(Command::Flush(ack))
            .map_err(|_| Error::WriterGone {
                back: Backtrace::new(),
            })?;
        acked.recv().map_err(|_| Error::WriterGone {
            back: Backtrace::new(),
        })
    }
}

fn run(transport: Box<dyn Transport + Send>, records: Receiver<Command>) {
    debug!("journal writer starting");
    for command in records {
        match command {
            Command::Record(record) => {
                if let Err(err) = transport.send(&record) {
                    // TODO: notice ECONNREFUSED & reconnect once journald comes back
                    debug!("dropped a {}-byte record: {}", record.len(), err);
                }
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    debug!("journal writer exiting");
}

#[cfg(test)]
pub(crate) mod test {

    use super::*;

    use parking_lot::Mutex;

    use std::{
        sync::{mpsc, Arc},
        time::Duration,
    };

    /// A [`Transport`] that remembers everything it was asked to send.
    #[derive(Clone, Default)]
    pub(crate) struct Recorder {
        pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl Transport for Recorder {
        fn send(&self, buf: &[u8]) -> Result<usize> {
            self.sent.lock().push(buf.to_vec());
            Ok(buf.len())
        }
    }

    /// A [`Transport`] that sends nothing until it's let through, one record per token.
    pub(crate) struct Gate {
        pub tokens: mpsc::Receiver<()>,
        pub inner: Recorder,
    }

    impl Transport for Gate {
        fn send(&self, buf: &[u8]) -> Result<usize> {
            let _ = self.tokens.recv();
            self.inner.send(buf)
        }
    }

    struct Broken;

    impl Transport for Broken {
        fn send(&self, _buf: &[u8]) -> Result<usize> {
            Err(Error::Transport {
                source: Box::new(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)),
                back: Backtrace::new(),
            })
        }
    }

    #[test]
    fn test_in_order() {
        let recorder = Recorder::default();
        let writer = Writer::spawn(Box::new(recorder.clone()), DEFAULT_CAPACITY).unwrap();
        for i in 0..250 {
            writer.send(Bytes::from(format!("record {}", i)));
        }
        writer.flush().unwrap();
        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 250);
        for (i, record) in sent.iter().enumerate() {
            assert_eq!(record, format!("record {}", i).as_bytes());
        }
    }

    #[test]
    fn test_backpressure() {
        let (tokens, gate) = mpsc::channel();
        let recorder = Recorder::default();
        let writer = Arc::new(
            Writer::spawn(
                Box::new(Gate {
                    tokens: gate,
                    inner: recorder.clone(),
                }),
                1,
            )
            .unwrap(),
        );

        // The writer takes the first off the queue & blocks in the transport; the second fills
        // the queue.
        writer.send(Bytes::from_static(b"one"));
        writer.send(Bytes::from_static(b"two"));

        let (done, finished) = mpsc::channel();
        let producer = {
            let writer = writer.clone();
            std::thread::spawn(move || {
                writer.send(Bytes::from_static(b"three"));
                done.send(()).unwrap();
            })
        };

        assert_eq!(
            finished.recv_timeout(Duration::from_millis(200)),
            Err(mpsc::RecvTimeoutError::Timeout)
        );
        assert!(recorder.sent.lock().is_empty());

        // Let one through; that frees a slot for the third
        tokens.send(()).unwrap();
        finished.recv_timeout(Duration::from_secs(10)).unwrap();
        producer.join().unwrap();

        tokens.send(()).unwrap();
        tokens.send(()).unwrap();
        writer.flush().unwrap();
        assert_eq!(
            *recorder.sent.lock(),
            vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]
        );
    }

    #[test]
    fn test_failures_absorbed() {
        let writer = Writer::spawn(Box::new(Broken), 4).unwrap();
        for _ in 0..10 {
            writer.send(Bytes::from_static(b"lost"));
        }
        // Still alive & still answering
        writer.flush().unwrap();
    }

    #[test]
    fn test_drains_on_close() {
        let (tokens, gate) = mpsc::channel();
        let recorder = Recorder::default();
        let writer = Writer::spawn(
            Box::new(Gate {
                tokens: gate,
                inner: recorder.clone(),
            }),
            8,
        )
        .unwrap();
        for i in 0..5 {
            writer.send(Bytes::from(format!("{}", i)));
        }
        drop(writer);
        for _ in 0..5 {
            tokens.send(()).unwrap();
        }
        // The writer exits once drained, dropping the transport & with it the token receiver
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while tokens.send(()).is_ok() {
            assert!(std::time::Instant::now() < deadline, "writer never exited");
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(recorder.sent.lock().len(), 5);
    }
}
