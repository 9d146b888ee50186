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
//! Journal priorities.
//!
//! The journal reuses the syslog severity numbering for its `PRIORITY` field, so [`Priority`]
//! replicates the names used in `<syslog.h>`.

use crate::field;

use bytes::Bytes;

type StdResult<T, E> = std::result::Result<T, E>;

/// The eight severity levels understood by the journal. The enumeration values duplicate the
/// constants documented as per the `syslog()` manual [page] & defined in `<syslog.h>`.
///
/// [page]: https://man7.org/linux/man-pages/man3/syslog.3.html
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// system is unusable
    LOG_EMERG,
    /// action must be take immediately
    LOG_ALERT,
    /// critical conditions
    LOG_CRIT,
    /// error conditions
    LOG_ERR,
    /// warning conditions
    LOG_WARNING,
    /// normal, but significant condition
    LOG_NOTICE,
    /// informational message
    LOG_INFO,
    /// debug-level message
    LOG_DEBUG,
}

impl Priority {
    /// All priorities, most severe first; `Priority::ALL[p as usize] == p`
    pub const ALL: [Priority; 8] = [
        Priority::LOG_EMERG,
        Priority::LOG_ALERT,
        Priority::LOG_CRIT,
        Priority::LOG_ERR,
        Priority::LOG_WARNING,
        Priority::LOG_NOTICE,
        Priority::LOG_INFO,
        Priority::LOG_DEBUG,
    ];

    /// The value of the `PRIORITY` field for this level: a single ASCII digit
    pub fn as_field_value(&self) -> &'static [u8] {
        match self {
            Priority::LOG_EMERG => b"0",
            Priority::LOG_ALERT => b"1",
            Priority::LOG_CRIT => b"2",
            Priority::LOG_ERR => b"3",
            Priority::LOG_WARNING => b"4",
            Priority::LOG_NOTICE => b"5",
            Priority::LOG_INFO => b"6",
            Priority::LOG_DEBUG => b"7",
        }
    }

    /// The complete, encoded `PRIORITY` field for this level
    pub fn encode(&self) -> Bytes {
        field::encode("PRIORITY", self.as_field_value())
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Priority::LOG_EMERG => "LOG_EMERG",
                Priority::LOG_ALERT => "LOG_ALERT",
                Priority::LOG_CRIT => "LOG_CRIT",
                Priority::LOG_ERR => "LOG_ERR",
                Priority::LOG_WARNING => "LOG_WARNING",
                Priority::LOG_NOTICE => "LOG_NOTICE",
                Priority::LOG_INFO => "LOG_INFO",
                Priority::LOG_DEBUG => "LOG_DEBUG",
            }
        )
    }
}

impl From<&tracing::Level> for Priority {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Priority::LOG_DEBUG,
            tracing::Level::INFO => Priority::LOG_INFO,
            tracing::Level::WARN => Priority::LOG_WARNING,
            tracing::Level::ERROR => Priority::LOG_ERR,
        }
    }
}

#[cfg(test)]
mod priority_tests {
    use super::*;

    #[test]
    fn test_numbering() {
        assert_eq!(Priority::LOG_DEBUG as u8, 7);
        assert_eq!(Priority::LOG_INFO as u8, 6);
        assert_eq!(Priority::LOG_ERR as u8, 3);
        for (i, p) in Priority::ALL.iter().enumerate() {
            assert_eq!(*p as usize, i);
            assert_eq!(p.as_field_value(), i.to_string().as_bytes());
        }
        assert_eq!(format!("{}", Priority::LOG_ERR), "LOG_ERR".to_string());
    }

    #[test]
    fn test_encode() {
        let mut golden = Vec::from(&b"PRIORITY\n"[..]);
        golden.extend_from_slice(&1u64.to_le_bytes());
        golden.extend_from_slice(b"6\n");
        assert_eq!(&Priority::LOG_INFO.encode()[..], &golden[..]);
    }

    #[test]
    fn test_from_tracing() {
        assert_eq!(Priority::from(&tracing::Level::TRACE), Priority::LOG_DEBUG);
        assert_eq!(Priority::from(&tracing::Level::WARN), Priority::LOG_WARNING);
        assert_eq!(Priority::from(&tracing::Level::ERROR), Priority::LOG_ERR);
    }
}
