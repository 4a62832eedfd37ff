// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp adapter for values read back from storage.
//!
//! Stored records carry timestamps in whichever shape the writer used: a
//! structured seconds + nanos pair, an RFC 3339 string, epoch milliseconds
//! as a number, or epoch milliseconds as a string. [`RawTimestamp`] is the
//! closed set of those shapes and [`normalize_timestamp`] maps each to one
//! canonical UTC time. Anything else is an error; there is no fallback to
//! the current time.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AirgiError;

/// Every timestamp representation observed in stored records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Backend-native seconds + fractional nanos pair.
    Structured {
        seconds: i64,
        #[serde(alias = "nanoseconds")]
        nanos: u32,
    },
    /// An already-parsed time value (RFC 3339 on the wire).
    Native(DateTime<Utc>),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// Any other string; must hold epoch milliseconds or a SQL datetime.
    Text(String),
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        RawTimestamp::Structured {
            seconds: value.timestamp(),
            nanos: value.timestamp_subsec_nanos(),
        }
    }
}

/// Converts a stored timestamp to a canonical UTC time.
pub fn normalize_timestamp(raw: RawTimestamp) -> Result<DateTime<Utc>, AirgiError> {
    match raw {
        RawTimestamp::Structured { seconds, nanos } => {
            if nanos >= 1_000_000_000 {
                return Err(AirgiError::Timestamp(format!(
                    "nanos out of range: {seconds}s {nanos}ns"
                )));
            }
            DateTime::from_timestamp(seconds, nanos).ok_or_else(|| {
                AirgiError::Timestamp(format!("seconds out of range: {seconds}"))
            })
        }
        RawTimestamp::Native(value) => Ok(value),
        RawTimestamp::EpochMillis(millis) => from_millis(millis),
        RawTimestamp::Text(text) => parse_text(&text),
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, AirgiError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| AirgiError::Timestamp(format!("epoch millis out of range: {millis}")))
}

fn parse_text(text: &str) -> Result<DateTime<Utc>, AirgiError> {
    let trimmed = text.trim();
    if let Ok(millis) = trimmed.parse::<i64>() {
        return from_millis(millis);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    // SQLite `datetime('now')` shape, always UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    Err(AirgiError::Timestamp(format!("unrecognized time text `{trimmed}`")))
}
