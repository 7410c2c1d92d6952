// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::TimestampError;

/// A declared publish timestamp, keeping the text exactly as written
///
/// The raw text feeds the episode guid, so it must never be reformatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTimestamp {
    raw: String,
    at: DateTime<Utc>,
}

impl PublishTimestamp {
    /// Parse a declared timestamp in any of the accepted representations
    pub fn parse(raw: &str) -> Result<Self, TimestampError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TimestampError::Empty);
        }

        let at = match DateTime::parse_from_rfc3339(trimmed) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(source) => parse_flexible(trimmed).ok_or_else(|| TimestampError::Unrecognized {
                value: raw.to_string(),
                source,
            })?,
        };
        Ok(Self {
            raw: raw.to_string(),
            at,
        })
    }

    /// The timestamp text as declared
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The instant in UTC
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// RFC 2822 form used for `pubDate` and `lastBuildDate`
    pub fn rfc2822(&self) -> String {
        self.at.to_rfc2822()
    }

    /// Whether the episode may appear in the feed at `now`
    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        self.at <= now
    }
}

/// Parse a timestamp string, trying the common declaration formats in turn
pub fn parse_flexible(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats_with_tz = [
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S%:z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%d %H:%M %z",
    ];

    for fmt in &formats_with_tz {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    // No offset given: treat as UTC
    let naive_formats = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

    for fmt in &naive_formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
