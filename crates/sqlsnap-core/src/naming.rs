//! Snapshot filename codec
//!
//! Snapshots are named `YYYY-MM-DD-HH-MM-SS.sql` in UTC. Every numeric field
//! is fixed-width and zero-padded, so for names produced by [`encode`] the
//! lexicographic order equals the chronological order.
//!
//! [`decode`] is deliberately lenient about padding: any six hyphen-separated
//! numeric components in range are accepted.

use crate::errors::NameError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SubsecRound, Timelike, Utc};
use std::cmp::Ordering;
use std::fmt;

/// Fixed suffix carried by every snapshot file
pub const SNAPSHOT_SUFFIX: &str = ".sql";

const MAX_YEAR: u32 = 9999;

/// A UTC timestamp with second resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotInstant(NaiveDateTime);

impl SnapshotInstant {
    /// The current instant, truncated to whole seconds
    pub fn now() -> Self {
        Self(Utc::now().naive_utc().trunc_subsecs(0))
    }

    /// Build an instant from calendar fields
    ///
    /// Returns `None` for impossible dates or years beyond four digits.
    pub fn from_ymd_hms(
        year: u32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        if year > MAX_YEAR {
            return None;
        }
        NaiveDate::from_ymd_opt(year as i32, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .map(Self)
    }

    /// Truncate a UTC datetime to an instant
    ///
    /// Returns `None` for years outside `0..=9999`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Option<Self> {
        let naive = dt.naive_utc().trunc_subsecs(0);
        (0..=MAX_YEAR as i32)
            .contains(&naive.year())
            .then_some(Self(naive))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0.and_utc()
    }
}

impl fmt::Display for SnapshotInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Format an instant as `YYYY-MM-DD-HH-MM-SS.sql`
pub fn encode(instant: SnapshotInstant) -> SnapshotName {
    let t = instant.0;
    let name = format!(
        "{:04}-{:02}-{:02}-{:02}-{:02}-{:02}{}",
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second(),
        SNAPSHOT_SUFFIX
    );
    SnapshotName { name, instant }
}

/// Parse a snapshot filename back into its instant
///
/// Never panics; every malformed input is reported as a [`NameError`].
pub fn decode(name: &str) -> Result<SnapshotInstant, NameError> {
    let stem = name
        .strip_suffix(SNAPSHOT_SUFFIX)
        .ok_or_else(|| NameError::MissingSuffix {
            name: name.to_string(),
        })?;

    let parts: Vec<&str> = stem.split('-').collect();
    if parts.len() != 6 {
        return Err(NameError::WrongComponentCount {
            name: name.to_string(),
            found: parts.len(),
        });
    }

    let mut fields = [0u32; 6];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        *slot = parse_component(name, part)?;
    }
    let [year, month, day, hour, minute, second] = fields;

    check_range(name, "year", year, 0, MAX_YEAR)?;
    check_range(name, "month", month, 1, 12)?;
    check_range(name, "day", day, 1, 31)?;
    check_range(name, "hour", hour, 0, 23)?;
    check_range(name, "minute", minute, 0, 59)?;
    check_range(name, "second", second, 0, 59)?;

    SnapshotInstant::from_ymd_hms(year, month, day, hour, minute, second).ok_or_else(|| {
        NameError::InvalidDate {
            name: name.to_string(),
        }
    })
}

fn parse_component(name: &str, part: &str) -> Result<u32, NameError> {
    // u32::from_str accepts a leading '+', which is not part of the format
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NameError::NotNumeric {
            name: name.to_string(),
            component: part.to_string(),
        });
    }
    part.parse::<u32>().map_err(|_| NameError::NotNumeric {
        name: name.to_string(),
        component: part.to_string(),
    })
}

fn check_range(
    name: &str,
    field: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<(), NameError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(NameError::OutOfRange {
            name: name.to_string(),
            field,
            value,
        })
    }
}

/// A validated snapshot filename together with the instant it encodes
///
/// Ordering is chronological; names that decode to the same instant (only
/// possible with non-padded input) fall back to lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotName {
    name: String,
    instant: SnapshotInstant,
}

impl SnapshotName {
    /// Validate a filename
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let instant = decode(name)?;
        Ok(Self {
            name: name.to_string(),
            instant,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn instant(&self) -> SnapshotInstant {
        self.instant
    }

    pub fn into_string(self) -> String {
        self.name
    }
}

impl Ord for SnapshotName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant
            .cmp(&other.instant)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for SnapshotName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for SnapshotName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}
