//! Capture-time resolution for synced files.
//!
//! Phones hand files to the sync app with their capture time as the file's
//! creation time, so that is the best ordering key available. Hosts that
//! cannot report a birth time fall back to the last-modified time.

use chrono::{DateTime, Local, NaiveDateTime};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use crate::error::{io_err, Result};

/// Filesystem-safe rendering: no colons, no spaces
pub const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A resolved capture instant in local time.
///
/// Renders as `YYYY-MM-DD_HH-MM-SS`; sub-second precision is kept internally
/// but never printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Stamp(NaiveDateTime);

impl Stamp {
    pub fn new(instant: NaiveDateTime) -> Self {
        Self(instant)
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        let local: DateTime<Local> = time.into();
        Self(local.naive_local())
    }

    /// Parse a string produced by `Display`
    pub fn parse(text: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(text, STAMP_FORMAT).ok().map(Self)
    }

    /// Date-only portion, `YYYY-MM-DD`
    pub fn date_part(&self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(STAMP_FORMAT))
    }
}

/// Source of capture instants for the renamer
pub trait TimestampResolver {
    fn resolve(&self, path: &Path) -> Result<Stamp>;
}

/// Reads creation time from file metadata, falling back to modification time
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTimestamps;

impl TimestampResolver for FsTimestamps {
    fn resolve(&self, path: &Path) -> Result<Stamp> {
        let metadata = fs::metadata(path).map_err(io_err("read metadata of", path))?;

        let time = match metadata.created() {
            Ok(created) => created,
            Err(_) => metadata
                .modified()
                .map_err(io_err("read modification time of", path))?,
        };

        Ok(Stamp::from_system_time(time))
    }
}

/// Resolver that reports the same instant for every file
#[derive(Debug, Clone, Copy)]
pub struct FixedTimestamp(pub Stamp);

impl TimestampResolver for FixedTimestamp {
    fn resolve(&self, _path: &Path) -> Result<Stamp> {
        Ok(self.0)
    }
}
