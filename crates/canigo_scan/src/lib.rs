//! Streaming lookup of a single record in a JSON array.
//!
//! The input is a top-level array of objects, possibly far larger than
//! memory. Elements are decoded one at a time and reading stops at the first
//! element whose numeric `id` equals the searched id; nothing after it is
//! read or validated.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use serde::de::{Deserializer as _, SeqAccess, Visitor};
use serde_json::Value;
use thiserror::Error;

/// Printed by `find_record` when no element matches.
pub const NOT_FOUND_MESSAGE: &str = "Aucune donnée trouvée";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("read failed: {0}")]
    Io(#[source] serde_json::Error),
    #[error("malformed JSON input: {0}")]
    Parse(#[source] serde_json::Error),
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Self::Io(err)
        } else {
            Self::Parse(err)
        }
    }
}

/// A matching element.
#[derive(Debug, Clone, PartialEq)]
pub struct Found {
    /// Zero-based position in the array.
    pub index: u64,
    /// The element's `name`, `Null` when it has none.
    pub name: Value,
}

impl Found {
    /// `name` as printed: strings bare, anything else as JSON.
    pub fn display_name(&self) -> String {
        match &self.name {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// True when `record.id` is a number equal to `id`. Non-objects and
/// non-numeric ids never match.
pub fn id_matches(record: &Value, id: f64) -> bool {
    record
        .get("id")
        .and_then(Value::as_f64)
        .is_some_and(|candidate| candidate == id)
}

struct FirstMatch<'a> {
    id: f64,
    found: &'a mut Option<Found>,
}

impl<'de> Visitor<'de> for FirstMatch<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON array of records")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        let mut index = 0u64;
        while let Some(record) = seq.next_element::<Value>()? {
            if id_matches(&record, self.id) {
                let name = record.get("name").cloned().unwrap_or(Value::Null);
                *self.found = Some(Found { index, name });
                return Ok(());
            }
            index += 1;
        }
        Ok(())
    }
}

/// Scan `reader` for the first element with the given id.
///
/// Returns `Ok(None)` only after the whole array has been read and found
/// well formed. Wrap unbuffered readers in a `BufReader`.
pub fn find_by_id<R: Read>(reader: R, id: f64) -> Result<Option<Found>, ScanError> {
    let mut de = serde_json::Deserializer::from_reader(reader);
    let mut found = None;
    let outcome = (&mut de).deserialize_seq(FirstMatch {
        id,
        found: &mut found,
    });

    // Stopping mid-array makes the deserializer report an unterminated
    // sequence; a recorded match wins over that.
    if found.is_some() {
        return Ok(found);
    }
    outcome?;
    de.end()?;
    Ok(None)
}

/// [`find_by_id`] over a file.
pub fn find_in_file(path: &Path, id: f64) -> Result<Option<Found>, ScanError> {
    let file = File::open(path).map_err(|source| ScanError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), id, "scanning");
    find_by_id(BufReader::new(file), id)
}
