// Causally comparable entry identifiers
//
// An `EntryId` is the triple (time, origin, counter). The derived ordering
// is the single ordering authority for the whole engine: logical time first,
// then the origin identifier, then the per-origin counter. Two distinct ids
// never compare equal, so the order is total and tie-free.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Globally unique, causally comparable identifier of one log entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId {
    /// Logical clock value assigned by the id generator.
    pub time: u64,
    /// Identifier of the node that created the entry.
    pub origin: String,
    /// Per-origin sequence number, breaking ties within one clock tick.
    pub counter: u64,
}

impl EntryId {
    pub fn new(time: u64, origin: impl Into<String>, counter: u64) -> Self {
        EntryId {
            time,
            origin: origin.into(),
            counter,
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.time, self.origin, self.counter)
    }
}

/// Error parsing the canonical `"time origin counter"` id form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid entry id: {0}")]
pub struct ParseEntryIdError(pub String);

impl FromStr for EntryId {
    type Err = ParseEntryIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(' ');
        let (time, origin, counter) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(time), Some(origin), Some(counter), None) => (time, origin, counter),
            _ => return Err(ParseEntryIdError(s.to_string())),
        };
        let time = time
            .parse()
            .map_err(|_| ParseEntryIdError(s.to_string()))?;
        let counter = counter
            .parse()
            .map_err(|_| ParseEntryIdError(s.to_string()))?;
        Ok(EntryId::new(time, origin, counter))
    }
}

/// Returns `true` when `first` is causally older than `second`.
///
/// An absent first id (no entry folded yet) is older than everything.
pub fn is_first_older(first: Option<&EntryId>, second: &EntryId) -> bool {
    match first {
        None => true,
        Some(first) => first < second,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_time_then_origin_then_counter() {
        let a = EntryId::new(1, "10:a", 0);
        let b = EntryId::new(2, "10:a", 0);
        let c = EntryId::new(2, "10:b", 0);
        let d = EntryId::new(2, "10:b", 1);
        assert!(a < b);
        assert!(b < c);
        assert!(c < d);
        assert!(a < d);
    }

    #[test]
    fn counter_compares_numerically() {
        let low = EntryId::new(1, "n", 2);
        let high = EntryId::new(1, "n", 10);
        assert!(low < high);
    }

    #[test]
    fn absent_first_is_older() {
        let id = EntryId::new(0, "n", 0);
        assert!(is_first_older(None, &id));
        assert!(!is_first_older(Some(&id), &id));
        assert!(is_first_older(Some(&id), &EntryId::new(0, "n", 1)));
    }

    #[test]
    fn round_trips_through_string_form() {
        let id = EntryId::new(57, "106:test1", 1);
        assert_eq!(id.to_string(), "57 106:test1 1");
        assert_eq!("57 106:test1 1".parse::<EntryId>().unwrap(), id);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!("1 only-two".parse::<EntryId>().is_err());
        assert!("x n 0".parse::<EntryId>().is_err());
        assert!("1 n 0 extra".parse::<EntryId>().is_err());
    }
}
