//! Clock and id helpers for audit events and the run ledger.
//!
//! Stamps are unix-epoch seconds with a `Z` suffix (`1771220592Z`), which
//! sort lexically for any date this store will see.

use std::time::{SystemTime, UNIX_EPOCH};
use ulid::Ulid;

pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub fn stamp() -> String {
    format!("{}Z", epoch_secs())
}

/// Seconds encoded in a stamp produced by [`stamp`].
pub fn parse_stamp(stamp: &str) -> Option<u64> {
    stamp.strip_suffix('Z')?.parse().ok()
}

/// Time-ordered unique id for one audit event.
pub fn new_event_id() -> String {
    Ulid::new().to_string()
}
