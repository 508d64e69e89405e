//! Domain model for catalog resources, boards, schedules and patient data.
//!
//! # Responsibility
//! - Define the canonical shapes shared by catalog, drag/drop and gateway code.
//! - Keep stored document shapes (camelCase JSON) next to their Rust types.
//!
//! # Invariants
//! - Catalog resources are immutable once loaded.
//! - Patient records are archived through `status`, never hard-deleted.
//! - Timestamps are Unix epoch milliseconds.

pub mod board;
pub mod patient;
pub mod resource;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time in Unix epoch milliseconds.
///
/// Falls back to `0` if the system clock reports a time before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
