//! Keyword search entry points.
//!
//! # Responsibility
//! - Substring search over the flattened resource catalog.
//! - Keep match semantics (case, blank handling, ordering) inside core.

pub mod resource_search;
