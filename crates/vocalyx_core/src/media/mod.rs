//! Media reference parsing and resolution.
//!
//! # Responsibility
//! - Classify stored media references (public URL vs bucket handle).
//! - Resolve references to fetchable URLs through a bounded cache.
//! - Look up worksheet images by category and filename.
//!
//! # Invariants
//! - Resolution is fail-soft: collaborator failures become cached placeholders.

pub mod reference;
pub mod resolver;
pub mod worksheet;
