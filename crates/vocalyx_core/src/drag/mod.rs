//! Drag-transfer protocol between the resource panel and board/schedule editors.
//!
//! # Responsibility
//! - Encode/decode the `aac-token` drag envelope.
//! - Apply dropped envelopes to tiles and steps.
//!
//! # Invariants
//! - Drags are copy-only; the source catalog is never mutated.
//! - A drop without payload is a no-op; a malformed payload aborts the
//!   gesture with a diagnostic and leaves the target untouched.

pub mod envelope;
pub mod transfer;
