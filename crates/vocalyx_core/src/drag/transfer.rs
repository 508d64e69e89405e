//! Drag payload channel and drop application.
//!
//! # Invariants
//! - `begin_drag` writes exactly one slot (`aac-token`) and allows copy only.
//! - `handle_drop` never panics and never mutates the target on failure.

use super::envelope::{DragEnvelope, DragError, AAC_TOKEN_SLOT};
use crate::model::board::{AudioPayload, BoardTile, ScheduleStep};
use crate::model::resource::MediaType;
use log::warn;
use std::collections::BTreeMap;

/// Operations the drag source allows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DropEffect {
    #[default]
    None,
    Copy,
    Move,
}

/// In-memory stand-in for the platform's drag data channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTransfer {
    slots: BTreeMap<String, String>,
    pub effect_allowed: DropEffect,
}

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_data(&mut self, format: &str, data: impl Into<String>) {
        self.slots.insert(format.to_string(), data.into());
    }

    /// Returns slot contents; empty slots read as absent.
    pub fn get_data(&self, format: &str) -> Option<&str> {
        self.slots
            .get(format)
            .map(String::as_str)
            .filter(|data| !data.is_empty())
    }
}

/// Anything a resource can be dropped onto.
pub trait DropTarget {
    fn target_id(&self) -> &str;
    fn set_icon(&mut self, media_ref: String);
    fn set_audio(&mut self, payload: AudioPayload);

    /// Image replaces `icon`; audio replaces the audio payload wholesale.
    fn apply_envelope(&mut self, envelope: DragEnvelope) {
        match envelope {
            DragEnvelope::Image(token) => self.set_icon(token.media_ref),
            DragEnvelope::Audio(payload) => self.set_audio(payload),
        }
    }
}

impl DropTarget for BoardTile {
    fn target_id(&self) -> &str {
        &self.id
    }

    fn set_icon(&mut self, media_ref: String) {
        self.icon = Some(media_ref);
    }

    fn set_audio(&mut self, payload: AudioPayload) {
        self.audio_data = Some(payload);
    }
}

impl DropTarget for ScheduleStep {
    fn target_id(&self) -> &str {
        &self.id
    }

    fn set_icon(&mut self, media_ref: String) {
        self.icon = Some(media_ref);
    }

    fn set_audio(&mut self, payload: AudioPayload) {
        self.audio_data = Some(payload);
    }
}

/// Result of one drop gesture.
#[derive(Debug)]
pub enum DropOutcome {
    /// No `aac-token` payload; unrelated external data is ignored.
    Ignored,
    /// Payload applied to the target.
    Applied(MediaType),
    /// Payload present but unusable; target left untouched.
    Rejected(DragError),
}

impl DropOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Producer side: attaches `envelope` to `transfer` as a copy-only drag.
pub fn begin_drag(transfer: &mut DataTransfer, envelope: &DragEnvelope) -> Result<(), DragError> {
    let raw = envelope.encode()?;
    transfer.effect_allowed = DropEffect::Copy;
    transfer.set_data(AAC_TOKEN_SLOT, raw);
    Ok(())
}

/// Consumer side: reads the `aac-token` slot and applies it to `target`.
pub fn handle_drop<T: DropTarget + ?Sized>(transfer: &DataTransfer, target: &mut T) -> DropOutcome {
    let Some(raw) = transfer.get_data(AAC_TOKEN_SLOT) else {
        return DropOutcome::Ignored;
    };

    match DragEnvelope::decode(raw) {
        Ok(envelope) => {
            let media_type = envelope.media_type();
            target.apply_envelope(envelope);
            DropOutcome::Applied(media_type)
        }
        Err(err) => {
            warn!(
                "event=drop_rejected module=drag status=error target={} error={}",
                target.target_id(),
                err
            );
            DropOutcome::Rejected(err)
        }
    }
}
