//! Drag envelope wire format.
//!
//! Wire shape (UTF-8 JSON):
//! `{id, label, type: "image"|"audio", url, imageRef, audioText?, audioLocaleVariants?}`.
//! Older producers sent `audioHi`/`audioTa` instead of `audioLocaleVariants`;
//! those are folded in on decode.

use crate::model::board::AudioPayload;
use crate::model::resource::{MediaType, Resource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Named slot in the platform drag payload.
pub const AAC_TOKEN_SLOT: &str = "aac-token";

/// Image reference carried by a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageToken {
    pub id: String,
    pub label: String,
    /// Public URL or bucket handle.
    pub media_ref: String,
}

/// Closed set of things that can be dragged onto a tile or step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEnvelope {
    Image(ImageToken),
    Audio(AudioPayload),
}

impl DragEnvelope {
    /// Builds an envelope for a catalog resource.
    ///
    /// Returns `None` for image resources with no media reference.
    pub fn from_resource(resource: &Resource) -> Option<Self> {
        match resource.media_type {
            MediaType::Image => resource.media_ref.as_ref().map(|media_ref| {
                Self::Image(ImageToken {
                    id: resource.id.clone(),
                    label: resource.label.clone(),
                    media_ref: media_ref.clone(),
                })
            }),
            MediaType::Audio => Some(Self::Audio(AudioPayload {
                id: resource.id.clone(),
                label: resource.label.clone(),
                audio_text: Some(resource.label.clone()),
                audio_locale_variants: BTreeMap::new(),
            })),
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Image(_) => MediaType::Image,
            Self::Audio(_) => MediaType::Audio,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Image(token) => &token.id,
            Self::Audio(payload) => &payload.id,
        }
    }

    /// Serializes the envelope to its JSON wire text.
    pub fn encode(&self) -> Result<String, DragError> {
        serde_json::to_string(&WireEnvelope::from(self)).map_err(DragError::Encode)
    }

    /// Parses wire text, rejecting unknown `type` tags and incomplete tokens.
    pub fn decode(raw: &str) -> Result<Self, DragError> {
        let wire: WireEnvelope = serde_json::from_str(raw).map_err(DragError::Malformed)?;
        match wire.kind.as_str() {
            "image" => {
                let media_ref = wire
                    .url
                    .or(wire.image_ref)
                    .filter(|media_ref| !media_ref.trim().is_empty())
                    .ok_or(DragError::MissingMediaRef { id: wire.id.clone() })?;
                Ok(Self::Image(ImageToken {
                    id: wire.id,
                    label: wire.label,
                    media_ref,
                }))
            }
            "audio" => {
                let mut variants = wire.audio_locale_variants.unwrap_or_default();
                for (locale, text) in [("hi", wire.audio_hi), ("ta", wire.audio_ta)] {
                    if let Some(text) = text {
                        variants.entry(locale.to_string()).or_insert(text);
                    }
                }
                Ok(Self::Audio(AudioPayload {
                    id: wire.id,
                    label: wire.label,
                    audio_text: wire.audio_text,
                    audio_locale_variants: variants,
                }))
            }
            other => Err(DragError::UnknownType(other.to_string())),
        }
    }
}

/// Drag protocol failures.
#[derive(Debug)]
pub enum DragError {
    /// Payload text is not valid envelope JSON.
    Malformed(serde_json::Error),
    /// Payload declares a `type` outside `image|audio`.
    UnknownType(String),
    /// Image payload without `url`/`imageRef`.
    MissingMediaRef { id: String },
    Encode(serde_json::Error),
}

impl Display for DragError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed drag payload: {err}"),
            Self::UnknownType(kind) => write!(f, "unsupported drag payload type `{kind}`"),
            Self::MissingMediaRef { id } => {
                write!(f, "image drag payload `{id}` has no media reference")
            }
            Self::Encode(err) => write!(f, "failed to encode drag payload: {err}"),
        }
    }
}

impl Error for DragError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) | Self::Encode(err) => Some(err),
            Self::UnknownType(_) | Self::MissingMediaRef { .. } => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    id: String,
    #[serde(default)]
    label: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_locale_variants: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing)]
    audio_hi: Option<String>,
    #[serde(default, skip_serializing)]
    audio_ta: Option<String>,
}

impl From<&DragEnvelope> for WireEnvelope {
    fn from(envelope: &DragEnvelope) -> Self {
        match envelope {
            DragEnvelope::Image(token) => Self {
                id: token.id.clone(),
                label: token.label.clone(),
                kind: MediaType::Image.as_str().to_string(),
                url: Some(token.media_ref.clone()),
                image_ref: Some(token.media_ref.clone()),
                audio_text: None,
                audio_locale_variants: None,
                audio_hi: None,
                audio_ta: None,
            },
            DragEnvelope::Audio(payload) => Self {
                id: payload.id.clone(),
                label: payload.label.clone(),
                kind: MediaType::Audio.as_str().to_string(),
                url: None,
                image_ref: None,
                audio_text: payload.audio_text.clone(),
                audio_locale_variants: Some(payload.audio_locale_variants.clone())
                    .filter(|variants| !variants.is_empty()),
                audio_hi: None,
                audio_ta: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DragEnvelope, DragError};

    #[test]
    fn decode_accepts_image_ref_alias() {
        let envelope =
            DragEnvelope::decode(r#"{"id":"x","label":"X","type":"image","imageRef":"gs://b/x.png"}"#)
                .unwrap();
        match envelope {
            DragEnvelope::Image(token) => assert_eq!(token.media_ref, "gs://b/x.png"),
            DragEnvelope::Audio(_) => panic!("expected image token"),
        }
    }

    #[test]
    fn decode_folds_legacy_locale_fields() {
        let envelope = DragEnvelope::decode(
            r#"{"id":"hello","label":"Hello","type":"audio","audioText":"Hello","audioHi":"नमस्ते","audioTa":"வணக்கம்"}"#,
        )
        .unwrap();
        let DragEnvelope::Audio(payload) = envelope else {
            panic!("expected audio payload");
        };
        assert_eq!(payload.audio_locale_variants.len(), 2);
        assert_eq!(payload.audio_locale_variants["ta"], "வணக்கம்");
    }

    #[test]
    fn decode_rejects_unknown_type() {
        let err = DragEnvelope::decode(r#"{"id":"v","label":"V","type":"video"}"#).unwrap_err();
        assert!(matches!(err, DragError::UnknownType(kind) if kind == "video"));
    }

    #[test]
    fn decode_rejects_image_without_reference() {
        let err = DragEnvelope::decode(r#"{"id":"v","label":"V","type":"image"}"#).unwrap_err();
        assert!(matches!(err, DragError::MissingMediaRef { .. }));
    }

    #[test]
    fn decode_rejects_malformed_text() {
        let err = DragEnvelope::decode("{not json").unwrap_err();
        assert!(matches!(err, DragError::Malformed(_)));
    }

    #[test]
    fn encoded_image_carries_both_reference_fields() {
        let raw = DragEnvelope::decode(r#"{"id":"x","label":"X","type":"image","url":"https://a/x.png"}"#)
            .unwrap()
            .encode()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["url"], "https://a/x.png");
        assert_eq!(value["imageRef"], "https://a/x.png");
    }
}
