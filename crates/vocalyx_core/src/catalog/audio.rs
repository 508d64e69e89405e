//! Audio phrase catalog used by the audio tab of the resource panel.

use super::fixture::read_fixture;
use super::{CatalogError, CatalogResult};
use crate::model::board::AudioPayload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Phrase available in English plus optional Hindi/Tamil renderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPhrase {
    pub id: String,
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ta: Option<String>,
}

impl AudioPhrase {
    /// Converts the phrase into the payload carried by an audio drag.
    pub fn to_payload(&self) -> AudioPayload {
        let audio_locale_variants = [("hi", &self.hi), ("ta", &self.ta)]
            .into_iter()
            .filter_map(|(locale, text)| text.clone().map(|text| (locale.to_string(), text)))
            .collect::<BTreeMap<_, _>>();
        AudioPayload {
            id: self.id.clone(),
            label: self.en.clone(),
            audio_text: Some(self.en.clone()),
            audio_locale_variants,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioCategory {
    pub id: String,
    #[serde(default)]
    pub items: Vec<AudioPhrase>,
}

/// `{categories: [{id, items: [{id, en, hi?, ta?}]}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioCatalog {
    #[serde(default)]
    pub categories: Vec<AudioCategory>,
}

impl AudioCatalog {
    pub fn from_json_str(text: &str) -> CatalogResult<Self> {
        serde_json::from_str(text).map_err(|source| CatalogError::Parse {
            fixture: "audio",
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        Self::from_json_str(&read_fixture(path.as_ref())?)
    }

    pub fn find(&self, phrase_id: &str) -> Option<&AudioPhrase> {
        self.categories
            .iter()
            .flat_map(|category| category.items.iter())
            .find(|phrase| phrase.id == phrase_id)
    }
}
