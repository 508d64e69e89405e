//! Fixture schemas for the categorized and legacy catalogs.

use super::{CatalogError, CatalogResult};
use crate::model::resource::Category;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Categorized catalog: `{categories: [{id, names, items: [...]}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedCatalog {
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl CategorizedCatalog {
    pub fn from_json_str(text: &str) -> CatalogResult<Self> {
        serde_json::from_str(text).map_err(|source| CatalogError::Parse {
            fixture: "categorized",
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        Self::from_json_str(&read_fixture(path.as_ref())?)
    }
}

/// One entry of the flat legacy catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyEntry {
    pub id: String,
    pub label: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl LegacyEntry {
    /// `url` wins over `imageRef` when both are present.
    pub fn media_ref(&self) -> Option<&str> {
        self.url.as_deref().or(self.image_ref.as_deref())
    }
}

/// Parses the legacy catalog (a bare JSON array).
pub fn parse_legacy_catalog(text: &str) -> CatalogResult<Vec<LegacyEntry>> {
    serde_json::from_str(text).map_err(|source| CatalogError::Parse {
        fixture: "legacy",
        source,
    })
}

pub fn load_legacy_catalog(path: impl AsRef<Path>) -> CatalogResult<Vec<LegacyEntry>> {
    parse_legacy_catalog(&read_fixture(path.as_ref())?)
}

pub(crate) fn read_fixture(path: &Path) -> CatalogResult<String> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}
