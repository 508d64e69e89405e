//! Catalog resource model.
//!
//! # Responsibility
//! - Describe selectable media resources and the categorized fixture shape.
//! - Preserve localized name ordering so "first available value" is stable.
//!
//! # Invariants
//! - `Resource::id` is unique within one catalog source; merged sources are
//!   namespaced by the catalog layer.
//! - Name lookups never fail: primary locale, then first value, then raw id.
//!   Blank values are skipped at every step.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt::Formatter;

/// Media kind carried by a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Audio,
}

impl MediaType {
    /// Stable wire name (`image|audio`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }

    /// Parses a wire name case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Some(Self::Image),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }
}

/// Locale-keyed display names in fixture declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedNames(Vec<(String, String)>);

impl LocalizedNames {
    /// Builds names from `(locale, value)` pairs, keeping the given order.
    pub fn new<I, L, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (L, V)>,
        L: Into<String>,
        V: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(locale, value)| (locale.into(), value.into()))
                .collect(),
        )
    }

    /// Returns the value registered for `locale`, if any. Blank values count as absent.
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == locale)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.trim().is_empty())
    }

    /// Returns the first declared non-blank value.
    pub fn first(&self) -> Option<&str> {
        self.0
            .iter()
            .map(|(_, value)| value.as_str())
            .find(|value| !value.trim().is_empty())
    }

    /// Resolves a display name: `locale`, then the first value, then `fallback_id`.
    pub fn display_name<'a>(&'a self, locale: &str, fallback_id: &'a str) -> &'a str {
        self.get(locale).or_else(|| self.first()).unwrap_or(fallback_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(locale, value)| (locale.as_str(), value.as_str()))
    }
}

impl Serialize for LocalizedNames {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (locale, value) in &self.0 {
            map.serialize_entry(locale, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LocalizedNames {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NamesVisitor;

        impl<'de> Visitor<'de> for NamesVisitor {
            type Value = LocalizedNames;

            fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "a map of locale tag to display name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((locale, value)) = access.next_entry::<String, String>()? {
                    entries.push((locale, value));
                }
                Ok(LocalizedNames(entries))
            }
        }

        deserializer.deserialize_map(NamesVisitor)
    }
}

/// One item inside a fixture category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryItem {
    pub id: String,
    #[serde(default)]
    pub names: LocalizedNames,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Free-form item kind; contributes a search tag when present.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Categorized catalog group. Owns its ordered item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub names: LocalizedNames,
    #[serde(default)]
    pub items: Vec<CategoryItem>,
}

impl Category {
    pub fn display_name<'a>(&'a self, locale: &str) -> &'a str {
        self.names.display_name(locale, &self.id)
    }
}

/// Flattened, searchable media resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    /// Public URL or bucket-relative handle.
    pub media_ref: Option<String>,
    pub category_id: Option<String>,
    pub tags: BTreeSet<String>,
}

impl Resource {
    /// Returns whether `needle` (already lowercased) occurs in the label or any tag.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.label.to_lowercase().contains(needle) || self.tags.iter().any(|tag| tag.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalizedNames, MediaType};

    #[test]
    fn localized_names_keep_declaration_order() {
        let names: LocalizedNames =
            serde_json::from_str(r#"{"ta":"அம்மா","hi":"माँ","en-IN":"Mom"}"#).unwrap();
        assert_eq!(names.first(), Some("அம்மா"));
        assert_eq!(names.display_name("en-IN", "mom"), "Mom");
        assert_eq!(names.display_name("fr", "mom"), "அம்மா");
    }

    #[test]
    fn empty_names_fall_back_to_id() {
        let names = LocalizedNames::default();
        assert_eq!(names.display_name("en-IN", "raw_id"), "raw_id");
    }

    #[test]
    fn blank_values_are_skipped_when_resolving_names() {
        let names: LocalizedNames =
            serde_json::from_str(r#"{"en-IN":"","ta":"  ","hi":"माँ"}"#).unwrap();
        assert_eq!(names.get("en-IN"), None);
        assert_eq!(names.first(), Some("माँ"));
        assert_eq!(names.display_name("en-IN", "mom"), "माँ");

        let blank: LocalizedNames = serde_json::from_str(r#"{"en-IN":""}"#).unwrap();
        assert_eq!(blank.display_name("en-IN", "mom"), "mom");
    }

    #[test]
    fn media_type_parse_is_case_insensitive() {
        assert_eq!(MediaType::parse(" Audio "), Some(MediaType::Audio));
        assert_eq!(MediaType::parse("video"), None);
    }
}
