//! Unified resource catalog over the categorized and legacy fixtures.
//!
//! # Invariants
//! - Categorized resource ids are `{categoryId}_{itemId}`; legacy ids are kept
//!   as-is, so the two sources never collide on a namespaced id.
//! - Categorized resources precede legacy resources in `resources()`.
//! - A legacy entry without `type` is an image; an entry whose `type` is not a
//!   known media kind is skipped with a warning, never coerced.

use super::fixture::{CategorizedCatalog, LegacyEntry};
use crate::logging::sanitize_for_log;
use crate::model::patient::DEFAULT_LANGUAGE;
use crate::model::resource::{Category, MediaType, Resource};
use crate::search::resource_search::search_resources;
use std::collections::BTreeSet;

/// Read-only view over both static catalogs.
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    categorized: CategorizedCatalog,
    resources: Vec<Resource>,
    categorized_len: usize,
}

impl ResourceCatalog {
    /// Builds the catalog, flattening both fixtures once.
    pub fn new(
        categorized: CategorizedCatalog,
        legacy: Vec<LegacyEntry>,
        primary_locale: &str,
    ) -> Self {
        let mut resources = flatten_categorized(&categorized, primary_locale);
        let categorized_len = resources.len();
        resources.extend(legacy.iter().filter_map(flatten_legacy_entry));
        log::debug!(
            "event=catalog_load module=catalog status=ok categories={} categorized={} legacy={} skipped={}",
            categorized.categories.len(),
            categorized_len,
            resources.len() - categorized_len,
            legacy.len() - (resources.len() - categorized_len)
        );
        Self {
            categorized,
            resources,
            categorized_len,
        }
    }

    /// Builds a catalog using the default `en-IN` primary locale.
    pub fn with_default_locale(categorized: CategorizedCatalog, legacy: Vec<LegacyEntry>) -> Self {
        Self::new(categorized, legacy, DEFAULT_LANGUAGE)
    }

    /// Canonical browse view: fixture categories in definition order.
    pub fn list_by_category(&self) -> &[Category] {
        &self.categorized.categories
    }

    /// Every flattened resource, categorized first.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn categorized_resources(&self) -> &[Resource] {
        &self.resources[..self.categorized_len]
    }

    pub fn legacy_resources(&self) -> &[Resource] {
        &self.resources[self.categorized_len..]
    }

    /// Keyword search; see [`search_resources`].
    pub fn search(&self, keyword: &str) -> Vec<&Resource> {
        search_resources(self, keyword)
    }

    /// Looks a resource up by its (namespaced) id. First match wins.
    pub fn find(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|resource| resource.id == id)
    }

    pub fn items_in_category<'a>(&'a self, category_id: &'a str) -> impl Iterator<Item = &'a Resource> {
        self.categorized_resources()
            .iter()
            .filter(move |resource| resource.category_id.as_deref() == Some(category_id))
    }
}

/// Flattens the categorized fixture into resources.
///
/// Label: item name for `primary_locale`, then first name, then item id.
/// Tags: lowercased label, lowercased category name, lowercased item kind.
pub fn flatten_categorized(catalog: &CategorizedCatalog, primary_locale: &str) -> Vec<Resource> {
    catalog
        .categories
        .iter()
        .flat_map(|category| {
            let category_name = category.display_name(primary_locale).to_lowercase();
            category.items.iter().map(move |item| {
                let label = item.names.display_name(primary_locale, &item.id).to_string();
                let mut tags = BTreeSet::from([label.to_lowercase(), category_name.clone()]);
                if let Some(kind) = item.kind.as_deref() {
                    tags.insert(kind.to_lowercase());
                }
                Resource {
                    id: format!("{}_{}", category.id, item.id),
                    label,
                    media_type: MediaType::Image,
                    media_ref: item.image_ref.clone(),
                    category_id: Some(category.id.clone()),
                    tags,
                }
            })
        })
        .collect()
}

fn flatten_legacy_entry(entry: &LegacyEntry) -> Option<Resource> {
    let media_type = match entry.kind.as_deref() {
        None => MediaType::Image,
        Some(raw) => match MediaType::parse(raw) {
            Some(media_type) => media_type,
            None => {
                log::warn!(
                    "event=catalog_load module=catalog status=skipped reason=unknown_type id={} type={}",
                    sanitize_for_log(&entry.id),
                    sanitize_for_log(raw)
                );
                return None;
            }
        },
    };
    Some(Resource {
        id: entry.id.clone(),
        label: entry.label.clone(),
        media_type,
        media_ref: entry.media_ref().map(str::to_string),
        category_id: None,
        tags: entry.tags.iter().map(|tag| tag.to_lowercase()).collect(),
    })
}
