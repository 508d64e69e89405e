//! Image lookup for the matching worksheets.
//!
//! # Responsibility
//! - Map `(category, filename)` pairs to display URLs from a fixture.
//! - Build a text placeholder URL for filenames the fixture does not list.
//!
//! # Invariants
//! - Lookups never fail; an unknown category or filename yields a placeholder.
//! - The placeholder text is the filename with the first `.webp` removed, the
//!   first `-` turned into `+`, uppercased and then percent-encoded.

use crate::catalog::fixture::read_fixture;
use crate::catalog::{CatalogError, CatalogResult};
use crate::config::CoreConfig;
use std::collections::BTreeMap;
use std::path::Path;

/// Category used when a worksheet does not name one.
pub const DEFAULT_WORKSHEET_CATEGORY: &str = "food";

const BUILTIN_FOOD: &[(&str, &str)] = &[
    ("dosa.webp", "Dosa"),
    ("idli.webp", "Idli"),
    ("poha.webp", "Poha"),
    ("puri.webp", "Puri"),
    ("chapati.webp", "Chapati"),
    ("sambar.webp", "Sambar"),
    ("rasam.webp", "Rasam"),
    ("upma.webp", "Upma"),
    ("vada.webp", "Vada"),
    ("aloo-paratha.webp", "Aloo"),
    ("chole-bhature.webp", "Chole"),
    ("biryani.webp", "Biryani"),
    ("idiyappam.webp", "Idiyappam"),
    ("pongal.webp", "Pongal"),
    ("dhokla.webp", "Dhokla"),
];

const BUILTIN_FESTIVALS: &[(&str, &str)] = &[
    ("diwali.webp", "Diwali"),
    ("holi.webp", "Holi"),
    ("pongal_f.webp", "Pongal"),
    ("eid.webp", "Eid"),
    ("christmas.webp", "Christmas"),
    ("navratri.webp", "Navratri"),
    ("durga-puja.webp", "Durga+Puja"),
    ("ganesh-chaturthi.webp", "Ganesh"),
    ("onam.webp", "Onam"),
    ("raksha-bandan.webp", "Raksha"),
];

/// Worksheet images keyed by category, then by filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetImages {
    categories: BTreeMap<String, BTreeMap<String, String>>,
    placeholder_base: String,
}

impl WorksheetImages {
    pub fn new(
        categories: BTreeMap<String, BTreeMap<String, String>>,
        placeholder_base: impl Into<String>,
    ) -> Self {
        Self {
            categories,
            placeholder_base: placeholder_base.into(),
        }
    }

    /// Built-in `food` and `festivals` tables rendered on `placeholder_base`.
    pub fn builtin(placeholder_base: impl Into<String>) -> Self {
        let placeholder_base = placeholder_base.into();
        let table = |entries: &[(&str, &str)]| {
            entries
                .iter()
                .map(|(filename, text)| ((*filename).to_string(), format!("{placeholder_base}{text}")))
                .collect::<BTreeMap<_, _>>()
        };
        let categories = BTreeMap::from([
            ("food".to_string(), table(BUILTIN_FOOD)),
            ("festivals".to_string(), table(BUILTIN_FESTIVALS)),
        ]);
        Self::new(categories, placeholder_base)
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::builtin(config.worksheet_placeholder_base.clone())
    }

    /// Parses a `{category: {filename: url}}` fixture.
    pub fn from_json_str(text: &str, placeholder_base: impl Into<String>) -> CatalogResult<Self> {
        let categories = serde_json::from_str(text).map_err(|source| CatalogError::Parse {
            fixture: "worksheet images",
            source,
        })?;
        Ok(Self::new(categories, placeholder_base))
    }

    pub fn load(path: impl AsRef<Path>, placeholder_base: impl Into<String>) -> CatalogResult<Self> {
        Self::from_json_str(&read_fixture(path.as_ref())?, placeholder_base)
    }

    /// Returns the fixture URL for `filename` in `category`, else a placeholder.
    pub fn image_url(&self, filename: &str, category: &str) -> String {
        match self
            .categories
            .get(category)
            .and_then(|images| images.get(filename))
        {
            Some(url) => url.clone(),
            None => self.placeholder_for(filename),
        }
    }

    pub fn placeholder_for(&self, filename: &str) -> String {
        let text = filename.replacen(".webp", "", 1).replacen('-', "+", 1).to_uppercase();
        format!("{}{}", self.placeholder_base, urlencoding::encode(&text))
    }

    pub fn category_len(&self, category: &str) -> usize {
        self.categories.get(category).map_or(0, BTreeMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::{WorksheetImages, DEFAULT_WORKSHEET_CATEGORY};
    use crate::catalog::CatalogError;
    use crate::config::CoreConfig;

    const BASE: &str = "https://placeholder.test/?text=";

    #[test]
    fn fixture_hit_returns_the_listed_url() {
        let images = WorksheetImages::from_json_str(
            r#"{"food":{"dosa.webp":"https://cdn.test/dosa.webp"},"festivals":{"holi.webp":"https://cdn.test/holi.webp"}}"#,
            BASE,
        )
        .unwrap();
        assert_eq!(images.image_url("dosa.webp", "food"), "https://cdn.test/dosa.webp");
        assert_eq!(images.image_url("holi.webp", "festivals"), "https://cdn.test/holi.webp");
    }

    #[test]
    fn misses_fall_back_to_an_uppercased_placeholder() {
        let images = WorksheetImages::from_json_str(r#"{"food":{}}"#, BASE).unwrap();
        assert_eq!(
            images.image_url("masala-dosa-plate.webp", "food"),
            format!("{BASE}MASALA%2BDOSA-PLATE")
        );
        // a listed filename under the wrong category is still a miss
        let images = WorksheetImages::from_json_str(r#"{"food":{"holi.webp":"x"}}"#, BASE).unwrap();
        assert_eq!(images.image_url("holi.webp", "festivals"), format!("{BASE}HOLI"));
        assert_eq!(images.image_url("Mango Lassi.png", "drinks"), format!("{BASE}MANGO%20LASSI.PNG"));
    }

    #[test]
    fn builtin_tables_use_the_configured_base() {
        let images = WorksheetImages::from_config(&CoreConfig::default());
        let base = CoreConfig::default().worksheet_placeholder_base;
        assert_eq!(
            images.image_url("durga-puja.webp", "festivals"),
            format!("{base}Durga+Puja")
        );
        assert_eq!(
            images.image_url("idli.webp", DEFAULT_WORKSHEET_CATEGORY),
            format!("{base}Idli")
        );
        assert_eq!(images.category_len("food"), 15);
        assert_eq!(images.category_len("festivals"), 10);
    }

    #[test]
    fn malformed_fixture_names_the_worksheet_catalog() {
        let err = WorksheetImages::from_json_str(r#"["dosa.webp"]"#, BASE).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { fixture: "worksheet images", .. }));
    }
}
