use std::io::Write;
use vocalyx_core::catalog::fixture::{load_legacy_catalog, parse_legacy_catalog, CategorizedCatalog};
use vocalyx_core::{CatalogError, MediaType, Resource, ResourceCatalog};

const CATEGORIZED: &str = r#"{
  "categories": [
    {
      "id": "family",
      "names": {"en-IN": "Family", "hi-IN": "परिवार"},
      "items": [
        {"id": "mom", "names": {"en-IN": "Mom"}, "imageRef": "gs://bucket/mom.jpg"},
        {"id": "dad", "names": {"hi-IN": "पापा", "ta-IN": "அப்பா"}, "imageRef": "gs://bucket/dad.jpg"},
        {"id": "baby", "names": {}, "type": "Person"}
      ]
    },
    {
      "id": "food",
      "names": {"en-IN": "Food"},
      "items": [
        {"id": "apple", "names": {"en-IN": "Apple"}, "imageRef": "https://cdn.example.com/apple.png"}
      ]
    }
  ]
}"#;

const LEGACY: &str = r#"[
  {"id": "r1", "label": "Water", "type": "image", "tags": ["Drink", "thirsty"], "url": "https://cdn.example.com/water.png"},
  {"id": "r2", "label": "Hello", "type": "audio", "tags": ["greeting"]},
  {"id": "r3", "label": "Mom hug", "tags": [], "imageRef": "gs://bucket/hug.png"}
]"#;

fn catalog() -> ResourceCatalog {
    ResourceCatalog::with_default_locale(
        CategorizedCatalog::from_json_str(CATEGORIZED).unwrap(),
        parse_legacy_catalog(LEGACY).unwrap(),
    )
}

fn matches(resource: &Resource, keyword: &str) -> bool {
    let needle = keyword.to_lowercase();
    resource.label.to_lowercase().contains(&needle)
        || resource.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
}

#[test]
fn blank_keywords_return_nothing() {
    let catalog = catalog();
    assert!(catalog.search("").is_empty());
    assert!(catalog.search("   ").is_empty());
    assert!(catalog.search("\t\n").is_empty());
}

#[test]
fn results_are_exactly_the_matching_resources() {
    let catalog = catalog();
    for keyword in ["a", "MO", "food", "drink", "person", "pp", "zzz", "é", "Hello"] {
        let hits = catalog.search(keyword);
        let expected = catalog
            .resources()
            .iter()
            .filter(|resource| matches(resource, keyword))
            .collect::<Vec<_>>();
        assert_eq!(hits, expected, "keyword {keyword:?}");
    }
}

#[test]
fn mom_is_found_with_its_bucket_reference() {
    let catalog = catalog();
    let hits = catalog
        .search("mom")
        .into_iter()
        .filter(|resource| resource.category_id.is_some())
        .collect::<Vec<_>>();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].label, "Mom");
    assert_eq!(hits[0].media_ref.as_deref(), Some("gs://bucket/mom.jpg"));
    assert_eq!(hits[0].media_type, MediaType::Image);
}

#[test]
fn both_catalogs_contribute_results_in_categorized_then_legacy_order() {
    let catalog = catalog();
    let ids = catalog
        .search("mom")
        .into_iter()
        .map(|resource| resource.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["family_mom", "r3"]);
}

#[test]
fn labels_fall_back_to_first_name_then_id() {
    let catalog = catalog();
    assert_eq!(catalog.find("family_dad").unwrap().label, "पापा");
    assert_eq!(catalog.find("family_baby").unwrap().label, "baby");
}

#[test]
fn blank_localized_names_fall_back_to_the_next_value() {
    let catalog = ResourceCatalog::with_default_locale(
        CategorizedCatalog::from_json_str(
            r#"{"categories": [{"id": "family", "names": {"en-IN": "", "hi": "परिवार"}, "items": [
                {"id": "mom", "names": {"en-IN": "", "hi": "माँ"}},
                {"id": "dad", "names": {"en-IN": " "}}
            ]}]}"#,
        )
        .unwrap(),
        Vec::new(),
    );
    let mom = catalog.find("family_mom").unwrap();
    assert_eq!(mom.label, "माँ");
    assert!(mom.tags.contains("माँ"));
    assert!(mom.tags.contains("परिवार"));
    assert!(!mom.tags.contains(""));
    assert_eq!(catalog.find("family_dad").unwrap().label, "dad");
    assert_eq!(catalog.search("माँ").len(), 1);
}

#[test]
fn category_name_is_a_search_tag() {
    let catalog = catalog();
    let family = catalog.search("family");
    assert_eq!(family.len(), 3);
    assert!(family.iter().all(|resource| resource.category_id.as_deref() == Some("family")));
}

#[test]
fn legacy_entries_keep_their_declared_type() {
    let catalog = catalog();
    assert_eq!(catalog.find("r2").unwrap().media_type, MediaType::Audio);
    assert_eq!(catalog.find("r3").unwrap().media_type, MediaType::Image);
    assert_eq!(
        catalog.find("r1").unwrap().media_ref.as_deref(),
        Some("https://cdn.example.com/water.png")
    );
}

#[test]
fn legacy_entries_with_unknown_type_are_not_coerced_to_images() {
    let catalog = ResourceCatalog::with_default_locale(
        CategorizedCatalog::default(),
        parse_legacy_catalog(
            r#"[{"id": "v1", "label": "Video clip", "type": "video", "tags": ["clip"], "url": "https://x/v.mp4"},
                {"id": "r1", "label": "Water", "tags": ["clip"]}]"#,
        )
        .unwrap(),
    );
    assert!(catalog.find("v1").is_none());
    let ids = catalog.search("clip").iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["r1"]);
    assert!(catalog.resources().iter().all(|r| r.media_ref.as_deref() != Some("https://x/v.mp4")));
}

#[test]
fn browse_view_preserves_fixture_order() {
    let catalog = catalog();
    let categories = catalog
        .list_by_category()
        .iter()
        .map(|category| category.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(categories, vec!["family", "food"]);
    assert_eq!(catalog.items_in_category("family").count(), 3);
}

#[test]
fn fixtures_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let categorized_path = dir.path().join("categorized.json");
    let legacy_path = dir.path().join("legacy.json");
    std::fs::File::create(&categorized_path)
        .unwrap()
        .write_all(CATEGORIZED.as_bytes())
        .unwrap();
    std::fs::write(&legacy_path, LEGACY).unwrap();

    let catalog = ResourceCatalog::with_default_locale(
        CategorizedCatalog::load(&categorized_path).unwrap(),
        load_legacy_catalog(&legacy_path).unwrap(),
    );
    assert_eq!(catalog.categorized_resources().len(), 4);
    assert_eq!(catalog.legacy_resources().len(), 3);
}

#[test]
fn missing_and_malformed_fixtures_report_which_one_failed() {
    let dir = tempfile::tempdir().unwrap();
    let missing = CategorizedCatalog::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(missing, CatalogError::Io { .. }));

    let malformed = parse_legacy_catalog("{\"not\": \"an array\"}").unwrap_err();
    assert!(matches!(malformed, CatalogError::Parse { fixture: "legacy", .. }));
}
