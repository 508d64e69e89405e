//! CLI probe for `vocalyx_core`.
//!
//! Usage: `vocalyx_cli <categorized.json> <legacy.json> <keyword> [bucket]`
//!
//! Loads both resource catalogs, searches them and prints each hit with its
//! resolved media URL. Without arguments it only prints the core version.

use std::process::ExitCode;
use vocalyx_core::catalog::fixture::{load_legacy_catalog, CategorizedCatalog};
use vocalyx_core::{CoreConfig, ImageResolver, PublicUrlStorage, ResourceCatalog};

fn main() -> ExitCode {
    println!("vocalyx_core version={}", vocalyx_core::core_version());

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let [categorized, legacy, keyword, rest @ ..] = args.as_slice() else {
        return ExitCode::SUCCESS;
    };
    let bucket = rest.first().map(String::as_str).unwrap_or("default-bucket");

    match run(categorized, legacy, keyword, bucket) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(categorized: &str, legacy: &str, keyword: &str, bucket: &str) -> Result<(), String> {
    let config = CoreConfig::default();
    let catalog = ResourceCatalog::new(
        CategorizedCatalog::load(categorized).map_err(|err| err.to_string())?,
        load_legacy_catalog(legacy).map_err(|err| err.to_string())?,
        &config.primary_locale,
    );
    let resolver = ImageResolver::from_config(PublicUrlStorage::new(bucket), &config);

    let hits = catalog.search(keyword);
    println!("hits={}", hits.len());
    for resource in hits {
        let url = resource
            .media_ref
            .as_deref()
            .and_then(|media_ref| resolver.resolve(media_ref))
            .unwrap_or_default();
        println!(
            "{}\t{}\t{}\t{}",
            resource.id,
            resource.media_type.as_str(),
            resource.label,
            url
        );
    }
    Ok(())
}
