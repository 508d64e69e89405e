//! Static resource catalogs.
//!
//! # Responsibility
//! - Parse the categorized, legacy and audio fixtures.
//! - Flatten fixtures into one searchable `Resource` list.
//!
//! # Invariants
//! - Catalogs are immutable after construction; flattening is pure.
//! - Missing localized names never fail a load (see `LocalizedNames`).

pub mod audio;
pub mod fixture;
pub mod resource_catalog;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Fixture loading error.
#[derive(Debug)]
pub enum CatalogError {
    /// Fixture file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Fixture text is not the expected JSON shape.
    Parse {
        fixture: &'static str,
        source: serde_json::Error,
    },
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read catalog `{}`: {source}", path.display())
            }
            Self::Parse { fixture, source } => write!(f, "invalid {fixture} catalog: {source}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}
