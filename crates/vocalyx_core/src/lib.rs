//! Core logic for the Vocalyx therapy companion.
//!
//! Resource catalog and search, the drag-transfer protocol between catalog and
//! board/schedule editors, media reference resolution, and the patient data and
//! auth gateways.

pub mod catalog;
pub mod config;
pub mod db;
pub mod drag;
pub mod logging;
pub mod media;
pub mod model;
pub mod search;
pub mod service;
pub mod store;

pub use catalog::resource_catalog::ResourceCatalog;
pub use catalog::{CatalogError, CatalogResult};
pub use config::{ConfigError, CoreConfig};
pub use drag::envelope::{DragEnvelope, DragError};
pub use drag::transfer::{begin_drag, handle_drop, DataTransfer, DropOutcome, DropTarget};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use media::resolver::{BlobError, BlobStorage, ImageResolver, PublicUrlStorage};
pub use media::worksheet::WorksheetImages;
pub use model::resource::{Category, MediaType, Resource};
pub use search::resource_search::search_resources;
pub use service::auth_service::{AuthEvent, AuthService, Session, SignupForm};
pub use service::gateway::{ErrorKind, GatewayError, GatewayResult};
pub use service::identity::{IdentityProvider, LocalIdentityProvider};
pub use service::patient_data_service::PatientDataService;
pub use store::{DocumentStore, SqliteDocumentStore, StoreError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
