#![forbid(unsafe_code)]

pub mod catalog;
pub mod repository;
pub mod sqlite;

pub use catalog::{CatalogLoadError, load_catalog, parse_catalog};
pub use repository::{InMemorySessionRepository, SessionRepository, Storage, StorageError};
