//! Asset catalog
//!
//! The catalog maps an asset name (plus resolution) to the locators published for
//! it. Postgres backs it in production; the in-memory implementation serves tests
//! and database-less development runs.

pub mod catalog;
pub mod memory;
pub mod postgres;

pub use catalog::{Catalog, CatalogError, CatalogResult};
pub use memory::InMemoryCatalog;
pub use postgres::PgCatalog;
