pub mod catalog;
pub mod types;

pub use catalog::{AttributeCatalog, CatalogStatistics};
pub use types::{AttributeDefinition, AttributeLevel, Profile};
