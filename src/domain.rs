//! Domain module - Core catalog concepts
//!
//! Natural keys, remote identifiers, scraped records, the webservice document
//! model and the `RemoteResource` seam the import passes are written against.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod constants;
pub mod document;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod value_objects;

// Re-export commonly used items for convenience
pub use document::Element;
pub use entities::{
    CategoryNode, CategoryPath, NaturalKey, ProductDetails, ProductDraft, ProductRecord, RemoteId,
};
pub use repositories::{RemoteResource, Resource};
pub use value_objects::{Display, Query};
