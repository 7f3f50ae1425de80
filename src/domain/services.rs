//! Domain services
//!
//! Stateless transformations from scraped data to shop payloads.

pub mod payload_builder;
pub mod product_service;
pub mod slug;

pub use payload_builder::PayloadBuilder;
pub use product_service::ProductService;
pub use slug::slugify;
