//! Services backing the HTTP handlers.
//!
//! # Services
//!
//! - `instance_catalog` - Cached shipping method instance list
//! - `save_token` - Signed tokens guarding admin product saves

pub mod instance_catalog;
pub mod save_token;

pub use instance_catalog::{CatalogError, InstanceCatalog};
pub use save_token::{SaveTokenError, SaveTokenSigner};
