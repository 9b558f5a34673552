//! Product Shipping Core - shipping method rules for products.
//!
//! This crate decides which already-computed shipping rates a cart may see,
//! and which local pickup addresses belong in an order confirmation:
//! - [`selector`] - Filters candidate rates against the methods allowed by the
//!   products in a cart, falling back to the unfiltered list when nothing would
//!   survive
//! - [`resolver`] - Resolves distinct pickup addresses for an order's products
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Product metadata is reached through the
//! [`ProductShippingMetadata`] lookup trait, so callers load a snapshot from
//! wherever it lives and hand it in.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, the tagged shipping method model, email kinds
//! - [`metadata`] - Lookup trait and the in-memory snapshot
//! - [`meta_keys`] - Mapping table between form fields and stored metadata keys
//! - [`save_gate`] - Decides whether an admin save is allowed to write
//! - [`email_block`] - Pickup address block for order emails
//! - [`settings`] - Extra settings field for local pickup instances

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod email_block;
pub mod meta_keys;
pub mod metadata;
pub mod resolver;
pub mod save_gate;
pub mod selector;
pub mod settings;
pub mod types;

pub use email_block::{EmailFormat, PickupAddressBlock, pickup_block_for_email};
pub use meta_keys::{MetaValue, MetaWrite, ProductMetaField, ProductShippingForm};
pub use metadata::{InMemoryMetadata, ProductShippingConfig, ProductShippingMetadata};
pub use resolver::resolve_pickup_addresses;
pub use save_gate::{SaveDecision, SaveTarget, SaveTrigger, SkipReason, TokenCheck, evaluate_save};
pub use selector::{RateFilterOutcome, RateSelection, evaluate_rates, filter_rates};
pub use settings::{SettingField, pickup_address_setting_field};
pub use types::*;
