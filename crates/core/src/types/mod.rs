//! Core types for product shipping rules.
//!
//! This module provides type-safe wrappers for the shipping domain.

pub mod email;
pub mod id;
pub mod shipping;

pub use email::EmailKind;
pub use id::*;
pub use shipping::{CandidateRate, CartLine, OrderLineItem, ShippingMethodInstance};
