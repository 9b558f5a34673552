//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Host hooks
//! POST /hooks/package-rates    - Filter a package's candidate rates
//! POST /hooks/order-email      - Pickup address block for an order email
//!
//! # Admin
//! GET  /admin/shipping-methods                              - List instances
//! GET  /admin/shipping-methods/settings-schema              - Pickup address field
//! PUT  /admin/shipping-methods/{instance_id}/pickup-address - Set instance address
//! GET  /admin/products/{product_id}/shipping-methods        - Product edit data
//! POST /admin/products/{product_id}/shipping-methods        - Save product section
//! ```

pub mod admin;
pub mod health;
pub mod hooks;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the host hook routes router.
pub fn hook_routes() -> Router<AppState> {
    Router::new()
        .route("/package-rates", post(hooks::package_rates))
        .route("/order-email", post(hooks::order_email))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/shipping-methods", get(admin::list_instances))
        .route(
            "/shipping-methods/settings-schema",
            get(admin::settings_schema),
        )
        .route(
            "/shipping-methods/{instance_id}/pickup-address",
            put(admin::set_instance_pickup_address),
        )
        .route(
            "/products/{product_id}/shipping-methods",
            get(admin::product_edit).post(admin::save_product),
        )
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/hooks", hook_routes())
        .nest("/admin", admin_routes())
}
