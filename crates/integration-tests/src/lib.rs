//! Integration tests for product shipping methods.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p product-shipping-integration-tests
//! ```
//!
//! Most tests need no database: router tests use a lazily connected pool and
//! only hit paths that answer before touching it. The `store` tests need
//! `PostgreSQL`:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/psm_test \
//!     cargo test -p product-shipping-integration-tests --test store -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `shipping_rules` - Rate filtering and pickup address resolution
//! - `admin_save` - Save gate, save tokens, and form writes
//! - `server_routes` - In-process HTTP tests of the router
//! - `store` - Repositories and the save/hook round trip against `PostgreSQL`
//!   (ignored by default, run with `DATABASE_URL` set and `--ignored`)

use std::time::Duration;

use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;

use product_shipping_core::InMemoryMetadata;
use product_shipping_server::config::ServerConfig;
use product_shipping_server::state::AppState;

/// Save token key used by [`test_state`].
pub const TEST_SAVE_TOKEN_SECRET: &str = "kQ9#vT2!mZ7@pL4$wX8^rB1&nC6*hJ3%";

/// Server configuration pointing at a database that is never contacted.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://psm@127.0.0.1:1/psm_test"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        save_token_secret: SecretString::from(TEST_SAVE_TOKEN_SECRET),
        save_token_ttl: Duration::from_secs(3600),
        instance_cache_ttl: Duration::from_secs(60),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Application state backed by a lazy pool. Must be called inside a Tokio runtime.
///
/// # Panics
///
/// Panics if the test database URL does not parse.
#[must_use]
pub fn test_state() -> AppState {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://psm@127.0.0.1:1/psm_test")
        .expect("lazy pool from static URL");
    AppState::new(&test_config(), pool)
}

/// Product metadata for a small store, as it would be stored in YAML fixtures.
///
/// - Product 1: local pickup at the main store only
/// - Product 2: courier only
/// - Product 3: main store pickup or courier
/// - Product 4: warehouse pickup
/// - Product 5: unrestricted
///
/// # Panics
///
/// Panics if the embedded fixture is invalid.
#[must_use]
pub fn store_metadata() -> InMemoryMetadata {
    serde_yaml::from_str(
        r#"
1:
  allowed_methods: ["local_pickup:1"]
  pickup_addresses:
    "local_pickup:1": 123 Main St
2:
  allowed_methods: ["flat_rate:2"]
3:
  allowed_methods: ["local_pickup:1", "flat_rate:2"]
  pickup_addresses:
    "local_pickup:1": 123 Main St
    "flat_rate:2": Not a pickup point
4:
  allowed_methods: ["local_pickup:4"]
  pickup_addresses:
    "local_pickup:4": 7 Warehouse Rd
"#,
    )
    .expect("valid store fixture")
}
