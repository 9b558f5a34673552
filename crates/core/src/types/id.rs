//! Newtype IDs for type-safe entity references.
//!
//! Products and orders come from the host store as integer IDs and use the
//! `define_id!` macro. Shipping method instances are identified by strings
//! whose prefix names the method family, wrapped in [`MethodInstanceId`].

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every local pickup method instance ID.
pub const LOCAL_PICKUP_PREFIX: &str = "local_pickup";

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use product_shipping_core::define_id;
/// define_id!(WarehouseId);
/// define_id!(ZoneId);
///
/// let warehouse = WarehouseId::new(1);
/// let zone = ZoneId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: WarehouseId = zone;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(ProductId);
define_id!(OrderId);

/// Family of a shipping method instance, derived from its ID prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// Local pickup: the customer collects the order at an address.
    LocalPickup,
    /// Any other method (flat rate, free shipping, carrier rates).
    Flat,
}

/// Identifier of a configured shipping method instance (e.g. `local_pickup:3`).
///
/// IDs are compared by exact string equality. An ID that is empty or only
/// whitespace is *blank* and never matches anything.
///
/// ```
/// use product_shipping_core::{MethodInstanceId, MethodKind};
///
/// assert_eq!(MethodInstanceId::new("local_pickup:1").kind(), MethodKind::LocalPickup);
/// assert_eq!(MethodInstanceId::new("flat_rate:2").kind(), MethodKind::Flat);
/// assert!(MethodInstanceId::new("  ").is_blank());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct MethodInstanceId(String);

impl MethodInstanceId {
    /// Create a new method instance ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns `true` if the ID is empty or only whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Method family, decided by the `local_pickup` prefix.
    #[must_use]
    pub fn kind(&self) -> MethodKind {
        if self.0.starts_with(LOCAL_PICKUP_PREFIX) {
            MethodKind::LocalPickup
        } else {
            MethodKind::Flat
        }
    }

    /// Shorthand for `kind() == MethodKind::LocalPickup`.
    #[must_use]
    pub fn is_local_pickup(&self) -> bool {
        self.kind() == MethodKind::LocalPickup
    }
}

impl fmt::Display for MethodInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MethodInstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for MethodInstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for MethodInstanceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MethodInstanceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
