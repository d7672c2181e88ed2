//! Strongly-typed identifiers for persisted entities
//!
//! Identities are surrogate keys generated by the database on insert, so an
//! entity that has not been stored yet carries `None` instead of an id.
//! Newtype wrappers prevent a bill id from being passed where an item id is
//! expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a database-generated key
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw key
            pub const fn get(&self) -> i64 {
                self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(raw.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(BillId, "BILL");
define_id!(AssignmentId, "BIA");
define_id!(CatalogItemId, "ITEM");
define_id!(IssuerId, "ISS");
define_id!(ReceiverId, "RCV");
define_id!(ExchangeRateId, "FX");
