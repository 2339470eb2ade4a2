//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Agents, pools, and runs each get a strongly-typed ID so they cannot be
//! mixed up at compile time. IDs built with `new()` are UUID v7 and sort by
//! creation time; run IDs are made this way. Agent IDs come from the run's
//! seeded random stream through `from_random_bytes` (UUID v4), so they carry
//! no time ordering but repeat exactly for the same seed.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Build an identifier from raw random bytes.
            ///
            /// Seeded simulations derive IDs from their own random stream so
            /// that two runs with the same seed produce the same identifiers.
            pub const fn from_random_bytes(bytes: [u8; 16]) -> Self {
                Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a trading agent (user, speculator, brand, data partner).
    AgentId
}

define_id! {
    /// Unique identifier for a token allocation pool.
    PoolId
}

define_id! {
    /// Unique identifier for a single simulation run.
    RunId
}
