//! Branded ID newtypes for type safety.
//!
//! Client and entity identifiers are distinct newtype wrappers around
//! `String`, so a client id can never be passed where an entity id is
//! expected. Transports supply their own client ids; [`ClientId::new`]
//! generates a UUID v7 (time-ordered) for transports that do not.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a new UUID v7 string (time-ordered).
fn new_v7() -> String {
    Uuid::now_v7().to_string()
}

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(new_v7())
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Unique identifier for a connected observer, supplied by the transport.
    ClientId
}

branded_id! {
    /// Identifier of an entity, e.g. `light.kitchen`. The prefix before the
    /// first `.` is the entity's domain.
    EntityId
}

impl EntityId {
    /// The domain portion of the id: everything before the first `.`,
    /// or the whole id when no separator is present.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_new_is_uuid_v7() {
        let id = ClientId::new();
        let parsed = Uuid::parse_str(id.as_str()).expect("should be valid UUID");
        assert_eq!(parsed.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn ids_are_unique() {
        let a = ClientId::new();
        let b = ClientId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn from_str_ref() {
        let id = ClientId::from("conn-42");
        assert_eq!(id.as_str(), "conn-42");
    }

    #[test]
    fn deref_to_str() {
        let id = EntityId::from("light.kitchen");
        let s: &str = &id;
        assert_eq!(s, "light.kitchen");
    }

    #[test]
    fn display() {
        let id = ClientId::from("display-me");
        assert_eq!(format!("{id}"), "display-me");
    }

    #[test]
    fn serde_roundtrip() {
        let id = EntityId::from("sensor.hall_temp");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"sensor.hall_temp\"");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn domain_is_prefix_before_dot() {
        assert_eq!(EntityId::from("light.kitchen").domain(), "light");
        assert_eq!(EntityId::from("binary_sensor.door.front").domain(), "binary_sensor");
    }

    #[test]
    fn domain_without_separator_is_whole_id() {
        assert_eq!(EntityId::from("sun").domain(), "sun");
    }

    #[test]
    fn hash_and_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        let id = ClientId::from("same");
        let _ = set.insert(id.clone());
        let _ = set.insert(id.clone());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn into_inner() {
        let id = ClientId::from("inner-test");
        assert_eq!(id.into_inner(), "inner-test");
    }
}
