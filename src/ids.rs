//! Identifier types.
//!
//! Damage sources, status effects and sounds are all named by the host.
//! Each gets its own interned string identifier backed by `Arc<str>`, so
//! clones are cheap and the three namespaces cannot be mixed up.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create a new identifier from a string slice.
            pub fn new(s: &str) -> Self {
                Self(Arc::from(s))
            }

            /// Get the string representation of this identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(Arc::from(s))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                self.0.as_ref().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok($name::from(s))
            }
        }
    };
}

interned_id!(
    /// Identity of a kind of damage (`"fall"`, `"anvil"`, ...).
    ///
    /// Static distribution rules are keyed by this identifier.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firstaid_rules::DamageSourceId;
    ///
    /// let fall = DamageSourceId::new("fall");
    /// let also_fall: DamageSourceId = "fall".into();
    /// assert_eq!(fall, also_fall);
    /// assert_eq!(fall.as_str(), "fall");
    /// ```
    DamageSourceId
);

interned_id!(
    /// Identifier of a status effect applied by a debuff rule.
    EffectId
);

interned_id!(
    /// Identifier of a sound the host should play.
    SoundId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let a = DamageSourceId::new("fall");
        let b: DamageSourceId = String::from("fall").into();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "fall");
    }

    #[test]
    fn test_id_serde_as_plain_string() {
        let id = EffectId::new("nausea");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"nausea\"");
        let back: EffectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
