//! Typed identifiers.
//!
//! A thin newtype wrapper over `String` per id kind, so a `ThreadId` can
//! never be passed where an `ItemId` is expected even though both are
//! strings on the wire.

use std::fmt;

macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw id string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(ThreadId, "Unique id of a running or completed thread.");
typed_id!(ItemId, "Slash-separated item id, e.g. `rye/file-system/read`.");
typed_id!(KeyFingerprint, "16-hex-char Ed25519 key fingerprint.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_id_displays_as_raw_string() {
        let id = ThreadId::new("t-1");
        assert_eq!(id.to_string(), "t-1");
        assert_eq!(id.as_str(), "t-1");
    }

    #[test]
    fn distinct_id_types_do_not_compare() {
        let thread = ThreadId::new("x");
        let item = ItemId::new("x");
        assert_eq!(thread.as_str(), item.as_str());
        // Different types entirely — this is a compile-time guarantee,
        // demonstrated here only by the fact both construct independently.
    }
}
