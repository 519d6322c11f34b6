//! Identifier newtypes for SOP entities
//!
//! Templates, steps and versions get generated ULIDs (sortable by creation
//! time). Fields and QC points are identified by author-supplied strings,
//! unique within their owning step.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! ulid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub Ulid);

        impl $name {
            /// Generate a new identifier
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

ulid_id!(
    /// Unique template identifier
    TemplateId
);
ulid_id!(
    /// Unique step identifier
    StepId
);
ulid_id!(
    /// Unique version identifier
    VersionId
);

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from an author-supplied identifier string
            #[inline]
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Identifier as a string slice
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is empty (rejected by draft validation)
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Field identifier, unique within a step
    FieldId
);
string_id!(
    /// Quality-control point identifier, unique within a step
    QcPointId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ulid_ids_are_unique() {
        let a = TemplateId::new();
        let b = TemplateId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn ulid_ids_sort_by_creation_time_across_milliseconds() {
        // Ids minted within the same millisecond order by their random
        // component; only across millisecond boundaries is ordering
        // guaranteed.
        let a = TemplateId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = TemplateId::new();
        assert!(a < b);
    }

    #[test]
    fn string_ids_round_trip() {
        let id = FieldId::new("concentration");
        assert_eq!(id.as_str(), "concentration");
        assert_eq!(id.to_string(), "concentration");
        assert!(!id.is_empty());
        assert!(FieldId::new("").is_empty());
    }
}
