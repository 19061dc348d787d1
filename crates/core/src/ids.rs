use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! newtype_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Return the inner UUID.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

newtype_id!(AlertId, "Unique identifier for an `Alert`.");
newtype_id!(CaseId, "Unique identifier for a `Case`.");
newtype_id!(ArtifactId, "Unique identifier for an `Artifact`.");
newtype_id!(TimelineEventId, "Unique identifier for a `TimelineEvent`.");
newtype_id!(ActionId, "Unique identifier for an `Action`.");
newtype_id!(TicketId, "Unique identifier for a `Ticket`.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip_through_display_and_parse() {
        let id = CaseId::new();
        let printed = id.to_string();
        let parsed: CaseId = printed.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ids_serde_roundtrip() {
        let id = AlertId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: AlertId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn distinct_ids_are_not_equal() {
        assert_ne!(CaseId::new(), CaseId::new());
    }
}
