//! Identifier newtypes
//!
//! Every entity the engine touches gets its own id type so a tenant id can
//! never be passed where an employee id is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random id
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing uuid
            #[inline]
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
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

uuid_id! {
    /// Unique obligation item identifier
    ItemId
}

uuid_id! {
    /// Unique tenant identifier
    TenantId
}

uuid_id! {
    /// Unique employee identifier
    EmployeeId
}

uuid_id! {
    /// Unique escalation record identifier
    EscalationId
}

uuid_id! {
    /// Unique sweep run identifier
    SweepRunId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(ItemId::new(), ItemId::new());
    }

    #[test]
    fn id_display_roundtrip() {
        let id = EmployeeId::new();
        let parsed: Uuid = id.to_string().parse().unwrap();
        assert_eq!(id, EmployeeId::from_uuid(parsed));
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = TenantId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: TenantId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
