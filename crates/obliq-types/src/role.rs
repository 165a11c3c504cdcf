//! Actor roles
//!
//! Roles are a closed enum instead of free-form strings: the transition
//! table and escalation rules reference them statically, so an unknown role
//! is unrepresentable rather than silently unauthorized.

use serde::{Deserialize, Serialize};

/// Who is performing an action or receiving an escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The obligation's assignee (or creator acting on their own item)
    Employee,

    /// Direct supervisor, escalation level 1
    Supervisor,

    /// Manager, escalation level 2
    Manager,

    /// Director, escalation level 3
    Director,

    /// HR contact, escalation level 4
    HrAdmin,

    /// The engine itself (sweep-initiated transitions)
    System,
}

impl Role {
    /// Role notified at a given escalation level, if the level is valid
    #[inline]
    #[must_use]
    pub fn for_escalation_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Supervisor),
            2 => Some(Self::Manager),
            3 => Some(Self::Director),
            4 => Some(Self::HrAdmin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Employee => "employee",
            Self::Supervisor => "supervisor",
            Self::Manager => "manager",
            Self::Director => "director",
            Self::HrAdmin => "hr_admin",
            Self::System => "system",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_to_role_mapping() {
        assert_eq!(Role::for_escalation_level(1), Some(Role::Supervisor));
        assert_eq!(Role::for_escalation_level(4), Some(Role::HrAdmin));
        assert_eq!(Role::for_escalation_level(0), None);
        assert_eq!(Role::for_escalation_level(5), None);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::HrAdmin).unwrap();
        assert_eq!(json, "\"hr_admin\"");
    }
}
