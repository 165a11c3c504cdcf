//! The declarative transition table
//!
//! Transitions are static data looked up once, not role checks scattered
//! across call sites: each [`TransitionRule`] declares the states an action
//! applies from, the state it leads to, the roles allowed to perform it and
//! whether a reason is mandatory. Guard rails that do not fit a from/to
//! pair live in the state machine itself.

use obliq_types::{Role, WorkflowStatus};
use serde::{Deserialize, Serialize};

/// Every action a caller can request on an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Assignee confirms they have seen the obligation
    Acknowledge,
    /// Assignee starts working
    Start,
    /// Assignee declares the work done
    Done,
    /// Supervisor accepts the work; terminal
    Approve,
    /// Supervisor sends the work back
    Return,
    /// Assignee picks returned work back up
    Resume,
    /// Pull the item out of the normal flow to a manager
    EscalateToManager,
    /// Manager puts an escalated item back into progress
    ManagerReassign,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Acknowledge => "acknowledge",
            Self::Start => "start",
            Self::Done => "done",
            Self::Approve => "approve",
            Self::Return => "return",
            Self::Resume => "resume",
            Self::EscalateToManager => "escalate_to_manager",
            Self::ManagerReassign => "manager_reassign",
        };
        f.write_str(s)
    }
}

/// One row of the transition table
#[derive(Debug, Clone, Copy)]
pub struct TransitionRule {
    /// The action this rule describes
    pub action: Action,
    /// Statuses the action may be applied from
    pub from: &'static [WorkflowStatus],
    /// Status the action leads to
    pub to: WorkflowStatus,
    /// Roles authorized to perform the action
    pub roles: &'static [Role],
    /// Whether a reason must accompany the action
    pub requires_reason: bool,
}

use obliq_types::WorkflowStatus as S;
use Role as R;

/// The complete transition table; one rule per action
pub const TRANSITION_TABLE: &[TransitionRule] = &[
    TransitionRule {
        action: Action::Acknowledge,
        from: &[S::New],
        to: S::Acknowledged,
        roles: &[R::Employee],
        requires_reason: false,
    },
    TransitionRule {
        action: Action::Start,
        from: &[S::Acknowledged],
        to: S::InProgress,
        roles: &[R::Employee],
        requires_reason: false,
    },
    TransitionRule {
        action: Action::Done,
        from: &[S::InProgress],
        to: S::DonePendingSupervisor,
        roles: &[R::Employee],
        requires_reason: false,
    },
    TransitionRule {
        action: Action::Approve,
        from: &[S::DonePendingSupervisor],
        to: S::Finished,
        roles: &[R::Supervisor, R::Manager],
        requires_reason: false,
    },
    TransitionRule {
        action: Action::Return,
        from: &[S::DonePendingSupervisor],
        to: S::Returned,
        roles: &[R::Supervisor, R::Manager],
        requires_reason: true,
    },
    TransitionRule {
        action: Action::Resume,
        from: &[S::Returned],
        to: S::InProgress,
        roles: &[R::Employee],
        requires_reason: false,
    },
    TransitionRule {
        action: Action::EscalateToManager,
        from: &[S::New, S::Acknowledged, S::InProgress],
        to: S::EscalatedToManager,
        roles: &[R::Supervisor, R::System],
        requires_reason: true,
    },
    TransitionRule {
        action: Action::ManagerReassign,
        from: &[S::EscalatedToManager],
        to: S::InProgress,
        roles: &[R::Manager, R::Director],
        requires_reason: false,
    },
];

/// Look up the rule for an action
#[inline]
#[must_use]
pub fn rule_for(action: Action) -> &'static TransitionRule {
    // The table carries exactly one rule per Action variant
    TRANSITION_TABLE
        .iter()
        .find(|r| r.action == action)
        .unwrap_or_else(|| unreachable!("transition table misses action {action}"))
}

/// Actions a role may perform from a status
#[must_use]
pub fn available_actions(status: WorkflowStatus, role: Role) -> Vec<Action> {
    TRANSITION_TABLE
        .iter()
        .filter(|r| r.from.contains(&status) && r.roles.contains(&role))
        .map(|r| r.action)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_one_rule_per_action() {
        for action in [
            Action::Acknowledge,
            Action::Start,
            Action::Done,
            Action::Approve,
            Action::Return,
            Action::Resume,
            Action::EscalateToManager,
            Action::ManagerReassign,
        ] {
            let count = TRANSITION_TABLE
                .iter()
                .filter(|r| r.action == action)
                .count();
            assert_eq!(count, 1, "{action} must appear exactly once");
        }
    }

    #[test]
    fn no_rule_leaves_a_terminal_status() {
        for rule in TRANSITION_TABLE {
            assert!(
                !rule.from.iter().any(|s| s.is_terminal()),
                "{} starts from a terminal status",
                rule.action
            );
        }
    }

    #[test]
    fn available_actions_respects_role() {
        let employee = available_actions(WorkflowStatus::DonePendingSupervisor, Role::Employee);
        assert!(employee.is_empty());

        let supervisor = available_actions(WorkflowStatus::DonePendingSupervisor, Role::Supervisor);
        assert!(supervisor.contains(&Action::Approve));
        assert!(supervisor.contains(&Action::Return));
    }

    #[test]
    fn finished_has_no_actions_for_anyone() {
        for role in [
            Role::Employee,
            Role::Supervisor,
            Role::Manager,
            Role::Director,
            Role::HrAdmin,
            Role::System,
        ] {
            assert!(available_actions(WorkflowStatus::Finished, role).is_empty());
        }
    }
}
