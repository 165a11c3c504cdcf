use obliq_types::{Role, WorkflowStatus};
use obliq_workflow::{available_actions, rule_for, Action, TRANSITION_TABLE};
use proptest::prelude::*;

const ALL_ACTIONS: [Action; 8] = [
    Action::Acknowledge,
    Action::Start,
    Action::Done,
    Action::Approve,
    Action::Return,
    Action::Resume,
    Action::EscalateToManager,
    Action::ManagerReassign,
];

#[test]
fn no_rule_targets_a_status_it_also_starts_from() {
    for rule in TRANSITION_TABLE {
        assert!(
            !rule.from.contains(&rule.to),
            "action {} would be a self-loop",
            rule.action
        );
    }
}

proptest! {
    #[test]
    fn prop_available_actions_match_the_table(
        status in prop_oneof![
            Just(WorkflowStatus::New),
            Just(WorkflowStatus::Acknowledged),
            Just(WorkflowStatus::InProgress),
            Just(WorkflowStatus::DonePendingSupervisor),
            Just(WorkflowStatus::Returned),
            Just(WorkflowStatus::EscalatedToManager),
            Just(WorkflowStatus::Finished),
        ],
        role in prop_oneof![
            Just(Role::Employee),
            Just(Role::Supervisor),
            Just(Role::Manager),
            Just(Role::Director),
            Just(Role::HrAdmin),
            Just(Role::System),
        ]
    ) {
        let available = available_actions(status, role);
        for action in ALL_ACTIONS {
            let rule = rule_for(action);
            let permitted = rule.from.contains(&status) && rule.roles.contains(&role);
            prop_assert_eq!(available.contains(&action), permitted);
        }
    }
}
