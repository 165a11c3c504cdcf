//! Workflow state machine integration tests

use obliq_store::ItemStore;
use pretty_assertions::assert_eq;
use obliq_test_utils::{fixed_now, recording_dispatcher, RecordingChannel, TenantFixture};
use obliq_types::{EmployeeId, Role, TransitionChannel, WorkflowStatus};
use obliq_workflow::{Action, ActionRequest, WorkflowError, WorkflowMachine};
use std::sync::Arc;

struct Setup {
    fixture: TenantFixture,
    machine: WorkflowMachine,
    chat: Arc<RecordingChannel>,
}

async fn setup() -> Setup {
    let fixture = TenantFixture::seeded().await;
    let chat = RecordingChannel::new();
    let sms = RecordingChannel::new();
    let dispatcher = recording_dispatcher(fixture.store.clone(), chat.clone(), sms);
    let machine = WorkflowMachine::new(
        fixture.store.clone(),
        fixture.store.clone(),
        dispatcher,
    );
    Setup {
        fixture,
        machine,
        chat,
    }
}

fn request(
    item_id: obliq_types::ItemId,
    action: Action,
    actor: EmployeeId,
    role: Role,
) -> ActionRequest {
    ActionRequest {
        item_id,
        action,
        actor,
        actor_role: role,
        reason: None,
        channel: TransitionChannel::Api,
    }
}

#[tokio::test]
async fn full_happy_path_to_finished() {
    let s = setup().await;
    let now = fixed_now();
    let item = s.fixture.item(now).await;
    let employee = s.fixture.employee;

    for action in [Action::Acknowledge, Action::Start, Action::Done] {
        s.machine
            .apply_action(request(item.id, action, employee, Role::Employee), now)
            .await
            .unwrap();
    }
    let status = s
        .machine
        .apply_action(
            request(item.id, Action::Approve, s.fixture.supervisor, Role::Supervisor),
            now,
        )
        .await
        .unwrap();
    assert_eq!(status, WorkflowStatus::Finished);

    // One audit entry per transition, in order
    let log = s.fixture.store.transitions(item.id).await.unwrap();
    assert_eq!(log.len(), 4);
    assert_eq!(log[0].old_status, WorkflowStatus::New);
    assert_eq!(log[3].new_status, WorkflowStatus::Finished);
}

#[tokio::test]
async fn done_then_done_again_is_invalid_transition() {
    // Scenario A: in_progress -> done succeeds, repeating done fails
    let s = setup().await;
    let now = fixed_now();
    let item = s.fixture.item(now).await;
    let employee = s.fixture.employee;

    for action in [Action::Acknowledge, Action::Start] {
        s.machine
            .apply_action(request(item.id, action, employee, Role::Employee), now)
            .await
            .unwrap();
    }

    let status = s
        .machine
        .apply_action(request(item.id, Action::Done, employee, Role::Employee), now)
        .await
        .unwrap();
    assert_eq!(status, WorkflowStatus::DonePendingSupervisor);

    let err = s
        .machine
        .apply_action(request(item.id, Action::Done, employee, Role::Employee), now)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidTransition {
            action: Action::Done,
            status: WorkflowStatus::DonePendingSupervisor,
        }
    ));

    // Status unchanged after the rejection
    let stored = s.fixture.store.item(item.id).await.unwrap().unwrap();
    assert_eq!(stored.workflow_status, WorkflowStatus::DonePendingSupervisor);
}

#[tokio::test]
async fn unauthorized_role_is_forbidden_without_mutation() {
    let s = setup().await;
    let now = fixed_now();
    let item = s.fixture.item(now).await;

    let err = s
        .machine
        .apply_action(
            request(item.id, Action::Acknowledge, s.fixture.manager, Role::Manager),
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden { .. }));

    let stored = s.fixture.store.item(item.id).await.unwrap().unwrap();
    assert_eq!(stored.workflow_status, WorkflowStatus::New);
    assert!(s.fixture.store.transitions(item.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn return_requires_a_reason() {
    let s = setup().await;
    let now = fixed_now();
    let item = s.fixture.item(now).await;
    let employee = s.fixture.employee;

    for action in [Action::Acknowledge, Action::Start, Action::Done] {
        s.machine
            .apply_action(request(item.id, action, employee, Role::Employee), now)
            .await
            .unwrap();
    }

    let err = s
        .machine
        .apply_action(
            request(item.id, Action::Return, s.fixture.supervisor, Role::Supervisor),
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    let mut with_reason = request(item.id, Action::Return, s.fixture.supervisor, Role::Supervisor);
    with_reason.reason = Some("missing signature page".to_string());
    let status = s.machine.apply_action(with_reason, now).await.unwrap();
    assert_eq!(status, WorkflowStatus::Returned);

    let log = s.fixture.store.transitions(item.id).await.unwrap();
    assert_eq!(
        log.last().unwrap().reason.as_deref(),
        Some("missing signature page")
    );
}

#[tokio::test]
async fn assignee_cannot_approve_their_own_work() {
    let s = setup().await;
    let now = fixed_now();
    let item = s.fixture.item(now).await;
    let employee = s.fixture.employee;

    for action in [Action::Acknowledge, Action::Start, Action::Done] {
        s.machine
            .apply_action(request(item.id, action, employee, Role::Employee), now)
            .await
            .unwrap();
    }

    // The assignee claims a supervisor role; the guard rail still rejects
    let err = s
        .machine
        .apply_action(request(item.id, Action::Approve, employee, Role::Supervisor), now)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden { .. }));
}

#[tokio::test]
async fn finishing_sends_a_completion_notice_to_the_creator() {
    let s = setup().await;
    let now = fixed_now();
    let item = s.fixture.item(now).await;
    let employee = s.fixture.employee;

    for action in [Action::Acknowledge, Action::Start, Action::Done] {
        s.machine
            .apply_action(request(item.id, action, employee, Role::Employee), now)
            .await
            .unwrap();
    }
    s.machine
        .apply_action(
            request(item.id, Action::Approve, s.fixture.supervisor, Role::Supervisor),
            now,
        )
        .await
        .unwrap();

    let sends = s.chat.sends();
    assert_eq!(sends.len(), 1);
    assert!(sends[0].message.contains("Sign vendor contract"));
    // The creator (the supervisor in this fixture) is the addressee
    assert_eq!(sends[0].address, "@supervisor");
}

#[tokio::test]
async fn completion_notice_failure_does_not_revert_the_transition() {
    let s = setup().await;
    let now = fixed_now();
    let item = s.fixture.item(now).await;
    let employee = s.fixture.employee;

    for action in [Action::Acknowledge, Action::Start, Action::Done] {
        s.machine
            .apply_action(request(item.id, action, employee, Role::Employee), now)
            .await
            .unwrap();
    }

    s.chat.set_failing(true);
    let status = s
        .machine
        .apply_action(
            request(item.id, Action::Approve, s.fixture.supervisor, Role::Supervisor),
            now,
        )
        .await
        .unwrap();
    assert_eq!(status, WorkflowStatus::Finished);

    let stored = s.fixture.store.item(item.id).await.unwrap().unwrap();
    assert_eq!(stored.workflow_status, WorkflowStatus::Finished);
}

#[tokio::test]
async fn concurrent_approvals_let_exactly_one_writer_win() {
    let s = setup().await;
    let now = fixed_now();
    let item = s.fixture.item(now).await;
    let employee = s.fixture.employee;

    for action in [Action::Acknowledge, Action::Start, Action::Done] {
        s.machine
            .apply_action(request(item.id, action, employee, Role::Employee), now)
            .await
            .unwrap();
    }

    // Both callers observed done_pending_supervisor; one approves, one
    // returns. The CAS lets exactly one of them through.
    let approve = s
        .machine
        .apply_action(
            request(item.id, Action::Approve, s.fixture.supervisor, Role::Supervisor),
            now,
        )
        .await;
    let mut ret = request(item.id, Action::Return, s.fixture.manager, Role::Manager);
    ret.reason = Some("re-check totals".to_string());
    let returned = s.machine.apply_action(ret, now).await;

    assert!(approve.is_ok());
    assert!(matches!(
        returned,
        Err(WorkflowError::InvalidTransition { .. })
    ));
    let stored = s.fixture.store.item(item.id).await.unwrap().unwrap();
    assert_eq!(stored.workflow_status, WorkflowStatus::Finished);
}
