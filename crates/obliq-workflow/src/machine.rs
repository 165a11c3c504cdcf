//! The workflow state machine
//!
//! Validates and applies item lifecycle transitions: table lookup, role
//! check, guard rails, conditional persist, audit log append, and the
//! terminal-state completion notice. Side effects are fire-and-forget; a
//! dispatcher failure is logged, never reverses a transition.

use crate::action::{available_actions, rule_for, Action};
use crate::error::WorkflowError;
use chrono::{DateTime, Utc};
use obliq_notify::Dispatcher;
use obliq_store::{HierarchyStore, ItemStore};
use obliq_types::{
    Channel, EmployeeId, Item, ItemId, Role, TransitionChannel, TransitionLogEntry, WorkflowStatus,
};
use std::sync::Arc;

/// One transition request
#[derive(Debug, Clone)]
pub struct ActionRequest {
    /// Target item
    pub item_id: ItemId,
    /// Requested action
    pub action: Action,
    /// Who is acting
    pub actor: EmployeeId,
    /// Role the actor acts under
    pub actor_role: Role,
    /// Reason; mandatory for actions with `requires_reason`
    pub reason: Option<String>,
    /// Where the request came from
    pub channel: TransitionChannel,
}

/// Validates and applies lifecycle transitions
pub struct WorkflowMachine {
    items: Arc<dyn ItemStore>,
    directory: Arc<dyn HierarchyStore>,
    dispatcher: Arc<Dispatcher>,
}

impl WorkflowMachine {
    /// Create a machine over the given stores and dispatcher
    #[must_use]
    pub fn new(
        items: Arc<dyn ItemStore>,
        directory: Arc<dyn HierarchyStore>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            items,
            directory,
            dispatcher,
        }
    }

    /// Actions a role may perform from a status
    #[must_use]
    pub fn available_actions(&self, status: WorkflowStatus, role: Role) -> Vec<Action> {
        available_actions(status, role)
    }

    /// Validate and apply one transition
    ///
    /// Check order: existence, current status against the table, role,
    /// reason, guard rails, then the conditional write. The write is keyed
    /// on the status this call observed, so two concurrent callers cannot
    /// both transition from a status only one of them actually saw; the
    /// loser gets `InvalidTransition` and may retry after refetching.
    pub async fn apply_action(
        &self,
        request: ActionRequest,
        now: DateTime<Utc>,
    ) -> Result<WorkflowStatus, WorkflowError> {
        let rule = rule_for(request.action);
        let item = self
            .items
            .item(request.item_id)
            .await?
            .ok_or(WorkflowError::ItemNotFound(request.item_id))?;
        let observed = item.workflow_status;

        if !rule.from.contains(&observed) {
            return Err(WorkflowError::InvalidTransition {
                action: request.action,
                status: observed,
            });
        }
        if !rule.roles.contains(&request.actor_role) {
            return Err(WorkflowError::Forbidden {
                role: request.actor_role,
                action: request.action,
            });
        }
        if rule.requires_reason && request.reason.as_deref().map_or(true, str::is_empty) {
            return Err(WorkflowError::Validation(format!(
                "action {} requires a reason",
                request.action
            )));
        }
        self.check_guard_rails(&request, &item, observed)?;

        let won = self
            .items
            .compare_and_set_status(request.item_id, observed, rule.to, now)
            .await?;
        if !won {
            // Someone transitioned the item between our read and our write
            return Err(WorkflowError::InvalidTransition {
                action: request.action,
                status: observed,
            });
        }

        self.items
            .append_transition(TransitionLogEntry {
                item_id: request.item_id,
                old_status: observed,
                new_status: rule.to,
                reason: request.reason.clone(),
                actor: request.actor,
                actor_role: request.actor_role,
                channel: request.channel,
                at: now,
            })
            .await?;

        tracing::info!(
            item = %request.item_id,
            action = %request.action,
            from = %observed,
            to = %rule.to,
            actor = %request.actor,
            "transition applied"
        );

        if rule.to.is_terminal() {
            self.send_completion_notice(&item, now).await;
        }

        Ok(rule.to)
    }

    /// Domain rules that do not fit a from/to pair
    fn check_guard_rails(
        &self,
        request: &ActionRequest,
        item: &Item,
        observed: WorkflowStatus,
    ) -> Result<(), WorkflowError> {
        // `done` is only ever valid from in_progress, regardless of what
        // the table might later allow
        if request.action == Action::Done && observed != WorkflowStatus::InProgress {
            return Err(WorkflowError::InvalidTransition {
                action: request.action,
                status: observed,
            });
        }
        // The assignee may not approve their own work, even when they also
        // hold a supervisory role
        if request.action == Action::Approve && request.actor == item.assignee_id {
            return Err(WorkflowError::Forbidden {
                role: request.actor_role,
                action: request.action,
            });
        }
        Ok(())
    }

    /// Best-effort completion notice to the item's creator
    ///
    /// Never rolls back the transition; any failure is a log line.
    async fn send_completion_notice(&self, item: &Item, now: DateTime<Utc>) {
        let recipient = match self.directory.recipient(item.creator_id).await {
            Ok(Some(recipient)) => recipient,
            Ok(None) => {
                tracing::debug!(
                    item = %item.id,
                    creator = %item.creator_id,
                    "no directory entry for creator, skipping completion notice"
                );
                return;
            }
            Err(err) => {
                tracing::warn!(item = %item.id, error = %err, "completion notice lookup failed");
                return;
            }
        };

        let message = format!("Obligation \"{}\" has been completed.", item.title);
        match self
            .dispatcher
            .dispatch(item.id.into(), recipient, vec![Channel::Chat], message, now)
            .await
        {
            Ok(report) if !report.any_sent() && !report.deduplicated() => {
                tracing::warn!(item = %item.id, ?report, "completion notice not delivered");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(item = %item.id, error = %err, "completion notice dispatch failed");
            }
        }
    }
}

impl std::fmt::Debug for WorkflowMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowMachine").finish_non_exhaustive()
    }
}
