//! The escalation engine
//!
//! Drives chains level-by-level through the organizational hierarchy. The
//! sweep is the heart of it: find overdue pending records, claim each one
//! with a conditional write, spawn the successor, notify the new recipient.
//! The claim is the engine's only concurrency control; an overlapping
//! sweep that read the same record loses the conditional update and takes
//! no further action on it, so no chain ever grows a duplicate successor.

use crate::error::EscalationError;
use crate::resolver::RecipientResolver;
use chrono::{DateTime, Utc};
use obliq_notify::Dispatcher;
use obliq_store::{
    EscalationStore, EscalationUpdate, HierarchyStore, ItemStore, RuleStore, RunStore,
};
use obliq_types::{
    ChainKey, EmployeeId, EscalationId, EscalationRecord, EscalationRule, EscalationStatus, Item,
    SweepRun, SweepRunId, SweepSummary, MAX_ESCALATION_LEVEL,
};
use std::sync::Arc;
use std::time::Instant;

/// Engine tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Highest level a chain may reach before expiring
    pub max_level: u8,
    /// Upper bound on records one sweep invocation touches
    pub batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_level: MAX_ESCALATION_LEVEL,
            batch_size: 100,
        }
    }
}

/// What became of one record during a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordOutcome {
    /// Claimed and handed to the next level
    Escalated,
    /// Chain exhausted (max level or no recipient)
    Expired,
    /// A concurrent sweep claimed it first; nothing to do
    LostRace,
}

/// The deadline-driven escalation state machine
pub struct EscalationEngine {
    escalations: Arc<dyn EscalationStore>,
    items: Arc<dyn ItemStore>,
    rules: Arc<dyn RuleStore>,
    hierarchy: Arc<dyn HierarchyStore>,
    runs: Arc<dyn RunStore>,
    resolver: RecipientResolver,
    dispatcher: Arc<Dispatcher>,
    config: EngineConfig,
}

impl EscalationEngine {
    /// Wire an engine over its collaborators
    #[must_use]
    pub fn new(
        escalations: Arc<dyn EscalationStore>,
        items: Arc<dyn ItemStore>,
        rules: Arc<dyn RuleStore>,
        hierarchy: Arc<dyn HierarchyStore>,
        runs: Arc<dyn RunStore>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            escalations,
            items,
            rules,
            hierarchy: Arc::clone(&hierarchy),
            runs,
            resolver: RecipientResolver::new(hierarchy),
            dispatcher,
            config: EngineConfig::default(),
        }
    }

    /// Override the default configuration
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// One batch pass over overdue records
    ///
    /// Idempotent and safe to re-run after a crash: every mutation is a
    /// conditional write, so a record already moved past `Pending` is left
    /// alone. Records are processed sequentially, oldest due first; one
    /// record's failure never blocks the rest. Only the initial
    /// due-records query aborts the whole invocation.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepSummary, EscalationError> {
        let started = Instant::now();
        let due = self
            .escalations
            .due_records(now, self.config.batch_size)
            .await?;
        tracing::info!(count = due.len(), "sweep found overdue escalations");

        let mut summary = SweepSummary::default();
        for record in due {
            summary.processed += 1;
            match self.process_record(&record, now).await {
                Ok(RecordOutcome::Escalated) => summary.escalated += 1,
                Ok(RecordOutcome::Expired) => summary.expired += 1,
                Ok(RecordOutcome::LostRace) => {
                    tracing::debug!(record = %record.id, "record claimed by a concurrent sweep");
                }
                Err(err) => {
                    summary.errors += 1;
                    tracing::warn!(record = %record.id, error = %err, "record processing failed");
                }
            }
        }

        summary.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let run = SweepRun {
            id: SweepRunId::new(),
            started_at: now,
            summary: summary.clone(),
        };
        if let Err(err) = self.runs.record_run(run).await {
            // The per-record writes already stand; losing the summary row
            // is not worth failing the invocation over
            tracing::warn!(error = %err, "failed to persist sweep run summary");
        }

        tracing::info!(
            processed = summary.processed,
            escalated = summary.escalated,
            expired = summary.expired,
            errors = summary.errors,
            duration_ms = summary.duration_ms,
            "sweep complete"
        );
        Ok(summary)
    }

    /// Advance one overdue record through the level check, resolution,
    /// claim, successor insert and hand-off notice
    async fn process_record(
        &self,
        record: &EscalationRecord,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome, EscalationError> {
        let next_level = record.level + 1;

        // (a) chain exhausted by level
        if next_level > self.config.max_level {
            return self
                .expire_record(record.id, "maximum escalation level reached".to_string())
                .await;
        }

        // (b) nobody to hand off to
        let Some(next_recipient) = self
            .resolver
            .resolve_next(record.tenant_id, record.original_recipient_id, next_level)
            .await?
        else {
            return self
                .expire_record(record.id, format!("no recipient at level {next_level}"))
                .await;
        };

        // Rule lookup happens before the claim so a configuration hole
        // cannot leave a claimed record without a successor
        let rule = self
            .rules
            .rule(record.tenant_id, next_level)
            .await?
            .ok_or(EscalationError::MissingRule(next_level))?;

        // (c) the claim: the only writer that wins this CAS creates the
        // successor
        let claimed = self
            .escalations
            .compare_and_set_record(
                record.id,
                EscalationStatus::Pending,
                EscalationStatus::Escalated,
                EscalationUpdate {
                    escalated_at: Some(now),
                    reason: None,
                },
            )
            .await?;
        if !claimed {
            return Ok(RecordOutcome::LostRace);
        }

        // (d) successor record one level up
        let successor = EscalationRecord {
            id: EscalationId::new(),
            tenant_id: record.tenant_id,
            item_id: record.item_id,
            original_recipient_id: record.original_recipient_id,
            level: next_level,
            current_recipient_id: next_recipient,
            previous_recipient_id: Some(record.current_recipient_id),
            status: EscalationStatus::Pending,
            next_escalation_at: now + rule.delay(),
            escalated_at: None,
            reason: None,
            created_at: now,
        };
        let successor_id = successor.id;
        self.escalations.insert_record(successor).await?;
        tracing::info!(
            record = %record.id,
            successor = %successor_id,
            level = next_level,
            recipient = %next_recipient,
            "escalated to next level"
        );

        // (e) notify the new recipient; failures never block the batch
        self.notify_recipient(successor_id, next_recipient, record.item_id, &rule, now)
            .await;

        Ok(RecordOutcome::Escalated)
    }

    /// Open a new chain for an item whose reminder went unacknowledged
    ///
    /// Idempotent, including against concurrent callers: the level-1
    /// record is inserted with a conditional write that fails when the
    /// chain already has records (live or terminal). Returns `Ok(None)`
    /// when the chain exists or there is no level-1 recipient to open
    /// it with.
    pub async fn open_chain(
        &self,
        item: &Item,
        original_recipient_id: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<Option<EscalationId>, EscalationError> {
        // Fast path; the conditional insert below is the authority
        let key = ChainKey {
            tenant_id: item.tenant_id,
            item_id: item.id,
            original_recipient_id,
        };
        if !self.escalations.chain_records(key).await?.is_empty() {
            return Ok(None);
        }

        let Some(recipient) = self
            .resolver
            .resolve_next(item.tenant_id, original_recipient_id, 1)
            .await?
        else {
            tracing::info!(item = %item.id, "no level-1 recipient, chain not opened");
            return Ok(None);
        };
        let rule = self
            .rules
            .rule(item.tenant_id, 1)
            .await?
            .ok_or(EscalationError::MissingRule(1))?;

        let record = EscalationRecord {
            id: EscalationId::new(),
            tenant_id: item.tenant_id,
            item_id: item.id,
            original_recipient_id,
            level: 1,
            current_recipient_id: recipient,
            previous_recipient_id: Some(original_recipient_id),
            status: EscalationStatus::Pending,
            next_escalation_at: now + rule.delay(),
            escalated_at: None,
            reason: None,
            created_at: now,
        };
        let record_id = record.id;
        if !self.escalations.insert_chain_origin(record).await? {
            tracing::debug!(item = %item.id, "chain opened by a concurrent caller");
            return Ok(None);
        }
        tracing::info!(item = %item.id, record = %record_id, "escalation chain opened");

        self.notify_recipient(record_id, recipient, item.id, &rule, now)
            .await;
        Ok(Some(record_id))
    }

    /// Current recipient acknowledges the escalation; terminal for the chain
    pub async fn acknowledge(
        &self,
        record_id: EscalationId,
        actor: EmployeeId,
    ) -> Result<(), EscalationError> {
        self.close_record(record_id, actor, EscalationStatus::Acknowledged, None)
            .await
    }

    /// Mark the escalation resolved out-of-band; terminal for the chain
    pub async fn resolve(
        &self,
        record_id: EscalationId,
        actor: EmployeeId,
        reason: Option<String>,
    ) -> Result<(), EscalationError> {
        self.close_record(record_id, actor, EscalationStatus::Resolved, reason)
            .await
    }

    async fn close_record(
        &self,
        record_id: EscalationId,
        actor: EmployeeId,
        status: EscalationStatus,
        reason: Option<String>,
    ) -> Result<(), EscalationError> {
        let record = self
            .escalations
            .record(record_id)
            .await?
            .ok_or(EscalationError::RecordNotFound(record_id))?;
        // Only the person the escalation currently sits with may close it
        if record.current_recipient_id != actor {
            return Err(EscalationError::Forbidden(record_id));
        }
        let won = self
            .escalations
            .compare_and_set_record(
                record_id,
                EscalationStatus::Pending,
                status,
                EscalationUpdate {
                    escalated_at: None,
                    reason,
                },
            )
            .await?;
        if !won {
            return Err(EscalationError::NotPending(record_id));
        }
        tracing::info!(record = %record_id, %status, actor = %actor, "escalation closed");
        Ok(())
    }

    /// Best-effort hand-off notice for a freshly created record
    async fn notify_recipient(
        &self,
        record_id: EscalationId,
        recipient_id: EmployeeId,
        item_id: obliq_types::ItemId,
        rule: &EscalationRule,
        now: DateTime<Utc>,
    ) {
        let recipient = match self.hierarchy.recipient(recipient_id).await {
            Ok(Some(recipient)) => recipient,
            Ok(None) => {
                tracing::warn!(
                    record = %record_id,
                    recipient = %recipient_id,
                    "no directory entry for recipient, notification skipped"
                );
                return;
            }
            Err(err) => {
                tracing::warn!(record = %record_id, error = %err, "recipient lookup failed");
                return;
            }
        };

        let title = match self.items.item(item_id).await {
            Ok(Some(item)) => item.title,
            _ => item_id.to_string(),
        };
        let message = rule.render_message(&title);
        match self
            .dispatcher
            .dispatch(
                record_id.into(),
                recipient,
                rule.channels.clone(),
                message,
                now,
            )
            .await
        {
            Ok(report) if report.any_sent() || report.deduplicated() => {}
            Ok(report) => {
                tracing::warn!(record = %record_id, ?report, "escalation notice not delivered");
            }
            Err(err) => {
                tracing::warn!(record = %record_id, error = %err, "escalation dispatch failed");
            }
        }
    }

    async fn expire_record(
        &self,
        record_id: EscalationId,
        reason: String,
    ) -> Result<RecordOutcome, EscalationError> {
        let won = self
            .escalations
            .compare_and_set_record(
                record_id,
                EscalationStatus::Pending,
                EscalationStatus::Expired,
                EscalationUpdate {
                    escalated_at: None,
                    reason: Some(reason.clone()),
                },
            )
            .await?;
        if won {
            tracing::info!(record = %record_id, %reason, "escalation expired");
            Ok(RecordOutcome::Expired)
        } else {
            Ok(RecordOutcome::LostRace)
        }
    }
}

impl std::fmt::Debug for EscalationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

