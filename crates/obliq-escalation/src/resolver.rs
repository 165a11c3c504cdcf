//! Recipient resolution
//!
//! Levels 1–3 walk the employee's organizational edge; level 4 picks from
//! the tenant's HR contact pool. A `None` from any level is terminal for
//! the calling chain; the engine never retries resolution at the same
//! level.

use obliq_store::{HierarchyStore, StoreError};
use obliq_types::{EmployeeId, HrContact, TenantId};
use std::sync::Arc;

/// Resolves the next human to notify for an escalation level
pub struct RecipientResolver {
    hierarchy: Arc<dyn HierarchyStore>,
}

impl RecipientResolver {
    /// Create a resolver over the hierarchy store
    #[must_use]
    pub fn new(hierarchy: Arc<dyn HierarchyStore>) -> Self {
        Self { hierarchy }
    }

    /// Next recipient for `(tenant, employee)` at `level`, or `None` when
    /// the chain has nobody at that level
    ///
    /// `employee_id` is always the chain's original recipient; the
    /// hierarchy row belongs to them at every level.
    pub async fn resolve_next(
        &self,
        tenant_id: TenantId,
        employee_id: EmployeeId,
        level: u8,
    ) -> Result<Option<EmployeeId>, StoreError> {
        match level {
            1..=3 => {
                let edge = self.hierarchy.org_edge(tenant_id, employee_id).await?;
                Ok(edge.and_then(|e| e.recipient_at(level)))
            }
            4 => {
                let contacts = self.hierarchy.hr_contacts(tenant_id).await?;
                Ok(pick_hr_contact(contacts))
            }
            _ => Ok(None),
        }
    }
}

/// Deterministic level-4 tie-break: designated primary first, then earliest
/// assignment, then lowest employee id
fn pick_hr_contact(contacts: Vec<HrContact>) -> Option<EmployeeId> {
    contacts
        .into_iter()
        .filter(|c| c.active)
        .min_by_key(|c| (!c.primary, c.assigned_at, c.employee_id))
        .map(|c| c.employee_id)
}

impl std::fmt::Debug for RecipientResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipientResolver").finish_non_exhaustive()
    }
}
