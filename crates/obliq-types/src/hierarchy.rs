//! Organizational hierarchy rows used by recipient resolution

use crate::id::{EmployeeId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row per employee: the chain above them
///
/// Levels 1–3 resolve through these fields; any unset field terminates the
/// chain at that level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgEdge {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// The employee this row describes
    pub employee_id: EmployeeId,
    /// Level-1 recipient
    pub supervisor_id: Option<EmployeeId>,
    /// Level-2 recipient
    pub manager_id: Option<EmployeeId>,
    /// Level-3 recipient
    pub director_id: Option<EmployeeId>,
}

impl OrgEdge {
    /// Recipient for hierarchy levels 1–3; `None` for unset fields or
    /// out-of-range levels (level 4 is resolved from the HR pool instead)
    #[inline]
    #[must_use]
    pub fn recipient_at(&self, level: u8) -> Option<EmployeeId> {
        match level {
            1 => self.supervisor_id,
            2 => self.manager_id,
            3 => self.director_id,
            _ => None,
        }
    }
}

/// Member of a tenant's HR contact pool (escalation level 4)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrContact {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// The contact
    pub employee_id: EmployeeId,
    /// Inactive contacts are never resolved
    pub active: bool,
    /// Designated primary contact, wins the tie-break
    pub primary: bool,
    /// When the contact was added to the pool; earlier wins the tie-break
    pub assigned_at: DateTime<Utc>,
}
