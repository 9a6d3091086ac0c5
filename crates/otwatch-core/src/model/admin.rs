//! Admin panel model: users, roles, the capability matrix, audit log,
//! and the editable system configuration record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// Console role. Determines what the admin panel lets the session do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Default)]
pub enum Role {
    #[default]
    Admin,
    Engineer,
    Operator,
    Analyst,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Engineer => "Engineer",
            Self::Operator => "Operator",
            Self::Analyst => "Analyst",
        }
    }

    /// The fixed capability matrix. Every mutation site in the admin panel
    /// consults this instead of branching on role names.
    pub fn allows(self, capability: Capability) -> bool {
        use Capability as C;
        match self {
            Self::Admin => true,
            Self::Engineer => matches!(
                capability,
                C::AddUsers | C::EditUsers | C::ViewAudit | C::ExportData
            ),
            Self::Operator => matches!(capability, C::ViewAudit),
            Self::Analyst => matches!(capability, C::ViewAudit | C::ExportData),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Admin-panel capabilities gated by [`Role::allows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Capability {
    DeleteUsers,
    AddUsers,
    EditUsers,
    ViewAudit,
    ModifySystemConfig,
    ManagePolicies,
    ExportData,
}

impl Capability {
    pub fn label(self) -> &'static str {
        match self {
            Self::DeleteUsers => "delete users",
            Self::AddUsers => "add users",
            Self::EditUsers => "edit users",
            Self::ViewAudit => "view audit",
            Self::ModifySystemConfig => "modify system config",
            Self::ManagePolicies => "manage policies",
            Self::ExportData => "export data",
        }
    }
}

/// Account state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

/// A console user account (decorative — no real authentication).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub last_login: DateTime<Utc>,
}

/// Outcome recorded for an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    Success,
    Failed,
}

impl AuditStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failed => "Failed",
        }
    }
}

/// One line in the admin audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub action: String,
    pub resource: String,
    pub status: AuditStatus,
    pub ip: String,
}

/// Editable security configuration. All integer-valued except the 2FA flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Minutes of inactivity before a session expires.
    pub session_timeout: u32,
    pub max_login_attempts: u32,
    /// Days until passwords expire.
    pub password_expiry: u32,
    pub enable_two_factor: bool,
    /// Days of log retention.
    pub log_retention: u32,
    /// Events per minute before an alert fires.
    pub alert_threshold: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            session_timeout: 30,
            max_login_attempts: 5,
            password_expiry: 90,
            enable_two_factor: false,
            log_retention: 365,
            alert_threshold: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn capability_matrix_matches_policy() {
        // Row-by-row: (role, [delete, add, edit, view audit, sysconfig, policies, export])
        let expected = [
            (Role::Admin, [true, true, true, true, true, true, true]),
            (Role::Engineer, [false, true, true, true, false, false, true]),
            (Role::Operator, [false, false, false, true, false, false, false]),
            (Role::Analyst, [false, false, false, true, false, false, true]),
        ];
        for (role, row) in expected {
            for (cap, want) in Capability::iter().zip(row) {
                assert_eq!(
                    role.allows(cap),
                    want,
                    "{} / {}",
                    role.label(),
                    cap.label()
                );
            }
        }
    }

    #[test]
    fn every_role_can_view_audit() {
        for role in Role::iter() {
            assert!(role.allows(Capability::ViewAudit));
        }
    }
}
