//! Response-workflow templates and running instances.
//!
//! The only domain whose data traverses the REST client; field names match
//! the backend wire format exactly so fixture and live payloads are
//! interchangeable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One step in a response playbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub target: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// A reusable response playbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub threat_type: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub actions: Vec<WorkflowAction>,
}

/// Execution state of a workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl InstanceStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// A running or finished execution of a template against a target device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: String,
    pub template_id: String,
    pub template_name: String,
    pub status: InstanceStatus,
    pub current_step: u32,
    pub total_steps: u32,
    pub target_device: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub started_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<String>,
}
