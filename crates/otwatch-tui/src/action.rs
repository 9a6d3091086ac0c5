//! Actions are the only way state changes in the console.
//!
//! Key handlers and background tasks emit actions into the shell's channel;
//! the shell routes them to itself or to the active page.

use otwatch_core::fixtures::ScanResult;
use otwatch_core::model::pcap::{CaptureState, TrainingState};
use otwatch_core::{Device, NotificationKind, PcapFile, PcapStats, SystemStatus, WorkflowInstance, WorkflowTemplate};

use otwatch_api::WorkflowSource;

use crate::page::PageId;

/// Pending destructive action shown in the confirmation dialog.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    RemoveDevice { id: u64, name: String },
    DeletePcap { id: i64, filename: String },
    DeleteWorkflowTemplate { id: String, name: String },
    CancelWorkflowInstance { id: String, template_name: String },
    DeleteUser { id: u64, name: String },
    ClearNotifications,
}

impl std::fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoveDevice { name, .. } => write!(f, "Remove device '{name}' from the inventory?"),
            Self::DeletePcap { filename, .. } => write!(f, "Delete capture '{filename}'?"),
            Self::DeleteWorkflowTemplate { name, .. } => write!(f, "Delete workflow template '{name}'?"),
            Self::CancelWorkflowInstance { template_name, .. } => {
                write!(f, "Cancel running workflow '{template_name}'?")
            }
            Self::DeleteUser { name, .. } => write!(f, "Delete user '{name}'?"),
            Self::ClearNotifications => write!(f, "Clear all notifications?"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Shell ────────────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),
    SwitchPage(PageId),
    GoBack,
    ToggleHelp,
    ToggleSidebar,
    OpenSearch,
    CloseSearch,
    /// Sanitized query, pushed to the active page on every keystroke.
    SearchInput(String),
    ToggleNotifications,
    ToggleAssistant,
    ToggleAdmin,
    Confirm(ConfirmAction),
    /// A spawned background task finished; drives the busy spinner.
    TaskDone,

    /// Toast + drawer entry from a page action.
    Notify {
        kind: NotificationKind,
        title: String,
        message: String,
    },

    // ── Telemetry ticker ─────────────────────────────────────────────
    StatusUpdated(Box<SystemStatus>),
    TickerNotice {
        kind: NotificationKind,
        title: &'static str,
        message: &'static str,
    },

    // ── Devices ──────────────────────────────────────────────────────
    ScanNetworkRequest { next_id: u64 },
    ScanNetworkDone(Box<Device>),
    ScanDeviceRequest { device_id: u64 },
    ScanDeviceDone { device_id: u64, result: ScanResult },
    DeviceRemove(u64),

    // ── AI models ────────────────────────────────────────────────────
    TrainModelRequest { model_id: u64 },
    TrainModelDone { model_id: u64 },

    // ── Monitoring ───────────────────────────────────────────────────
    MonitoringRefresh,

    // ── PCAP (requests routed to the backend task pool) ──────────────
    PcapReload,
    PcapLoaded { files: Vec<PcapFile>, stats: PcapStats },
    /// Backend failure surfaced as an inline page banner.
    PcapBanner(String),
    PcapDelete(i64),
    PcapDeleted(i64),
    PcapUploadRequest { path: std::path::PathBuf, auto_train: bool },
    PcapUploaded(Box<PcapFile>),
    PcapToggleFlag { id: i64, flagged: bool },
    PcapFlagUpdated(Box<PcapFile>),
    PcapDownload(i64),
    CaptureStart,
    CaptureStop,
    CaptureChanged(CaptureState),
    TrainingStart(Vec<i64>),
    TrainingPoll,
    TrainingPollStop,
    TrainingStatusUpdated {
        state: TrainingState,
        progress: Option<f64>,
        message: Option<String>,
    },

    // ── Workflows ────────────────────────────────────────────────────
    WorkflowsReload,
    WorkflowTemplatesLoaded {
        templates: Vec<WorkflowTemplate>,
        source: WorkflowSource,
    },
    WorkflowInstancesLoaded {
        instances: Vec<WorkflowInstance>,
        source: WorkflowSource,
    },
    WorkflowCreate(serde_json::Value),
    WorkflowCreated(Box<WorkflowTemplate>),
    WorkflowDelete(String),
    WorkflowDeleted(String),
    WorkflowExecute {
        template_id: String,
        target_device: String,
    },
    WorkflowStarted(Box<WorkflowInstance>),
    WorkflowCancel(String),
    WorkflowCancelled(Box<WorkflowInstance>),
    WorkflowBanner(String),

    // ── Admin panel ──────────────────────────────────────────────────
    AdminDeleteUser(u64),
}

impl Action {
    pub fn notify_success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notify {
            kind: NotificationKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn notify_info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notify {
            kind: NotificationKind::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn notify_warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notify {
            kind: NotificationKind::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn notify_error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notify {
            kind: NotificationKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}
