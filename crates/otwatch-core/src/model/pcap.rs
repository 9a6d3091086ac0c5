//! PCAP file metadata and the capture/training state machines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side processing state of an uploaded capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PcapStatus {
    Uploaded,
    Processing,
    Processed,
    Failed,
}

impl PcapStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Failed => "failed",
        }
    }
}

/// Metadata-only view of a capture file. The binary payload stays on the
/// backend; `download` streams it on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcapFile {
    pub id: i64,
    pub original_filename: String,
    pub file_size: u64,
    pub upload_date: DateTime<Utc>,
    #[serde(default)]
    pub packet_count: Option<u64>,
    #[serde(default)]
    pub protocols: Option<Vec<String>>,
    pub status: PcapStatus,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub analysis_results: Option<serde_json::Value>,
    /// Flagged files are prioritized for training.
    #[serde(default)]
    pub flagged: bool,
}

/// Aggregate counters from `/api/v1/pcap/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PcapStats {
    pub total_files: u64,
    pub total_size: u64,
    pub processed_files: u64,
    pub failed_files: u64,
}

/// Live-capture control state as tracked by the PCAP page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl CaptureState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }
}

/// Training job state, polled until terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrainingState {
    #[default]
    Idle,
    Starting,
    Running,
    Completed,
    Failed,
}

impl TrainingState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Terminal states stop the 2-second poll loop.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}
