//! `otwatch-core` — domain model and shared services for the otwatch console.
//!
//! Everything in this crate is UI-agnostic: entity types for every console
//! surface, input sanitization and validation, the session notification
//! store, simulated telemetry generation, fixture seeding, and report/export
//! builders. The TUI crate owns presentation; the API crate owns transport.

pub mod error;
pub mod export;
pub mod fixtures;
pub mod model;
pub mod notifications;
pub mod rate_limit;
pub mod sanitize;
pub mod telemetry;
pub mod upload;

pub use error::Error;
pub use model::admin::{AuditLogEntry, AuditStatus, Capability, Role, SystemConfig, User, UserStatus};
pub use model::ai_model::{AiModel, ModelMetrics, ModelStatus};
pub use model::device::{Criticality, Device, DeviceStatus, DeviceType};
pub use model::monitoring::{Granularity, MonitoringSample};
pub use model::pcap::{CaptureState, PcapFile, PcapStats, PcapStatus, TrainingState};
pub use model::status::SystemStatus;
pub use model::threat::{SecurityEvent, Severity, Threat, ThreatStatus};
pub use model::topology::{NodeStatus, NodeType, TopologyGraph, TopologyLink, TopologyNode};
pub use model::workflow::{InstanceStatus, WorkflowAction, WorkflowInstance, WorkflowTemplate};
pub use notifications::{Notification, NotificationKind, NotificationStore};
pub use rate_limit::RateLimiter;
