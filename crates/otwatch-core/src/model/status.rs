//! Live "system status" counters shown in the shell header.

use serde::{Deserialize, Serialize};

/// Device counters for the header status chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCounters {
    pub total: u32,
    pub online: u32,
    pub critical: u32,
}

/// Threat counters for the header status chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatCounters {
    pub active: u32,
    pub resolved: u32,
    pub investigating: u32,
}

/// AI model counters for the header status chips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCounters {
    pub active: u32,
    pub training: u32,
    /// Ensemble accuracy, pre-formatted to three decimals. Consumers render
    /// this verbatim rather than re-parsing it.
    pub accuracy: String,
}

/// Snapshot of all header counters. Replaced wholesale on every telemetry
/// tick — partial states are never observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub devices: DeviceCounters,
    pub threats: ThreatCounters,
    pub models: ModelCounters,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self {
            devices: DeviceCounters {
                total: 124,
                online: 98,
                critical: 3,
            },
            threats: ThreatCounters {
                active: 7,
                resolved: 38,
                investigating: 5,
            },
            models: ModelCounters {
                active: 10,
                training: 2,
                accuracy: "0.947".into(),
            },
        }
    }
}
