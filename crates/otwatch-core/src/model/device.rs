//! Inventory device model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// Device class in the plant network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum DeviceType {
    #[serde(rename = "PLC")]
    Plc,
    #[serde(rename = "HMI")]
    Hmi,
    #[serde(rename = "RTU")]
    Rtu,
    Server,
    Network,
    Sensor,
    Other,
}

impl DeviceType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Plc => "PLC",
            Self::Hmi => "HMI",
            Self::Rtu => "RTU",
            Self::Server => "Server",
            Self::Network => "Network",
            Self::Sensor => "Sensor",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Reachability as of the last scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    #[default]
    Online,
    Offline,
}

impl DeviceStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

/// Operational criticality assigned by the asset owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
pub enum Criticality {
    Low,
    Medium,
    High,
    Critical,
}

impl Criticality {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Criticality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An inventoried OT/IT asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: u64,
    pub name: String,
    pub ip: String,
    pub mac: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub vendor: String,
    pub model: String,
    pub status: DeviceStatus,
    pub last_seen: DateTime<Utc>,
    pub protocols: Vec<String>,
    pub ports: Vec<u16>,
    pub criticality: Criticality,
    pub location: String,
    pub firmware: String,
}

impl Device {
    /// Fields the devices page searches across.
    pub fn matches_query(&self, query_lower: &str) -> bool {
        if query_lower.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(query_lower)
            || self.ip.contains(query_lower)
            || self.vendor.to_lowercase().contains(query_lower)
            || self.location.to_lowercase().contains(query_lower)
    }
}
