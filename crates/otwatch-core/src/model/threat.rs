//! Threat intelligence and security event models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// Severity shared by threats and security events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Triage state of a tracked threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum ThreatStatus {
    Active,
    Investigating,
    Monitoring,
    Resolved,
    #[serde(rename = "Patch Available")]
    PatchAvailable,
    Blocked,
    Acknowledged,
    Quarantined,
}

impl ThreatStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Investigating => "Investigating",
            Self::Monitoring => "Monitoring",
            Self::Resolved => "Resolved",
            Self::PatchAvailable => "Patch Available",
            Self::Blocked => "Blocked",
            Self::Acknowledged => "Acknowledged",
            Self::Quarantined => "Quarantined",
        }
    }
}

impl std::fmt::Display for ThreatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A tracked threat-intelligence record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    pub id: u64,
    pub title: String,
    #[serde(rename = "type")]
    pub threat_type: String,
    pub severity: Severity,
    pub status: ThreatStatus,
    pub description: String,
    pub source: String,
    /// Analyst confidence, 0-100.
    pub confidence: u8,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub affected_systems: Vec<String>,
    pub indicators: Vec<String>,
    pub mitre_tactics: Vec<String>,
    pub mitre_id: String,
    pub cve_id: Option<String>,
    /// Composite risk, 0.0-10.0.
    pub risk_score: f64,
}

impl Threat {
    pub fn matches_query(&self, query_lower: &str) -> bool {
        if query_lower.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(query_lower)
            || self.threat_type.to_lowercase().contains(query_lower)
            || self.description.to_lowercase().contains(query_lower)
            || self.mitre_id.to_lowercase().contains(query_lower)
            || self
                .cve_id
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(query_lower))
    }
}

/// A single entry in the monitoring event feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub severity: Severity,
    pub source: String,
    pub target: String,
    pub description: String,
    pub status: String,
    pub protocol: String,
    pub port: u16,
}

impl SecurityEvent {
    pub fn matches_query(&self, query_lower: &str) -> bool {
        if query_lower.is_empty() {
            return true;
        }
        self.event_type.to_lowercase().contains(query_lower)
            || self.source.contains(query_lower)
            || self.target.contains(query_lower)
            || self.description.to_lowercase().contains(query_lower)
            || self.protocol.to_lowercase().contains(query_lower)
    }
}
