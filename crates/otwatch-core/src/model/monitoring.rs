//! Monitoring time-series types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time window selectable on the monitoring page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Granularity {
    #[default]
    OneHour,
    TwentyFourHours,
    SevenDays,
}

impl Granularity {
    /// Number of buckets rendered for this window.
    pub fn bucket_count(self) -> usize {
        match self {
            Self::OneHour => 12,
            Self::TwentyFourHours => 24,
            Self::SevenDays => 7,
        }
    }

    /// Seconds covered by one bucket.
    pub fn bucket_secs(self) -> i64 {
        match self {
            Self::OneHour => 300,
            Self::TwentyFourHours => 3_600,
            Self::SevenDays => 86_400,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::TwentyFourHours => "24h",
            Self::SevenDays => "7d",
        }
    }
}

/// One bucket of the real-time monitoring series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSample {
    pub time: DateTime<Utc>,
    pub events: u32,
    pub threats: u32,
    pub blocked: u32,
    /// Aggregate traffic in Mbps.
    pub network_traffic: f64,
}
