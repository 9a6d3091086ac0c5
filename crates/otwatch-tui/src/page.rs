//! Page identifiers and ordering for the console surfaces.

use serde::{Deserialize, Serialize};

/// One of the eight console pages, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PageId {
    #[default]
    Dashboard,
    Devices,
    Threats,
    Monitoring,
    AiModels,
    Topology,
    Pcap,
    Workflows,
}

impl PageId {
    pub const ALL: [Self; 8] = [
        Self::Dashboard,
        Self::Devices,
        Self::Threats,
        Self::Monitoring,
        Self::AiModels,
        Self::Topology,
        Self::Pcap,
        Self::Workflows,
    ];

    /// 1-based position for the number-key shortcuts.
    pub fn number(self) -> usize {
        match self {
            Self::Dashboard => 1,
            Self::Devices => 2,
            Self::Threats => 3,
            Self::Monitoring => 4,
            Self::AiModels => 5,
            Self::Topology => 6,
            Self::Pcap => 7,
            Self::Workflows => 8,
        }
    }

    /// Resolve a number key. Unknown keys land on the Dashboard.
    pub fn from_number(n: usize) -> Self {
        Self::ALL.get(n.wrapping_sub(1)).copied().unwrap_or_default()
    }

    pub fn next(self) -> Self {
        Self::from_number(self.number() % Self::ALL.len() + 1)
    }

    pub fn prev(self) -> Self {
        let n = self.number();
        Self::from_number(if n == 1 { Self::ALL.len() } else { n - 1 })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Devices => "Devices",
            Self::Threats => "Threats",
            Self::Monitoring => "Monitoring",
            Self::AiModels => "AI Models",
            Self::Topology => "Topology",
            Self::Pcap => "PCAP",
            Self::Workflows => "Workflows",
        }
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keys_round_trip() {
        for page in PageId::ALL {
            assert_eq!(PageId::from_number(page.number()), page);
        }
    }

    #[test]
    fn unknown_numbers_land_on_dashboard() {
        assert_eq!(PageId::from_number(0), PageId::Dashboard);
        assert_eq!(PageId::from_number(9), PageId::Dashboard);
        assert_eq!(PageId::from_number(usize::MAX), PageId::Dashboard);
    }

    #[test]
    fn next_prev_cycle_all_pages() {
        let mut page = PageId::Dashboard;
        for _ in 0..PageId::ALL.len() {
            page = page.next();
        }
        assert_eq!(page, PageId::Dashboard);
        assert_eq!(PageId::Dashboard.prev(), PageId::Workflows);
        assert_eq!(PageId::Workflows.next(), PageId::Dashboard);
    }
}
