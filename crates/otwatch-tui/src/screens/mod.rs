//! Page registry.

use std::collections::HashMap;
use std::path::Path;

use crate::component::Page;
use crate::page::PageId;

pub mod ai_models;
pub mod dashboard;
pub mod devices;
pub mod monitoring;
pub mod pcap;
pub mod threats;
pub mod topology;
pub mod workflows;

/// Build every page. Exports land in `export_dir`.
pub fn create_pages(export_dir: &Path) -> HashMap<PageId, Box<dyn Page>> {
    let dir = export_dir.to_path_buf();
    let mut pages: HashMap<PageId, Box<dyn Page>> = HashMap::new();
    pages.insert(PageId::Dashboard, Box::new(dashboard::DashboardPage::new()));
    pages.insert(PageId::Devices, Box::new(devices::DevicesPage::new(dir.clone())));
    pages.insert(PageId::Threats, Box::new(threats::ThreatsPage::new(dir.clone())));
    pages.insert(
        PageId::Monitoring,
        Box::new(monitoring::MonitoringPage::new(dir.clone())),
    );
    pages.insert(PageId::AiModels, Box::new(ai_models::AiModelsPage::new(dir.clone())));
    pages.insert(PageId::Topology, Box::new(topology::TopologyPage::new(dir)));
    pages.insert(PageId::Pcap, Box::new(pcap::PcapPage::new()));
    pages.insert(PageId::Workflows, Box::new(workflows::WorkflowsPage::new()));
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_page_id_is_registered() {
        let pages = create_pages(&std::env::temp_dir());
        for id in PageId::ALL {
            let page = pages.get(&id).unwrap_or_else(|| panic!("missing page {id}"));
            assert_eq!(page.id(), id);
        }
    }
}
