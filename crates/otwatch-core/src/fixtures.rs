//! Seed data for the page surfaces.
//!
//! Every page re-seeds its local collections on mount, so these builders
//! return fresh owned values each call. Timestamps are derived from the
//! current wall clock so relative ages stay plausible.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::model::admin::{AuditLogEntry, AuditStatus, Role, User, UserStatus};
use crate::model::ai_model::{AiModel, ModelMetrics, ModelStatus};
use crate::model::device::{Criticality, Device, DeviceStatus, DeviceType};
use crate::model::monitoring::{Granularity, MonitoringSample};
use crate::model::threat::{SecurityEvent, Severity, Threat, ThreatStatus};
use crate::model::topology::{NodeStatus, NodeType, TopologyGraph, TopologyLink, TopologyNode};

/// Ports a device scan may assign, filtered by fair coin.
pub const CANDIDATE_PORTS: &[u16] = &[102, 502, 44_818, 20_000, 80, 443, 22, 161];

/// Protocols a device scan may assign, filtered by fair coin.
pub const CANDIDATE_PROTOCOLS: &[&str] = &[
    "Modbus TCP",
    "DNP3",
    "EtherNet/IP",
    "S7comm",
    "OPC UA",
    "HTTP",
    "HTTPS",
    "SNMP",
];

fn ago(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    now - Duration::minutes(minutes)
}

#[allow(clippy::too_many_arguments)]
fn device(
    id: u64,
    name: &str,
    ip: &str,
    mac: &str,
    device_type: DeviceType,
    vendor: &str,
    model: &str,
    status: DeviceStatus,
    seen_mins_ago: i64,
    protocols: &[&str],
    ports: &[u16],
    criticality: Criticality,
    location: &str,
    firmware: &str,
) -> Device {
    Device {
        id,
        name: name.into(),
        ip: ip.into(),
        mac: mac.into(),
        device_type,
        vendor: vendor.into(),
        model: model.into(),
        status,
        last_seen: ago(Utc::now(), seen_mins_ago),
        protocols: protocols.iter().map(|&p| p.into()).collect(),
        ports: ports.to_vec(),
        criticality,
        location: location.into(),
        firmware: firmware.into(),
    }
}

/// Inventory seeded by the devices page on mount.
pub fn seed_devices() -> Vec<Device> {
    vec![
        device(
            1, "PLC-Station-01", "10.20.1.10", "00:1d:9c:c7:b0:01", DeviceType::Plc,
            "Siemens", "S7-1500", DeviceStatus::Online, 1,
            &["S7comm", "OPC UA"], &[102, 443], Criticality::Critical,
            "Line 1 / Cabinet A", "2.9.4",
        ),
        device(
            2, "PLC-Station-02", "10.20.1.11", "00:1d:9c:c7:b0:02", DeviceType::Plc,
            "Allen-Bradley", "ControlLogix 5580", DeviceStatus::Online, 2,
            &["EtherNet/IP"], &[44_818], Criticality::Critical,
            "Line 1 / Cabinet B", "33.011",
        ),
        device(
            3, "HMI-Panel-01", "10.20.1.20", "00:1d:9c:c7:b0:03", DeviceType::Hmi,
            "Siemens", "TP1200 Comfort", DeviceStatus::Online, 3,
            &["S7comm", "HTTPS"], &[102, 443], Criticality::High,
            "Line 1 / Operator desk", "17.0.2",
        ),
        device(
            4, "RTU-Field-12", "10.20.1.45", "00:1d:9c:c7:b0:04", DeviceType::Rtu,
            "Schneider Electric", "SCADAPack 474", DeviceStatus::Offline, 95,
            &["DNP3"], &[20_000], Criticality::High,
            "Pump house north", "8.15.1",
        ),
        device(
            5, "RTU-Field-13", "10.20.1.46", "00:1d:9c:c7:b0:05", DeviceType::Rtu,
            "Schneider Electric", "SCADAPack 474", DeviceStatus::Online, 4,
            &["DNP3", "Modbus TCP"], &[20_000, 502], Criticality::Medium,
            "Pump house south", "8.15.1",
        ),
        device(
            6, "SCADA-Server-01", "10.20.2.5", "00:1d:9c:c7:b0:06", DeviceType::Server,
            "Dell", "PowerEdge R650", DeviceStatus::Online, 1,
            &["OPC UA", "HTTPS", "SNMP"], &[4840, 443, 161], Criticality::Critical,
            "Server room", "1.8.2",
        ),
        device(
            7, "Historian-01", "10.20.2.6", "00:1d:9c:c7:b0:07", DeviceType::Server,
            "HPE", "ProLiant DL380", DeviceStatus::Online, 2,
            &["HTTPS", "SNMP"], &[443, 161], Criticality::High,
            "Server room", "2.1.0",
        ),
        device(
            8, "Core-Switch-01", "10.20.0.2", "00:1d:9c:c7:b0:08", DeviceType::Network,
            "Cisco", "IE-4000", DeviceStatus::Online, 1,
            &["SNMP", "SSH"], &[161, 22], Criticality::Critical,
            "Network closet", "15.2(7)E4",
        ),
        device(
            9, "Edge-Firewall-01", "10.20.0.1", "00:1d:9c:c7:b0:09", DeviceType::Network,
            "Fortinet", "FortiGate 100F", DeviceStatus::Online, 1,
            &["HTTPS", "SSH"], &[443, 22], Criticality::Critical,
            "Network closet", "7.2.5",
        ),
        device(
            10, "Temp-Sensor-22", "10.20.3.22", "00:1d:9c:c7:b0:0a", DeviceType::Sensor,
            "Endress+Hauser", "iTEMP TMT82", DeviceStatus::Online, 6,
            &["HART-IP"], &[5094], Criticality::Low,
            "Boiler room", "1.02.01",
        ),
        device(
            11, "Flow-Sensor-07", "10.20.3.7", "00:1d:9c:c7:b0:0b", DeviceType::Sensor,
            "Yokogawa", "AXG4A", DeviceStatus::Offline, 240,
            &["Modbus TCP"], &[502], Criticality::Medium,
            "Intake pipe", "4.1.0",
        ),
        device(
            12, "Eng-Workstation-03", "10.20.2.33", "00:1d:9c:c7:b0:0c", DeviceType::Other,
            "Lenovo", "ThinkStation P360", DeviceStatus::Online, 1,
            &["HTTPS", "SSH"], &[443, 22], Criticality::Medium,
            "Engineering office", "n/a",
        ),
    ]
}

/// A freshly "discovered" device appended after a network scan.
pub fn discovered_device<R: Rng + ?Sized>(rng: &mut R, id: u64) -> Device {
    let octet: u8 = rng.gen_range(2..255);
    Device {
        id,
        name: format!("Discovered-Device-{id}"),
        ip: format!("192.168.1.{octet}"),
        mac: format!(
            "02:42:{:02x}:{:02x}:{:02x}:{:02x}",
            rng.r#gen::<u8>(),
            rng.r#gen::<u8>(),
            rng.r#gen::<u8>(),
            rng.r#gen::<u8>()
        ),
        device_type: DeviceType::Other,
        vendor: "Unknown".into(),
        model: "Unknown".into(),
        status: DeviceStatus::Online,
        last_seen: Utc::now(),
        protocols: Vec::new(),
        ports: Vec::new(),
        criticality: Criticality::Low,
        location: "Unassigned".into(),
        firmware: "Unknown".into(),
    }
}

/// Result of scanning a single device in place.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub status: DeviceStatus,
    pub ports: Vec<u16>,
    pub protocols: Vec<String>,
    pub firmware: String,
}

/// Roll a scan outcome: online with p=0.8, candidate ports and protocols
/// each kept on a fair coin, and a fresh firmware triple.
pub fn scan_device<R: Rng + ?Sized>(rng: &mut R) -> ScanResult {
    let status = if rng.gen_bool(0.8) {
        DeviceStatus::Online
    } else {
        DeviceStatus::Offline
    };
    let ports = CANDIDATE_PORTS
        .iter()
        .copied()
        .filter(|_| rng.gen_bool(0.5))
        .collect();
    let protocols = CANDIDATE_PROTOCOLS
        .iter()
        .filter(|_| rng.gen_bool(0.5))
        .map(|&p| p.to_owned())
        .collect();
    let firmware = format!(
        "{}.{}.{}",
        rng.gen_range(1..6),
        rng.gen_range(0..10),
        rng.gen_range(0..20)
    );
    ScanResult {
        status,
        ports,
        protocols,
        firmware,
    }
}

#[allow(clippy::too_many_arguments)]
fn threat(
    id: u64,
    title: &str,
    threat_type: &str,
    severity: Severity,
    status: ThreatStatus,
    description: &str,
    source: &str,
    confidence: u8,
    first_seen_hours: i64,
    affected: &[&str],
    indicators: &[&str],
    tactics: &[&str],
    mitre_id: &str,
    cve_id: Option<&str>,
    risk_score: f64,
) -> Threat {
    let now = Utc::now();
    Threat {
        id,
        title: title.into(),
        threat_type: threat_type.into(),
        severity,
        status,
        description: description.into(),
        source: source.into(),
        confidence,
        first_seen: now - Duration::hours(first_seen_hours),
        last_updated: now - Duration::minutes(first_seen_hours),
        affected_systems: affected.iter().map(|&s| s.into()).collect(),
        indicators: indicators.iter().map(|&s| s.into()).collect(),
        mitre_tactics: tactics.iter().map(|&s| s.into()).collect(),
        mitre_id: mitre_id.into(),
        cve_id: cve_id.map(Into::into),
        risk_score,
    }
}

/// Threat-intelligence records seeded on mount.
pub fn seed_threats() -> Vec<Threat> {
    vec![
        threat(
            1, "Modbus write storm from engineering VLAN", "Protocol Abuse",
            Severity::Critical, ThreatStatus::Active,
            "Sustained unauthorized Modbus function code 16 writes targeting PLC holding registers.",
            "Network IDS", 92, 6,
            &["PLC-Station-01", "PLC-Station-02"],
            &["10.20.2.33", "modbus.fc16.burst"],
            &["Impair Process Control"], "T0836", None, 9.1,
        ),
        threat(
            2, "Phishing campaign targeting operators", "Phishing",
            Severity::High, ThreatStatus::Investigating,
            "Credential-harvesting emails spoofing the historian vendor's support portal.",
            "Mail gateway", 78, 30,
            &["Eng-Workstation-03"],
            &["support@hist0rian-vendor.com", "login.hist0rian-vendor.com"],
            &["Initial Access"], "T1566", None, 7.4,
        ),
        threat(
            3, "Outdated FortiOS on edge firewall", "Vulnerability",
            Severity::High, ThreatStatus::PatchAvailable,
            "Edge firewall firmware affected by a known heap overflow in the SSL-VPN portal.",
            "Vulnerability scanner", 97, 120,
            &["Edge-Firewall-01"],
            &["CVE-2023-27997"],
            &["Initial Access"], "T1190", Some("CVE-2023-27997"), 8.2,
        ),
        threat(
            4, "Anomalous DNP3 polling cadence", "Anomaly",
            Severity::Medium, ThreatStatus::Monitoring,
            "RTU polling interval deviates from the learned baseline outside shift changes.",
            "Anomaly model", 64, 52,
            &["RTU-Field-12"],
            &["dnp3.poll.cadence"],
            &["Collection"], "T0801", None, 5.0,
        ),
        threat(
            5, "Blocked C2 beacon from workstation", "Malware",
            Severity::High, ThreatStatus::Blocked,
            "Periodic HTTPS beacons to a known command-and-control domain were blocked at the firewall.",
            "Firewall", 88, 200,
            &["Eng-Workstation-03"],
            &["beacon.badcdn.net", "9f86d081884c7d659a2feaa0c55ad015"],
            &["Command and Control"], "T1071", None, 7.9,
        ),
        threat(
            6, "Default credentials on legacy HMI", "Misconfiguration",
            Severity::Medium, ThreatStatus::Resolved,
            "Factory default credentials found during the quarterly audit; since rotated.",
            "Internal audit", 100, 400,
            &["HMI-Panel-01"],
            &[],
            &["Persistence"], "T0812", None, 4.2,
        ),
    ]
}

/// The two extra threats appended by "Update Feed". Ids continue from the
/// caller's current maximum.
pub fn update_feed_threats(next_id: u64) -> [Threat; 2] {
    [
        threat(
            next_id, "Suspicious S7comm stop command", "Protocol Abuse",
            Severity::Critical, ThreatStatus::Active,
            "An S7comm PLC STOP request was observed from an address outside the engineering subnet.",
            "Network IDS", 85, 0,
            &["PLC-Station-01"],
            &["s7comm.stop", "10.20.9.14"],
            &["Inhibit Response Function"], "T0816", None, 9.4,
        ),
        threat(
            next_id + 1, "New OT malware signature published", "Intelligence",
            Severity::Medium, ThreatStatus::Monitoring,
            "Vendor feed published indicators for a PLC-targeting loader; no local matches yet.",
            "Threat feed", 70, 0,
            &[],
            &["CVE-2024-38434", "loader.ot-dropper.bin"],
            &["Execution"], "T0863", None, 5.6,
        ),
    ]
}

/// Event feed seeded by the monitoring page.
pub fn seed_events() -> Vec<SecurityEvent> {
    let now = Utc::now();
    let mk = |id: u64,
              mins: i64,
              event_type: &str,
              severity: Severity,
              source: &str,
              target: &str,
              description: &str,
              status: &str,
              protocol: &str,
              port: u16| SecurityEvent {
        id,
        timestamp: now - Duration::minutes(mins),
        event_type: event_type.into(),
        severity,
        source: source.into(),
        target: target.into(),
        description: description.into(),
        status: status.into(),
        protocol: protocol.into(),
        port,
    };
    vec![
        mk(1, 2, "Unauthorized Write", Severity::Critical, "10.20.2.33", "10.20.1.10",
            "Modbus write to holding register outside change window", "active", "Modbus TCP", 502),
        mk(2, 9, "Port Scan", Severity::Medium, "192.168.1.77", "10.20.0.2",
            "Sequential TCP connect scan across management ports", "investigating", "TCP", 22),
        mk(3, 14, "Login Failure", Severity::Low, "10.20.2.33", "10.20.2.5",
            "Three failed SSH logins for user 'scada'", "resolved", "SSH", 22),
        mk(4, 21, "Beacon Blocked", Severity::High, "10.20.2.33", "beacon.badcdn.net",
            "Outbound HTTPS beacon blocked by egress policy", "blocked", "HTTPS", 443),
        mk(5, 33, "Protocol Anomaly", Severity::Medium, "10.20.1.45", "10.20.2.5",
            "DNP3 unsolicited responses above baseline", "active", "DNP3", 20_000),
        mk(6, 41, "Config Change", Severity::Low, "10.20.2.33", "10.20.0.1",
            "Firewall rule modified by admin session", "resolved", "HTTPS", 443),
        mk(7, 48, "Malformed Packet", Severity::Medium, "10.20.3.7", "10.20.1.11",
            "EtherNet/IP packet failed CIP validation", "investigating", "EtherNet/IP", 44_818),
        mk(8, 55, "New Device", Severity::Low, "192.168.1.112", "-",
            "Unknown MAC joined the process VLAN", "active", "ARP", 0),
    ]
}

/// Detection model cards seeded by the AI models page.
pub fn seed_models() -> Vec<AiModel> {
    let now = Utc::now();
    let mk = |id: u64,
              name: &str,
              model_type: &str,
              algorithm: &str,
              status: ModelStatus,
              metrics: ModelMetrics,
              trained_days: i64,
              predictions: u64,
              false_positives: u64,
              version: &str,
              training_data: &str,
              inference_time: f64,
              model_size: &str| AiModel {
        id,
        name: name.into(),
        model_type: model_type.into(),
        algorithm: algorithm.into(),
        status,
        metrics,
        last_trained: now - Duration::days(trained_days),
        predictions,
        false_positives,
        version: version.into(),
        training_data: training_data.into(),
        inference_time,
        model_size: model_size.into(),
    };
    vec![
        mk(1, "Traffic Anomaly Detector", "Anomaly Detection", "Isolation Forest",
            ModelStatus::Active,
            ModelMetrics { accuracy: 94.7, precision: 92.1, recall: 89.8, f1_score: 90.9 },
            3, 1_248_332, 412, "3.2.1", "90 days of plant NetFlow", 4.2, "48 MB"),
        mk(2, "Modbus Sequence Model", "Protocol Analysis", "LSTM",
            ModelStatus::Active,
            ModelMetrics { accuracy: 96.3, precision: 95.0, recall: 93.4, f1_score: 94.2 },
            7, 884_102, 198, "2.0.0", "Labeled Modbus captures", 11.8, "112 MB"),
        mk(3, "Malware Classifier", "Classification", "Gradient Boosting",
            ModelStatus::Active,
            ModelMetrics { accuracy: 98.1, precision: 97.6, recall: 96.2, f1_score: 96.9 },
            14, 52_019, 61, "5.4.0", "Vendor sample corpus", 2.1, "23 MB"),
        mk(4, "DNP3 Baseline Model", "Anomaly Detection", "Autoencoder",
            ModelStatus::Training,
            ModelMetrics { accuracy: 91.2, precision: 88.7, recall: 90.3, f1_score: 89.5 },
            1, 310_556, 845, "1.3.0-rc1", "30 days of RTU polling", 6.5, "67 MB"),
        mk(5, "Insider Behavior Model", "Behavioral Analysis", "Random Forest",
            ModelStatus::Inactive,
            ModelMetrics { accuracy: 87.4, precision: 84.2, recall: 81.0, f1_score: 82.6 },
            60, 120_884, 1_920, "0.9.2", "Workstation audit logs", 3.3, "31 MB"),
        mk(6, "Firmware Integrity Model", "Integrity", "One-Class SVM",
            ModelStatus::Error,
            ModelMetrics { accuracy: 89.9, precision: 90.5, recall: 85.1, f1_score: 87.7 },
            21, 8_410, 92, "1.1.0", "Firmware image hashes", 1.4, "9 MB"),
    ]
}

/// The topology graph seeded on mount.
pub fn seed_topology() -> TopologyGraph {
    let node = |id: &str,
                node_type: NodeType,
                name: &str,
                x: f64,
                y: f64,
                status: NodeStatus,
                connections: &[&str],
                ip: Option<&str>,
                criticality: Option<Criticality>| TopologyNode {
        id: id.into(),
        node_type,
        name: name.into(),
        x,
        y,
        status,
        connections: connections.iter().map(|&c| c.into()).collect(),
        ip: ip.map(Into::into),
        criticality,
    };
    let link = |from: &str, to: &str| TopologyLink {
        from: from.into(),
        to: to.into(),
    };
    TopologyGraph {
        nodes: vec![
            node("internet", NodeType::Internet, "Internet", 400.0, 20.0,
                NodeStatus::Online, &["fw1"], None, None),
            node("fw1", NodeType::Firewall, "Edge-Firewall-01", 400.0, 100.0,
                NodeStatus::Online, &["internet", "sw1"], Some("10.20.0.1"), Some(Criticality::Critical)),
            node("sw1", NodeType::Switch, "Core-Switch-01", 400.0, 180.0,
                NodeStatus::Online, &["fw1", "srv1", "srv2", "sw2"], Some("10.20.0.2"), Some(Criticality::Critical)),
            node("srv1", NodeType::Server, "SCADA-Server-01", 250.0, 260.0,
                NodeStatus::Online, &["sw1"], Some("10.20.2.5"), Some(Criticality::Critical)),
            node("srv2", NodeType::Server, "Historian-01", 550.0, 260.0,
                NodeStatus::Online, &["sw1"], Some("10.20.2.6"), Some(Criticality::High)),
            node("sw2", NodeType::Switch, "Process-Switch-01", 400.0, 340.0,
                NodeStatus::Online, &["sw1", "plc1", "plc2", "hmi1", "rtu1"], Some("10.20.0.3"), Some(Criticality::High)),
            node("plc1", NodeType::Plc, "PLC-Station-01", 200.0, 430.0,
                NodeStatus::Online, &["sw2", "sens1"], Some("10.20.1.10"), Some(Criticality::Critical)),
            node("plc2", NodeType::Plc, "PLC-Station-02", 350.0, 430.0,
                NodeStatus::Online, &["sw2"], Some("10.20.1.11"), Some(Criticality::Critical)),
            node("hmi1", NodeType::Hmi, "HMI-Panel-01", 500.0, 430.0,
                NodeStatus::Online, &["sw2"], Some("10.20.1.20"), Some(Criticality::High)),
            node("rtu1", NodeType::Rtu, "RTU-Field-12", 650.0, 430.0,
                NodeStatus::Offline, &["sw2"], Some("10.20.1.45"), Some(Criticality::High)),
            node("sens1", NodeType::Sensor, "Temp-Sensor-22", 200.0, 510.0,
                NodeStatus::Online, &["plc1"], Some("10.20.3.22"), Some(Criticality::Low)),
            node("sens2", NodeType::Sensor, "Flow-Sensor-07", 650.0, 510.0,
                NodeStatus::Warning, &["rtu1"], Some("10.20.3.7"), Some(Criticality::Medium)),
        ],
        links: vec![
            link("internet", "fw1"),
            link("fw1", "sw1"),
            link("sw1", "srv1"),
            link("sw1", "srv2"),
            link("sw1", "sw2"),
            link("sw2", "plc1"),
            link("sw2", "plc2"),
            link("sw2", "hmi1"),
            link("sw2", "rtu1"),
            link("plc1", "sens1"),
            link("rtu1", "sens2"),
        ],
    }
}

/// The four user accounts the admin panel shows after unlocking.
pub fn seed_users() -> Vec<User> {
    let now = Utc::now();
    let mk = |id: u64, name: &str, email: &str, role: Role, status: UserStatus, mins: i64| User {
        id,
        name: name.into(),
        email: email.into(),
        role,
        status,
        last_login: now - Duration::minutes(mins),
    };
    vec![
        mk(1, "Sarah Chen", "sarah.chen@plant.example.com", Role::Admin, UserStatus::Active, 12),
        mk(2, "Marcus Webb", "marcus.webb@plant.example.com", Role::Engineer, UserStatus::Active, 95),
        mk(3, "Priya Nair", "priya.nair@plant.example.com", Role::Operator, UserStatus::Active, 33),
        mk(4, "Tom Okafor", "tom.okafor@plant.example.com", Role::Analyst, UserStatus::Inactive, 4_320),
    ]
}

/// Audit-log lines seeded before any session activity.
pub fn seed_audit_log() -> Vec<AuditLogEntry> {
    let now = Utc::now();
    let mk = |id: u64, mins: i64, user: &str, action: &str, resource: &str, status: AuditStatus, ip: &str| {
        AuditLogEntry {
            id,
            timestamp: now - Duration::minutes(mins),
            user: user.into(),
            action: action.into(),
            resource: resource.into(),
            status,
            ip: ip.into(),
        }
    };
    vec![
        mk(1, 14, "sarah.chen", "Login", "Admin panel", AuditStatus::Success, "10.20.2.30"),
        mk(2, 60, "marcus.webb", "Edit user", "priya.nair", AuditStatus::Success, "10.20.2.33"),
        mk(3, 130, "unknown", "Login", "Admin panel", AuditStatus::Failed, "192.168.1.77"),
        mk(4, 300, "sarah.chen", "Modify config", "session_timeout", AuditStatus::Success, "10.20.2.30"),
        mk(5, 480, "tom.okafor", "Export data", "users.csv", AuditStatus::Success, "10.20.2.41"),
        mk(6, 900, "marcus.webb", "Add user", "tom.okafor", AuditStatus::Success, "10.20.2.33"),
    ]
}

/// Fresh monitoring series for the selected window: one sample per bucket,
/// oldest first, with randomized counters.
pub fn monitoring_series<R: Rng + ?Sized>(rng: &mut R, granularity: Granularity) -> Vec<MonitoringSample> {
    let now = Utc::now();
    let buckets = granularity.bucket_count();
    let step = Duration::seconds(granularity.bucket_secs());
    (0..buckets)
        .map(|i| {
            let back = (buckets - 1 - i) as i32;
            MonitoringSample {
                time: now - step * back,
                events: rng.gen_range(20..200),
                threats: rng.gen_range(0..12),
                blocked: rng.gen_range(0..30),
                network_traffic: rng.gen_range(50.0..950.0),
            }
        })
        .collect()
}

/// Re-stamp events with random offsets within the last hour, as the 30-second
/// monitoring refresh does.
pub fn rejitter_events<R: Rng + ?Sized>(rng: &mut R, events: &mut [SecurityEvent]) {
    let now = Utc::now();
    for event in events {
        event.timestamp = now - Duration::seconds(rng.gen_range(0..3_600));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn seeds_have_expected_shape() {
        assert_eq!(seed_devices().len(), 12);
        assert_eq!(seed_users().len(), 4);
        assert!(seed_threats().len() >= 5);
        assert!(seed_events().len() >= 6);
        assert!(seed_models().len() >= 5);
    }

    #[test]
    fn seed_ids_are_unique() {
        let devices = seed_devices();
        let mut ids: Vec<u64> = devices.iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), devices.len());
    }

    #[test]
    fn topology_links_all_resolve() {
        let graph = seed_topology();
        assert_eq!(graph.drawable_links().count(), graph.links.len());
    }

    #[test]
    fn users_cover_every_role() {
        let users = seed_users();
        for role in [Role::Admin, Role::Engineer, Role::Operator, Role::Analyst] {
            assert!(users.iter().any(|u| u.role == role), "missing {role}");
        }
    }

    #[test]
    fn discovered_device_lands_in_scan_subnet() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let d = discovered_device(&mut rng, 99);
            assert!(d.ip.starts_with("192.168.1."));
            assert_eq!(d.status, DeviceStatus::Online);
            assert!(d.ports.is_empty());
            assert!(d.protocols.is_empty());
        }
    }

    #[test]
    fn scan_draws_from_candidate_sets() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let scan = scan_device(&mut rng);
            assert!(scan.ports.iter().all(|p| CANDIDATE_PORTS.contains(p)));
            assert!(scan
                .protocols
                .iter()
                .all(|p| CANDIDATE_PROTOCOLS.contains(&p.as_str())));
            let parts: Vec<&str> = scan.firmware.split('.').collect();
            assert_eq!(parts.len(), 3);
            assert!(parts.iter().all(|p| p.parse::<u32>().is_ok()));
        }
    }

    #[test]
    fn update_feed_ids_continue_from_caller() {
        let [a, b] = update_feed_threats(7);
        assert_eq!(a.id, 7);
        assert_eq!(b.id, 8);
    }

    #[test]
    fn monitoring_series_matches_granularity() {
        let mut rng = StdRng::seed_from_u64(3);
        for g in [Granularity::OneHour, Granularity::TwentyFourHours, Granularity::SevenDays] {
            let series = monitoring_series(&mut rng, g);
            assert_eq!(series.len(), g.bucket_count());
            assert!(series.windows(2).all(|w| w[0].time < w[1].time));
            let span = series.last().unwrap().time - series[0].time;
            assert_eq!(
                span.num_seconds(),
                g.bucket_secs() * (g.bucket_count() as i64 - 1)
            );
        }
    }

    #[test]
    fn rejitter_keeps_events_within_the_hour() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut events = seed_events();
        rejitter_events(&mut rng, &mut events);
        let now = Utc::now();
        for e in &events {
            let age = now - e.timestamp;
            assert!(age.num_seconds() >= 0 && age.num_seconds() <= 3_600);
        }
    }
}
