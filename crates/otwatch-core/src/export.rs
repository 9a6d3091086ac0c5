//! Export rendering: CSV for tabular data, JSON for models and topology,
//! plain text for the monitoring and threat reports.
//!
//! These functions only build the bytes; writing them to the export
//! directory is the caller's concern.

use chrono::Utc;

use crate::error::Error;
use crate::model::admin::User;
use crate::model::ai_model::AiModel;
use crate::model::device::Device;
use crate::model::monitoring::{Granularity, MonitoringSample};
use crate::model::threat::{SecurityEvent, Threat};
use crate::model::topology::TopologyGraph;
use crate::sanitize::sanitize_filename;

/// Classification assigned to a threat indicator in the CSV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorClass {
    Email,
    DomainOrIp,
    Cve,
    HashOrOther,
}

impl IndicatorClass {
    pub fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::DomainOrIp => "Domain/IP",
            Self::Cve => "CVE",
            Self::HashOrOther => "Hash/Other",
        }
    }
}

/// Heuristic indicator classing: `@` wins, then a dotted token without
/// spaces, then `CVE-` prefix, else hash-or-other.
pub fn classify_indicator(indicator: &str) -> IndicatorClass {
    if indicator.contains('@') {
        IndicatorClass::Email
    } else if indicator.contains('.') && !indicator.contains(char::is_whitespace) {
        IndicatorClass::DomainOrIp
    } else if indicator.starts_with("CVE-") {
        IndicatorClass::Cve
    } else {
        IndicatorClass::HashOrOther
    }
}

/// RFC 4180 style quoting: only when the field needs it.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

fn csv_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Device inventory as CSV, one row per device.
pub fn devices_csv(devices: &[Device]) -> String {
    let mut out = String::from(
        "Name,IP,MAC,Type,Vendor,Model,Status,Criticality,Location,Protocols,Ports,Firmware,Last Seen\n",
    );
    for d in devices {
        let ports = d
            .ports
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        out.push_str(&csv_row(&[
            d.name.clone(),
            d.ip.clone(),
            d.mac.clone(),
            d.device_type.label().to_owned(),
            d.vendor.clone(),
            d.model.clone(),
            d.status.label().to_owned(),
            d.criticality.label().to_owned(),
            d.location.clone(),
            d.protocols.join("; "),
            ports,
            d.firmware.clone(),
            d.last_seen.to_rfc3339(),
        ]));
        out.push('\n');
    }
    out
}

/// Admin user list as CSV.
pub fn users_csv(users: &[User]) -> String {
    let mut out = String::from("Name,Email,Role,Status,Last Login\n");
    for u in users {
        out.push_str(&csv_row(&[
            u.name.clone(),
            u.email.clone(),
            u.role.label().to_owned(),
            u.status.label().to_owned(),
            u.last_login.to_rfc3339(),
        ]));
        out.push('\n');
    }
    out
}

/// One model card as pretty JSON, for the model Export dialog.
pub fn model_json(model: &AiModel) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(model)?)
}

/// The whole topology graph as pretty JSON.
pub fn topology_json(graph: &TopologyGraph) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(graph)?)
}

/// Plain-text security monitoring report over the current series and feed.
pub fn monitoring_report(
    granularity: Granularity,
    series: &[MonitoringSample],
    events: &[SecurityEvent],
) -> String {
    let mut out = String::new();
    out.push_str("SECURITY MONITORING REPORT\n");
    out.push_str(&format!("Generated: {}\n", Utc::now().to_rfc3339()));
    out.push_str(&format!("Window: {}\n\n", granularity.label()));

    let events_total: u64 = series.iter().map(|s| u64::from(s.events)).sum();
    let threats_total: u64 = series.iter().map(|s| u64::from(s.threats)).sum();
    let blocked_total: u64 = series.iter().map(|s| u64::from(s.blocked)).sum();
    out.push_str("SUMMARY\n");
    out.push_str(&format!("  Events:  {events_total}\n"));
    out.push_str(&format!("  Threats: {threats_total}\n"));
    out.push_str(&format!("  Blocked: {blocked_total}\n\n"));

    out.push_str("SERIES\n");
    for s in series {
        out.push_str(&format!(
            "  {}  events={:<4} threats={:<3} blocked={:<3} traffic={:.1} Mbps\n",
            s.time.format("%Y-%m-%d %H:%M"),
            s.events,
            s.threats,
            s.blocked,
            s.network_traffic,
        ));
    }

    out.push_str("\nRECENT EVENTS\n");
    for e in events {
        out.push_str(&format!(
            "  [{}] {} {} -> {} ({}/{}): {}\n",
            e.severity.label(),
            e.event_type,
            e.source,
            e.target,
            e.protocol,
            e.port,
            e.description,
        ));
    }
    out
}

fn write_threat(out: &mut String, t: &Threat) {
    out.push_str(&format!("{} [{}]\n", t.title, t.severity.label()));
    out.push_str(&format!("  Type:        {}\n", t.threat_type));
    out.push_str(&format!("  Status:      {}\n", t.status.label()));
    out.push_str(&format!("  Risk score:  {:.1}\n", t.risk_score));
    out.push_str(&format!("  Confidence:  {}%\n", t.confidence));
    out.push_str(&format!("  Source:      {}\n", t.source));
    out.push_str(&format!("  MITRE:       {}\n", t.mitre_id));
    if let Some(cve) = &t.cve_id {
        out.push_str(&format!("  CVE:         {cve}\n"));
    }
    out.push_str(&format!("  First seen:  {}\n", t.first_seen.to_rfc3339()));
    out.push_str(&format!("  Updated:     {}\n", t.last_updated.to_rfc3339()));
    if !t.affected_systems.is_empty() {
        out.push_str(&format!("  Affected:    {}\n", t.affected_systems.join(", ")));
    }
    if !t.indicators.is_empty() {
        out.push_str(&format!("  Indicators:  {}\n", t.indicators.join(", ")));
    }
    out.push_str(&format!("  {}\n", t.description));
}

/// Whole-feed plain-text threat report.
pub fn threat_report(threats: &[Threat]) -> String {
    let mut out = String::new();
    out.push_str("THREAT INTELLIGENCE REPORT\n");
    out.push_str(&format!("Generated: {}\n", Utc::now().to_rfc3339()));
    out.push_str(&format!("Threats: {}\n\n", threats.len()));
    for t in threats {
        write_threat(&mut out, t);
        out.push('\n');
    }
    out
}

/// Plain-text report for a single threat.
pub fn single_threat_report(threat: &Threat) -> String {
    let mut out = String::new();
    out.push_str("THREAT REPORT\n");
    out.push_str(&format!("Generated: {}\n\n", Utc::now().to_rfc3339()));
    write_threat(&mut out, threat);
    out
}

/// CSV of every indicator across the feed, classed by [`classify_indicator`].
pub fn indicators_csv(threats: &[Threat]) -> String {
    let mut out = String::from("Indicator,Class,Threat,Severity\n");
    for t in threats {
        for indicator in &t.indicators {
            out.push_str(&csv_row(&[
                indicator.clone(),
                classify_indicator(indicator).label().to_owned(),
                t.title.clone(),
                t.severity.label().to_owned(),
            ]));
            out.push('\n');
        }
    }
    out
}

/// Export filename: sanitized stem, ISO date stamp, extension.
pub fn export_filename(stem: &str, extension: &str) -> String {
    let stem = sanitize_filename(stem);
    let stem = if stem.is_empty() { "export".to_owned() } else { stem };
    format!("{stem}_{}.{extension}", Utc::now().format("%Y-%m-%d"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fixtures;
    use crate::model::monitoring::Granularity;

    #[test]
    fn indicator_heuristic() {
        assert_eq!(classify_indicator("ops@plant.example.com"), IndicatorClass::Email);
        assert_eq!(classify_indicator("CVE-2023-27997"), IndicatorClass::Cve);
        assert_eq!(classify_indicator("beacon.badcdn.net"), IndicatorClass::DomainOrIp);
        assert_eq!(classify_indicator("10.20.1.45"), IndicatorClass::DomainOrIp);
        assert_eq!(
            classify_indicator("9f86d081884c7d659a2feaa0c55ad015"),
            IndicatorClass::HashOrOther
        );
        // A dot next to whitespace is prose, not a domain.
        assert_eq!(classify_indicator("some. thing"), IndicatorClass::HashOrOther);
    }

    #[test]
    fn dotted_cve_string_classes_as_domain() {
        // The dotted check comes before the CVE prefix check.
        assert_eq!(classify_indicator("CVE-2024.0101"), IndicatorClass::DomainOrIp);
        assert_eq!(classify_indicator("CVE-2024-0101"), IndicatorClass::Cve);
    }

    #[test]
    fn devices_csv_has_header_and_rows() {
        let devices = fixtures::seed_devices();
        let csv = devices_csv(&devices);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), devices.len() + 1);
        assert!(lines[0].starts_with("Name,IP,MAC"));
        assert!(lines[1].contains("PLC-Station-01"));
    }

    #[test]
    fn csv_quotes_embedded_commas_and_quotes() {
        let mut users = fixtures::seed_users();
        users[0].name = "Chen, Sarah \"SC\"".into();
        let csv = users_csv(&users);
        assert!(csv.contains("\"Chen, Sarah \"\"SC\"\"\""));
    }

    #[test]
    fn model_json_round_trips() {
        let model = &fixtures::seed_models()[0];
        let json = model_json(model).unwrap();
        let back: crate::model::ai_model::AiModel = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, model);
    }

    #[test]
    fn indicators_csv_rows_match_feed() {
        let threats = fixtures::seed_threats();
        let expected: usize = threats.iter().map(|t| t.indicators.len()).sum();
        let csv = indicators_csv(&threats);
        assert_eq!(csv.lines().count(), expected + 1);
        assert!(csv.contains("CVE-2023-27997,CVE"));
    }

    #[test]
    fn reports_mention_each_entry() {
        let threats = fixtures::seed_threats();
        let report = threat_report(&threats);
        for t in &threats {
            assert!(report.contains(&t.title), "missing {}", t.title);
        }

        let single = single_threat_report(&threats[0]);
        assert!(single.contains(&threats[0].mitre_id));

        let mut rng = rand::thread_rng();
        let series = fixtures::monitoring_series(&mut rng, Granularity::OneHour);
        let events = fixtures::seed_events();
        let report = monitoring_report(Granularity::OneHour, &series, &events);
        assert!(report.contains("Window: 1h"));
        assert!(report.contains("Unauthorized Write"));
    }

    #[test]
    fn export_filename_is_sanitized_and_stamped() {
        let name = export_filename("my devices (v2)", "csv");
        assert!(name.starts_with("my_devices__v2__"));
        assert!(name.ends_with(".csv"));
        assert_eq!(export_filename("", "json").split('_').next(), Some("export"));
    }
}
