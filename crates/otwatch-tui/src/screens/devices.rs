//! Devices page — asset inventory with scans, add form, and CSV export.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use otwatch_core::fixtures::{self, ScanResult};
use otwatch_core::model::device::{Criticality, Device, DeviceStatus, DeviceType};
use otwatch_core::sanitize::{sanitize_input, validate_ipv4};
use otwatch_core::{RateLimiter, export};

use crate::action::{Action, ConfirmAction};
use crate::component::Page;
use crate::page::PageId;
use crate::theme;
use crate::widgets::sub_tabs;

/// Scans admitted per minute before the limiter pushes back.
const SCAN_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DeviceFilter {
    #[default]
    All,
    Online,
    Offline,
    Critical,
}

impl DeviceFilter {
    const ALL: [Self; 4] = [Self::All, Self::Online, Self::Offline, Self::Critical];

    fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Online => "Online",
            Self::Offline => "Offline",
            Self::Critical => "Critical",
        }
    }

    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn matches(self, device: &Device) -> bool {
        match self {
            Self::All => true,
            Self::Online => device.status == DeviceStatus::Online,
            Self::Offline => device.status == DeviceStatus::Offline,
            Self::Critical => device.criticality == Criticality::Critical,
        }
    }
}

/// Which field of the add form holds the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AddField {
    #[default]
    Name,
    Ip,
    Location,
    Type,
    Criticality,
}

#[derive(Default)]
struct AddForm {
    name: Input,
    ip: Input,
    location: Input,
    type_idx: usize,
    crit_idx: usize,
    field: AddField,
    error: Option<String>,
}

const TYPE_CHOICES: [DeviceType; 7] = [
    DeviceType::Plc,
    DeviceType::Hmi,
    DeviceType::Rtu,
    DeviceType::Server,
    DeviceType::Network,
    DeviceType::Sensor,
    DeviceType::Other,
];

const CRIT_CHOICES: [Criticality; 4] = [
    Criticality::Low,
    Criticality::Medium,
    Criticality::High,
    Criticality::Critical,
];

pub struct DevicesPage {
    action_tx: Option<UnboundedSender<Action>>,
    devices: Vec<Device>,
    cached_filtered: Vec<usize>,
    table_state: TableState,
    filter: DeviceFilter,
    search_query: String,
    detail_open: bool,
    add_form: Option<AddForm>,
    scanning_network: bool,
    scanning_device: Option<u64>,
    scan_limiter: RateLimiter,
    inline_msg: Option<String>,
    export_dir: PathBuf,
}

impl DevicesPage {
    pub fn new(export_dir: PathBuf) -> Self {
        let mut page = Self {
            action_tx: None,
            devices: fixtures::seed_devices(),
            cached_filtered: Vec::new(),
            table_state: TableState::default(),
            filter: DeviceFilter::All,
            search_query: String::new(),
            detail_open: false,
            add_form: None,
            scanning_network: false,
            scanning_device: None,
            scan_limiter: RateLimiter::new(SCAN_LIMIT, Duration::from_secs(60)),
            inline_msg: None,
            export_dir,
        };
        page.recompute_filtered();
        page.table_state.select(Some(0));
        page
    }

    fn recompute_filtered(&mut self) {
        let q = self.search_query.to_lowercase();
        self.cached_filtered = self
            .devices
            .iter()
            .enumerate()
            .filter(|(_, d)| self.filter.matches(d) && d.matches_query(&q))
            .map(|(i, _)| i)
            .collect();
        let len = self.cached_filtered.len();
        match self.table_state.selected() {
            Some(sel) if sel >= len && len > 0 => self.table_state.select(Some(len - 1)),
            None if len > 0 => self.table_state.select(Some(0)),
            _ => {}
        }
        if len == 0 {
            self.table_state.select(None);
            self.detail_open = false;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.cached_filtered.len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        let next = (current as isize + delta).rem_euclid(len as isize) as usize;
        self.table_state.select(Some(next));
    }

    fn selected_device(&self) -> Option<&Device> {
        let sel = self.table_state.selected()?;
        let idx = *self.cached_filtered.get(sel)?;
        self.devices.get(idx)
    }

    fn next_device_id(&self) -> u64 {
        self.devices.iter().map(|d| d.id).max().unwrap_or(0) + 1
    }

    fn apply_scan_result(&mut self, device_id: u64, result: &ScanResult) {
        if let Some(device) = self.devices.iter_mut().find(|d| d.id == device_id) {
            device.status = result.status;
            device.ports = result.ports.clone();
            device.protocols = result.protocols.clone();
            device.firmware = result.firmware.clone();
            device.last_seen = Utc::now();
        }
    }

    fn request_network_scan(&mut self) -> Option<Action> {
        if self.scanning_network {
            return None;
        }
        if !self.scan_limiter.is_allowed("network-scan") {
            self.inline_msg = Some("Scan rate limit reached. Try again in a minute.".into());
            return None;
        }
        self.inline_msg = None;
        self.scanning_network = true;
        Some(Action::ScanNetworkRequest {
            next_id: self.next_device_id(),
        })
    }

    fn request_device_scan(&mut self) -> Option<Action> {
        let device_id = self.selected_device()?.id;
        if self.scanning_device.is_some() {
            return None;
        }
        if !self.scan_limiter.is_allowed("device-scan") {
            self.inline_msg = Some("Scan rate limit reached. Try again in a minute.".into());
            return None;
        }
        self.inline_msg = None;
        self.scanning_device = Some(device_id);
        Some(Action::ScanDeviceRequest { device_id })
    }

    fn export_csv(&self) -> Action {
        let csv = export::devices_csv(&self.devices);
        let filename = export::export_filename("devices", "csv");
        let path = self.export_dir.join(&filename);
        match std::fs::write(&path, csv) {
            Ok(()) => Action::notify_success("Export complete", format!("Wrote {}", path.display())),
            Err(err) => Action::notify_error("Export failed", err.to_string()),
        }
    }

    fn submit_add_form(&mut self) {
        let Some(form) = self.add_form.as_mut() else {
            return;
        };
        let name = sanitize_input(form.name.value());
        let ip = form.ip.value().trim().to_owned();
        let location = sanitize_input(form.location.value());

        if name.is_empty() {
            form.error = Some("Device name is required".into());
            return;
        }
        if !validate_ipv4(&ip) {
            form.error = Some("Invalid IP address format".into());
            return;
        }

        let type_idx = form.type_idx;
        let crit_idx = form.crit_idx;
        let device = Device {
            id: self.next_device_id(),
            name: name.clone(),
            ip,
            mac: "00:00:00:00:00:00".into(),
            device_type: TYPE_CHOICES[type_idx % TYPE_CHOICES.len()],
            vendor: "Unknown".into(),
            model: "Unknown".into(),
            status: DeviceStatus::Online,
            last_seen: Utc::now(),
            protocols: Vec::new(),
            ports: Vec::new(),
            criticality: CRIT_CHOICES[crit_idx % CRIT_CHOICES.len()],
            location: if location.is_empty() { "Unassigned".into() } else { location },
            firmware: "Unknown".into(),
        };
        self.devices.push(device);
        self.add_form = None;
        self.recompute_filtered();
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::notify_success("Device added", format!("Added {name} to the inventory")));
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<Action> {
        let Some(form) = self.add_form.as_mut() else {
            return None;
        };
        match key.code {
            KeyCode::Esc => {
                self.add_form = None;
            }
            KeyCode::Enter => self.submit_add_form(),
            KeyCode::Tab | KeyCode::Down => {
                form.field = match form.field {
                    AddField::Name => AddField::Ip,
                    AddField::Ip => AddField::Location,
                    AddField::Location => AddField::Type,
                    AddField::Type => AddField::Criticality,
                    AddField::Criticality => AddField::Name,
                };
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.field = match form.field {
                    AddField::Name => AddField::Criticality,
                    AddField::Ip => AddField::Name,
                    AddField::Location => AddField::Ip,
                    AddField::Type => AddField::Location,
                    AddField::Criticality => AddField::Type,
                };
            }
            KeyCode::Left if form.field == AddField::Type => {
                form.type_idx = (form.type_idx + TYPE_CHOICES.len() - 1) % TYPE_CHOICES.len();
            }
            KeyCode::Right if form.field == AddField::Type => {
                form.type_idx = (form.type_idx + 1) % TYPE_CHOICES.len();
            }
            KeyCode::Left if form.field == AddField::Criticality => {
                form.crit_idx = (form.crit_idx + CRIT_CHOICES.len() - 1) % CRIT_CHOICES.len();
            }
            KeyCode::Right if form.field == AddField::Criticality => {
                form.crit_idx = (form.crit_idx + 1) % CRIT_CHOICES.len();
            }
            _ => {
                let input = match form.field {
                    AddField::Name => &mut form.name,
                    AddField::Ip => &mut form.ip,
                    AddField::Location => &mut form.location,
                    AddField::Type | AddField::Criticality => return None,
                };
                input.handle_event(&crossterm::event::Event::Key(key));
            }
        }
        None
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(1), // filter tabs
            Constraint::Min(1),    // table
            Constraint::Length(1), // inline message / scan state
        ])
        .split(area);

        let labels: Vec<&str> = DeviceFilter::ALL.iter().map(|f| f.label()).collect();
        let active = DeviceFilter::ALL.iter().position(|f| *f == self.filter).unwrap_or(0);
        frame.render_widget(Paragraph::new(sub_tabs::render_sub_tabs(&labels, active)), layout[0]);

        let header = Row::new(vec![
            Cell::from("Name"),
            Cell::from("IP"),
            Cell::from("Type"),
            Cell::from("Status"),
            Cell::from("Criticality"),
            Cell::from("Protocols"),
            Cell::from("Location"),
        ])
        .style(theme::table_header());

        let rows: Vec<Row> = self
            .cached_filtered
            .iter()
            .filter_map(|&i| self.devices.get(i))
            .map(|d| {
                let status_style = match d.status {
                    DeviceStatus::Online => theme::success(),
                    DeviceStatus::Offline => theme::error(),
                };
                Row::new(vec![
                    Cell::from(d.name.clone()),
                    Cell::from(d.ip.clone()),
                    Cell::from(d.device_type.label()),
                    Cell::from(Span::styled(d.status.label(), status_style)),
                    Cell::from(Span::styled(
                        d.criticality.label(),
                        Style::default().fg(theme::criticality_color(d.criticality)),
                    )),
                    Cell::from(d.protocols.join(", ")),
                    Cell::from(d.location.clone()),
                ])
            })
            .collect();

        let widths = [
            Constraint::Fill(2),
            Constraint::Length(15),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(11),
            Constraint::Fill(2),
            Constraint::Fill(1),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::row_selected());
        let mut state = self.table_state.clone();
        frame.render_stateful_widget(table, layout[1], &mut state);

        let status_line = if self.scanning_network {
            Line::from(Span::styled("  Scanning network...", theme::warning()))
        } else if self.scanning_device.is_some() {
            Line::from(Span::styled("  Scanning device...", theme::warning()))
        } else if let Some(msg) = &self.inline_msg {
            Line::from(Span::styled(format!("  {msg}"), theme::error()))
        } else if self.search_query.is_empty() {
            Line::from(Span::styled(
                format!("  {} of {} devices", self.cached_filtered.len(), self.devices.len()),
                theme::dim(),
            ))
        } else {
            Line::from(Span::styled(
                format!(
                    "  {} matches for '{}'",
                    self.cached_filtered.len(),
                    self.search_query
                ),
                theme::dim(),
            ))
        };
        frame.render_widget(Paragraph::new(status_line), layout[2]);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let Some(device) = self.selected_device() else {
            return;
        };
        let popup = centered_rect(area, 60, 16);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(format!(" {} ", device.name), theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let ports = device
            .ports
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let lines = vec![
            detail_line("IP", &device.ip),
            detail_line("MAC", &device.mac),
            detail_line("Type", device.device_type.label()),
            detail_line("Vendor", &device.vendor),
            detail_line("Model", &device.model),
            detail_line("Status", device.status.label()),
            detail_line("Criticality", device.criticality.label()),
            detail_line("Firmware", &device.firmware),
            detail_line("Location", &device.location),
            detail_line("Protocols", &device.protocols.join(", ")),
            detail_line("Open ports", &ports),
            detail_line("Last seen", &device.last_seen.to_rfc3339()),
            Line::default(),
            Line::from(Span::styled("  Esc close  S scan this device", theme::dim())),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_add_form(&self, frame: &mut Frame, area: Rect) {
        let Some(form) = &self.add_form else {
            return;
        };
        let popup = centered_rect(area, 50, 13);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(" Add Device ", theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let field_line = |label: &str, value: String, active: bool| {
            let style = if active {
                Style::default().fg(theme::CONTROL_TEAL).add_modifier(Modifier::BOLD)
            } else {
                theme::dim()
            };
            Line::from(vec![
                Span::styled(format!(" {label:<12}"), style),
                Span::raw(value),
                Span::raw(if active { "_" } else { "" }),
            ])
        };

        let type_label = TYPE_CHOICES[form.type_idx % TYPE_CHOICES.len()].label();
        let crit_label = CRIT_CHOICES[form.crit_idx % CRIT_CHOICES.len()].label();
        let mut lines = vec![
            field_line("Name", form.name.value().to_owned(), form.field == AddField::Name),
            field_line("IP", form.ip.value().to_owned(), form.field == AddField::Ip),
            field_line("Location", form.location.value().to_owned(), form.field == AddField::Location),
            field_line("Type", format!("< {type_label} >"), form.field == AddField::Type),
            field_line("Criticality", format!("< {crit_label} >"), form.field == AddField::Criticality),
            Line::default(),
        ];
        if let Some(err) = &form.error {
            lines.push(Line::from(Span::styled(format!(" {err}"), theme::error())));
        }
        lines.push(Line::from(Span::styled(
            " Tab next field  Enter save  Esc cancel",
            theme::dim(),
        )));
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn detail_line<'a>(label: &'a str, value: &str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {label:<12}"), theme::dim()),
        Span::raw(value.to_owned()),
    ])
}

/// Center a fixed-size popup inside `area`, clamped to it.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(w)) / 2,
        y: area.y + (area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

impl Page for DevicesPage {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.add_form.is_some() {
            return Ok(self.handle_form_key(key));
        }
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Enter => {
                if self.selected_device().is_some() {
                    self.detail_open = true;
                }
                None
            }
            KeyCode::Char('f') => {
                self.filter = self.filter.next();
                self.recompute_filtered();
                None
            }
            KeyCode::Char('a') => {
                self.add_form = Some(AddForm::default());
                None
            }
            KeyCode::Char('s') => self.request_network_scan(),
            KeyCode::Char('S') => self.request_device_scan(),
            KeyCode::Char('d') => self.selected_device().map(|d| {
                Action::Confirm(ConfirmAction::RemoveDevice {
                    id: d.id,
                    name: d.name.clone(),
                })
            }),
            KeyCode::Char('e') => Some(self.export_csv()),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SearchInput(query) => {
                self.search_query = query.clone();
                self.recompute_filtered();
            }
            Action::GoBack => {
                if self.detail_open {
                    self.detail_open = false;
                }
            }
            Action::ScanNetworkDone(device) => {
                self.scanning_network = false;
                let name = device.name.clone();
                self.devices.push((**device).clone());
                self.recompute_filtered();
                return Ok(Some(Action::notify_success(
                    "Network scan complete",
                    format!("Discovered {name}"),
                )));
            }
            Action::ScanDeviceDone { device_id, result } => {
                self.scanning_device = None;
                self.apply_scan_result(*device_id, result);
                self.recompute_filtered();
                return Ok(Some(Action::notify_info(
                    "Device scan complete",
                    format!("Device {device_id} is {}", result.status.label()),
                )));
            }
            Action::DeviceRemove(id) => {
                self.devices.retain(|d| d.id != *id);
                self.recompute_filtered();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        self.render_table(frame, area);
        if self.detail_open {
            self.render_detail(frame, area);
        }
        if self.add_form.is_some() {
            self.render_add_form(frame, area);
        }
    }

    fn capturing_input(&self) -> bool {
        self.add_form.is_some()
    }

    fn key_hints(&self) -> &'static str {
        "j/k move  Enter detail  f filter  a add  s scan net  S scan dev  d delete  e export"
    }

    fn id(&self) -> PageId {
        PageId::Devices
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page() -> DevicesPage {
        DevicesPage::new(std::env::temp_dir())
    }

    #[test]
    fn seeded_inventory_is_visible_unfiltered() {
        let p = page();
        assert_eq!(p.cached_filtered.len(), p.devices.len());
        assert_eq!(p.table_state.selected(), Some(0));
    }

    #[test]
    fn offline_filter_narrows_the_table() {
        let mut p = page();
        p.filter = DeviceFilter::Offline;
        p.recompute_filtered();
        assert!(!p.cached_filtered.is_empty());
        for &i in &p.cached_filtered {
            assert_eq!(p.devices[i].status, DeviceStatus::Offline);
        }
    }

    #[test]
    fn search_matches_name_case_insensitively() {
        let mut p = page();
        p.search_query = "plc-station".into();
        p.recompute_filtered();
        assert!(!p.cached_filtered.is_empty());
        for &i in &p.cached_filtered {
            assert!(p.devices[i].name.to_lowercase().contains("plc-station"));
        }
    }

    #[test]
    fn add_form_rejects_bad_ip() {
        let mut p = page();
        let mut form = AddForm::default();
        form.name = Input::new("New PLC".into());
        form.ip = Input::new("999.1.1.1".into());
        p.add_form = Some(form);
        let before = p.devices.len();
        p.submit_add_form();
        assert_eq!(p.devices.len(), before);
        assert_eq!(
            p.add_form.unwrap().error.unwrap(),
            "Invalid IP address format"
        );
    }

    #[test]
    fn add_form_accepts_valid_input_and_closes() {
        let mut p = page();
        let mut form = AddForm::default();
        form.name = Input::new("  New PLC  ".into());
        form.ip = Input::new("10.0.0.42".into());
        p.add_form = Some(form);
        let before = p.devices.len();
        p.submit_add_form();
        assert_eq!(p.devices.len(), before + 1);
        assert!(p.add_form.is_none());
        let added = p.devices.last().unwrap();
        assert_eq!(added.name, "New PLC");
        assert_eq!(added.ip, "10.0.0.42");
    }

    #[test]
    fn add_form_records_the_chosen_criticality() {
        let mut p = page();
        let mut form = AddForm::default();
        form.name = Input::new("PLC-9".into());
        form.ip = Input::new("192.168.9.9".into());
        form.field = AddField::Criticality;
        p.add_form = Some(form);
        // One step right: Low -> Medium.
        p.handle_form_key(KeyEvent::from(KeyCode::Right));
        p.handle_form_key(KeyEvent::from(KeyCode::Enter));
        assert!(p.add_form.is_none());
        let added = p.devices.last().unwrap();
        assert_eq!(added.name, "PLC-9");
        assert_eq!(added.device_type, DeviceType::Plc);
        assert_eq!(added.criticality, Criticality::Medium);
    }

    #[test]
    fn scan_rate_limit_sets_inline_message() {
        let mut p = page();
        let mut granted = 0;
        for _ in 0..SCAN_LIMIT + 1 {
            p.scanning_network = false;
            if p.request_network_scan().is_some() {
                granted += 1;
            }
        }
        assert_eq!(granted, SCAN_LIMIT);
        assert!(p.inline_msg.as_ref().unwrap().contains("rate limit"));
    }

    #[test]
    fn scan_result_applies_to_device() {
        let mut p = page();
        let id = p.devices[0].id;
        let result = ScanResult {
            status: DeviceStatus::Offline,
            ports: vec![102, 502],
            protocols: vec!["Modbus TCP".into()],
            firmware: "2.1.7".into(),
        };
        p.apply_scan_result(id, &result);
        let device = p.devices.iter().find(|d| d.id == id).unwrap();
        assert_eq!(device.status, DeviceStatus::Offline);
        assert_eq!(device.ports, vec![102, 502]);
        assert_eq!(device.firmware, "2.1.7");
    }

    #[test]
    fn next_id_is_past_the_seed_range() {
        let p = page();
        let max = p.devices.iter().map(|d| d.id).max().unwrap();
        assert_eq!(p.next_device_id(), max + 1);
    }
}
