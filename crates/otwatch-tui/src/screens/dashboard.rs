//! Dashboard page — plant-wide overview cards and the recent event feed.

use color_eyre::eyre::Result;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table};
use tokio::sync::mpsc::UnboundedSender;

use otwatch_core::model::device::DeviceStatus;
use otwatch_core::model::threat::ThreatStatus;
use otwatch_core::{Device, SecurityEvent, SystemStatus, Threat, fixtures};

use crate::action::Action;
use crate::component::Page;
use crate::page::PageId;
use crate::theme;
use crate::widgets::fmt;

pub struct DashboardPage {
    action_tx: Option<UnboundedSender<Action>>,
    status: SystemStatus,
    devices: Vec<Device>,
    threats: Vec<Threat>,
    events: Vec<SecurityEvent>,
}

impl DashboardPage {
    pub fn new() -> Self {
        let mut events = fixtures::seed_events();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Self {
            action_tx: None,
            status: SystemStatus::default(),
            devices: fixtures::seed_devices(),
            threats: fixtures::seed_threats(),
            events,
        }
    }

    fn render_cards(&self, frame: &mut Frame, area: Rect) {
        let cards = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
        ])
        .split(area);

        let card = |title: &'static str, lines: Vec<Line<'static>>| {
            Paragraph::new(lines).block(
                Block::default()
                    .title(Span::styled(title, theme::title_style()))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_unfocused()),
            )
        };

        let d = self.status.devices;
        let offline = self.devices.iter().filter(|x| x.status == DeviceStatus::Offline).count();
        frame.render_widget(
            card(
                " Devices ",
                vec![
                    stat_line("total", d.total.to_string(), theme::dim()),
                    stat_line("online", d.online.to_string(), theme::success()),
                    stat_line("critical", d.critical.to_string(), theme::error()),
                    stat_line("inventory offline", offline.to_string(), theme::warning()),
                ],
            ),
            cards[0],
        );

        let t = self.status.threats;
        let active_tracked = self
            .threats
            .iter()
            .filter(|x| x.status == ThreatStatus::Active)
            .count();
        frame.render_widget(
            card(
                " Threats ",
                vec![
                    stat_line("active", t.active.to_string(), theme::error()),
                    stat_line("investigating", t.investigating.to_string(), theme::warning()),
                    stat_line("resolved", t.resolved.to_string(), theme::success()),
                    stat_line("tracked active", active_tracked.to_string(), theme::dim()),
                ],
            ),
            cards[1],
        );

        let m = &self.status.models;
        frame.render_widget(
            card(
                " AI Models ",
                vec![
                    stat_line("active", m.active.to_string(), theme::success()),
                    stat_line("training", m.training.to_string(), theme::warning()),
                    stat_line("ensemble accuracy", m.accuracy.clone(), theme::key_hint()),
                ],
            ),
            cards[2],
        );
    }

    fn render_events(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(Span::styled(" Recent Security Events ", theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_unfocused());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let header = Row::new(vec![
            Cell::from("Time"),
            Cell::from("Type"),
            Cell::from("Severity"),
            Cell::from("Source"),
            Cell::from("Description"),
        ])
        .style(theme::table_header());

        let rows: Vec<Row> = self
            .events
            .iter()
            .take(10)
            .map(|e| {
                Row::new(vec![
                    Cell::from(fmt::time_ago(e.timestamp)),
                    Cell::from(e.event_type.clone()),
                    Cell::from(Span::styled(
                        e.severity.label(),
                        Style::default().fg(theme::severity_color(e.severity)),
                    )),
                    Cell::from(e.source.clone()),
                    Cell::from(e.description.clone()),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(10),
            Constraint::Fill(2),
            Constraint::Length(9),
            Constraint::Length(15),
            Constraint::Fill(4),
        ];
        frame.render_widget(Table::new(rows, widths).header(header), inner);
    }
}

fn stat_line(label: &'static str, value: String, style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {label:<20}"), theme::dim()),
        Span::styled(value, style),
    ])
}

impl Default for DashboardPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Page for DashboardPage {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::StatusUpdated(status) = action {
            self.status = (**status).clone();
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([Constraint::Length(7), Constraint::Min(1)]).split(area);
        self.render_cards(frame, layout[0]);
        self.render_events(frame, layout[1]);
    }

    fn key_hints(&self) -> &'static str {
        "1-8 pages  / search  ? help"
    }

    fn id(&self) -> PageId {
        PageId::Dashboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_snapshot_replaces_the_cards() {
        let mut p = DashboardPage::new();
        let mut status = SystemStatus::default();
        status.devices.total = 999;
        status.models.accuracy = "0.912".into();
        p.update(&Action::StatusUpdated(Box::new(status))).ok();
        assert_eq!(p.status.devices.total, 999);
        assert_eq!(p.status.models.accuracy, "0.912");
    }

    #[test]
    fn event_feed_is_newest_first() {
        let p = DashboardPage::new();
        for pair in p.events.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }
}
