//! Monitoring page — event-rate series plus the live security event feed.
//!
//! The series regenerates when the window changes, on the shell's
//! 30-second refresh pulse, and on manual refresh.

use std::path::PathBuf;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use rand::thread_rng;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Sparkline, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;

use otwatch_core::model::monitoring::{Granularity, MonitoringSample};
use otwatch_core::model::threat::SecurityEvent;
use otwatch_core::{export, fixtures};

use crate::action::Action;
use crate::component::Page;
use crate::page::PageId;
use crate::theme;
use crate::widgets::sub_tabs;

const GRANULARITIES: [Granularity; 3] = [
    Granularity::OneHour,
    Granularity::TwentyFourHours,
    Granularity::SevenDays,
];

pub struct MonitoringPage {
    action_tx: Option<UnboundedSender<Action>>,
    granularity: Granularity,
    series: Vec<MonitoringSample>,
    events: Vec<SecurityEvent>,
    cached_filtered: Vec<usize>,
    table_state: TableState,
    search_query: String,
    export_dir: PathBuf,
}

impl MonitoringPage {
    pub fn new(export_dir: PathBuf) -> Self {
        let granularity = Granularity::default();
        let mut page = Self {
            action_tx: None,
            granularity,
            series: fixtures::monitoring_series(&mut thread_rng(), granularity),
            events: fixtures::seed_events(),
            cached_filtered: Vec::new(),
            table_state: TableState::default(),
            search_query: String::new(),
            export_dir,
        };
        page.recompute_filtered();
        page.table_state.select(Some(0));
        page
    }

    /// Regenerate the series for the active window and re-stamp the feed
    /// into the last hour.
    fn refresh(&mut self) {
        let mut rng = thread_rng();
        self.series = fixtures::monitoring_series(&mut rng, self.granularity);
        fixtures::rejitter_events(&mut rng, &mut self.events);
        self.events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.recompute_filtered();
    }

    fn recompute_filtered(&mut self) {
        let q = self.search_query.to_lowercase();
        self.cached_filtered = self
            .events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.matches_query(&q))
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

    fn cycle_granularity(&mut self) {
        let idx = GRANULARITIES.iter().position(|g| *g == self.granularity).unwrap_or(0);
        self.granularity = GRANULARITIES[(idx + 1) % GRANULARITIES.len()];
        self.refresh();
    }

    fn export_report(&self) -> Action {
        let report = export::monitoring_report(self.granularity, &self.series, &self.events);
        let filename = export::export_filename("monitoring_report", "txt");
        let path = self.export_dir.join(&filename);
        match std::fs::write(&path, report) {
            Ok(()) => Action::notify_success("Export complete", format!("Wrote {}", path.display())),
            Err(err) => Action::notify_error("Export failed", err.to_string()),
        }
    }

    fn render_series(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).split(area);

        let labels: Vec<&str> = GRANULARITIES.iter().map(|g| g.label()).collect();
        let active = GRANULARITIES.iter().position(|g| *g == self.granularity).unwrap_or(0);
        let mut line = sub_tabs::render_sub_tabs(&labels, active);
        line.push_span(Span::styled(
            format!(
                "   events {}  threats {}  blocked {}",
                self.series.iter().map(|s| u64::from(s.events)).sum::<u64>(),
                self.series.iter().map(|s| u64::from(s.threats)).sum::<u64>(),
                self.series.iter().map(|s| u64::from(s.blocked)).sum::<u64>(),
            ),
            theme::dim(),
        ));
        frame.render_widget(Paragraph::new(line), layout[0]);

        let data: Vec<u64> = self.series.iter().map(|s| u64::from(s.events)).collect();
        let sparkline = Sparkline::default()
            .data(&data)
            .style(Style::default().fg(theme::CONTROL_TEAL));
        frame.render_widget(sparkline, layout[1]);
    }

    fn render_events(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(vec![
            Cell::from("Time"),
            Cell::from("Type"),
            Cell::from("Severity"),
            Cell::from("Source"),
            Cell::from("Target"),
            Cell::from("Proto"),
            Cell::from("Port"),
            Cell::from("Status"),
        ])
        .style(theme::table_header());

        let rows: Vec<Row> = self
            .cached_filtered
            .iter()
            .filter_map(|&i| self.events.get(i))
            .map(|e| {
                Row::new(vec![
                    Cell::from(e.timestamp.format("%H:%M:%S").to_string()),
                    Cell::from(e.event_type.clone()),
                    Cell::from(Span::styled(
                        e.severity.label(),
                        Style::default().fg(theme::severity_color(e.severity)),
                    )),
                    Cell::from(e.source.clone()),
                    Cell::from(e.target.clone()),
                    Cell::from(e.protocol.clone()),
                    Cell::from(e.port.to_string()),
                    Cell::from(e.status.clone()),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(9),
            Constraint::Fill(2),
            Constraint::Length(9),
            Constraint::Length(15),
            Constraint::Length(15),
            Constraint::Length(12),
            Constraint::Length(6),
            Constraint::Length(12),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::row_selected());
        let mut state = self.table_state.clone();
        frame.render_stateful_widget(table, area, &mut state);
    }
}

impl Page for MonitoringPage {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Char('g') => {
                self.cycle_granularity();
                None
            }
            KeyCode::Char('r') => {
                self.refresh();
                None
            }
            KeyCode::Char('e') => Some(self.export_report()),
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
            Action::MonitoringRefresh => self.refresh(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([Constraint::Length(8), Constraint::Min(1)]).split(area);
        self.render_series(frame, layout[0]);
        self.render_events(frame, layout[1]);
    }

    fn key_hints(&self) -> &'static str {
        "j/k move  g window  r refresh  e report"
    }

    fn id(&self) -> PageId {
        PageId::Monitoring
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page() -> MonitoringPage {
        MonitoringPage::new(std::env::temp_dir())
    }

    #[test]
    fn series_matches_the_active_window() {
        let mut p = page();
        assert_eq!(p.series.len(), Granularity::OneHour.bucket_count());
        p.cycle_granularity();
        assert_eq!(p.granularity, Granularity::TwentyFourHours);
        assert_eq!(p.series.len(), Granularity::TwentyFourHours.bucket_count());
        p.cycle_granularity();
        assert_eq!(p.series.len(), Granularity::SevenDays.bucket_count());
        p.cycle_granularity();
        assert_eq!(p.granularity, Granularity::OneHour);
    }

    #[test]
    fn refresh_keeps_feed_sorted_newest_first() {
        let mut p = page();
        p.refresh();
        for pair in p.events.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[test]
    fn search_filters_the_feed() {
        let mut p = page();
        p.search_query = "modbus".into();
        p.recompute_filtered();
        for &i in &p.cached_filtered {
            assert!(p.events[i].matches_query("modbus"));
        }
    }
}
