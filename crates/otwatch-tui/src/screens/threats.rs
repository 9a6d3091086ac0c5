//! Threats page — intelligence feed with severity filtering and reports.

use std::path::PathBuf;

use chrono::Utc;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;

use otwatch_core::model::threat::{Severity, Threat};
use otwatch_core::{export, fixtures};

use crate::action::Action;
use crate::component::Page;
use crate::page::PageId;
use crate::screens::devices::centered_rect;
use crate::theme;
use crate::widgets::sub_tabs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SeverityFilter {
    #[default]
    All,
    Critical,
    High,
    Medium,
    Low,
}

impl SeverityFilter {
    const ALL: [Self; 5] = [Self::All, Self::Critical, Self::High, Self::Medium, Self::Low];

    fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn matches(self, threat: &Threat) -> bool {
        match self {
            Self::All => true,
            Self::Critical => threat.severity == Severity::Critical,
            Self::High => threat.severity == Severity::High,
            Self::Medium => threat.severity == Severity::Medium,
            Self::Low => threat.severity == Severity::Low,
        }
    }
}

pub struct ThreatsPage {
    action_tx: Option<UnboundedSender<Action>>,
    threats: Vec<Threat>,
    cached_filtered: Vec<usize>,
    table_state: TableState,
    filter: SeverityFilter,
    search_query: String,
    detail_open: bool,
    export_dir: PathBuf,
}

impl ThreatsPage {
    pub fn new(export_dir: PathBuf) -> Self {
        let mut page = Self {
            action_tx: None,
            threats: fixtures::seed_threats(),
            cached_filtered: Vec::new(),
            table_state: TableState::default(),
            filter: SeverityFilter::All,
            search_query: String::new(),
            detail_open: false,
            export_dir,
        };
        page.recompute_filtered();
        page.table_state.select(Some(0));
        page
    }

    fn recompute_filtered(&mut self) {
        let q = self.search_query.to_lowercase();
        self.cached_filtered = self
            .threats
            .iter()
            .enumerate()
            .filter(|(_, t)| self.filter.matches(t) && t.matches_query(&q))
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

    fn selected_threat(&self) -> Option<&Threat> {
        let sel = self.table_state.selected()?;
        let idx = *self.cached_filtered.get(sel)?;
        self.threats.get(idx)
    }

    /// Pull two fresh feed entries and refresh every record's timestamp.
    fn update_feed(&mut self) -> Action {
        let next_id = self.threats.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let fresh = fixtures::update_feed_threats(next_id);
        let added = fresh.len();
        self.threats.extend(fresh);
        let now = Utc::now();
        for threat in &mut self.threats {
            threat.last_updated = now;
        }
        self.recompute_filtered();
        Action::notify_success(
            "Threat feed updated",
            format!("{added} new entries from the intelligence feed"),
        )
    }

    fn write_export(&self, stem: &str, ext: &str, content: String) -> Action {
        let filename = export::export_filename(stem, ext);
        let path = self.export_dir.join(&filename);
        match std::fs::write(&path, content) {
            Ok(()) => Action::notify_success("Export complete", format!("Wrote {}", path.display())),
            Err(err) => Action::notify_error("Export failed", err.to_string()),
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

        let labels: Vec<&str> = SeverityFilter::ALL.iter().map(|f| f.label()).collect();
        let active = SeverityFilter::ALL.iter().position(|f| *f == self.filter).unwrap_or(0);
        frame.render_widget(Paragraph::new(sub_tabs::render_sub_tabs(&labels, active)), layout[0]);

        let header = Row::new(vec![
            Cell::from("Title"),
            Cell::from("Type"),
            Cell::from("Severity"),
            Cell::from("Status"),
            Cell::from("Risk"),
            Cell::from("Conf"),
            Cell::from("MITRE"),
            Cell::from("CVE"),
        ])
        .style(theme::table_header());

        let rows: Vec<Row> = self
            .cached_filtered
            .iter()
            .filter_map(|&i| self.threats.get(i))
            .map(|t| {
                Row::new(vec![
                    Cell::from(t.title.clone()),
                    Cell::from(t.threat_type.clone()),
                    Cell::from(Span::styled(
                        t.severity.label(),
                        Style::default().fg(theme::severity_color(t.severity)),
                    )),
                    Cell::from(t.status.label()),
                    Cell::from(format!("{:.1}", t.risk_score)),
                    Cell::from(format!("{}%", t.confidence)),
                    Cell::from(t.mitre_id.clone()),
                    Cell::from(t.cve_id.clone().unwrap_or_else(|| "-".into())),
                ])
            })
            .collect();

        let widths = [
            Constraint::Fill(3),
            Constraint::Fill(2),
            Constraint::Length(9),
            Constraint::Length(15),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(9),
            Constraint::Length(16),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::row_selected());
        let mut state = self.table_state.clone();
        frame.render_stateful_widget(table, layout[1], &mut state);

        let count_line = Line::from(Span::styled(
            format!("  {} of {} threats", self.cached_filtered.len(), self.threats.len()),
            theme::dim(),
        ));
        frame.render_widget(Paragraph::new(count_line), layout[2]);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let Some(threat) = self.selected_threat() else {
            return;
        };
        let popup = centered_rect(area, 72, 20);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(format!(" {} ", threat.title), theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let field = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("  {label:<16}"), theme::dim()),
                Span::raw(value),
            ])
        };
        let lines = vec![
            field("Type", threat.threat_type.clone()),
            field("Severity", threat.severity.label().to_owned()),
            field("Status", threat.status.label().to_owned()),
            field("Source", threat.source.clone()),
            field("Risk score", format!("{:.1}", threat.risk_score)),
            field("Confidence", format!("{}%", threat.confidence)),
            field("MITRE", format!("{} / {}", threat.mitre_id, threat.mitre_tactics.join(", "))),
            field("CVE", threat.cve_id.clone().unwrap_or_else(|| "-".into())),
            field("Affected", threat.affected_systems.join(", ")),
            field("Indicators", threat.indicators.join(", ")),
            field("First seen", threat.first_seen.to_rfc3339()),
            field("Last updated", threat.last_updated.to_rfc3339()),
            Line::default(),
            Line::from(Span::styled(format!("  {}", threat.description), Style::default())),
            Line::default(),
            Line::from(Span::styled("  Esc close  r report for this threat", theme::dim())),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Page for ThreatsPage {
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
            KeyCode::Enter => {
                if self.selected_threat().is_some() {
                    self.detail_open = true;
                }
                None
            }
            KeyCode::Char('f') => {
                self.filter = self.filter.next();
                self.recompute_filtered();
                None
            }
            KeyCode::Char('u') => Some(self.update_feed()),
            KeyCode::Char('e') => {
                let report = export::threat_report(&self.threats);
                Some(self.write_export("threat_report", "txt", report))
            }
            KeyCode::Char('i') => {
                let csv = export::indicators_csv(&self.threats);
                Some(self.write_export("indicators", "csv", csv))
            }
            KeyCode::Char('r') if self.detail_open => self.selected_threat().map(|t| {
                let report = export::single_threat_report(t);
                (report, t.id)
            }).map(|(report, id)| {
                self.write_export(&format!("threat_{id}"), "txt", report)
            }),
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
                self.detail_open = false;
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
    }

    fn key_hints(&self) -> &'static str {
        "j/k move  Enter detail  f severity  u update feed  e report  i indicators"
    }

    fn id(&self) -> PageId {
        PageId::Threats
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page() -> ThreatsPage {
        ThreatsPage::new(std::env::temp_dir())
    }

    #[test]
    fn update_feed_appends_and_refreshes_timestamps() {
        let mut p = page();
        let before = p.threats.len();
        let stale = p.threats[0].last_updated;
        let action = p.update_feed();
        assert_eq!(p.threats.len(), before + 2);
        assert!(p.threats.iter().all(|t| t.last_updated >= stale));
        // All records share the refreshed timestamp.
        let stamp = p.threats[0].last_updated;
        assert!(p.threats.iter().all(|t| t.last_updated == stamp));
        assert!(matches!(action, Action::Notify { .. }));
    }

    #[test]
    fn feed_ids_continue_past_existing_max() {
        let mut p = page();
        let max = p.threats.iter().map(|t| t.id).max().unwrap();
        p.update_feed();
        let new_max = p.threats.iter().map(|t| t.id).max().unwrap();
        assert_eq!(new_max, max + 2);
        let mut ids: Vec<u64> = p.threats.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), p.threats.len(), "duplicate threat ids");
    }

    #[test]
    fn severity_filter_narrows() {
        let mut p = page();
        p.filter = SeverityFilter::Critical;
        p.recompute_filtered();
        for &i in &p.cached_filtered {
            assert_eq!(p.threats[i].severity, Severity::Critical);
        }
    }

    #[test]
    fn search_matches_cve_ids() {
        let mut p = page();
        p.search_query = "cve-2023".into();
        p.recompute_filtered();
        assert!(!p.cached_filtered.is_empty());
    }

    #[test]
    fn empty_filter_result_clears_selection() {
        let mut p = page();
        p.search_query = "no-such-threat-xyzzy".into();
        p.recompute_filtered();
        assert!(p.cached_filtered.is_empty());
        assert_eq!(p.table_state.selected(), None);
    }
}
