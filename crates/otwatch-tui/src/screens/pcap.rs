//! PCAP page — capture files served by the backend.
//!
//! This is the one page with no fixture fallback: backend failures show
//! up as an inline banner that expires after five seconds.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use otwatch_core::model::pcap::{CaptureState, PcapFile, PcapStats, TrainingState};
use otwatch_core::upload::{PCAP_EXTENSIONS, validate_upload};

use crate::action::{Action, ConfirmAction};
use crate::component::Page;
use crate::page::PageId;
use crate::screens::devices::centered_rect;
use crate::theme;
use crate::widgets::fmt;

/// How long an error banner stays up.
const BANNER_SECS: u64 = 5;

struct UploadForm {
    path: Input,
    auto_train: bool,
    error: Option<String>,
}

pub struct PcapPage {
    action_tx: Option<UnboundedSender<Action>>,
    files: Vec<PcapFile>,
    stats: PcapStats,
    cached_filtered: Vec<usize>,
    table_state: TableState,
    search_query: String,
    banner: Option<(String, Instant)>,
    capture: CaptureState,
    training: TrainingState,
    training_progress: Option<f64>,
    training_message: Option<String>,
    selected_ids: HashSet<i64>,
    upload_form: Option<UploadForm>,
    loading: bool,
}

impl PcapPage {
    pub fn new() -> Self {
        Self {
            action_tx: None,
            files: Vec::new(),
            stats: PcapStats::default(),
            cached_filtered: Vec::new(),
            table_state: TableState::default(),
            search_query: String::new(),
            banner: None,
            capture: CaptureState::Stopped,
            training: TrainingState::Idle,
            training_progress: None,
            training_message: None,
            selected_ids: HashSet::new(),
            upload_form: None,
            loading: false,
        }
    }

    fn recompute_filtered(&mut self) {
        let q = self.search_query.to_lowercase();
        self.cached_filtered = self
            .files
            .iter()
            .enumerate()
            .filter(|(_, f)| q.is_empty() || f.original_filename.to_lowercase().contains(&q))
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

    fn selected_file(&self) -> Option<&PcapFile> {
        let sel = self.table_state.selected()?;
        let idx = *self.cached_filtered.get(sel)?;
        self.files.get(idx)
    }

    fn set_banner(&mut self, message: String) {
        self.banner = Some((message, Instant::now()));
    }

    fn toggle_mark(&mut self) {
        if let Some(id) = self.selected_file().map(|f| f.id) {
            if !self.selected_ids.remove(&id) {
                self.selected_ids.insert(id);
            }
        }
    }

    /// Training target: the marked set, or the cursor row when nothing is
    /// marked.
    fn training_ids(&self) -> Vec<i64> {
        if self.selected_ids.is_empty() {
            self.selected_file().map(|f| f.id).into_iter().collect()
        } else {
            let mut ids: Vec<i64> = self.selected_ids.iter().copied().collect();
            ids.sort_unstable();
            ids
        }
    }

    fn toggle_capture(&mut self) -> Option<Action> {
        match self.capture {
            CaptureState::Stopped => {
                self.capture = CaptureState::Starting;
                Some(Action::CaptureStart)
            }
            CaptureState::Running => {
                self.capture = CaptureState::Stopping;
                Some(Action::CaptureStop)
            }
            // A transition is already in flight.
            CaptureState::Starting | CaptureState::Stopping => None,
        }
    }

    fn submit_upload(&mut self) -> Option<Action> {
        let form = self.upload_form.as_mut()?;
        let path = PathBuf::from(form.path.value().trim());
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if filename.is_empty() {
            form.error = Some("Enter a capture file path".into());
            return None;
        }
        let size = match std::fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(err) => {
                form.error = Some(format!("Cannot read file: {err}"));
                return None;
            }
        };
        if let Some(reason) = validate_upload(&filename, size, PCAP_EXTENSIONS) {
            form.error = Some(reason);
            return None;
        }
        let auto_train = form.auto_train;
        self.upload_form = None;
        Some(Action::PcapUploadRequest { path, auto_train })
    }

    fn handle_upload_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.upload_form = None;
                None
            }
            KeyCode::Enter => self.submit_upload(),
            KeyCode::Tab => {
                if let Some(form) = self.upload_form.as_mut() {
                    form.auto_train = !form.auto_train;
                }
                None
            }
            _ => {
                if let Some(form) = self.upload_form.as_mut() {
                    form.path.handle_event(&crossterm::event::Event::Key(key));
                }
                None
            }
        }
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let capture_style = match self.capture {
            CaptureState::Running => theme::success(),
            CaptureState::Starting | CaptureState::Stopping => theme::warning(),
            CaptureState::Stopped => theme::dim(),
        };
        let line = Line::from(vec![
            Span::styled(format!("  files {}", self.stats.total_files), theme::dim()),
            Span::styled(
                format!("  size {}", fmt::human_bytes(self.stats.total_size)),
                theme::dim(),
            ),
            Span::styled(
                format!("  processed {}", self.stats.processed_files),
                theme::success(),
            ),
            Span::styled(format!("  failed {}", self.stats.failed_files), theme::error()),
            Span::styled(format!("   capture: {}", self.capture.label()), capture_style),
            Span::styled(
                if self.selected_ids.is_empty() {
                    String::new()
                } else {
                    format!("   {} marked for training", self.selected_ids.len())
                },
                theme::key_hint(),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(vec![
            Cell::from(""),
            Cell::from("Filename"),
            Cell::from("Size"),
            Cell::from("Packets"),
            Cell::from("Protocols"),
            Cell::from("Status"),
            Cell::from("Uploaded"),
            Cell::from("Flag"),
        ])
        .style(theme::table_header());

        let rows: Vec<Row> = self
            .cached_filtered
            .iter()
            .filter_map(|&i| self.files.get(i))
            .map(|f| {
                let mark = if self.selected_ids.contains(&f.id) { "*" } else { " " };
                Row::new(vec![
                    Cell::from(mark),
                    Cell::from(f.original_filename.clone()),
                    Cell::from(fmt::human_bytes(f.file_size)),
                    Cell::from(f.packet_count.map_or_else(|| "-".into(), |c| c.to_string())),
                    Cell::from(f.protocols.clone().unwrap_or_default().join(", ")),
                    Cell::from(f.status.label()),
                    Cell::from(fmt::time_ago(f.upload_date)),
                    Cell::from(if f.flagged {
                        Span::styled("flagged", theme::warning())
                    } else {
                        Span::raw("")
                    }),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(1),
            Constraint::Fill(3),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Fill(2),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(7),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::row_selected());
        let mut state = self.table_state.clone();
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        if let Some((message, _)) = &self.banner {
            let line = Line::from(Span::styled(format!("  {message}"), theme::error()));
            frame.render_widget(Paragraph::new(line), area);
            return;
        }
        if self.training == TrainingState::Running || self.training == TrainingState::Starting {
            let ratio = (self.training_progress.unwrap_or(0.0) / 100.0).clamp(0.0, 1.0);
            let label = self
                .training_message
                .clone()
                .unwrap_or_else(|| format!("training: {}", self.training.label()));
            let gauge = Gauge::default()
                .ratio(ratio)
                .label(label)
                .gauge_style(theme::warning());
            frame.render_widget(gauge, area);
            return;
        }
        let line = if self.loading {
            Line::from(Span::styled("  loading captures...", theme::dim()))
        } else {
            Line::from(Span::styled(
                format!("  {} of {} captures", self.cached_filtered.len(), self.files.len()),
                theme::dim(),
            ))
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_upload(&self, frame: &mut Frame, area: Rect) {
        let Some(form) = &self.upload_form else {
            return;
        };
        let popup = centered_rect(area, 60, 8);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(" Upload Capture ", theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let mut lines = vec![
            Line::from(vec![
                Span::styled(" Path       ", theme::dim()),
                Span::raw(form.path.value().to_owned()),
                Span::raw("_"),
            ]),
            Line::from(vec![
                Span::styled(" Auto-train ", theme::dim()),
                Span::styled(
                    if form.auto_train { "[x]" } else { "[ ]" },
                    theme::key_hint(),
                ),
            ]),
            Line::default(),
        ];
        if let Some(err) = &form.error {
            lines.push(Line::from(Span::styled(format!(" {err}"), theme::error())));
        }
        lines.push(Line::from(Span::styled(
            " Enter upload  Tab toggle auto-train  Esc cancel",
            theme::dim(),
        )));
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Default for PcapPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Page for PcapPage {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.loading = true;
        let _ = action_tx.send(Action::PcapReload);
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.upload_form.is_some() {
            return Ok(self.handle_upload_key(key));
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
            KeyCode::Char('r') => {
                self.loading = true;
                Some(Action::PcapReload)
            }
            KeyCode::Char('u') => {
                self.upload_form = Some(UploadForm {
                    path: Input::default(),
                    auto_train: false,
                    error: None,
                });
                None
            }
            KeyCode::Char('d') => self.selected_file().map(|f| Action::PcapDownload(f.id)),
            KeyCode::Char('x') => self.selected_file().map(|f| {
                Action::Confirm(ConfirmAction::DeletePcap {
                    id: f.id,
                    filename: f.original_filename.clone(),
                })
            }),
            KeyCode::Char('f') => self.selected_file().map(|f| Action::PcapToggleFlag {
                id: f.id,
                flagged: !f.flagged,
            }),
            KeyCode::Char(' ') => {
                self.toggle_mark();
                None
            }
            KeyCode::Char('c') => self.toggle_capture(),
            KeyCode::Char('t') => {
                if self.training.is_terminal() || self.training == TrainingState::Idle {
                    let ids = self.training_ids();
                    if ids.is_empty() {
                        None
                    } else {
                        self.training = TrainingState::Starting;
                        self.training_progress = Some(0.0);
                        self.training_message = None;
                        Some(Action::TrainingStart(ids))
                    }
                } else {
                    None
                }
            }
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick => {
                if let Some((_, since)) = &self.banner
                    && since.elapsed() >= Duration::from_secs(BANNER_SECS)
                {
                    self.banner = None;
                }
            }
            Action::SearchInput(query) => {
                self.search_query = query.clone();
                self.recompute_filtered();
            }
            Action::PcapLoaded { files, stats } => {
                self.loading = false;
                self.files = files.clone();
                self.stats = *stats;
                self.selected_ids.retain(|id| self.files.iter().any(|f| f.id == *id));
                self.recompute_filtered();
            }
            Action::PcapBanner(message) => {
                self.loading = false;
                if self.training == TrainingState::Starting {
                    self.training = TrainingState::Idle;
                }
                if self.capture == CaptureState::Starting {
                    self.capture = CaptureState::Stopped;
                } else if self.capture == CaptureState::Stopping {
                    self.capture = CaptureState::Running;
                }
                self.set_banner(message.clone());
            }
            Action::PcapDeleted(id) => {
                self.files.retain(|f| f.id != *id);
                self.selected_ids.remove(id);
                self.recompute_filtered();
                return Ok(Some(Action::notify_success("Capture deleted", format!("Removed file {id}"))));
            }
            Action::PcapUploaded(file) => {
                self.files.insert(0, (**file).clone());
                self.recompute_filtered();
                return Ok(Some(Action::notify_success(
                    "Upload complete",
                    file.original_filename.clone(),
                )));
            }
            Action::PcapFlagUpdated(file) => {
                if let Some(existing) = self.files.iter_mut().find(|f| f.id == file.id) {
                    *existing = (**file).clone();
                }
            }
            Action::CaptureChanged(state) => {
                self.capture = *state;
            }
            Action::TrainingStatusUpdated { state, progress, message } => {
                self.training = *state;
                self.training_progress = *progress;
                self.training_message = message.clone();
                if state.is_terminal() {
                    let notice = match state {
                        TrainingState::Completed => {
                            Action::notify_success("Training complete", "Model retrained from captures")
                        }
                        _ => Action::notify_error(
                            "Training failed",
                            message.clone().unwrap_or_else(|| "training job failed".into()),
                        ),
                    };
                    if let Some(tx) = &self.action_tx {
                        let _ = tx.send(Action::TrainingPollStop);
                    }
                    return Ok(Some(notice));
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);
        self.render_stats(frame, layout[0]);
        self.render_table(frame, layout[1]);
        self.render_footer(frame, layout[2]);
        if self.upload_form.is_some() {
            self.render_upload(frame, area);
        }
    }

    fn capturing_input(&self) -> bool {
        self.upload_form.is_some()
    }

    fn key_hints(&self) -> &'static str {
        "j/k move  r reload  u upload  d download  x delete  f flag  space mark  t train  c capture"
    }

    fn id(&self) -> PageId {
        PageId::Pcap
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use otwatch_core::model::pcap::PcapStatus;

    use super::*;

    fn file(id: i64, name: &str) -> PcapFile {
        PcapFile {
            id,
            original_filename: name.into(),
            file_size: 2048,
            upload_date: Utc::now(),
            packet_count: Some(100),
            protocols: Some(vec!["Modbus TCP".into()]),
            status: PcapStatus::Processed,
            duration_seconds: Some(1.0),
            analysis_results: None,
            flagged: false,
        }
    }

    fn loaded_page() -> PcapPage {
        let mut p = PcapPage::new();
        p.files = vec![file(1, "line1.pcap"), file(2, "line2.pcap"), file(3, "east.pcapng")];
        p.recompute_filtered();
        p.table_state.select(Some(0));
        p
    }

    #[test]
    fn capture_state_machine_round_trip() {
        let mut p = loaded_page();
        assert!(matches!(p.toggle_capture(), Some(Action::CaptureStart)));
        assert_eq!(p.capture, CaptureState::Starting);
        // Another press while starting is ignored.
        assert!(p.toggle_capture().is_none());

        p.capture = CaptureState::Running;
        assert!(matches!(p.toggle_capture(), Some(Action::CaptureStop)));
        assert_eq!(p.capture, CaptureState::Stopping);
        assert!(p.toggle_capture().is_none());
    }

    #[test]
    fn banner_expires_after_five_seconds() {
        let mut p = loaded_page();
        p.set_banner("HTTP 500: Internal Server Error".into());
        p.banner = Some((
            p.banner.take().unwrap().0,
            Instant::now() - Duration::from_secs(BANNER_SECS + 1),
        ));
        p.update(&Action::Tick).unwrap();
        assert!(p.banner.is_none());
    }

    #[test]
    fn training_targets_marked_files_first() {
        let mut p = loaded_page();
        assert_eq!(p.training_ids(), vec![1]);
        p.selected_ids.insert(3);
        p.selected_ids.insert(2);
        assert_eq!(p.training_ids(), vec![2, 3]);
    }

    #[test]
    fn terminal_training_status_stops_the_poll() {
        let mut p = loaded_page();
        p.training = TrainingState::Running;
        let follow_up = p
            .update(&Action::TrainingStatusUpdated {
                state: TrainingState::Completed,
                progress: Some(100.0),
                message: None,
            })
            .unwrap();
        assert!(matches!(follow_up, Some(Action::Notify { .. })));
        assert!(p.training.is_terminal());
    }

    #[test]
    fn failed_transition_rolls_capture_state_back() {
        let mut p = loaded_page();
        p.capture = CaptureState::Starting;
        p.update(&Action::PcapBanner("backend unreachable".into())).unwrap();
        assert_eq!(p.capture, CaptureState::Stopped);
        assert!(p.banner.is_some());
    }

    #[test]
    fn search_filters_by_filename() {
        let mut p = loaded_page();
        p.search_query = "pcapng".into();
        p.recompute_filtered();
        assert_eq!(p.cached_filtered.len(), 1);
        assert_eq!(p.files[p.cached_filtered[0]].original_filename, "east.pcapng");
    }
}
