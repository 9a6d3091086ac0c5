//! AI models page — model cards with train, configure, export, import.

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
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use otwatch_core::model::ai_model::{AiModel, CONFIGURE_OPTIONS, EXPORT_FORMATS, ModelStatus};
use otwatch_core::upload::{MODEL_EXTENSIONS, extension_allowed};
use otwatch_core::{export, fixtures};

use crate::action::Action;
use crate::component::Page;
use crate::page::PageId;
use crate::screens::devices::centered_rect;
use crate::theme;
use crate::widgets::fmt;

/// Which chooser dialog is open, with its cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialog {
    Configure(usize),
    Export(usize),
}

pub struct AiModelsPage {
    action_tx: Option<UnboundedSender<Action>>,
    models: Vec<AiModel>,
    cached_filtered: Vec<usize>,
    table_state: TableState,
    search_query: String,
    detail_open: bool,
    dialog: Option<Dialog>,
    import_input: Option<Input>,
    export_dir: PathBuf,
}

impl AiModelsPage {
    pub fn new(export_dir: PathBuf) -> Self {
        let mut page = Self {
            action_tx: None,
            models: fixtures::seed_models(),
            cached_filtered: Vec::new(),
            table_state: TableState::default(),
            search_query: String::new(),
            detail_open: false,
            dialog: None,
            import_input: None,
            export_dir,
        };
        page.recompute_filtered();
        page.table_state.select(Some(0));
        page
    }

    fn recompute_filtered(&mut self) {
        let q = self.search_query.to_lowercase();
        self.cached_filtered = self
            .models
            .iter()
            .enumerate()
            .filter(|(_, m)| m.matches_query(&q))
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

    fn selected_model(&self) -> Option<&AiModel> {
        let sel = self.table_state.selected()?;
        let idx = *self.cached_filtered.get(sel)?;
        self.models.get(idx)
    }

    /// Start a simulated training run for the selected model.
    fn start_training(&mut self) -> Option<Action> {
        let sel = self.table_state.selected()?;
        let idx = *self.cached_filtered.get(sel)?;
        let model = self.models.get_mut(idx)?;
        if model.status == ModelStatus::Training {
            return None;
        }
        model.status = ModelStatus::Training;
        let model_id = model.id;
        Some(Action::TrainModelRequest { model_id })
    }

    fn finish_training(&mut self, model_id: u64) -> Option<Action> {
        let model = self.models.iter_mut().find(|m| m.id == model_id)?;
        model.status = ModelStatus::Active;
        model.last_trained = Utc::now();
        Some(Action::notify_success(
            "Training complete",
            format!("{} is active again", model.name),
        ))
    }

    fn apply_configure(&self, option_idx: usize) -> Option<Action> {
        let model = self.selected_model()?;
        let option = CONFIGURE_OPTIONS.get(option_idx)?;
        Some(Action::notify_info(
            "Configuration applied",
            format!("{option} on {}", model.name),
        ))
    }

    /// Export the selected model. The JSON Config format writes a real
    /// file; the binary formats are simulated.
    fn apply_export(&self, format_idx: usize) -> Option<Action> {
        let model = self.selected_model()?;
        let format = EXPORT_FORMATS.get(format_idx)?;
        if *format == "JSON Config" {
            let json = match export::model_json(model) {
                Ok(json) => json,
                Err(err) => return Some(Action::notify_error("Export failed", err.to_string())),
            };
            let filename = export::export_filename(&format!("model_{}", model.id), "json");
            let path = self.export_dir.join(&filename);
            return Some(match std::fs::write(&path, json) {
                Ok(()) => Action::notify_success("Export complete", format!("Wrote {}", path.display())),
                Err(err) => Action::notify_error("Export failed", err.to_string()),
            });
        }
        Some(Action::notify_success(
            "Export queued",
            format!("{} as {format}", model.name),
        ))
    }

    fn submit_import(&mut self) -> Option<Action> {
        let input = self.import_input.take()?;
        let filename = input.value().trim().to_owned();
        if filename.is_empty() {
            return None;
        }
        if !extension_allowed(&filename, MODEL_EXTENSIONS) {
            return Some(Action::notify_error(
                "Import rejected",
                format!(
                    "Unsupported file type. Allowed: {}",
                    MODEL_EXTENSIONS
                        .iter()
                        .map(|e| format!(".{e}"))
                        .collect::<Vec<_>>()
                        .join(" ")
                ),
            ));
        }
        Some(Action::notify_success(
            "Model import queued",
            format!("Validating {filename}"),
        ))
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) -> Option<Action> {
        let dialog = self.dialog?;
        let (cursor, len) = match dialog {
            Dialog::Configure(c) => (c, CONFIGURE_OPTIONS.len()),
            Dialog::Export(c) => (c, EXPORT_FORMATS.len()),
        };
        match key.code {
            KeyCode::Esc => {
                self.dialog = None;
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let next = (cursor + 1) % len;
                self.dialog = Some(match dialog {
                    Dialog::Configure(_) => Dialog::Configure(next),
                    Dialog::Export(_) => Dialog::Export(next),
                });
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let next = (cursor + len - 1) % len;
                self.dialog = Some(match dialog {
                    Dialog::Configure(_) => Dialog::Configure(next),
                    Dialog::Export(_) => Dialog::Export(next),
                });
                None
            }
            KeyCode::Enter => {
                self.dialog = None;
                match dialog {
                    Dialog::Configure(c) => self.apply_configure(c),
                    Dialog::Export(c) => self.apply_export(c),
                }
            }
            _ => None,
        }
    }

    fn handle_import_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.import_input = None;
                None
            }
            KeyCode::Enter => self.submit_import(),
            _ => {
                if let Some(input) = self.import_input.as_mut() {
                    input.handle_event(&crossterm::event::Event::Key(key));
                }
                None
            }
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(vec![
            Cell::from("Name"),
            Cell::from("Type"),
            Cell::from("Algorithm"),
            Cell::from("Status"),
            Cell::from("Accuracy"),
            Cell::from("F1"),
            Cell::from("Version"),
            Cell::from("Trained"),
        ])
        .style(theme::table_header());

        let rows: Vec<Row> = self
            .cached_filtered
            .iter()
            .filter_map(|&i| self.models.get(i))
            .map(|m| {
                let status_style = match m.status {
                    ModelStatus::Active => theme::success(),
                    ModelStatus::Training => theme::warning(),
                    ModelStatus::Inactive => theme::dim(),
                    ModelStatus::Error => theme::error(),
                };
                Row::new(vec![
                    Cell::from(m.name.clone()),
                    Cell::from(m.model_type.clone()),
                    Cell::from(m.algorithm.clone()),
                    Cell::from(Span::styled(m.status.label(), status_style)),
                    Cell::from(fmt::percent(m.metrics.accuracy)),
                    Cell::from(fmt::percent(m.metrics.f1_score)),
                    Cell::from(m.version.clone()),
                    Cell::from(fmt::time_ago(m.last_trained)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Fill(3),
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::row_selected());
        let mut state = self.table_state.clone();
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let Some(model) = self.selected_model() else {
            return;
        };
        let popup = centered_rect(area, 64, 17);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(format!(" {} ", model.name), theme::title_style()))
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
            field("Type", model.model_type.clone()),
            field("Algorithm", model.algorithm.clone()),
            field("Status", model.status.label().to_owned()),
            field("Version", model.version.clone()),
            field("Accuracy", fmt::percent(model.metrics.accuracy)),
            field("Precision", fmt::percent(model.metrics.precision)),
            field("Recall", fmt::percent(model.metrics.recall)),
            field("F1 score", fmt::percent(model.metrics.f1_score)),
            field("Predictions", model.predictions.to_string()),
            field("False positives", model.false_positives.to_string()),
            field("Inference time", format!("{:.1} ms", model.inference_time)),
            field("Model size", model.model_size.clone()),
            field("Training data", model.training_data.clone()),
            field("Last trained", model.last_trained.to_rfc3339()),
            Line::default(),
            Line::from(Span::styled("  Esc close  t train  c configure  e export", theme::dim())),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_dialog(&self, frame: &mut Frame, area: Rect) {
        let Some(dialog) = self.dialog else {
            return;
        };
        let (title, options, cursor) = match dialog {
            Dialog::Configure(c) => (" Configure Model ", CONFIGURE_OPTIONS, c),
            Dialog::Export(c) => (" Export Model ", EXPORT_FORMATS, c),
        };
        #[allow(clippy::cast_possible_truncation)]
        let height = options.len() as u16 + 4;
        let popup = centered_rect(area, 44, height);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(title, theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let mut lines: Vec<Line> = options
            .iter()
            .enumerate()
            .map(|(i, opt)| {
                if i == cursor {
                    Line::from(Span::styled(format!(" > {opt}"), theme::key_hint()))
                } else {
                    Line::from(Span::styled(format!("   {opt}"), Style::default()))
                }
            })
            .collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(" j/k move  Enter select  Esc cancel", theme::dim())));
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_import(&self, frame: &mut Frame, area: Rect) {
        let Some(input) = &self.import_input else {
            return;
        };
        let popup = centered_rect(area, 52, 6);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(" Import Model ", theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let lines = vec![
            Line::from(vec![
                Span::styled(" Filename  ", theme::dim()),
                Span::raw(input.value().to_owned()),
                Span::raw("_"),
            ]),
            Line::default(),
            Line::from(Span::styled(
                format!(
                    " Allowed: {}",
                    MODEL_EXTENSIONS
                        .iter()
                        .map(|e| format!(".{e}"))
                        .collect::<Vec<_>>()
                        .join(" ")
                ),
                theme::dim(),
            )),
            Line::from(Span::styled(" Enter import  Esc cancel", theme::dim())),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Page for AiModelsPage {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.import_input.is_some() {
            return Ok(self.handle_import_key(key));
        }
        if self.dialog.is_some() {
            return Ok(self.handle_dialog_key(key));
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
                if self.selected_model().is_some() {
                    self.detail_open = true;
                }
                None
            }
            KeyCode::Char('t') => self.start_training(),
            KeyCode::Char('c') => {
                if self.selected_model().is_some() {
                    self.dialog = Some(Dialog::Configure(0));
                }
                None
            }
            KeyCode::Char('e') => {
                if self.selected_model().is_some() {
                    self.dialog = Some(Dialog::Export(0));
                }
                None
            }
            KeyCode::Char('i') => {
                self.import_input = Some(Input::default());
                None
            }
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
            Action::TrainModelDone { model_id } => return Ok(self.finish_training(*model_id)),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        self.render_table(frame, area);
        if self.detail_open {
            self.render_detail(frame, area);
        }
        if self.dialog.is_some() {
            self.render_dialog(frame, area);
        }
        if self.import_input.is_some() {
            self.render_import(frame, area);
        }
    }

    fn capturing_input(&self) -> bool {
        self.dialog.is_some() || self.import_input.is_some()
    }

    fn key_hints(&self) -> &'static str {
        "j/k move  Enter detail  t train  c configure  e export  i import"
    }

    fn id(&self) -> PageId {
        PageId::AiModels
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page() -> AiModelsPage {
        AiModelsPage::new(std::env::temp_dir())
    }

    #[test]
    fn training_moves_through_the_lifecycle() {
        let mut p = page();
        // Select a model that is not already training.
        let pos = p
            .models
            .iter()
            .position(|m| m.status != ModelStatus::Training)
            .unwrap();
        let sel = p.cached_filtered.iter().position(|&i| i == pos).unwrap();
        p.table_state.select(Some(sel));

        let action = p.start_training().unwrap();
        let Action::TrainModelRequest { model_id } = action else {
            panic!("expected a training request");
        };
        assert_eq!(p.models[pos].status, ModelStatus::Training);

        let before = p.models[pos].last_trained;
        let done = p.finish_training(model_id).unwrap();
        assert!(matches!(done, Action::Notify { .. }));
        assert_eq!(p.models[pos].status, ModelStatus::Active);
        assert!(p.models[pos].last_trained > before);
    }

    #[test]
    fn training_an_already_training_model_is_a_noop() {
        let mut p = page();
        let pos = p
            .models
            .iter()
            .position(|m| m.status == ModelStatus::Training)
            .unwrap();
        let sel = p.cached_filtered.iter().position(|&i| i == pos).unwrap();
        p.table_state.select(Some(sel));
        assert!(p.start_training().is_none());
    }

    #[test]
    fn import_rejects_disallowed_extensions() {
        let mut p = page();
        p.import_input = Some(Input::new("detector.exe".into()));
        let action = p.submit_import().unwrap();
        let Action::Notify { kind, message, .. } = action else {
            panic!("expected a notification");
        };
        assert_eq!(kind, otwatch_core::NotificationKind::Error);
        assert!(message.contains(".onnx"));
    }

    #[test]
    fn import_accepts_whitelisted_extensions() {
        let mut p = page();
        p.import_input = Some(Input::new("detector.onnx".into()));
        let action = p.submit_import().unwrap();
        let Action::Notify { kind, .. } = action else {
            panic!("expected a notification");
        };
        assert_eq!(kind, otwatch_core::NotificationKind::Success);
        assert!(p.import_input.is_none());
    }
}
