//! Workflows page — response playbooks and their running instances.
//!
//! Every load goes through the availability probe; when the backend is
//! away the page serves the built-in fixture set and says so.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use serde_json::json;
use tokio::sync::mpsc::UnboundedSender;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use otwatch_core::model::workflow::{InstanceStatus, WorkflowInstance, WorkflowTemplate};
use otwatch_core::sanitize::sanitize_input;

use otwatch_api::WorkflowSource;

use crate::action::{Action, ConfirmAction};
use crate::component::Page;
use crate::page::PageId;
use crate::screens::devices::centered_rect;
use crate::theme;
use crate::widgets::{fmt, sub_tabs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Tab {
    #[default]
    Templates,
    Instances,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CreateField {
    #[default]
    Name,
    Description,
    ThreatType,
    Actions,
}

#[derive(Default)]
struct CreateForm {
    name: Input,
    description: Input,
    threat_type: Input,
    /// Steps as `type:target:description`, separated by `;`.
    actions: Input,
    field: CreateField,
    error: Option<String>,
}

/// Parse the actions field. Steps missing a type or target are rejected.
fn parse_actions(raw: &str) -> Vec<serde_json::Value> {
    raw.split(';')
        .filter_map(|step| {
            let mut parts = step.splitn(3, ':');
            let action_type = sanitize_input(parts.next()?.trim());
            let target = sanitize_input(parts.next().unwrap_or("").trim());
            let description = sanitize_input(parts.next().unwrap_or("").trim());
            if action_type.is_empty() || target.is_empty() {
                return None;
            }
            Some(json!({
                "type": action_type,
                "target": target,
                "description": description,
            }))
        })
        .collect()
}

pub struct WorkflowsPage {
    action_tx: Option<UnboundedSender<Action>>,
    tab: Tab,
    templates: Vec<WorkflowTemplate>,
    instances: Vec<WorkflowInstance>,
    source: WorkflowSource,
    templates_state: TableState,
    instances_state: TableState,
    search_query: String,
    detail_open: bool,
    create_form: Option<CreateForm>,
    execute_input: Option<Input>,
    loading: bool,
}

impl WorkflowsPage {
    pub fn new() -> Self {
        Self {
            action_tx: None,
            tab: Tab::Templates,
            templates: Vec::new(),
            instances: Vec::new(),
            source: WorkflowSource::Backend,
            templates_state: TableState::default(),
            instances_state: TableState::default(),
            search_query: String::new(),
            detail_open: false,
            create_form: None,
            execute_input: None,
            loading: false,
        }
    }

    fn filtered_templates(&self) -> Vec<usize> {
        let q = self.search_query.to_lowercase();
        self.templates
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                q.is_empty()
                    || t.name.to_lowercase().contains(&q)
                    || t.threat_type.to_lowercase().contains(&q)
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn filtered_instances(&self) -> Vec<usize> {
        let q = self.search_query.to_lowercase();
        self.instances
            .iter()
            .enumerate()
            .filter(|(_, i)| {
                q.is_empty()
                    || i.template_name.to_lowercase().contains(&q)
                    || i.target_device.to_lowercase().contains(&q)
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn move_selection(&mut self, delta: isize) {
        let (state, len) = match self.tab {
            Tab::Templates => {
                let len = self.filtered_templates().len();
                (&mut self.templates_state, len)
            }
            Tab::Instances => {
                let len = self.filtered_instances().len();
                (&mut self.instances_state, len)
            }
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0);
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        let next = (current as isize + delta).rem_euclid(len as isize) as usize;
        state.select(Some(next));
    }

    fn selected_template(&self) -> Option<&WorkflowTemplate> {
        let sel = self.templates_state.selected()?;
        let idx = *self.filtered_templates().get(sel)?;
        self.templates.get(idx)
    }

    fn selected_instance(&self) -> Option<&WorkflowInstance> {
        let sel = self.instances_state.selected()?;
        let idx = *self.filtered_instances().get(sel)?;
        self.instances.get(idx)
    }

    fn submit_create(&mut self) -> Option<Action> {
        let form = self.create_form.as_mut()?;
        let name = sanitize_input(form.name.value());
        let description = sanitize_input(form.description.value());
        let threat_type = sanitize_input(form.threat_type.value());
        let actions = parse_actions(form.actions.value());

        if name.is_empty() {
            form.error = Some("Template name is required".into());
            return None;
        }
        if description.is_empty() {
            form.error = Some("Description is required".into());
            return None;
        }
        if actions.is_empty() {
            form.error = Some("At least one action is required (type:target:description)".into());
            return None;
        }

        let body = json!({
            "name": name,
            "description": description,
            "threat_type": if threat_type.is_empty() { "Generic".to_owned() } else { threat_type },
            "created_by": "operator",
            "actions": actions,
        });
        self.create_form = None;
        self.loading = true;
        Some(Action::WorkflowCreate(body))
    }

    fn handle_create_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.create_form = None;
                None
            }
            KeyCode::Enter => self.submit_create(),
            KeyCode::Tab | KeyCode::Down => {
                if let Some(form) = self.create_form.as_mut() {
                    form.field = match form.field {
                        CreateField::Name => CreateField::Description,
                        CreateField::Description => CreateField::ThreatType,
                        CreateField::ThreatType => CreateField::Actions,
                        CreateField::Actions => CreateField::Name,
                    };
                }
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                if let Some(form) = self.create_form.as_mut() {
                    form.field = match form.field {
                        CreateField::Name => CreateField::Actions,
                        CreateField::Description => CreateField::Name,
                        CreateField::ThreatType => CreateField::Description,
                        CreateField::Actions => CreateField::ThreatType,
                    };
                }
                None
            }
            _ => {
                if let Some(form) = self.create_form.as_mut() {
                    let input = match form.field {
                        CreateField::Name => &mut form.name,
                        CreateField::Description => &mut form.description,
                        CreateField::ThreatType => &mut form.threat_type,
                        CreateField::Actions => &mut form.actions,
                    };
                    input.handle_event(&crossterm::event::Event::Key(key));
                }
                None
            }
        }
    }

    fn handle_execute_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.execute_input = None;
                None
            }
            KeyCode::Enter => {
                let input = self.execute_input.take()?;
                let target = sanitize_input(input.value());
                if target.is_empty() {
                    return None;
                }
                let template_id = self.selected_template()?.id.clone();
                self.loading = true;
                Some(Action::WorkflowExecute {
                    template_id,
                    target_device: target,
                })
            }
            _ => {
                if let Some(input) = self.execute_input.as_mut() {
                    input.handle_event(&crossterm::event::Event::Key(key));
                }
                None
            }
        }
    }

    fn render_templates(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(vec![
            Cell::from("Name"),
            Cell::from("Threat type"),
            Cell::from("Steps"),
            Cell::from("Created by"),
            Cell::from("Created"),
        ])
        .style(theme::table_header());

        let rows: Vec<Row> = self
            .filtered_templates()
            .iter()
            .filter_map(|&i| self.templates.get(i))
            .map(|t| {
                Row::new(vec![
                    Cell::from(t.name.clone()),
                    Cell::from(t.threat_type.clone()),
                    Cell::from(t.actions.len().to_string()),
                    Cell::from(t.created_by.clone()),
                    Cell::from(fmt::time_ago(t.created_at)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Fill(3),
            Constraint::Fill(2),
            Constraint::Length(6),
            Constraint::Length(14),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::row_selected());
        let mut state = self.templates_state.clone();
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_instances(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(vec![
            Cell::from("Template"),
            Cell::from("Target"),
            Cell::from("Status"),
            Cell::from("Step"),
            Cell::from("Started by"),
            Cell::from("Started"),
        ])
        .style(theme::table_header());

        let rows: Vec<Row> = self
            .filtered_instances()
            .iter()
            .filter_map(|&i| self.instances.get(i))
            .map(|inst| {
                let status_style = match inst.status {
                    InstanceStatus::Completed => theme::success(),
                    InstanceStatus::InProgress | InstanceStatus::Pending => theme::warning(),
                    InstanceStatus::Failed => theme::error(),
                    InstanceStatus::Cancelled => theme::dim(),
                };
                Row::new(vec![
                    Cell::from(inst.template_name.clone()),
                    Cell::from(inst.target_device.clone()),
                    Cell::from(Span::styled(inst.status.label(), status_style)),
                    Cell::from(format!("{}/{}", inst.current_step, inst.total_steps)),
                    Cell::from(inst.started_by.clone()),
                    Cell::from(fmt::time_ago(inst.started_at)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Fill(3),
            Constraint::Fill(2),
            Constraint::Length(12),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::row_selected());
        let mut state = self.instances_state.clone();
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let field = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("  {label:<14}"), theme::dim()),
                Span::raw(value),
            ])
        };
        let (title, lines) = match self.tab {
            Tab::Templates => {
                let Some(t) = self.selected_template() else {
                    return;
                };
                let mut lines = vec![
                    field("Threat type", t.threat_type.clone()),
                    field("Created by", t.created_by.clone()),
                    field("Created", t.created_at.to_rfc3339()),
                    Line::default(),
                    Line::from(Span::styled(format!("  {}", t.description), ratatui::style::Style::default())),
                    Line::default(),
                    Line::from(Span::styled("  Steps", theme::table_header())),
                ];
                for (i, action) in t.actions.iter().enumerate() {
                    lines.push(Line::from(Span::raw(format!(
                        "  {}. {} -> {} ({})",
                        i + 1,
                        action.action_type,
                        action.target,
                        action.description
                    ))));
                }
                (format!(" {} ", t.name), lines)
            }
            Tab::Instances => {
                let Some(inst) = self.selected_instance() else {
                    return;
                };
                let lines = vec![
                    field("Template", inst.template_name.clone()),
                    field("Target", inst.target_device.clone()),
                    field("Status", inst.status.label().to_owned()),
                    field("Progress", format!("{}/{}", inst.current_step, inst.total_steps)),
                    field("Started by", inst.started_by.clone()),
                    field("Started", inst.started_at.to_rfc3339()),
                    field(
                        "Completed",
                        inst.completed_at.map_or_else(|| "-".into(), |t| t.to_rfc3339()),
                    ),
                    field("Alert", inst.alert_id.clone().unwrap_or_else(|| "-".into())),
                ];
                (format!(" Instance {} ", inst.id), lines)
            }
        };

        let popup = centered_rect(area, 68, 18);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(title, theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_create_form(&self, frame: &mut Frame, area: Rect) {
        let Some(form) = &self.create_form else {
            return;
        };
        let popup = centered_rect(area, 70, 12);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(" New Workflow Template ", theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let field_line = |label: &str, value: &str, active: bool| {
            let style = if active { theme::key_hint() } else { theme::dim() };
            Line::from(vec![
                Span::styled(format!(" {label:<12}"), style),
                Span::raw(value.to_owned()),
                Span::raw(if active { "_" } else { "" }),
            ])
        };
        let mut lines = vec![
            field_line("Name", form.name.value(), form.field == CreateField::Name),
            field_line("Description", form.description.value(), form.field == CreateField::Description),
            field_line("Threat type", form.threat_type.value(), form.field == CreateField::ThreatType),
            field_line("Actions", form.actions.value(), form.field == CreateField::Actions),
            Line::from(Span::styled(
                "   steps as type:target:description, separated by ;",
                theme::dim(),
            )),
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

    fn render_execute_prompt(&self, frame: &mut Frame, area: Rect) {
        let Some(input) = &self.execute_input else {
            return;
        };
        let popup = centered_rect(area, 52, 5);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(" Execute Workflow ", theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let lines = vec![
            Line::from(vec![
                Span::styled(" Target device  ", theme::dim()),
                Span::raw(input.value().to_owned()),
                Span::raw("_"),
            ]),
            Line::from(Span::styled(" Enter run  Esc cancel", theme::dim())),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Default for WorkflowsPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Page for WorkflowsPage {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.loading = true;
        let _ = action_tx.send(Action::WorkflowsReload);
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.create_form.is_some() {
            return Ok(self.handle_create_key(key));
        }
        if self.execute_input.is_some() {
            return Ok(self.handle_execute_key(key));
        }
        let action = match key.code {
            KeyCode::Char('[' | ']') => {
                self.tab = match self.tab {
                    Tab::Templates => Tab::Instances,
                    Tab::Instances => Tab::Templates,
                };
                self.detail_open = false;
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Enter => {
                let has_row = match self.tab {
                    Tab::Templates => self.selected_template().is_some(),
                    Tab::Instances => self.selected_instance().is_some(),
                };
                if has_row {
                    self.detail_open = true;
                }
                None
            }
            KeyCode::Char('r') => {
                self.loading = true;
                Some(Action::WorkflowsReload)
            }
            KeyCode::Char('n') if self.tab == Tab::Templates => {
                self.create_form = Some(CreateForm::default());
                None
            }
            KeyCode::Char('x') if self.tab == Tab::Templates => {
                if self.selected_template().is_some() {
                    self.execute_input = Some(Input::default());
                }
                None
            }
            KeyCode::Char('d') if self.tab == Tab::Templates => {
                self.selected_template().map(|t| {
                    Action::Confirm(ConfirmAction::DeleteWorkflowTemplate {
                        id: t.id.clone(),
                        name: t.name.clone(),
                    })
                })
            }
            KeyCode::Char('c') if self.tab == Tab::Instances => self
                .selected_instance()
                .filter(|i| !i.status.is_terminal())
                .map(|i| {
                    Action::Confirm(ConfirmAction::CancelWorkflowInstance {
                        id: i.id.clone(),
                        template_name: i.template_name.clone(),
                    })
                }),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SearchInput(query) => {
                self.search_query = query.clone();
            }
            Action::GoBack => {
                self.detail_open = false;
            }
            Action::WorkflowTemplatesLoaded { templates, source } => {
                self.loading = false;
                self.templates = templates.clone();
                self.source = *source;
                if self.templates_state.selected().is_none() && !self.templates.is_empty() {
                    self.templates_state.select(Some(0));
                }
            }
            Action::WorkflowInstancesLoaded { instances, source } => {
                self.loading = false;
                self.instances = instances.clone();
                self.source = *source;
                if self.instances_state.selected().is_none() && !self.instances.is_empty() {
                    self.instances_state.select(Some(0));
                }
            }
            Action::WorkflowCreated(template) => {
                self.loading = false;
                self.templates.push((**template).clone());
                return Ok(Some(Action::notify_success(
                    "Template created",
                    template.name.clone(),
                )));
            }
            Action::WorkflowDeleted(id) => {
                self.templates.retain(|t| t.id != *id);
                return Ok(Some(Action::notify_success("Template deleted", format!("Removed template {id}"))));
            }
            Action::WorkflowStarted(instance) => {
                self.loading = false;
                self.instances.insert(0, (**instance).clone());
                self.tab = Tab::Instances;
                self.instances_state.select(Some(0));
                return Ok(Some(Action::notify_success(
                    "Workflow started",
                    format!("{} on {}", instance.template_name, instance.target_device),
                )));
            }
            Action::WorkflowCancelled(instance) => {
                if let Some(existing) = self.instances.iter_mut().find(|i| i.id == instance.id) {
                    *existing = (**instance).clone();
                }
                return Ok(Some(Action::notify_info(
                    "Workflow cancelled",
                    instance.template_name.clone(),
                )));
            }
            Action::WorkflowBanner(message) => {
                self.loading = false;
                return Ok(Some(Action::notify_error("Workflow error", message.clone())));
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

        let active = match self.tab {
            Tab::Templates => 0,
            Tab::Instances => 1,
        };
        let mut tabs = sub_tabs::render_sub_tabs(&["Templates", "Instances"], active);
        if self.source == WorkflowSource::Fixture {
            tabs.push_span(Span::styled("   offline - fixture data", theme::warning()));
        }
        frame.render_widget(Paragraph::new(tabs), layout[0]);

        match self.tab {
            Tab::Templates => self.render_templates(frame, layout[1]),
            Tab::Instances => self.render_instances(frame, layout[1]),
        }

        let footer = if self.loading {
            Line::from(Span::styled("  loading...", theme::dim()))
        } else {
            Line::from(Span::styled(
                format!("  {} templates, {} instances", self.templates.len(), self.instances.len()),
                theme::dim(),
            ))
        };
        frame.render_widget(Paragraph::new(footer), layout[2]);

        if self.detail_open {
            self.render_detail(frame, area);
        }
        if self.create_form.is_some() {
            self.render_create_form(frame, area);
        }
        if self.execute_input.is_some() {
            self.render_execute_prompt(frame, area);
        }
    }

    fn capturing_input(&self) -> bool {
        self.create_form.is_some() || self.execute_input.is_some()
    }

    fn key_hints(&self) -> &'static str {
        "[/] tab  j/k move  r reload  n new  x execute  d delete  c cancel"
    }

    fn id(&self) -> PageId {
        PageId::Workflows
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn actions_parse_and_reject_incomplete_steps() {
        let parsed = parse_actions("isolate:PLC-Station-01:cut the port; notify:ops:page the on-call");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["type"], "isolate");
        assert_eq!(parsed[0]["target"], "PLC-Station-01");
        assert_eq!(parsed[1]["description"], "page the on-call");

        // Missing targets are dropped.
        assert!(parse_actions("isolate").is_empty());
        assert!(parse_actions("isolate:").is_empty());
        assert!(parse_actions("").is_empty());
    }

    #[test]
    fn create_requires_name_description_and_actions() {
        let mut p = WorkflowsPage::new();
        p.create_form = Some(CreateForm::default());
        assert!(p.submit_create().is_none());
        assert!(p.create_form.as_ref().unwrap().error.as_ref().unwrap().contains("name"));

        let form = p.create_form.as_mut().unwrap();
        form.name = Input::new("Lockdown".into());
        assert!(p.submit_create().is_none());

        let form = p.create_form.as_mut().unwrap();
        form.description = Input::new("Lock the cell".into());
        assert!(p.submit_create().is_none());
        assert!(p.create_form.as_ref().unwrap().error.as_ref().unwrap().contains("action"));

        let form = p.create_form.as_mut().unwrap();
        form.actions = Input::new("isolate:PLC-01:cut it".into());
        let action = p.submit_create().unwrap();
        let Action::WorkflowCreate(body) = action else {
            panic!("expected a create request");
        };
        assert_eq!(body["name"], "Lockdown");
        assert_eq!(body["threat_type"], "Generic");
        assert_eq!(body["actions"].as_array().unwrap().len(), 1);
        assert!(p.create_form.is_none());
    }

    #[test]
    fn cancel_is_offered_only_for_live_instances() {
        use chrono::Utc;

        let mut p = WorkflowsPage::new();
        p.tab = Tab::Instances;
        p.instances = vec![WorkflowInstance {
            id: "100".into(),
            template_id: "1".into(),
            template_name: "Isolate".into(),
            status: InstanceStatus::Completed,
            current_step: 3,
            total_steps: 3,
            target_device: "PLC-01".into(),
            started_at: Utc::now(),
            completed_at: Some(Utc::now()),
            started_by: "operator".into(),
            alert_id: None,
        }];
        p.instances_state.select(Some(0));
        let action = p
            .handle_key_event(KeyEvent::from(KeyCode::Char('c')))
            .unwrap();
        assert!(action.is_none());

        p.instances[0].status = InstanceStatus::InProgress;
        let action = p
            .handle_key_event(KeyEvent::from(KeyCode::Char('c')))
            .unwrap();
        assert!(matches!(
            action,
            Some(Action::Confirm(ConfirmAction::CancelWorkflowInstance { .. }))
        ));
    }
}
