//! Admin panel — password-gated modal with user management, system
//! configuration, security policies, the audit log, and the role matrix.
//!
//! Strength validation runs before the password comparison, so a weak
//! guess is rejected with the strength message even when it happens to
//! match nothing.

use std::path::PathBuf;

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table};
use secrecy::{ExposeSecret, SecretString};
use strum::IntoEnumIterator;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use otwatch_core::model::admin::{
    AuditLogEntry, AuditStatus, Capability, Role, SystemConfig, User, UserStatus,
};
use otwatch_core::sanitize::{clamp_numeric, sanitize_input, validate_email, validate_password};
use otwatch_core::{export, fixtures};

use crate::action::{Action, ConfirmAction};
use crate::screens::devices::centered_rect;
use crate::theme;
use crate::widgets::{fmt, sub_tabs};

/// Source address recorded for console-originated audit entries.
const CONSOLE_IP: &str = "10.20.0.99";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AdminTab {
    #[default]
    Users,
    SystemConfig,
    Policies,
    Audit,
    Permissions,
}

impl AdminTab {
    const ALL: [Self; 5] = [
        Self::Users,
        Self::SystemConfig,
        Self::Policies,
        Self::Audit,
        Self::Permissions,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Users => "Users",
            Self::SystemConfig => "System Config",
            Self::Policies => "Policies",
            Self::Audit => "Audit Log",
            Self::Permissions => "Permissions",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum UserField {
    #[default]
    Name,
    Email,
    Role,
    Status,
}

struct UserForm {
    /// `Some` when editing an existing account.
    editing: Option<u64>,
    name: Input,
    email: Input,
    role_idx: usize,
    status: UserStatus,
    field: UserField,
    error: Option<String>,
}

impl UserForm {
    fn blank() -> Self {
        Self {
            editing: None,
            name: Input::default(),
            email: Input::default(),
            role_idx: 0,
            status: UserStatus::Active,
            field: UserField::Name,
            error: None,
        }
    }

    fn for_user(user: &User, roles: &[Role]) -> Self {
        Self {
            editing: Some(user.id),
            name: Input::new(user.name.clone()),
            email: Input::new(user.email.clone()),
            role_idx: roles.iter().position(|r| *r == user.role).unwrap_or(0),
            status: user.status,
            field: UserField::Name,
            error: None,
        }
    }
}

/// Editable rows on the System Config tab, with their clamp bounds.
const CONFIG_FIELDS: [(&str, f64, f64); 5] = [
    ("Session timeout (min)", 5.0, 480.0),
    ("Max login attempts", 1.0, 10.0),
    ("Password expiry (days)", 0.0, 365.0),
    ("Log retention (days)", 1.0, 3650.0),
    ("Alert threshold (events/min)", 1.0, 10_000.0),
];

pub struct AdminPanel {
    unlocked: bool,
    password_input: Input,
    password_error: Option<String>,
    tab: AdminTab,
    users: Vec<User>,
    audit: Vec<AuditLogEntry>,
    config: SystemConfig,
    policies: Vec<(&'static str, bool)>,
    roles: Vec<Role>,
    /// Index into `users`; the account whose role gates every mutation.
    acting_idx: usize,
    cursor: usize,
    user_form: Option<UserForm>,
    config_edit: Option<Input>,
    denial: Option<String>,
    next_audit_id: u64,
    admin_password: SecretString,
    export_dir: PathBuf,
}

impl AdminPanel {
    pub fn new(admin_password: SecretString, export_dir: PathBuf) -> Self {
        let audit = fixtures::seed_audit_log();
        let next_audit_id = audit.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        Self {
            unlocked: false,
            password_input: Input::default(),
            password_error: None,
            tab: AdminTab::Users,
            users: fixtures::seed_users(),
            audit,
            config: SystemConfig::default(),
            policies: vec![
                ("Block unknown Modbus function codes", true),
                ("Quarantine devices failing 3 scans", true),
                ("Require change window for PLC writes", true),
                ("Alert on new MAC in OT subnets", true),
                ("Auto-archive captures after 30 days", false),
            ],
            roles: Role::iter().collect(),
            acting_idx: 0,
            cursor: 0,
            user_form: None,
            config_edit: None,
            denial: None,
            next_audit_id,
            admin_password,
            export_dir,
        }
    }

    /// Lock again when the modal closes; the password is re-entered per visit.
    pub fn reset(&mut self) {
        self.unlocked = false;
        self.password_input.reset();
        self.password_error = None;
        self.user_form = None;
        self.config_edit = None;
        self.denial = None;
    }

    fn acting_user(&self) -> &User {
        &self.users[self.acting_idx.min(self.users.len() - 1)]
    }

    fn acting_role(&self) -> Role {
        self.acting_user().role
    }

    fn audit_push(&mut self, action: &str, resource: &str, status: AuditStatus) {
        let entry = AuditLogEntry {
            id: self.next_audit_id,
            timestamp: Utc::now(),
            user: self.acting_user().email.clone(),
            action: action.to_owned(),
            resource: resource.to_owned(),
            status,
            ip: CONSOLE_IP.into(),
        };
        self.next_audit_id += 1;
        self.audit.insert(0, entry);
    }

    /// Check a capability against the acting role; records the denial.
    fn allowed(&mut self, capability: Capability) -> bool {
        let role = self.acting_role();
        if role.allows(capability) {
            self.denial = None;
            true
        } else {
            self.denial = Some(format!(
                "Role {} is not permitted to {}.",
                role.label(),
                capability.label()
            ));
            false
        }
    }

    fn try_unlock(&mut self) {
        let candidate = sanitize_input(self.password_input.value());
        if !validate_password(&candidate) {
            self.password_error = Some("Password does not meet security requirements.".into());
            return;
        }
        if candidate != self.admin_password.expose_secret() {
            self.password_error = Some("Incorrect password.".into());
            self.audit_push("admin login", "admin panel", AuditStatus::Failed);
            return;
        }
        self.unlocked = true;
        self.password_error = None;
        self.password_input.reset();
        self.audit_push("admin login", "admin panel", AuditStatus::Success);
    }

    fn next_user_id(&self) -> u64 {
        self.users.iter().map(|u| u.id).max().unwrap_or(0) + 1
    }

    fn email_taken(&self, email: &str, exclude: Option<u64>) -> bool {
        let lower = email.to_lowercase();
        self.users
            .iter()
            .any(|u| Some(u.id) != exclude && u.email.to_lowercase() == lower)
    }

    fn submit_user_form(&mut self) {
        let Some(form) = self.user_form.as_mut() else {
            return;
        };
        let name = sanitize_input(form.name.value());
        let email = sanitize_input(form.email.value());
        let count = name.chars().count();
        if count < 2 || count > 50 {
            form.error = Some("Name must be 2-50 characters".into());
            return;
        }
        if !validate_email(&email) {
            form.error = Some("Invalid email address".into());
            return;
        }
        let editing = form.editing;
        if self.email_taken(&email, editing) {
            // Re-borrow: email_taken needed &self.
            if let Some(form) = self.user_form.as_mut() {
                form.error = Some("Email address already in use".into());
            }
            return;
        }
        let Some(form) = self.user_form.take() else {
            return;
        };
        let role = self.roles[form.role_idx % self.roles.len()];
        match editing {
            Some(id) => {
                if let Some(user) = self.users.iter_mut().find(|u| u.id == id) {
                    user.name = name.clone();
                    user.email = email;
                    user.role = role;
                    user.status = form.status;
                }
                self.audit_push("edit user", &name, AuditStatus::Success);
            }
            None => {
                self.users.push(User {
                    id: self.next_user_id(),
                    name: name.clone(),
                    email,
                    role,
                    status: form.status,
                    last_login: Utc::now(),
                });
                self.audit_push("add user", &name, AuditStatus::Success);
            }
        }
    }

    fn handle_user_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.user_form = None,
            KeyCode::Enter => self.submit_user_form(),
            KeyCode::Tab | KeyCode::Down => {
                if let Some(form) = self.user_form.as_mut() {
                    form.field = match form.field {
                        UserField::Name => UserField::Email,
                        UserField::Email => UserField::Role,
                        UserField::Role => UserField::Status,
                        UserField::Status => UserField::Name,
                    };
                }
            }
            KeyCode::BackTab | KeyCode::Up => {
                if let Some(form) = self.user_form.as_mut() {
                    form.field = match form.field {
                        UserField::Name => UserField::Status,
                        UserField::Email => UserField::Name,
                        UserField::Role => UserField::Email,
                        UserField::Status => UserField::Role,
                    };
                }
            }
            KeyCode::Left | KeyCode::Right => {
                let roles = self.roles.len();
                if let Some(form) = self.user_form.as_mut() {
                    match form.field {
                        UserField::Role => {
                            form.role_idx = if key.code == KeyCode::Left {
                                (form.role_idx + roles - 1) % roles
                            } else {
                                (form.role_idx + 1) % roles
                            };
                        }
                        UserField::Status => {
                            form.status = match form.status {
                                UserStatus::Active => UserStatus::Inactive,
                                UserStatus::Inactive => UserStatus::Active,
                            };
                        }
                        _ => {}
                    }
                }
            }
            _ => {
                if let Some(form) = self.user_form.as_mut() {
                    let input = match form.field {
                        UserField::Name => &mut form.name,
                        UserField::Email => &mut form.email,
                        UserField::Role | UserField::Status => return,
                    };
                    input.handle_event(&crossterm::event::Event::Key(key));
                }
            }
        }
    }

    fn apply_config_edit(&mut self) {
        let Some(input) = self.config_edit.take() else {
            return;
        };
        let Some(&(name, min, max)) = CONFIG_FIELDS.get(self.cursor) else {
            return;
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = clamp_numeric(input.value(), min, max) as u32;
        match self.cursor {
            0 => self.config.session_timeout = value,
            1 => self.config.max_login_attempts = value,
            2 => self.config.password_expiry = value,
            3 => self.config.log_retention = value,
            4 => self.config.alert_threshold = value,
            _ => {}
        }
        self.audit_push("modify config", name, AuditStatus::Success);
    }

    fn export_users(&mut self) -> Option<Action> {
        if !self.allowed(Capability::ExportData) {
            return None;
        }
        let csv = export::users_csv(&self.users);
        let filename = export::export_filename("users", "csv");
        let path = self.export_dir.join(&filename);
        let action = match std::fs::write(&path, csv) {
            Ok(()) => {
                self.audit_push("export users", "users.csv", AuditStatus::Success);
                Action::notify_success("Export complete", format!("Wrote {}", path.display()))
            }
            Err(err) => Action::notify_error("Export failed", err.to_string()),
        };
        Some(action)
    }

    /// Remove a user after the confirmation dialog. Routed back through
    /// the shell so the dialog renders above the modal.
    pub fn delete_user(&mut self, id: u64) {
        if let Some(pos) = self.users.iter().position(|u| u.id == id) {
            let name = self.users[pos].name.clone();
            if pos == self.acting_idx {
                // Never delete the acting account.
                self.denial = Some("Cannot delete the signed-in account.".into());
                return;
            }
            self.users.remove(pos);
            if self.acting_idx > pos {
                self.acting_idx -= 1;
            }
            self.cursor = self.cursor.min(self.users.len().saturating_sub(1));
            self.audit_push("delete user", &name, AuditStatus::Success);
        }
    }

    fn tab_row_count(&self) -> usize {
        match self.tab {
            AdminTab::Users => self.users.len(),
            AdminTab::SystemConfig => CONFIG_FIELDS.len() + 1, // plus the 2FA toggle
            AdminTab::Policies => self.policies.len(),
            AdminTab::Audit => self.audit.len(),
            AdminTab::Permissions => self.roles.len(),
        }
    }

    fn handle_unlocked_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.user_form.is_some() {
            self.handle_user_form_key(key);
            return None;
        }
        if self.config_edit.is_some() {
            match key.code {
                KeyCode::Esc => self.config_edit = None,
                KeyCode::Enter => self.apply_config_edit(),
                _ => {
                    if let Some(input) = self.config_edit.as_mut() {
                        input.handle_event(&crossterm::event::Event::Key(key));
                    }
                }
            }
            return None;
        }

        match key.code {
            KeyCode::Esc => return Some(Action::ToggleAdmin),
            KeyCode::Char(c @ '1'..='5') => {
                let idx = (c as usize) - ('1' as usize);
                self.tab = AdminTab::ALL[idx];
                self.cursor = 0;
                self.denial = None;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let len = self.tab_row_count();
                if len > 0 {
                    self.cursor = (self.cursor + 1) % len;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let len = self.tab_row_count();
                if len > 0 {
                    self.cursor = (self.cursor + len - 1) % len;
                }
            }
            KeyCode::Char('a') if self.tab == AdminTab::Users => {
                if self.allowed(Capability::AddUsers) {
                    self.user_form = Some(UserForm::blank());
                }
            }
            KeyCode::Char('e') if self.tab == AdminTab::Users => {
                if self.allowed(Capability::EditUsers)
                    && let Some(user) = self.users.get(self.cursor)
                {
                    self.user_form = Some(UserForm::for_user(user, &self.roles));
                }
            }
            KeyCode::Char('d') if self.tab == AdminTab::Users => {
                if self.allowed(Capability::DeleteUsers)
                    && let Some(user) = self.users.get(self.cursor)
                {
                    return Some(Action::Confirm(ConfirmAction::DeleteUser {
                        id: user.id,
                        name: user.name.clone(),
                    }));
                }
            }
            KeyCode::Char('o') if self.tab == AdminTab::Users => {
                // Operate as the selected account; gates follow its role.
                if self.cursor < self.users.len() {
                    self.acting_idx = self.cursor;
                    self.denial = None;
                }
            }
            KeyCode::Char('x') if self.tab == AdminTab::Users => return self.export_users(),
            KeyCode::Enter if self.tab == AdminTab::SystemConfig => {
                if self.allowed(Capability::ModifySystemConfig) {
                    if self.cursor < CONFIG_FIELDS.len() {
                        self.config_edit = Some(Input::default());
                    } else {
                        self.config.enable_two_factor = !self.config.enable_two_factor;
                        self.audit_push("modify config", "two-factor", AuditStatus::Success);
                    }
                }
            }
            KeyCode::Char(' ') if self.tab == AdminTab::Policies => {
                if self.allowed(Capability::ManagePolicies)
                    && let Some(policy) = self.policies.get_mut(self.cursor)
                {
                    policy.1 = !policy.1;
                    let name = policy.0;
                    self.audit_push("toggle policy", name, AuditStatus::Success);
                }
            }
            _ => {}
        }
        None
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        if self.unlocked {
            return self.handle_unlocked_key(key);
        }
        match key.code {
            KeyCode::Esc => return Some(Action::ToggleAdmin),
            KeyCode::Enter => self.try_unlock(),
            _ => {
                self.password_input.handle_event(&crossterm::event::Event::Key(key));
            }
        }
        None
    }

    // ── Rendering ────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if self.unlocked {
            self.render_panel(frame, area);
        } else {
            self.render_lock(frame, area);
        }
    }

    fn render_lock(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(area, 48, 7);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(" Admin Access ", theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let masked = "*".repeat(self.password_input.value().chars().count());
        let mut lines = vec![
            Line::from(vec![
                Span::styled(" Password  ", theme::dim()),
                Span::raw(masked),
                Span::raw("_"),
            ]),
            Line::default(),
        ];
        if let Some(err) = &self.password_error {
            lines.push(Line::from(Span::styled(format!(" {err}"), theme::error())));
        }
        lines.push(Line::from(Span::styled(" Enter unlock  Esc close", theme::dim())));
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_panel(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(area, area.width.saturating_sub(8).max(60), area.height.saturating_sub(4).max(16));
        frame.render_widget(Clear, popup);
        let title = format!(" Admin Panel - acting as {} ({}) ", self.acting_user().name, self.acting_role().label());
        let block = Block::default()
            .title(Span::styled(title, theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

        let labels: Vec<&str> = AdminTab::ALL.iter().map(|t| t.label()).collect();
        let active = AdminTab::ALL.iter().position(|t| *t == self.tab).unwrap_or(0);
        frame.render_widget(Paragraph::new(sub_tabs::render_sub_tabs(&labels, active)), layout[0]);

        match self.tab {
            AdminTab::Users => self.render_users(frame, layout[1]),
            AdminTab::SystemConfig => self.render_config(frame, layout[1]),
            AdminTab::Policies => self.render_policies(frame, layout[1]),
            AdminTab::Audit => self.render_audit(frame, layout[1]),
            AdminTab::Permissions => self.render_permissions(frame, layout[1]),
        }

        let footer = if let Some(denial) = &self.denial {
            Line::from(Span::styled(format!(" {denial}"), theme::error()))
        } else {
            Line::from(Span::styled(
                match self.tab {
                    AdminTab::Users => " 1-5 tab  j/k move  a add  e edit  d delete  o act as  x export  Esc close",
                    AdminTab::SystemConfig => " 1-5 tab  j/k move  Enter edit/toggle  Esc close",
                    AdminTab::Policies => " 1-5 tab  j/k move  space toggle  Esc close",
                    _ => " 1-5 tab  j/k move  Esc close",
                },
                theme::dim(),
            ))
        };
        frame.render_widget(Paragraph::new(footer), layout[2]);

        if self.user_form.is_some() {
            self.render_user_form(frame, area);
        }
    }

    fn render_users(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(vec![
            Cell::from("Name"),
            Cell::from("Email"),
            Cell::from("Role"),
            Cell::from("Status"),
            Cell::from("Last login"),
        ])
        .style(theme::table_header());

        let rows: Vec<Row> = self
            .users
            .iter()
            .enumerate()
            .map(|(i, u)| {
                let style = if i == self.cursor { theme::row_selected() } else { ratatui::style::Style::default() };
                Row::new(vec![
                    Cell::from(format!(
                        "{}{}",
                        if i == self.acting_idx { "> " } else { "  " },
                        u.name
                    )),
                    Cell::from(u.email.clone()),
                    Cell::from(u.role.label()),
                    Cell::from(Span::styled(
                        u.status.label(),
                        match u.status {
                            UserStatus::Active => theme::success(),
                            UserStatus::Inactive => theme::dim(),
                        },
                    )),
                    Cell::from(fmt::time_ago(u.last_login)),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Fill(2),
            Constraint::Fill(3),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(10),
        ];
        frame.render_widget(Table::new(rows, widths).header(header), area);
    }

    fn render_config(&self, frame: &mut Frame, area: Rect) {
        let values = [
            self.config.session_timeout.to_string(),
            self.config.max_login_attempts.to_string(),
            self.config.password_expiry.to_string(),
            self.config.log_retention.to_string(),
            self.config.alert_threshold.to_string(),
        ];
        let mut lines: Vec<Line> = CONFIG_FIELDS
            .iter()
            .zip(values.iter())
            .enumerate()
            .map(|(i, (&(name, _, _), value))| {
                let style = if i == self.cursor { theme::key_hint() } else { theme::dim() };
                let shown = if i == self.cursor && self.config_edit.is_some() {
                    let edit = self.config_edit.as_ref().map(tui_input::Input::value).unwrap_or_default();
                    format!("{edit}_")
                } else {
                    value.clone()
                };
                Line::from(vec![
                    Span::styled(format!(" {name:<32}"), style),
                    Span::raw(shown),
                ])
            })
            .collect();
        let twofa_idx = CONFIG_FIELDS.len();
        let style = if self.cursor == twofa_idx { theme::key_hint() } else { theme::dim() };
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<32}", "Two-factor authentication"), style),
            Span::styled(
                if self.config.enable_two_factor { "enabled" } else { "disabled" },
                if self.config.enable_two_factor { theme::success() } else { theme::dim() },
            ),
        ]));
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_policies(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .policies
            .iter()
            .enumerate()
            .map(|(i, (name, enabled))| {
                let style = if i == self.cursor { theme::key_hint() } else { theme::dim() };
                Line::from(vec![
                    Span::styled(if *enabled { " [x] " } else { " [ ] " }, style),
                    Span::styled(*name, if *enabled { ratatui::style::Style::default() } else { theme::dim() }),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_audit(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(vec![
            Cell::from("Time"),
            Cell::from("User"),
            Cell::from("Action"),
            Cell::from("Resource"),
            Cell::from("Status"),
            Cell::from("IP"),
        ])
        .style(theme::table_header());

        let rows: Vec<Row> = self
            .audit
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let style = if i == self.cursor { theme::row_selected() } else { ratatui::style::Style::default() };
                Row::new(vec![
                    Cell::from(fmt::time_ago(e.timestamp)),
                    Cell::from(e.user.clone()),
                    Cell::from(e.action.clone()),
                    Cell::from(e.resource.clone()),
                    Cell::from(Span::styled(
                        e.status.label(),
                        match e.status {
                            AuditStatus::Success => theme::success(),
                            AuditStatus::Failed => theme::error(),
                        },
                    )),
                    Cell::from(e.ip.clone()),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(10),
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Length(8),
            Constraint::Length(14),
        ];
        frame.render_widget(Table::new(rows, widths).header(header), area);
    }

    fn render_permissions(&self, frame: &mut Frame, area: Rect) {
        let mut header_cells = vec![Cell::from("Role")];
        for cap in Capability::iter() {
            header_cells.push(Cell::from(cap.label()));
        }
        let header = Row::new(header_cells).style(theme::table_header());

        let rows: Vec<Row> = self
            .roles
            .iter()
            .map(|role| {
                let mut cells = vec![Cell::from(role.label())];
                for cap in Capability::iter() {
                    cells.push(if role.allows(cap) {
                        Cell::from(Span::styled("yes", theme::success()))
                    } else {
                        Cell::from(Span::styled("no", theme::dim()))
                    });
                }
                Row::new(cells)
            })
            .collect();

        let mut widths = vec![Constraint::Length(10)];
        widths.extend(std::iter::repeat_n(Constraint::Fill(1), Capability::iter().count()));
        frame.render_widget(Table::new(rows, widths).header(header), area);
    }

    fn render_user_form(&self, frame: &mut Frame, area: Rect) {
        let Some(form) = &self.user_form else {
            return;
        };
        let popup = centered_rect(area, 52, 11);
        frame.render_widget(Clear, popup);
        let title = if form.editing.is_some() { " Edit User " } else { " Add User " };
        let block = Block::default()
            .title(Span::styled(title, theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let field_line = |label: &str, value: String, active: bool| {
            let style = if active { theme::key_hint() } else { theme::dim() };
            Line::from(vec![
                Span::styled(format!(" {label:<8}"), style),
                Span::raw(value),
                Span::raw(if active { "_" } else { "" }),
            ])
        };
        let role = self.roles[form.role_idx % self.roles.len()];
        let mut lines = vec![
            field_line("Name", form.name.value().to_owned(), form.field == UserField::Name),
            field_line("Email", form.email.value().to_owned(), form.field == UserField::Email),
            field_line("Role", format!("< {} >", role.label()), form.field == UserField::Role),
            field_line("Status", format!("< {} >", form.status.label()), form.field == UserField::Status),
            Line::default(),
        ];
        if let Some(err) = &form.error {
            lines.push(Line::from(Span::styled(format!(" {err}"), theme::error())));
        }
        lines.push(Line::from(Span::styled(
            " Tab next  arrows cycle  Enter save  Esc cancel",
            theme::dim(),
        )));
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn panel() -> AdminPanel {
        AdminPanel::new(SecretString::from("SecureAdmin2024!"), std::env::temp_dir())
    }

    fn unlock(panel: &mut AdminPanel) {
        panel.password_input = Input::new("SecureAdmin2024!".into());
        panel.try_unlock();
        assert!(panel.unlocked);
    }

    #[test]
    fn weak_password_fails_strength_before_comparison() {
        let mut p = panel();
        p.password_input = Input::new("weak".into());
        p.try_unlock();
        assert!(!p.unlocked);
        assert_eq!(
            p.password_error.unwrap(),
            "Password does not meet security requirements."
        );
    }

    #[test]
    fn strong_but_wrong_password_is_incorrect_and_audited() {
        let mut p = panel();
        let audit_len = p.audit.len();
        p.password_input = Input::new("WrongPass2024!".into());
        p.try_unlock();
        assert!(!p.unlocked);
        assert_eq!(p.password_error.unwrap(), "Incorrect password.");
        assert_eq!(p.audit.len(), audit_len + 1);
        assert_eq!(p.audit[0].status, AuditStatus::Failed);
    }

    #[test]
    fn correct_password_unlocks() {
        let mut p = panel();
        unlock(&mut p);
        assert_eq!(p.audit[0].action, "admin login");
        assert_eq!(p.audit[0].status, AuditStatus::Success);
    }

    #[test]
    fn duplicate_email_is_rejected_case_insensitively() {
        let mut p = panel();
        unlock(&mut p);
        let existing = p.users[1].email.to_uppercase();
        let mut form = UserForm::blank();
        form.name = Input::new("Dupe Person".into());
        form.email = Input::new(existing);
        p.user_form = Some(form);
        let before = p.users.len();
        p.submit_user_form();
        assert_eq!(p.users.len(), before);
        assert_eq!(
            p.user_form.unwrap().error.unwrap(),
            "Email address already in use"
        );
    }

    #[test]
    fn name_length_bounds_are_enforced() {
        let mut p = panel();
        unlock(&mut p);
        let mut form = UserForm::blank();
        form.name = Input::new("A".into());
        form.email = Input::new("a@plant.example.com".into());
        p.user_form = Some(form);
        p.submit_user_form();
        assert!(p.user_form.unwrap().error.unwrap().contains("2-50"));
    }

    #[test]
    fn add_user_appends_and_audits() {
        let mut p = panel();
        unlock(&mut p);
        let mut form = UserForm::blank();
        form.name = Input::new("Dana Ito".into());
        form.email = Input::new("dana.ito@plant.example.com".into());
        p.user_form = Some(form);
        let before = p.users.len();
        p.submit_user_form();
        assert_eq!(p.users.len(), before + 1);
        assert!(p.user_form.is_none());
        assert_eq!(p.audit[0].action, "add user");
    }

    #[test]
    fn edit_keeps_the_users_own_email() {
        let mut p = panel();
        unlock(&mut p);
        let user = p.users[1].clone();
        let form = UserForm::for_user(&user, &p.roles.clone());
        p.user_form = Some(form);
        p.submit_user_form();
        // Unchanged email on the same account is not a duplicate.
        assert!(p.user_form.is_none());
        assert_eq!(p.audit[0].action, "edit user");
    }

    #[test]
    fn capability_gates_follow_the_acting_role() {
        let mut p = panel();
        unlock(&mut p);
        // Seeded user 2 is an Operator.
        let operator_idx = p.users.iter().position(|u| u.role == Role::Operator).unwrap();
        p.acting_idx = operator_idx;
        assert!(!p.allowed(Capability::AddUsers));
        assert!(p.denial.as_ref().unwrap().contains("Operator"));
        assert!(p.allowed(Capability::ViewAudit));
        assert!(p.denial.is_none());
    }

    #[test]
    fn deleting_the_acting_account_is_refused() {
        let mut p = panel();
        unlock(&mut p);
        let id = p.users[p.acting_idx].id;
        let before = p.users.len();
        p.delete_user(id);
        assert_eq!(p.users.len(), before);
        assert!(p.denial.as_ref().unwrap().contains("signed-in"));
    }

    #[test]
    fn delete_shifts_the_acting_index() {
        let mut p = panel();
        unlock(&mut p);
        p.acting_idx = 2;
        let id = p.users[0].id;
        p.delete_user(id);
        assert_eq!(p.acting_idx, 1);
        assert_eq!(p.audit[0].action, "delete user");
    }

    #[test]
    fn config_edits_clamp_to_bounds() {
        let mut p = panel();
        unlock(&mut p);
        p.cursor = 0; // session timeout, 5..480
        p.config_edit = Some(Input::new("99999".into()));
        p.apply_config_edit();
        assert_eq!(p.config.session_timeout, 480);

        p.cursor = 1; // max login attempts, 1..10
        p.config_edit = Some(Input::new("not a number".into()));
        p.apply_config_edit();
        assert_eq!(p.config.max_login_attempts, 1);
    }

    #[test]
    fn reset_locks_the_panel_again() {
        let mut p = panel();
        unlock(&mut p);
        p.reset();
        assert!(!p.unlocked);
        assert!(p.password_input.value().is_empty());
    }
}
