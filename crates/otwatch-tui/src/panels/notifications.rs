//! Notifications drawer — right-hand overlay over the session store.
//!
//! The store itself lives in the shell; the drawer only keeps its cursor.
//! Opening an error entry deep-links to the Threats page.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use otwatch_core::{NotificationKind, NotificationStore};

use crate::action::{Action, ConfirmAction};
use crate::page::PageId;
use crate::theme;
use crate::widgets::fmt;

#[derive(Default)]
pub struct NotificationsDrawer {
    cursor: usize,
}

impl NotificationsDrawer {
    /// Drawer column width.
    pub const WIDTH: u16 = 46;

    pub fn new() -> Self {
        Self::default()
    }

    fn clamp_cursor(&mut self, store: &NotificationStore) {
        if store.is_empty() {
            self.cursor = 0;
        } else if self.cursor >= store.len() {
            self.cursor = store.len() - 1;
        }
    }

    fn selected_id(&self, store: &NotificationStore) -> Option<u64> {
        store.entries().get(self.cursor).map(|n| n.id)
    }

    /// Handle a key while the drawer is open. Mutates the store directly;
    /// returns a follow-up action for the shell when needed.
    pub fn handle_key_event(
        &mut self,
        key: KeyEvent,
        store: &mut NotificationStore,
    ) -> Option<Action> {
        match key.code {
            KeyCode::Esc => return Some(Action::ToggleNotifications),
            KeyCode::Char('j') | KeyCode::Down => {
                if !store.is_empty() {
                    self.cursor = (self.cursor + 1) % store.len();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if !store.is_empty() {
                    self.cursor = (self.cursor + store.len() - 1) % store.len();
                }
            }
            KeyCode::Enter => {
                let id = self.selected_id(store)?;
                let kind = store.get(id).map(|n| n.kind)?;
                store.mark_read(id);
                // Error notifications jump straight to triage.
                if kind == NotificationKind::Error {
                    return Some(Action::SwitchPage(PageId::Threats));
                }
            }
            KeyCode::Char('a') => {
                if let Some(id) = self.selected_id(store) {
                    store.acknowledge(id);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id(store) {
                    store.remove(id);
                    self.clamp_cursor(store);
                }
            }
            KeyCode::Char('R') => store.mark_all_read(),
            KeyCode::Char('C') => {
                if !store.is_empty() {
                    return Some(Action::Confirm(ConfirmAction::ClearNotifications));
                }
            }
            _ => {}
        }
        None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, store: &NotificationStore) {
        let width = Self::WIDTH.min(area.width);
        let drawer = Rect {
            x: area.x + area.width - width,
            y: area.y,
            width,
            height: area.height,
        };
        frame.render_widget(Clear, drawer);

        let title = format!(" Notifications ({} unread) ", store.unread_count());
        let block = Block::default()
            .title(Span::styled(title, theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(drawer);
        frame.render_widget(block, drawer);

        if store.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled("  nothing yet", theme::dim()))),
                inner,
            );
            return;
        }

        let mut lines: Vec<Line> = Vec::new();
        for (i, n) in store.entries().iter().enumerate() {
            let marker = if i == self.cursor { ">" } else { " " };
            let unread = if n.read { " " } else { "*" };
            let title_style = if n.read {
                theme::dim()
            } else {
                Style::default()
                    .fg(theme::notification_color(n.kind))
                    .add_modifier(Modifier::BOLD)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{marker}{unread} "), theme::key_hint()),
                Span::styled(n.title.clone(), title_style),
                Span::styled(
                    format!("  {}{}", fmt::time_ago(n.timestamp), if n.acknowledged { "  ack" } else { "" }),
                    theme::dim(),
                ),
            ]));
            lines.push(Line::from(Span::styled(format!("    {}", n.message), Style::default())));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            " Enter open  a ack  d remove  R read all  C clear  Esc close",
            theme::dim(),
        )));
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store_with(n: usize) -> NotificationStore {
        let mut store = NotificationStore::new();
        for i in 0..n {
            store.push(NotificationKind::Info, format!("t{i}"), "m");
        }
        store
    }

    #[test]
    fn enter_on_error_deep_links_to_threats() {
        let mut drawer = NotificationsDrawer::new();
        let mut store = NotificationStore::new();
        store.push(NotificationKind::Error, "Device unreachable", "RTU-Field-12");
        let action = drawer.handle_key_event(KeyEvent::from(KeyCode::Enter), &mut store);
        assert!(matches!(action, Some(Action::SwitchPage(PageId::Threats))));
        assert!(store.entries()[0].read);
    }

    #[test]
    fn enter_on_info_only_marks_read() {
        let mut drawer = NotificationsDrawer::new();
        let mut store = store_with(1);
        let action = drawer.handle_key_event(KeyEvent::from(KeyCode::Enter), &mut store);
        assert!(action.is_none());
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn remove_clamps_the_cursor() {
        let mut drawer = NotificationsDrawer::new();
        let mut store = store_with(2);
        drawer.cursor = 1;
        drawer.handle_key_event(KeyEvent::from(KeyCode::Char('d')), &mut store);
        assert_eq!(store.len(), 1);
        assert_eq!(drawer.cursor, 0);
    }

    #[test]
    fn clear_asks_for_confirmation() {
        let mut drawer = NotificationsDrawer::new();
        let mut store = store_with(3);
        let action = drawer.handle_key_event(KeyEvent::from(KeyCode::Char('C')), &mut store);
        assert!(matches!(
            action,
            Some(Action::Confirm(ConfirmAction::ClearNotifications))
        ));
        // Nothing removed until the dialog is confirmed.
        assert_eq!(store.len(), 3);
    }
}
