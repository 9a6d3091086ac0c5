//! Page component trait.

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;
use crate::page::PageId;

/// Every console page implements this.
///
/// Lifecycle: `init` once at mount, then any interleaving of
/// `handle_key_event`, `update`, and `render`.
pub trait Page: Send {
    /// Called once when the page is mounted. Receives the action sender
    /// for background dispatches.
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    /// Handle a key that the shell delegated to this page. Return an
    /// action to dispatch, or `None` when the key was absorbed or ignored.
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Process a dispatched action. May return a follow-up action.
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Render into the content area.
    fn render(&self, frame: &mut Frame, area: Rect);

    /// Whether an in-page overlay (form, dialog) currently captures keys.
    /// While true the shell suppresses its global shortcuts.
    fn capturing_input(&self) -> bool {
        false
    }

    /// Key hints shown in the status bar while this page is active.
    fn key_hints(&self) -> &'static str {
        ""
    }

    fn id(&self) -> PageId;
}
