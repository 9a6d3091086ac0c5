//! Assistant panel — keyword-matched canned responses.
//!
//! Purely decorative: no model behind it, just a rule table over the
//! sanitized prompt.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use otwatch_core::sanitize::sanitize_input;

use crate::action::Action;
use crate::theme;

/// Keyword rules, first match wins.
const RESPONSES: &[(&str, &str)] = &[
    (
        "threat",
        "The Threats page (3) tracks the intelligence feed. Press u there to pull fresh entries, e for a report.",
    ),
    (
        "device",
        "The Devices page (2) holds the asset inventory. s scans the network, S re-scans the selected device.",
    ),
    (
        "scan",
        "Scans run from the Devices page: s discovers new assets, S probes the selected one. Scans are rate limited.",
    ),
    (
        "model",
        "AI Models (5) shows the detection ensemble. t retrains a model, e exports it, i imports a model file.",
    ),
    (
        "pcap",
        "The PCAP page (7) talks to the capture backend. u uploads a capture, t trains on the marked files.",
    ),
    (
        "capture",
        "Live capture is controlled from the PCAP page with c. The backend must be reachable.",
    ),
    (
        "workflow",
        "Workflows (8) hold response playbooks. n creates a template, x executes one against a device.",
    ),
    (
        "export",
        "Most pages export with e. Files land in the configured export directory with a date-stamped name.",
    ),
    (
        "help",
        "Press ? anywhere for the key reference. Pages are on 1-8, / searches, N opens notifications.",
    ),
];

const FALLBACK: &str =
    "I can help with threats, devices, scans, models, PCAP captures, workflows, and exports. Try one of those words.";

/// Resolve a prompt to a canned response.
fn respond(prompt: &str) -> &'static str {
    let lower = prompt.to_lowercase();
    RESPONSES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map_or(FALLBACK, |(_, answer)| answer)
}

struct Exchange {
    prompt: String,
    answer: &'static str,
}

#[derive(Default)]
pub struct AssistantPanel {
    input: Input,
    transcript: Vec<Exchange>,
}

impl AssistantPanel {
    /// Panel column width.
    pub const WIDTH: u16 = 54;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => return Some(Action::ToggleAssistant),
            KeyCode::Enter => {
                let prompt = sanitize_input(self.input.value());
                if !prompt.is_empty() {
                    let answer = respond(&prompt);
                    self.transcript.push(Exchange { prompt, answer });
                    self.input.reset();
                }
            }
            _ => {
                self.input.handle_event(&crossterm::event::Event::Key(key));
            }
        }
        None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = Self::WIDTH.min(area.width);
        let panel = Rect {
            x: area.x + area.width - width,
            y: area.y,
            width,
            height: area.height,
        };
        frame.render_widget(Clear, panel);

        let block = Block::default()
            .title(Span::styled(" Assistant ", theme::title_style()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(theme::panel_bg());
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let mut lines: Vec<Line> = Vec::new();
        if self.transcript.is_empty() {
            lines.push(Line::from(Span::styled(
                " Ask about threats, devices, scans, models, or captures.",
                theme::dim(),
            )));
        }
        for exchange in &self.transcript {
            lines.push(Line::from(Span::styled(
                format!(" you: {}", exchange.prompt),
                theme::key_hint(),
            )));
            lines.push(Line::from(Span::styled(
                format!(" bot: {}", exchange.answer),
                Style::default(),
            )));
            lines.push(Line::default());
        }
        lines.push(Line::from(vec![
            Span::styled(" > ", theme::key_hint()),
            Span::raw(self.input.value().to_owned()),
            Span::raw("_"),
        ]));
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_route_to_their_topics() {
        assert!(respond("how do I scan a device?").contains("Devices page"));
        assert!(respond("any new THREATS today").contains("Threats page"));
        assert!(respond("upload a pcap").contains("PCAP"));
        assert!(respond("start a workflow").contains("playbooks"));
    }

    #[test]
    fn unknown_prompts_get_the_fallback() {
        assert_eq!(respond("what is the weather"), FALLBACK);
    }

    #[test]
    fn first_matching_rule_wins() {
        // "threat" appears before "model" in the table.
        assert!(respond("threat model review").contains("Threats page"));
    }

    #[test]
    fn enter_records_a_sanitized_exchange() {
        let mut panel = AssistantPanel::new();
        panel.input = Input::new("  <b>scan</b> the plant  ".into());
        panel.handle_key_event(KeyEvent::from(KeyCode::Enter));
        assert_eq!(panel.transcript.len(), 1);
        assert_eq!(panel.transcript[0].prompt, "bscan/b the plant");
        assert!(panel.input.value().is_empty());
    }
}
