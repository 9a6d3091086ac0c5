//! Color palette and shared styles for the console.

use ratatui::style::{Color, Modifier, Style};

// ── Palette ─────────────────────────────────────────────────────────

/// Primary accent, used for titles and the active page tab.
pub const SIGNAL_AMBER: Color = Color::Rgb(255, 179, 71);
/// Secondary accent for focused borders and selections.
pub const CONTROL_TEAL: Color = Color::Rgb(54, 214, 198);
/// Informational highlights (links, hints).
pub const STEEL_BLUE: Color = Color::Rgb(120, 170, 255);
/// Healthy / success states.
pub const OK_GREEN: Color = Color::Rgb(92, 214, 113);
/// Degraded / warning states.
pub const WARN_YELLOW: Color = Color::Rgb(240, 210, 80);
/// Alarm / error states.
pub const ALARM_RED: Color = Color::Rgb(240, 84, 84);
/// Muted foreground for secondary text.
pub const DIM_GRAY: Color = Color::Rgb(150, 150, 160);
/// Unfocused borders.
pub const BORDER_GRAY: Color = Color::Rgb(80, 84, 92);
/// Row highlight background.
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 46, 56);
/// Overlay background.
pub const BG_PANEL: Color = Color::Rgb(24, 28, 34);

// ── Semantic styles ─────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(SIGNAL_AMBER).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(CONTROL_TEAL)
}

pub fn border_unfocused() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn table_header() -> Style {
    Style::default().fg(STEEL_BLUE).add_modifier(Modifier::BOLD)
}

pub fn row_selected() -> Style {
    Style::default().bg(BG_HIGHLIGHT).add_modifier(Modifier::BOLD)
}

pub fn tab_active() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(SIGNAL_AMBER)
        .add_modifier(Modifier::BOLD)
}

pub fn tab_inactive() -> Style {
    Style::default().fg(DIM_GRAY)
}

pub fn key_hint() -> Style {
    Style::default().fg(CONTROL_TEAL).add_modifier(Modifier::BOLD)
}

pub fn dim() -> Style {
    Style::default().fg(DIM_GRAY)
}

pub fn success() -> Style {
    Style::default().fg(OK_GREEN)
}

pub fn warning() -> Style {
    Style::default().fg(WARN_YELLOW)
}

pub fn error() -> Style {
    Style::default().fg(ALARM_RED)
}

pub fn panel_bg() -> Style {
    Style::default().bg(BG_PANEL)
}

/// Color for a severity badge, shared by threats, events, and criticality.
pub fn severity_color(severity: otwatch_core::Severity) -> Color {
    use otwatch_core::Severity;
    match severity {
        Severity::Low => OK_GREEN,
        Severity::Medium => WARN_YELLOW,
        Severity::High => SIGNAL_AMBER,
        Severity::Critical => ALARM_RED,
    }
}

pub fn criticality_color(criticality: otwatch_core::Criticality) -> Color {
    use otwatch_core::Criticality;
    match criticality {
        Criticality::Low => OK_GREEN,
        Criticality::Medium => WARN_YELLOW,
        Criticality::High => SIGNAL_AMBER,
        Criticality::Critical => ALARM_RED,
    }
}

pub fn notification_color(kind: otwatch_core::NotificationKind) -> Color {
    use otwatch_core::NotificationKind;
    match kind {
        NotificationKind::Info => STEEL_BLUE,
        NotificationKind::Success => OK_GREEN,
        NotificationKind::Warning => WARN_YELLOW,
        NotificationKind::Error => ALARM_RED,
    }
}
