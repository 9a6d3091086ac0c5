//! Topology page — plant network graph on a canvas with zoom and filters.

use std::path::PathBuf;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Color;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Context, Line as CanvasLine};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use otwatch_core::model::device::Criticality;
use otwatch_core::model::topology::{NodeStatus, TopologyGraph, TopologyNode};
use otwatch_core::{export, fixtures};

use crate::action::Action;
use crate::component::Page;
use crate::page::PageId;
use crate::theme;
use crate::widgets::sub_tabs;

const ZOOM_MIN: f64 = 0.5;
const ZOOM_MAX: f64 = 2.0;
const ZOOM_STEP: f64 = 0.1;

/// Canvas coordinate space the seeded layout was designed for.
const CANVAS_W: f64 = 820.0;
const CANVAS_H: f64 = 560.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum NodeFilter {
    #[default]
    All,
    Critical,
    Offline,
    Ot,
}

impl NodeFilter {
    const ALL: [Self; 4] = [Self::All, Self::Critical, Self::Offline, Self::Ot];

    fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Critical => "Critical",
            Self::Offline => "Offline",
            Self::Ot => "OT only",
        }
    }

    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn matches(self, node: &TopologyNode) -> bool {
        match self {
            Self::All => true,
            Self::Critical => node.criticality == Some(Criticality::Critical),
            Self::Offline => node.status != NodeStatus::Online,
            Self::Ot => node.node_type.is_ot(),
        }
    }
}

pub struct TopologyPage {
    action_tx: Option<UnboundedSender<Action>>,
    graph: TopologyGraph,
    zoom: f64,
    filter: NodeFilter,
    selected: usize,
    export_dir: PathBuf,
}

impl TopologyPage {
    pub fn new(export_dir: PathBuf) -> Self {
        Self {
            action_tx: None,
            graph: fixtures::seed_topology(),
            zoom: 1.0,
            filter: NodeFilter::All,
            selected: 0,
            export_dir,
        }
    }

    fn visible_nodes(&self) -> Vec<&TopologyNode> {
        self.graph
            .nodes
            .iter()
            .filter(|n| self.filter.matches(n))
            .collect()
    }

    fn selected_node(&self) -> Option<&TopologyNode> {
        let visible = self.visible_nodes();
        if visible.is_empty() {
            return None;
        }
        visible.get(self.selected % visible.len()).copied()
    }

    fn adjust_zoom(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(ZOOM_MIN, ZOOM_MAX);
    }

    fn cycle_selection(&mut self, delta: isize) {
        let len = self.visible_nodes().len();
        if len == 0 {
            return;
        }
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        let next = (self.selected as isize + delta).rem_euclid(len as isize) as usize;
        self.selected = next;
    }

    fn export_json(&self) -> Action {
        let json = match export::topology_json(&self.graph) {
            Ok(json) => json,
            Err(err) => return Action::notify_error("Export failed", err.to_string()),
        };
        let filename = export::export_filename("topology", "json");
        let path = self.export_dir.join(&filename);
        match std::fs::write(&path, json) {
            Ok(()) => Action::notify_success("Export complete", format!("Wrote {}", path.display())),
            Err(err) => Action::notify_error("Export failed", err.to_string()),
        }
    }

    fn node_color(node: &TopologyNode) -> Color {
        match node.status {
            NodeStatus::Online => theme::OK_GREEN,
            NodeStatus::Warning => theme::WARN_YELLOW,
            NodeStatus::Offline => theme::ALARM_RED,
        }
    }

    fn node_glyph(node: &TopologyNode) -> &'static str {
        use otwatch_core::model::topology::NodeType;
        match node.node_type {
            NodeType::Internet => "((o))",
            NodeType::Firewall => "[FW]",
            NodeType::Switch => "[SW]",
            NodeType::Server => "[SRV]",
            NodeType::Plc => "[PLC]",
            NodeType::Hmi => "[HMI]",
            NodeType::Rtu => "[RTU]",
            NodeType::Sensor => "(S)",
        }
    }

    /// Canvas y grows upward; the layout was designed top-down.
    fn plot(&self, node: &TopologyNode) -> (f64, f64) {
        (node.x * self.zoom, (CANVAS_H - node.y) * self.zoom)
    }

    fn draw_graph(&self, ctx: &mut Context) {
        // Links first so node glyphs overwrite them.
        for (_, from, to) in self.graph.drawable_links() {
            if !self.filter.matches(from) || !self.filter.matches(to) {
                continue;
            }
            let (x1, y1) = self.plot(from);
            let (x2, y2) = self.plot(to);
            let degraded = from.status != NodeStatus::Online || to.status != NodeStatus::Online;
            if degraded {
                draw_dashed(ctx, x1, y1, x2, y2, theme::ALARM_RED);
            } else {
                ctx.draw(&CanvasLine {
                    x1,
                    y1,
                    x2,
                    y2,
                    color: theme::BORDER_GRAY,
                });
            }
        }

        let selected_id = self.selected_node().map(|n| n.id.clone());
        for node in self.graph.nodes.iter().filter(|n| self.filter.matches(n)) {
            let (x, y) = self.plot(node);
            let color = if selected_id.as_deref() == Some(node.id.as_str()) {
                theme::CONTROL_TEAL
            } else {
                Self::node_color(node)
            };
            ctx.print(x, y, Span::styled(Self::node_glyph(node), ratatui::style::Style::default().fg(color)));
            ctx.print(
                x,
                y - 18.0 * self.zoom,
                Span::styled(node.name.clone(), theme::dim()),
            );
        }
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let Some(node) = self.selected_node() else {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled("  no nodes match this filter", theme::dim()))),
                area,
            );
            return;
        };
        let field = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!(" {label:<12}"), theme::dim()),
                Span::raw(value),
            ])
        };
        let lines = vec![
            Line::from(Span::styled(format!(" {}", node.name), theme::title_style())),
            field("Type", node.node_type.label().to_owned()),
            field(
                "Status",
                match node.status {
                    NodeStatus::Online => "online",
                    NodeStatus::Offline => "offline",
                    NodeStatus::Warning => "warning",
                }
                .to_owned(),
            ),
            field("IP", node.ip.clone().unwrap_or_else(|| "-".into())),
            field(
                "Criticality",
                node.criticality.map_or_else(|| "-".into(), |c| c.label().to_owned()),
            ),
            field("Links", node.connections.join(", ")),
        ];
        frame.render_widget(Paragraph::new(lines), area);
    }
}

/// Draw a dashed line by alternating short segments.
fn draw_dashed(ctx: &mut Context, x1: f64, y1: f64, x2: f64, y2: f64, color: Color) {
    const SEGMENTS: usize = 12;
    #[allow(clippy::cast_precision_loss)]
    let step = 1.0 / SEGMENTS as f64;
    for i in (0..SEGMENTS).step_by(2) {
        #[allow(clippy::cast_precision_loss)]
        let t0 = i as f64 * step;
        let t1 = t0 + step;
        ctx.draw(&CanvasLine {
            x1: x1 + (x2 - x1) * t0,
            y1: y1 + (y2 - y1) * t0,
            x2: x1 + (x2 - x1) * t1,
            y2: y1 + (y2 - y1) * t1,
            color,
        });
    }
}

impl Page for TopologyPage {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('+' | '=') => {
                self.adjust_zoom(ZOOM_STEP);
                None
            }
            KeyCode::Char('-') => {
                self.adjust_zoom(-ZOOM_STEP);
                None
            }
            KeyCode::Char('0') => {
                self.zoom = 1.0;
                None
            }
            KeyCode::Char('n') | KeyCode::Down | KeyCode::Right => {
                self.cycle_selection(1);
                None
            }
            KeyCode::Char('p') | KeyCode::Up | KeyCode::Left => {
                self.cycle_selection(-1);
                None
            }
            KeyCode::Char('f') => {
                self.filter = self.filter.next();
                self.selected = 0;
                None
            }
            KeyCode::Char('e') => Some(self.export_json()),
            _ => None,
        };
        Ok(action)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(7),
        ])
        .split(area);

        let labels: Vec<&str> = NodeFilter::ALL.iter().map(|f| f.label()).collect();
        let active = NodeFilter::ALL.iter().position(|f| *f == self.filter).unwrap_or(0);
        let mut tabs = sub_tabs::render_sub_tabs(&labels, active);
        tabs.push_span(Span::styled(format!("   zoom {:.1}x", self.zoom), theme::dim()));
        frame.render_widget(Paragraph::new(tabs), layout[0]);

        let canvas = Canvas::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_unfocused()),
            )
            .x_bounds([0.0, CANVAS_W])
            .y_bounds([0.0, CANVAS_H])
            .paint(|ctx| self.draw_graph(ctx));
        frame.render_widget(canvas, layout[1]);

        self.render_detail(frame, layout[2]);
    }

    fn key_hints(&self) -> &'static str {
        "n/p node  +/- zoom  0 reset  f filter  e export"
    }

    fn id(&self) -> PageId {
        PageId::Topology
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page() -> TopologyPage {
        TopologyPage::new(std::env::temp_dir())
    }

    #[test]
    fn zoom_clamps_to_bounds() {
        let mut p = page();
        for _ in 0..30 {
            p.adjust_zoom(ZOOM_STEP);
        }
        assert!((p.zoom - ZOOM_MAX).abs() < f64::EPSILON);
        for _ in 0..30 {
            p.adjust_zoom(-ZOOM_STEP);
        }
        assert!((p.zoom - ZOOM_MIN).abs() < f64::EPSILON);
    }

    #[test]
    fn every_seeded_link_is_drawable() {
        let p = page();
        assert_eq!(p.graph.drawable_links().count(), p.graph.links.len());
    }

    #[test]
    fn ot_filter_keeps_only_ot_nodes() {
        let mut p = page();
        p.filter = NodeFilter::Ot;
        let visible = p.visible_nodes();
        assert!(!visible.is_empty());
        assert!(visible.iter().all(|n| n.node_type.is_ot()));
    }

    #[test]
    fn selection_wraps_within_the_filtered_set() {
        let mut p = page();
        p.filter = NodeFilter::Offline;
        p.selected = 0;
        let len = p.visible_nodes().len();
        assert!(len >= 1);
        p.cycle_selection(-1);
        assert_eq!(p.selected, len - 1);
        p.cycle_selection(1);
        assert_eq!(p.selected, 0);
    }
}
