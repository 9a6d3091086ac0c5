//! Network topology graph.
//!
//! Nodes carry absolute canvas coordinates; the view multiplies them by a
//! zoom factor at render time. Links reference node ids — a link whose
//! endpoints do not both resolve is simply not drawn.

use serde::{Deserialize, Serialize};

use super::device::Criticality;

/// Node class, used for glyph selection and the OT filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Internet,
    Firewall,
    Switch,
    Server,
    Plc,
    Hmi,
    Rtu,
    Sensor,
}

impl NodeType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Internet => "Internet",
            Self::Firewall => "Firewall",
            Self::Switch => "Switch",
            Self::Server => "Server",
            Self::Plc => "PLC",
            Self::Hmi => "HMI",
            Self::Rtu => "RTU",
            Self::Sensor => "Sensor",
        }
    }

    /// Whether this node belongs to the OT layer.
    pub fn is_ot(self) -> bool {
        matches!(self, Self::Plc | Self::Hmi | Self::Rtu | Self::Sensor)
    }
}

/// Node health for link styling (offline endpoints get dashed lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Online,
    Offline,
    Warning,
}

/// A positioned node on the topology canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub status: NodeStatus,
    pub connections: Vec<String>,
    pub ip: Option<String>,
    pub criticality: Option<Criticality>,
}

/// A drawn edge between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyLink {
    pub from: String,
    pub to: String,
}

/// The whole graph as seeded for the topology page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TopologyGraph {
    pub nodes: Vec<TopologyNode>,
    pub links: Vec<TopologyLink>,
}

impl TopologyGraph {
    pub fn node(&self, id: &str) -> Option<&TopologyNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Resolve a link to its endpoint nodes. `None` when either endpoint is
    /// missing — the renderer omits such links rather than erroring.
    pub fn endpoints(&self, link: &TopologyLink) -> Option<(&TopologyNode, &TopologyNode)> {
        Some((self.node(&link.from)?, self.node(&link.to)?))
    }

    /// Links whose endpoints both resolve, paired with those endpoints.
    pub fn drawable_links(&self) -> impl Iterator<Item = (&TopologyLink, &TopologyNode, &TopologyNode)> {
        self.links
            .iter()
            .filter_map(|l| self.endpoints(l).map(|(a, b)| (l, a, b)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn node(id: &str, status: NodeStatus) -> TopologyNode {
        TopologyNode {
            id: id.into(),
            node_type: NodeType::Switch,
            name: id.to_uppercase(),
            x: 0.0,
            y: 0.0,
            status,
            connections: Vec::new(),
            ip: None,
            criticality: None,
        }
    }

    #[test]
    fn link_with_missing_endpoint_is_not_drawable() {
        let graph = TopologyGraph {
            nodes: vec![node("a", NodeStatus::Online), node("b", NodeStatus::Online)],
            links: vec![
                TopologyLink { from: "a".into(), to: "b".into() },
                TopologyLink { from: "a".into(), to: "ghost".into() },
                TopologyLink { from: "ghost".into(), to: "b".into() },
            ],
        };

        let drawable: Vec<_> = graph.drawable_links().collect();
        assert_eq!(drawable.len(), 1);
        assert_eq!(drawable[0].1.id, "a");
        assert_eq!(drawable[0].2.id, "b");
    }

    #[test]
    fn endpoints_resolve_in_order() {
        let graph = TopologyGraph {
            nodes: vec![node("x", NodeStatus::Offline), node("y", NodeStatus::Online)],
            links: vec![TopologyLink { from: "x".into(), to: "y".into() }],
        };
        let (a, b) = graph.endpoints(&graph.links[0]).unwrap();
        assert_eq!(a.status, NodeStatus::Offline);
        assert_eq!(b.id, "y");
    }
}
