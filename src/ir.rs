use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DescriptorKind {
    #[default]
    Network,
}

impl DescriptorKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "network" | "graph" => Some(Self::Network),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
        }
    }
}

/// Canvas pixel position (System P: origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub kind: DescriptorKind,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Descriptor {
    pub fn new() -> Self {
        Self {
            kind: DescriptorKind::Network,
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn push_node(&mut self, id: &str, label: &str, size: f64) -> &mut Node {
        self.nodes.push(Node {
            id: id.to_string(),
            label: label.to_string(),
            size,
            position: None,
        });
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }

    pub fn push_link(&mut self, source: &str, target: &str) {
        self.links.push(Link::new(source, target));
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|node| node.id.as_str()).collect()
    }

    /// Links whose source or target is not a node of this descriptor.
    pub fn dangling_links(&self) -> Vec<&Link> {
        let ids = self.node_ids();
        self.links
            .iter()
            .filter(|link| !ids.contains(link.source.as_str()) || !ids.contains(link.target.as_str()))
            .collect()
    }

    pub fn all_positioned(&self) -> bool {
        !self.nodes.is_empty() && self.nodes.iter().all(|node| node.position.is_some())
    }

    /// Rejects input that is not even minimally well-typed: duplicate ids and
    /// non-finite numbers. Everything else is a constraint violation.
    pub fn check_well_formed(&self) -> EngineResult<()> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(EngineError::DuplicateNodeId(node.id.clone()));
            }
            if !node.size.is_finite() {
                return Err(EngineError::NonFiniteValue {
                    node: node.id.clone(),
                    field: "size",
                });
            }
            if let Some(pos) = node.position {
                if !pos.x.is_finite() || !pos.y.is_finite() {
                    return Err(EngineError::NonFiniteValue {
                        node: node.id.clone(),
                        field: "position",
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::new()
    }
}
