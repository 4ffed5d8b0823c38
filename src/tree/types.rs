use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Static definition of a whole tree: the center plus its top-level branches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDef {
    pub center: NodeDef,
    #[serde(default)]
    pub branches: Vec<NodeDef>,
}

/// Static definition of a single node and its subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    /// Unique identifier, stable across layout passes
    pub id: String,
    /// Display label (defaults to the id)
    #[serde(default)]
    pub name: Option<String>,
    /// Position relative to the parent (world origin for the center)
    #[serde(default)]
    pub position: DVec3,
    #[serde(default)]
    pub expanded: bool,
    /// Primary color handed through to the renderer's material generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Ordered children; order is the angular distribution order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDef>,
}

impl NodeDef {
    pub fn new(id: impl Into<String>, position: DVec3) -> Self {
        Self {
            id: id.into(),
            name: None,
            position,
            expanded: false,
            color: None,
            children: Vec::new(),
        }
    }

    pub fn expanded(mut self) -> Self {
        self.expanded = true;
        self
    }

    pub fn with_children(mut self, children: Vec<NodeDef>) -> Self {
        self.children = children;
        self
    }
}
