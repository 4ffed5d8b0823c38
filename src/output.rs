//! Output types for the rendering layer.
//!
//! These structs are serialized to JSON and handed to the front end, which
//! animates spheres and lines toward the given positions.

use glam::DVec3;
use serde::Serialize;

use crate::layout::LayoutResult;
use crate::tree::{NodeTree, TreeError};

/// A visible node ready for the renderer
#[derive(Debug, Clone, Serialize)]
pub struct NodeOutput {
    pub id: String,
    pub name: String,
    pub level: usize,
    /// Relative to the parent
    pub position: DVec3,
    /// Sum of the parent chain, for camera framing
    pub world_position: DVec3,
    pub expanded: bool,
    pub has_children: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Top-level branch the node belongs to (None for the center)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    /// Primary color for the material generator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A visible parent -> child connection
#[derive(Debug, Clone, Serialize)]
pub struct EdgeOutput {
    pub from: String,
    pub to: String,
}

/// Error information for the front end
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl From<&TreeError> for ErrorInfo {
    fn from(e: &TreeError) -> Self {
        let node_id = match e {
            TreeError::DuplicateId(id) | TreeError::UnknownId(id) => Some(id.clone()),
            TreeError::EmptyId { parent, .. } if !parent.is_empty() => Some(parent.clone()),
            _ => None,
        };
        ErrorInfo { message: e.to_string(), node_id }
    }
}

/// Layout statistics of the pass that produced a scene
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LayoutStats {
    pub placed: usize,
    pub fallbacks: usize,
}

impl From<&LayoutResult> for LayoutStats {
    fn from(r: &LayoutResult) -> Self {
        LayoutStats { placed: r.placed, fallbacks: r.fallbacks }
    }
}

/// The combined output sent to the renderer
#[derive(Debug, Clone, Serialize)]
pub struct SceneOutput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<EdgeOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<LayoutStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl SceneOutput {
    /// Snapshot of every visible node and edge.
    pub fn from_tree(tree: &NodeTree) -> Self {
        let world = tree.world_positions();
        let id_of = |nid: crate::tree::NodeId| tree.get(nid).id.clone();

        let nodes = tree
            .visible_nodes()
            .into_iter()
            .map(|nid| {
                let n = tree.get(nid);
                NodeOutput {
                    id: n.id.clone(),
                    name: n.name.clone(),
                    level: n.level,
                    position: n.position,
                    world_position: world[nid.0],
                    expanded: n.expanded,
                    has_children: !n.children.is_empty(),
                    parent_id: n.parent.map(id_of),
                    branch_id: tree.branch_of(nid).map(id_of),
                    color: n.color.clone(),
                }
            })
            .collect();

        let edges = tree
            .visible_edges()
            .into_iter()
            .map(|(from, to)| EdgeOutput { from: id_of(from), to: id_of(to) })
            .collect();

        SceneOutput { nodes, edges, stats: None, error: None }
    }

    pub fn with_stats(mut self, result: &LayoutResult) -> Self {
        self.stats = Some(LayoutStats::from(result));
        self
    }

    pub fn error(e: &TreeError) -> Self {
        SceneOutput { nodes: vec![], edges: vec![], stats: None, error: Some(ErrorInfo::from(e)) }
    }
}
