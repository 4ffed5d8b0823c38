//
// Build step: TreeDef (nested static data) -> NodeTree (layout-friendly arena)
//
// What this does:
// - Flattens the nested NodeDef hierarchy into an indexed vector with parent pointers
// - Assigns depth levels (center = 0, branches = 1, ...)
// - Enforces global uniqueness of node identifiers
// - Preserves child order, which is the angular distribution order
//
// Positions stay relative to the parent. World positions are always derived
// by walking the parent chain, never stored.

use std::collections::HashMap;

use glam::DVec3;
use serde::Serialize;
use thiserror::Error;

use crate::tree::{NodeDef, TreeDef};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub nid: NodeId,
    /// Unique identifier
    pub id: String,
    pub name: String,
    /// Relative to the parent; the center's is relative to the world origin
    pub position: DVec3,
    /// Depth from the center (center = 0)
    pub level: usize,
    pub expanded: bool,
    pub color: Option<String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct NodeTree {
    pub root: NodeId,
    pub nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
}

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("node id must not be empty (child {index} of '{parent}')")]
    EmptyId { parent: String, index: usize },
    #[error("duplicate node id '{0}'")]
    DuplicateId(String),
    #[error("unknown node id '{0}'")]
    UnknownId(String),
    #[error("invalid tree definition: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn build_tree(def: &TreeDef) -> Result<NodeTree, TreeError> {
    let mut ctx = BuildCtx::default();

    let mut center = def.center.clone();
    center.children = def.branches.clone();
    center.expanded = true;
    if center.id.is_empty() {
        return Err(TreeError::EmptyId { parent: String::new(), index: 0 });
    }

    let root = ctx.add_node(&center, None, 0)?;
    Ok(NodeTree { root, nodes: ctx.nodes, index: ctx.index })
}

/// Parse a JSON tree definition and build it.
pub fn parse_tree(json: &str) -> Result<NodeTree, TreeError> {
    let def: TreeDef = serde_json::from_str(json)?;
    build_tree(&def)
}

#[derive(Default)]
struct BuildCtx {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
}

impl BuildCtx {
    fn add_node(&mut self, def: &NodeDef, parent: Option<NodeId>, level: usize) -> Result<NodeId, TreeError> {
        if self.index.contains_key(&def.id) {
            return Err(TreeError::DuplicateId(def.id.clone()));
        }

        let nid = NodeId(self.nodes.len());
        self.index.insert(def.id.clone(), nid);
        self.nodes.push(Node {
            nid,
            id: def.id.clone(),
            name: def.name.clone().unwrap_or_else(|| def.id.clone()),
            position: def.position,
            level,
            expanded: def.expanded,
            color: def.color.clone(),
            children: Vec::with_capacity(def.children.len()),
            parent,
        });

        for (i, child) in def.children.iter().enumerate() {
            if child.id.is_empty() {
                return Err(TreeError::EmptyId { parent: def.id.clone(), index: i });
            }
            let cid = self.add_node(child, Some(nid), level + 1)?;
            self.nodes[nid.0].children.push(cid);
        }

        Ok(nid)
    }
}

impl NodeTree {
    pub fn get(&self, nid: NodeId) -> &Node {
        &self.nodes[nid.0]
    }

    pub(crate) fn get_mut(&mut self, nid: NodeId) -> &mut Node {
        &mut self.nodes[nid.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    /// Like `lookup`, but unknown ids are an error.
    pub fn resolve(&self, id: &str) -> Result<NodeId, TreeError> {
        self.lookup(id).ok_or_else(|| TreeError::UnknownId(id.to_string()))
    }

    /// Top-level subtrees attached directly to the center.
    pub fn branches(&self) -> &[NodeId] {
        &self.get(self.root).children
    }

    /// The top-level branch a node belongs to. None for the center.
    pub fn branch_of(&self, nid: NodeId) -> Option<NodeId> {
        let mut cur = nid;
        loop {
            let parent = self.get(cur).parent?;
            if parent == self.root {
                return Some(cur);
            }
            cur = parent;
        }
    }

    /// World position: sum of relative positions up the parent chain.
    pub fn world_position(&self, nid: NodeId) -> DVec3 {
        let mut pos = DVec3::ZERO;
        let mut cur = Some(nid);
        while let Some(c) = cur {
            let node = self.get(c);
            pos += node.position;
            cur = node.parent;
        }
        pos
    }

    /// World positions for every node (visible or not), indexed by NodeId.
    pub fn world_positions(&self) -> Vec<DVec3> {
        let mut out = vec![DVec3::ZERO; self.nodes.len()];
        for nid in self.pre_order(self.root) {
            let node = self.get(nid);
            let parent_world = node.parent.map(|p| out[p.0]).unwrap_or(DVec3::ZERO);
            out[nid.0] = parent_world + node.position;
        }
        out
    }

    /// A node is visible when every ancestor is expanded.
    pub fn is_visible(&self, nid: NodeId) -> bool {
        let mut cur = self.get(nid).parent;
        while let Some(p) = cur {
            let node = self.get(p);
            if !node.expanded {
                return false;
            }
            cur = node.parent;
        }
        true
    }

    /// Visible nodes in pre-order (parents before children, children in order).
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_visible(self.root, &mut out);
        out
    }

    fn collect_visible(&self, nid: NodeId, out: &mut Vec<NodeId>) {
        out.push(nid);
        let node = self.get(nid);
        if node.expanded {
            for &c in &node.children {
                self.collect_visible(c, out);
            }
        }
    }

    /// Derived parent -> child edges between visible nodes.
    pub fn visible_edges(&self) -> Vec<(NodeId, NodeId)> {
        self.visible_nodes()
            .into_iter()
            .filter_map(|nid| self.get(nid).parent.map(|p| (p, nid)))
            .collect()
    }

    /// Pre-order traversal of a subtree, ignoring expansion state.
    pub fn pre_order(&self, nid: NodeId) -> Vec<NodeId> {
        fn dfs(tree: &NodeTree, nid: NodeId, out: &mut Vec<NodeId>) {
            out.push(nid);
            for &c in &tree.get(nid).children {
                dfs(tree, c, out);
            }
        }
        let mut out = Vec::new();
        dfs(self, nid, &mut out);
        out
    }

    /// All descendants of a node (excluding the node itself).
    pub fn descendants(&self, nid: NodeId) -> Vec<NodeId> {
        let mut all = self.pre_order(nid);
        all.remove(0);
        all
    }

    /// Ids from the center down to the node (breadcrumb order).
    pub fn path_to(&self, nid: NodeId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut cur = Some(nid);
        while let Some(c) = cur {
            let node = self.get(c);
            path.push(node.id.as_str());
            cur = node.parent;
        }
        path.reverse();
        path
    }

    /// Nested definition with the current positions and expansion flags.
    pub fn to_def(&self) -> TreeDef {
        fn node_def(tree: &NodeTree, nid: NodeId) -> NodeDef {
            let n = tree.get(nid);
            NodeDef {
                id: n.id.clone(),
                name: (n.name != n.id).then(|| n.name.clone()),
                position: n.position,
                expanded: n.expanded,
                color: n.color.clone(),
                children: n.children.iter().map(|&c| node_def(tree, c)).collect(),
            }
        }
        let mut center = node_def(self, self.root);
        let branches = std::mem::take(&mut center.children);
        TreeDef { center, branches }
    }

    pub fn is_ancestor(&self, ancestor: NodeId, nid: NodeId) -> bool {
        let mut cur = self.get(nid).parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.get(p).parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_def() -> TreeDef {
        TreeDef {
            center: NodeDef::new("hub", DVec3::ZERO),
            branches: vec![
                NodeDef::new("a", DVec3::new(5.0, 0.0, 0.0))
                    .expanded()
                    .with_children(vec![
                        NodeDef::new("a1", DVec3::new(3.0, 0.0, 0.0)),
                        NodeDef::new("a2", DVec3::new(0.0, 3.0, 0.0))
                            .with_children(vec![NodeDef::new("a2x", DVec3::new(1.0, 1.0, 0.0))]),
                    ]),
                NodeDef::new("b", DVec3::new(-5.0, 0.0, 0.0)),
            ],
        }
    }

    #[test]
    fn test_build_assigns_levels_and_parents() {
        let tree = build_tree(&sample_def()).unwrap();
        assert_eq!(tree.len(), 6);

        let a2x = tree.lookup("a2x").unwrap();
        assert_eq!(tree.get(a2x).level, 3);
        assert_eq!(tree.path_to(a2x), vec!["hub", "a", "a2", "a2x"]);
        assert_eq!(tree.branch_of(a2x), tree.lookup("a"));
        assert_eq!(tree.branch_of(tree.root), None);
        assert!(tree.get(tree.root).expanded);
    }

    #[test]
    fn test_build_rejects_duplicate_ids() {
        let mut def = sample_def();
        def.branches.push(NodeDef::new("a1", DVec3::ZERO));
        assert!(matches!(build_tree(&def), Err(TreeError::DuplicateId(id)) if id == "a1"));
    }

    #[test]
    fn test_build_rejects_empty_ids() {
        let mut def = sample_def();
        def.branches[1].children.push(NodeDef::new("", DVec3::ZERO));
        assert!(matches!(build_tree(&def), Err(TreeError::EmptyId { index: 0, .. })));
    }

    #[test]
    fn test_world_position_sums_parent_chain() {
        let tree = build_tree(&sample_def()).unwrap();
        let a2x = tree.lookup("a2x").unwrap();
        assert_eq!(tree.world_position(a2x), DVec3::new(6.0, 4.0, 0.0));
        assert_eq!(tree.world_positions()[a2x.0], DVec3::new(6.0, 4.0, 0.0));
    }

    #[test]
    fn test_visibility_follows_expansion() {
        let tree = build_tree(&sample_def()).unwrap();
        let visible: Vec<&str> = tree.visible_nodes().iter().map(|&n| tree.get(n).id.as_str()).collect();
        // a2 is collapsed, so a2x stays hidden
        assert_eq!(visible, vec!["hub", "a", "a1", "a2", "b"]);
        assert!(!tree.is_visible(tree.lookup("a2x").unwrap()));
        assert_eq!(tree.visible_edges().len(), 4);
    }

    #[test]
    fn test_parse_tree_from_json() {
        let json = r##"{
            "center": { "id": "hub", "name": "Hub" },
            "branches": [
                { "id": "x", "position": [4.0, 0.0, 0.0], "color": "#ff0000",
                  "children": [ { "id": "y" } ] }
            ]
        }"##;
        let tree = parse_tree(json).unwrap();
        let x = tree.lookup("x").unwrap();
        assert_eq!(tree.get(x).position, DVec3::new(4.0, 0.0, 0.0));
        assert_eq!(tree.get(x).color.as_deref(), Some("#ff0000"));
        assert!(!tree.get(x).expanded);
        assert_eq!(tree.get(tree.lookup("y").unwrap()).name, "y");
        assert!(matches!(parse_tree("{"), Err(TreeError::Json(_))));
    }

    #[test]
    fn test_to_def_rebuilds_same_tree() {
        let tree = build_tree(&sample_def()).unwrap();
        let again = build_tree(&tree.to_def()).unwrap();
        assert_eq!(again.len(), tree.len());
        for (a, b) in tree.nodes.iter().zip(&again.nodes) {
            assert_eq!((&a.id, a.position, a.expanded, a.level), (&b.id, b.position, b.expanded, b.level));
        }
    }
}
