//! WASM bindings for the constellation-core library.
//!
//! All functions exposed to JavaScript via wasm-bindgen are defined here.
//! The front end owns the tree definition (JSON); every operation takes it
//! in and returns either a new definition or a scene snapshot.

use wasm_bindgen::prelude::*;

use crate::layout::LayoutEngine;
use crate::output::SceneOutput;
use crate::tree::{self, NodeTree, TreeError};
use glam::DVec3;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    pub fn console_log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn console_error(s: &str);
}

fn engine(seed: Option<u32>) -> LayoutEngine {
    match seed {
        Some(s) => LayoutEngine::seeded(u64::from(s)),
        None => LayoutEngine::from_entropy(),
    }
}

fn emit(tree: &NodeTree, source: &str) -> String {
    match serde_json::to_string(&tree.to_def()) {
        Ok(json) => json,
        Err(e) => {
            console_error(&format!("Error serializing tree: {e}"));
            source.to_string()
        }
    }
}

/// Parse `source`, apply `update`, and return the new definition.
/// On any error the source is returned unchanged.
fn rewrite(source: &str, update: impl FnOnce(NodeTree) -> Result<NodeTree, TreeError>) -> String {
    let result = tree::parse_tree(source).and_then(update);
    match result {
        Ok(tree) => emit(&tree, source),
        Err(e) => {
            console_error(&format!("Error updating tree: {e}"));
            source.to_string()
        }
    }
}

/// Scene snapshot of a definition, positions as stored.
#[wasm_bindgen]
pub fn compile_scene(source: &str) -> String {
    let scene = match tree::parse_tree(source) {
        Ok(tree) => SceneOutput::from_tree(&tree),
        Err(e) => {
            console_error(&format!("Error parsing tree: {e}"));
            SceneOutput::error(&e)
        }
    };
    serde_json::to_string(&scene).unwrap_or_else(|_| "{\"error\": {\"message\": \"serialization\"}}".to_string())
}

/// Full layout pass; returns the scene with layout statistics.
#[wasm_bindgen]
pub fn layout_scene(source: &str, seed: Option<u32>) -> String {
    let scene = match tree::parse_tree(source) {
        Ok(tree) => {
            let result = engine(seed).reposition(&tree);
            if result.fallbacks > 0 {
                console_log(&format!("layout: {} of {} nodes fell back", result.fallbacks, result.placed));
            }
            SceneOutput::from_tree(&tree.with_positions(&result)).with_stats(&result)
        }
        Err(e) => {
            console_error(&format!("Error parsing tree: {e}"));
            SceneOutput::error(&e)
        }
    };
    serde_json::to_string(&scene).unwrap_or_else(|_| "{\"error\": {\"message\": \"serialization\"}}".to_string())
}

/// Full layout pass; returns the updated definition.
#[wasm_bindgen]
pub fn layout_tree(source: &str, seed: Option<u32>) -> String {
    rewrite(source, |tree| Ok(engine(seed).layout(&tree)))
}

/// Expand every node and lay the whole tree out again.
#[wasm_bindgen]
pub fn expand_all(source: &str, seed: Option<u32>) -> String {
    rewrite(source, |mut tree| {
        tree.expand_all();
        Ok(engine(seed).layout(&tree))
    })
}

/// Collapse everything but the center. Positions are kept as they are.
#[wasm_bindgen]
pub fn collapse_all(source: &str) -> String {
    rewrite(source, |mut tree| {
        tree.collapse_all();
        Ok(tree)
    })
}

/// Toggle one node. Expanding re-places that node's subtree around the rest.
#[wasm_bindgen]
pub fn toggle_node(source: &str, node_id: &str, seed: Option<u32>) -> String {
    rewrite(source, |mut tree| {
        let nid = tree.resolve(node_id)?;
        if tree.toggle_expanded(nid) {
            Ok(engine(seed).layout_subtree(&tree, nid))
        } else {
            Ok(tree)
        }
    })
}

/// Expand the ancestors of a node (filter or breadcrumb navigation) and lay the tree out.
#[wasm_bindgen]
pub fn reveal_node(source: &str, node_id: &str, seed: Option<u32>) -> String {
    rewrite(source, |mut tree| {
        let nid = tree.resolve(node_id)?;
        if tree.reveal(nid).is_empty() {
            Ok(tree)
        } else {
            Ok(engine(seed).layout(&tree))
        }
    })
}

/// Drag a node to a world position. Its descendants follow; no layout runs.
#[wasm_bindgen]
pub fn drag_node(source: &str, node_id: &str, x: f64, y: f64, z: f64) -> String {
    rewrite(source, |mut tree| {
        let nid = tree.resolve(node_id)?;
        tree.drag_to(nid, DVec3::new(x, y, z));
        Ok(tree)
    })
}
