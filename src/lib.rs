//! Collision-aware 3D radial layout for expandable node trees.
//!
//! A tree of labeled nodes (one center, any number of branches) is laid out
//! so that nodes keep their distance, parent -> child edges do not cross,
//! and distance from the center grows with every generation.
//!
//! ```
//! use constellation_core::layout::LayoutEngine;
//! use constellation_core::tree::parse_tree;
//!
//! let mut tree = parse_tree(r#"{
//!     "center": { "id": "hub" },
//!     "branches": [ { "id": "a", "children": [ { "id": "a1" } ] }, { "id": "b" } ]
//! }"#).unwrap();
//! tree.expand_all();
//!
//! let laid_out = LayoutEngine::seeded(7).layout(&tree);
//! let a1 = laid_out.lookup("a1").unwrap();
//! assert!(laid_out.world_position(a1).length() > 5.0);
//! ```

pub mod layout;
pub mod output;
pub mod tree;
mod wasm;

pub use layout::{LayoutConfig, LayoutEngine, LayoutResult};
pub use output::SceneOutput;
pub use tree::{NodeId, NodeTree, TreeDef, TreeError};
