mod build;
mod types;
mod update;

pub use build::{Node, NodeId, NodeTree, TreeError, build_tree, parse_tree};
pub use types::{NodeDef, TreeDef};
