mod node;
pub use node::{Dfs, LocalTree, Node, NodeKey, NodeRef};

mod order;
pub use order::SortBy;

mod render;

mod search;
pub use search::{FindNodes, Found};

pub mod snapshot;

pub mod table;

mod tree;
pub use tree::{Locator, Tree};

mod fuzz;

pub mod api {
    pub use comtree_api::*;
}
