mod inspect;
mod node;
pub mod ops;
mod path;
mod pool;
mod registry;
mod tree;

pub use inspect::{BranchInfo, branch_info, root_branch_info};
pub use node::{MessageNode, NewNode, NodeId, NodePatch, Role};
pub use ops::{Direction, Inserted};
pub use path::{active_leaf, ancestors, visible_path, visible_path_from};
pub use pool::NodePool;
pub use registry::{BranchPoint, BranchRegistry};
pub use tree::MessageTree;
