// Branching conversation engine without CLI dependencies

pub mod context;
pub mod conversation;
pub mod error;
pub mod preferences;
pub mod session;
pub mod store;
pub mod test_utils;
pub mod utils;

pub use context::TreeContext;
pub use conversation::{MessageTree, NodeId, Role};
pub use error::{Error, Result};
