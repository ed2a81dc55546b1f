//! Turn user-typed id prefixes into full ids.

use arbor_core::conversation::{MessageTree, NodeId};
use arbor_core::session::ConversationId;
use arbor_core::store::ConversationStore;

use crate::error::Error;

/// An exact id wins over longer ids it happens to prefix.
pub fn node_id(tree: &MessageTree, prefix: &str) -> Result<NodeId, Error> {
    let exact = NodeId::from(prefix);
    if tree.get(&exact).is_some() {
        return Ok(exact);
    }
    let matches: Vec<&NodeId> = tree.pool().ids_with_prefix(prefix).collect();
    match matches.as_slice() {
        [] => Err(Error::NoMatch {
            kind: "node",
            prefix: prefix.to_string(),
        }),
        [only] => Ok((*only).clone()),
        _ => Err(Error::Ambiguous {
            kind: "node",
            prefix: prefix.to_string(),
            count: matches.len(),
        }),
    }
}

pub async fn conversation_id(
    store: &dyn ConversationStore,
    prefix: &str,
) -> Result<ConversationId, Error> {
    if let Ok(id) = prefix.parse::<ConversationId>() {
        return Ok(id);
    }
    let matches: Vec<ConversationId> = store
        .list()
        .await?
        .into_iter()
        .map(|summary| summary.id)
        .filter(|id| id.to_string().starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [] => Err(Error::NoMatch {
            kind: "conversation",
            prefix: prefix.to_string(),
        }),
        [only] => Ok(*only),
        _ => Err(Error::Ambiguous {
            kind: "conversation",
            prefix: prefix.to_string(),
            count: matches.len(),
        }),
    }
}
