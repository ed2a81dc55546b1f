use arbor_core::TreeContext;
use arbor_core::conversation::{
    BranchPoint, Direction, MessageNode, MessageTree, NewNode, NodeId, Role,
};
use arbor_core::preferences::Preferences;
use arbor_core::session::{ChatSession, Conversation};
use arbor_core::store::ConversationStore;
use async_trait::async_trait;
use chrono::Local;
use comfy_table::{Cell, Color, Table};
use eyre::Result;
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

use super::{Command, resolve};
use crate::cli::ConversationCommands;
use crate::error::Error;

const PREVIEW_CHARS: usize = 72;

pub struct ConversationCommand {
    pub command: ConversationCommands,
    pub store: Arc<dyn ConversationStore>,
    pub preferences: Preferences,
    pub ctx: TreeContext,
}

#[async_trait]
impl Command for ConversationCommand {
    async fn execute(&self) -> Result<()> {
        let mut out = Vec::new();
        let result = self.run(&mut out).await;
        std::io::stdout().write_all(&out)?;
        result.map_err(Into::into)
    }
}

impl ConversationCommand {
    pub async fn run(&self, out: &mut Vec<u8>) -> std::result::Result<(), Error> {
        match &self.command {
            ConversationCommands::New { title } => {
                let conversation = Conversation::new(title.clone());
                self.store.save(&conversation).await?;
                writeln!(out, "{}", conversation.id)?;
            }
            ConversationCommands::List => self.list(out).await?,
            ConversationCommands::Show { conversation, tree } => {
                let conversation = self.load(conversation).await?;
                if *tree {
                    write_tree(out, &conversation)?;
                } else {
                    write_path(out, &conversation)?;
                }
            }
            ConversationCommands::Say {
                conversation,
                text,
                role,
                model,
            } => {
                let mut session = self.open(conversation).await?;
                let model = match role {
                    Role::Assistant => model.clone().or_else(|| self.default_model()),
                    Role::User | Role::System => model.clone(),
                };
                let draft = NewNode::with_role(*role, text.clone()).with_model(model);
                let id = session.send(draft)?;
                self.save(session).await?;
                writeln!(out, "{id}")?;
            }
            ConversationCommands::Edit {
                conversation,
                node,
                text,
            } => {
                let mut session = self.open(conversation).await?;
                let node = resolve::node_id(session.tree(), node)?;
                let id = session.edit(&node, text.clone())?;
                self.save(session).await?;
                writeln!(out, "{id}")?;
            }
            ConversationCommands::Regenerate {
                conversation,
                node,
                model,
                content,
            } => {
                let mut session = self.open(conversation).await?;
                let node = resolve::node_id(session.tree(), node)?;
                let model = model.clone().or_else(|| self.default_model());
                let id = session.regenerate(&node, model)?;
                if let Some(content) = content {
                    session.append_chunk(&id, content);
                }
                session.finish_reply(&id);
                self.save(session).await?;
                writeln!(out, "{id}")?;
            }
            ConversationCommands::Switch {
                conversation,
                node,
                position,
            } => {
                let mut session = self.open(conversation).await?;
                let point = match node {
                    Some(prefix) => BranchPoint::Node(resolve::node_id(session.tree(), prefix)?),
                    None => BranchPoint::Root,
                };
                let index = position.checked_sub(1).ok_or_else(|| {
                    Error::InvalidArgument("positions start at 1".to_string())
                })?;
                session.switch_branch(&point, index)?;
                self.save_and_show(session, out).await?;
            }
            ConversationCommands::Next { conversation, node } => {
                self.step(conversation, node, Direction::Next, out).await?;
            }
            ConversationCommands::Prev { conversation, node } => {
                self.step(conversation, node, Direction::Previous, out)
                    .await?;
            }
            ConversationCommands::Delete { conversation, node } => {
                let mut session = self.open(conversation).await?;
                let node = resolve::node_id(session.tree(), node)?;
                let removed = session.tree().pool().descendants(&node).len();
                session.delete(&node)?;
                self.save(session).await?;
                writeln!(
                    out,
                    "Deleted {removed} message{}",
                    if removed == 1 { "" } else { "s" }
                )?;
            }
        }
        Ok(())
    }

    async fn list(&self, out: &mut Vec<u8>) -> std::result::Result<(), Error> {
        let summaries = self.store.list().await?;
        if summaries.is_empty() {
            writeln!(out, "No conversations found.")?;
            return Ok(());
        }

        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("ID").fg(Color::Green),
            Cell::new("Title").fg(Color::Green),
            Cell::new("Updated").fg(Color::Green),
            Cell::new("Visible").fg(Color::Green),
            Cell::new("Total").fg(Color::Green),
        ]);
        for summary in summaries {
            table.add_row(vec![
                Cell::new(summary.id),
                Cell::new(summary.title.unwrap_or_else(|| "N/A".to_string())),
                Cell::new(
                    summary
                        .updated_at
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M:%S"),
                ),
                Cell::new(summary.visible_len),
                Cell::new(summary.node_count),
            ]);
        }
        writeln!(out, "{table}")?;
        Ok(())
    }

    async fn step(
        &self,
        conversation: &str,
        node: &str,
        direction: Direction,
        out: &mut Vec<u8>,
    ) -> std::result::Result<(), Error> {
        let mut session = self.open(conversation).await?;
        let node = resolve::node_id(session.tree(), node)?;
        session.step_branch(&node, direction)?;
        self.save_and_show(session, out).await
    }

    fn default_model(&self) -> Option<String> {
        self.preferences.default_model.clone()
    }

    async fn load(&self, prefix: &str) -> std::result::Result<Conversation, Error> {
        let id = resolve::conversation_id(self.store.as_ref(), prefix).await?;
        Ok(self.store.load(id).await?)
    }

    async fn open(&self, prefix: &str) -> std::result::Result<ChatSession, Error> {
        let conversation = self.load(prefix).await?;
        Ok(ChatSession::new(
            conversation,
            self.ctx.clone(),
            self.preferences.session_options(),
        ))
    }

    async fn save(&self, session: ChatSession) -> std::result::Result<Conversation, Error> {
        let conversation = session.into_conversation();
        debug!(
            target: "arbor::cli",
            id = %conversation.id,
            nodes = conversation.tree.len(),
            "Saving conversation"
        );
        self.store.save(&conversation).await?;
        Ok(conversation)
    }

    async fn save_and_show(
        &self,
        session: ChatSession,
        out: &mut Vec<u8>,
    ) -> std::result::Result<(), Error> {
        let conversation = self.save(session).await?;
        write_path(out, &conversation)?;
        Ok(())
    }
}

fn write_header(out: &mut Vec<u8>, conversation: &Conversation) -> std::io::Result<()> {
    match &conversation.title {
        Some(title) => writeln!(out, "Conversation {} ({title})", conversation.id),
        None => writeln!(out, "Conversation {}", conversation.id),
    }
}

fn write_path(out: &mut Vec<u8>, conversation: &Conversation) -> std::io::Result<()> {
    write_header(out, conversation)?;
    let tree = &conversation.tree;
    for node in tree.visible_path() {
        writeln!(out, "{}", describe(tree, &node))?;
    }
    Ok(())
}

/// Every node, indented by depth. Nodes on the visible path carry a `*`.
fn write_tree(out: &mut Vec<u8>, conversation: &Conversation) -> std::io::Result<()> {
    write_header(out, conversation)?;
    let tree = &conversation.tree;
    let visible: HashSet<_> = tree
        .visible_path()
        .iter()
        .map(|node| node.id.clone())
        .collect();

    let mut stack: Vec<(usize, &NodeId)> =
        tree.pool().roots().iter().rev().map(|id| (0, id)).collect();
    while let Some((depth, id)) = stack.pop() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        let marker = if visible.contains(id) { '*' } else { ' ' };
        writeln!(
            out,
            "{}{marker} {}",
            "  ".repeat(depth),
            describe(tree, node)
        )?;
        stack.extend(node.child_ids().iter().rev().map(|child| (depth + 1, child)));
    }
    Ok(())
}

fn describe(tree: &MessageTree, node: &MessageNode) -> String {
    let position = tree
        .branch_info(&node.id)
        .or_else(|| tree.root_branch_info(&node.id))
        .filter(|info| info.has_alternatives())
        .map(|info| format!(" [{info}]"))
        .unwrap_or_default();
    let flags = if node.is_streaming { " (streaming)" } else { "" };
    format!(
        "{} {}{position}{flags}: {}",
        node.id,
        node.role,
        preview(&node.content)
    )
}

fn preview(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default();
    let mut preview: String = first_line.chars().take(PREVIEW_CHARS).collect();
    if first_line.chars().count() > PREVIEW_CHARS || content.lines().nth(1).is_some() {
        preview.push_str("...");
    }
    preview
}
