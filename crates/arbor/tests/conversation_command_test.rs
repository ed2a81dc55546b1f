use arbor::cli::ConversationCommands;
use arbor::commands::conversation::ConversationCommand;
use arbor::error::Error;
use arbor_core::conversation::{NodeId, Role};
use arbor_core::preferences::Preferences;
use arbor_core::session::EditPolicy;
use arbor_core::store::{ConversationStore, JsonFileStore};
use arbor_core::test_utils::fixed_context;
use arbor_core::TreeContext;
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    store: Arc<JsonFileStore>,
    preferences: Preferences,
    ctx: TreeContext,
}

impl Harness {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
        let mut preferences = Preferences::default();
        preferences.default_model = Some("pref-model".to_string());
        Self {
            _dir: dir,
            store,
            preferences,
            ctx: fixed_context(),
        }
    }

    async fn run(&self, command: ConversationCommands) -> Result<String, Error> {
        let cmd = ConversationCommand {
            command,
            store: self.store.clone(),
            preferences: self.preferences.clone(),
            ctx: self.ctx.clone(),
        };
        let mut out = Vec::new();
        cmd.run(&mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    async fn new_conversation(&self) -> String {
        self.run(ConversationCommands::New {
            title: Some("demo".to_string()),
        })
        .await
        .unwrap()
        .trim()
        .to_string()
    }

    async fn say(&self, conversation: &str, role: Role, text: &str) -> String {
        self.run(ConversationCommands::Say {
            conversation: conversation.to_string(),
            text: text.to_string(),
            role,
            model: None,
        })
        .await
        .unwrap()
        .trim()
        .to_string()
    }
}

#[tokio::test]
async fn say_edit_and_switch_round_trip_through_the_store() {
    let h = Harness::new().await;
    let conv = h.new_conversation().await;

    assert_eq!(h.say(&conv, Role::User, "What is a trie?").await, "user_1");
    assert_eq!(
        h.say(&conv, Role::Assistant, "A prefix tree.").await,
        "assistant_2"
    );

    let edited = h
        .run(ConversationCommands::Edit {
            conversation: conv[..8].to_string(),
            node: "user_1".to_string(),
            text: "What is a radix tree?".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(edited.trim(), "user_3");

    let shown = h
        .run(ConversationCommands::Show {
            conversation: conv.clone(),
            tree: false,
        })
        .await
        .unwrap();
    assert!(shown.contains("user_3 user [2/2]: What is a radix tree?"));
    assert!(!shown.contains("assistant_2"));

    let switched = h
        .run(ConversationCommands::Switch {
            conversation: conv.clone(),
            node: None,
            position: 1,
        })
        .await
        .unwrap();
    assert!(switched.contains("user_1 user [1/2]: What is a trie?"));
    assert!(switched.contains("assistant_2 assistant: A prefix tree."));

    let stored = h.store.load(conv.parse().unwrap()).await.unwrap();
    assert_eq!(stored.tree.len(), 3);
    assert_eq!(
        stored.tree.get(&NodeId::from("assistant_2")).unwrap().model.as_deref(),
        Some("pref-model")
    );
}

#[tokio::test]
async fn regenerate_next_prev_and_delete() {
    let h = Harness::new().await;
    let conv = h.new_conversation().await;
    h.say(&conv, Role::User, "Name a tree.").await;
    h.say(&conv, Role::Assistant, "Oak").await;

    let regenerated = h
        .run(ConversationCommands::Regenerate {
            conversation: conv.clone(),
            node: "assistant_2".to_string(),
            model: Some("other-model".to_string()),
            content: Some("Birch".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(regenerated.trim(), "assistant_3");

    let prev = h
        .run(ConversationCommands::Prev {
            conversation: conv.clone(),
            node: "assistant_3".to_string(),
        })
        .await
        .unwrap();
    assert!(prev.contains("assistant_2 assistant [1/2]: Oak"));

    let err = h
        .run(ConversationCommands::Prev {
            conversation: conv.clone(),
            node: "assistant_2".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Core(_)));

    let next = h
        .run(ConversationCommands::Next {
            conversation: conv.clone(),
            node: "assistant_2".to_string(),
        })
        .await
        .unwrap();
    assert!(next.contains("assistant_3 assistant [2/2]: Birch"));

    let deleted = h
        .run(ConversationCommands::Delete {
            conversation: conv.clone(),
            node: "user_1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(deleted.trim(), "Deleted 3 messages");

    let stored = h.store.load(conv.parse().unwrap()).await.unwrap();
    assert!(stored.tree.is_empty());
}

#[tokio::test]
async fn in_place_edit_follows_preferences() {
    let mut h = Harness::new().await;
    h.preferences.branching.edit = EditPolicy::InPlace;
    let conv = h.new_conversation().await;
    h.say(&conv, Role::User, "typo").await;

    let edited = h
        .run(ConversationCommands::Edit {
            conversation: conv.clone(),
            node: "user".to_string(),
            text: "fixed".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(edited.trim(), "user_1");

    let tree = h
        .run(ConversationCommands::Show {
            conversation: conv.clone(),
            tree: true,
        })
        .await
        .unwrap();
    assert!(tree.contains("* user_1 user: fixed"));
}

#[tokio::test]
async fn bad_arguments_are_reported() {
    let h = Harness::new().await;
    let conv = h.new_conversation().await;
    h.say(&conv, Role::User, "one").await;
    h.say(&conv, Role::User, "two").await;

    let err = h
        .run(ConversationCommands::Switch {
            conversation: conv.clone(),
            node: None,
            position: 0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let err = h
        .run(ConversationCommands::Delete {
            conversation: conv.clone(),
            node: "user_".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Ambiguous { count: 2, .. }));

    let err = h
        .run(ConversationCommands::Show {
            conversation: "ffffffff".to_string(),
            tree: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoMatch { .. }));

    let listed = h.run(ConversationCommands::List).await.unwrap();
    assert!(listed.contains(&conv));
    assert!(listed.contains("demo"));
}
