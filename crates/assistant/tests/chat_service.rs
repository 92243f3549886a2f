//! ChatService against an in-memory database.

use std::sync::{Arc, Mutex};

use assistant::{async_trait, Assistant, AssistantError, ChatService, EchoAssistant};
use database::{chat_message, ChatMessage, ChatRole, Database};

/// Records the history it was given and replies from a script.
#[derive(Default)]
struct ScriptedAssistant {
    fail: bool,
    seen_history: Mutex<Vec<usize>>,
}

#[async_trait]
impl Assistant for ScriptedAssistant {
    async fn complete(&self, message: &str, history: &[ChatMessage]) -> Result<String, AssistantError> {
        self.seen_history.lock().unwrap().push(history.len());
        if self.fail {
            return Err(AssistantError::Timeout);
        }
        Ok(format!("You said: {}", message))
    }

    fn name(&self) -> &str {
        "ScriptedAssistant"
    }
}

async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

#[tokio::test]
async fn test_exchange_is_persisted() {
    let db = test_db().await;
    let service = ChatService::new(db.clone(), Arc::new(EchoAssistant::with_prefix("Echo: ")));

    let exchange = service.send("alice", "  Is 120/80 normal?  ").await.unwrap();
    assert_eq!(exchange.message.content, "Is 120/80 normal?");
    assert_eq!(exchange.message.role, ChatRole::User);
    assert_eq!(exchange.reply.content, "Echo: Is 120/80 normal?");
    assert_eq!(exchange.reply.role, ChatRole::Assistant);

    let history = service.history("alice", 10).await.unwrap();
    assert_eq!(history, vec![exchange.message, exchange.reply]);
}

#[tokio::test]
async fn test_failure_stores_nothing() {
    let db = test_db().await;
    let assistant = Arc::new(ScriptedAssistant {
        fail: true,
        ..Default::default()
    });
    let service = ChatService::new(db.clone(), assistant);

    let err = service.send("alice", "hello").await.unwrap_err();
    assert!(err.is_unavailable());
    assert!(chat_message::recent_messages(db.pool(), "alice", 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_history_window_is_passed_as_context() {
    let db = test_db().await;
    let assistant = Arc::new(ScriptedAssistant::default());
    let service = ChatService::new(db.clone(), assistant.clone()).with_history_turns(1);

    service.send("alice", "one").await.unwrap();
    service.send("alice", "two").await.unwrap();
    service.send("alice", "three").await.unwrap();
    service.send("bob", "hi").await.unwrap();

    assert_eq!(*assistant.seen_history.lock().unwrap(), vec![0, 2, 2, 0]);
}

#[tokio::test]
async fn test_empty_message_rejected_and_clear() {
    let db = test_db().await;
    let service = ChatService::new(db.clone(), Arc::new(EchoAssistant::new()));

    assert!(matches!(
        service.send("alice", "   ").await,
        Err(AssistantError::Validation(_))
    ));

    service.send("alice", "hello").await.unwrap();
    assert_eq!(service.clear_history("alice").await.unwrap(), 2);
    assert!(service.history("alice", 10).await.unwrap().is_empty());
}
