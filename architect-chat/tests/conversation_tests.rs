//! Conversation store windowing tests.

use architect_chat::{ConversationStore, Role, Turn};

#[tokio::test]
async fn history_is_chronological_most_recent_last() {
    let store = ConversationStore::new(10);
    store.append("c1", Turn::user("first")).await;
    store.append("c1", Turn::assistant("second")).await;
    store.append("c1", Turn::user("third")).await;

    let history = store.history("c1").await;
    let contents: Vec<&str> = history.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, ["first", "second", "third"]);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
}

#[tokio::test]
async fn window_evicts_oldest_first() {
    let window = 4;
    let store = ConversationStore::new(window);

    // Append window + 1 turns: exactly the window-most-recent survive.
    for i in 0..=window {
        store.append("c1", Turn::user(format!("turn {i}"))).await;
    }

    let history = store.history("c1").await;
    assert_eq!(history.len(), window);
    assert_eq!(history[0].content, "turn 1");
    assert_eq!(history.last().unwrap().content, format!("turn {window}"));
}

#[tokio::test]
async fn conversations_are_independent() {
    let store = ConversationStore::new(4);
    store.append("c1", Turn::user("for c1")).await;
    store.append("c2", Turn::user("for c2")).await;

    assert_eq!(store.history("c1").await.len(), 1);
    assert_eq!(store.history("c2").await.len(), 1);
    assert!(store.history("c3").await.is_empty());

    store.clear("c1").await;
    assert!(store.history("c1").await.is_empty());
    assert_eq!(store.history("c2").await.len(), 1);
}

#[tokio::test]
async fn concurrent_appends_to_one_conversation_all_land() {
    let store = std::sync::Arc::new(ConversationStore::new(64));

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = std::sync::Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.append("c1", Turn::user(format!("turn {i}"))).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Arrival order is whatever the scheduler chose, but nothing is lost
    // and nothing is interleaved into other conversations.
    assert_eq!(store.history("c1").await.len(), 16);
}
