//! Prompt assembly tests: template rendering and the budget sacrifice order.

use architect_chat::{SYSTEM_INSTRUCTION, Turn, assemble};
use architect_model::MessageRole;
use architect_rag::{Chunk, SearchResult};

fn result(source_id: &str, seq: usize, text: &str, score: f32) -> SearchResult {
    SearchResult {
        chunk: Chunk {
            id: format!("{source_id}#{seq}"),
            source_id: source_id.to_string(),
            seq,
            start: 0,
            end: text.len(),
            text: text.to_string(),
            embedding: Vec::new(),
        },
        score,
    }
}

// A small fixed system string keeps the budget arithmetic in these tests
// readable; the real instruction is exercised in the assistant tests.
const SYSTEM: &str = "You answer from the docs.";

#[test]
fn everything_survives_under_a_generous_budget() {
    let results = vec![
        result("docs/a", 0, "best match", 0.9),
        result("docs/b", 0, "second match", 0.7),
    ];
    let history = vec![Turn::user("earlier question"), Turn::assistant("earlier answer")];

    let prompt = assemble("current question", results, history, SYSTEM, 100_000);

    assert_eq!(prompt.context.len(), 2);
    assert_eq!(prompt.history.len(), 2);
    assert_eq!(prompt.system, SYSTEM);
    assert_eq!(prompt.query, "current question");
}

#[test]
fn lowest_similarity_chunks_are_dropped_first() {
    let results = vec![
        result("docs/a", 0, "x".repeat(200).as_str(), 0.9),
        result("docs/b", 0, "y".repeat(200).as_str(), 0.7),
        result("docs/c", 0, "z".repeat(200).as_str(), 0.5),
    ];

    // Room for the fixed parts and roughly two chunks.
    let budget = SYSTEM.len() + "q".len() + 2 * (200 + "docs/a".len()) + 10;
    let prompt = assemble("q", results, Vec::new(), SYSTEM, budget);

    let survivors: Vec<&str> = prompt.context.iter().map(|r| r.chunk.source_id.as_str()).collect();
    assert_eq!(survivors, ["docs/a", "docs/b"]);
}

#[test]
fn oldest_turns_are_dropped_before_the_best_chunk() {
    let results = vec![result("docs/a", 0, "the one relevant passage", 0.9)];
    let history = vec![
        Turn::user("oldest question"),
        Turn::assistant("oldest answer"),
        Turn::user("recent question"),
    ];

    // Budget fits the fixed parts, the single chunk, and one history turn.
    let chunk_cost = "the one relevant passage".len() + "docs/a".len();
    let budget = SYSTEM.len() + "q".len() + chunk_cost + "recent question".len() + 2;
    let prompt = assemble("q", results, history, SYSTEM, budget);

    // The chunk survives; history lost its oldest turns first.
    assert_eq!(prompt.context.len(), 1);
    let kept: Vec<&str> = prompt.history.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(kept, ["recent question"]);
}

#[test]
fn system_and_query_always_survive() {
    let results = vec![
        result("docs/a", 0, "a".repeat(500).as_str(), 0.9),
        result("docs/b", 0, "b".repeat(500).as_str(), 0.8),
    ];
    let history = vec![Turn::user("h".repeat(500))];

    // Budget below even the fixed parts: everything else is sacrificed, the
    // best chunk last, but the system instruction and query are untouched.
    let prompt = assemble("the question", results, history, SYSTEM, 1);

    assert!(prompt.context.is_empty());
    assert!(prompt.history.is_empty());
    assert_eq!(prompt.system, SYSTEM);
    assert_eq!(prompt.query, "the question");
}

#[test]
fn sources_are_distinct_and_rank_ordered() {
    let results = vec![
        result("docs/a", 0, "one", 0.9),
        result("docs/b", 0, "two", 0.8),
        result("docs/a", 1, "three", 0.7),
    ];
    let prompt = assemble("q", results, Vec::new(), SYSTEM, 100_000);

    assert_eq!(prompt.sources(), ["docs/a", "docs/b"]);
}

#[test]
fn rendered_request_follows_the_template_order() {
    let results = vec![result("docs/faq", 0, "The challenge period is 7 days.", 0.9)];
    let history = vec![Turn::user("hello"), Turn::assistant("hi, how can I help?")];

    let prompt = assemble("What is the challenge period?", results, history, SYSTEM, 100_000);
    let request = prompt.into_request(0.7, 2048);

    assert_eq!(request.system.as_deref(), Some(SYSTEM));
    assert_eq!(request.messages.len(), 3);
    assert_eq!(request.messages[0].role, MessageRole::User);
    assert_eq!(request.messages[0].content, "hello");
    assert_eq!(request.messages[1].role, MessageRole::Assistant);

    let last = &request.messages[2];
    assert_eq!(last.role, MessageRole::User);
    assert!(last.content.contains("Source: docs/faq"));
    assert!(last.content.contains("The challenge period is 7 days."));
    assert!(last.content.ends_with("What is the challenge period?"));
}

#[test]
fn empty_context_renders_the_no_context_note() {
    let prompt = assemble("anything indexed?", Vec::new(), Vec::new(), SYSTEM, 100_000);
    assert!(prompt.sources().is_empty());

    let request = prompt.into_request(0.7, 2048);
    let last = request.messages.last().unwrap();
    assert!(last.content.contains("No relevant documentation was found"));
}

#[test]
fn uses_the_real_system_instruction_untruncated() {
    // Even a budget smaller than the instruction itself never cuts it.
    let prompt = assemble("q", Vec::new(), Vec::new(), SYSTEM_INSTRUCTION, 10);
    assert_eq!(prompt.system, SYSTEM_INSTRUCTION);
}
