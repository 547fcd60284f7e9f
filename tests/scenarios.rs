// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! Facade-level smoke tests: the public `tandem` API wired end-to-end with
//! the scripted completer.

use std::sync::Arc;

use serde_json::json;
use tandem::{
    Completion, FnExecutor, Message, Scaffold, ScaffoldConfig, ScriptedCompleter,
    ScriptedResponse, ToolCall, ToolRegistry,
};

fn accept(output: &str) -> ScriptedResponse {
    ScriptedResponse::text(
        json!({ "review_result": true, "added_notes": [], "output": output }).to_string(),
    )
}

#[tokio::test]
async fn one_shot_query_returns_reviewed_answer() {
    let completer = Arc::new(ScriptedCompleter::new(vec![
        ScriptedResponse::text("391"),
        accept("391"),
    ]));
    let answer = tandem::query(completer, &[Message::user("What is 17 * 23?")])
        .await
        .unwrap();
    assert_eq!(answer, "391");
}

#[tokio::test]
async fn scaffold_with_local_tools_resolves_calls() {
    let mut registry = ToolRegistry::new();
    registry.register(FnExecutor::new(
        "calc",
        "evaluates an arithmetic expression",
        json!({"type": "object", "properties": {"expression": {"type": "string"}}}),
        |_| "391".to_string(),
    ));

    // The reviewer runs with tools offered, so its structured format is
    // deferred and the verdict is requested twice (text, then structured).
    let completer = Arc::new(ScriptedCompleter::new(vec![
        ScriptedResponse::Ok(Completion {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "c1".into(),
                name: "calc".into(),
                arguments: r#"{"expression": "17*23"}"#.into(),
            }],
            usage: None,
        }),
        ScriptedResponse::text("17 * 23 = 391"),
        accept("17 * 23 = 391"),
        accept("17 * 23 = 391"),
    ]));

    let mut scaffold = Scaffold::with_tools(
        completer,
        Arc::new(registry),
        ScaffoldConfig::default(),
    )
    .unwrap();

    let answer = scaffold.query(&[Message::user("what is 17 * 23?")]).await.unwrap();
    assert_eq!(answer, "17 * 23 = 391");
    assert_eq!(scaffold.iteration_count(), 2);
    assert!(scaffold.usage_last().total_tokens > 0);
}

#[tokio::test]
async fn checkpoint_round_trip_through_the_facade() {
    let completer = Arc::new(ScriptedCompleter::always_text("x"));
    let mut scaffold = Scaffold::new(completer.clone(), ScaffoldConfig::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    scaffold.save_checkpoint(&path).unwrap();

    let mut other = Scaffold::new(completer, ScaffoldConfig::default()).unwrap();
    other.load_checkpoint(&path).unwrap();
    assert_eq!(other.iteration_count(), 0);
}
