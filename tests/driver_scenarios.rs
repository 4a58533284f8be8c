//! Conversation scenarios over real agents and a scripted backend.

use std::sync::Arc;

use automl_agents::agent::{ConversationDriver, Termination};
use automl_agents::agents::{run_phase, Agent, DataCleaner, FeatureEngineer};
use automl_agents::data::{Column, Dataset};
use automl_agents::llm::{
    Content, LlmClient, ModelResponse, Part, Role, ScriptedClient, ToolCallRequest,
};
use automl_agents::tools::Toolbox;
use serde_json::json;

fn table() -> Dataset {
    Dataset::new(vec![
        Column::int("A", vec![Some(1), Some(2), Some(3)]),
        Column::float("Possession", vec![Some(40.0), None, Some(60.0)]),
        Column::text("Venue", vec![Some("Home"), Some("Away"), Some("Home")]),
        Column::int("ArsenalWin", vec![Some(1), Some(0), Some(1)]),
    ])
    .unwrap()
}

fn call(name: &str, args: serde_json::Value) -> ToolCallRequest {
    ToolCallRequest::new(name, args)
}

/// Payloads of the function responses in a user turn.
fn payloads(turn: &Content) -> Vec<String> {
    assert_eq!(turn.role, Role::User);
    turn.parts
        .iter()
        .map(|part| match part {
            Part::FunctionResponse(result) => result.payload.clone(),
            other => panic!("unexpected part in results turn: {:?}", other),
        })
        .collect()
}

#[tokio::test]
async fn cleaner_three_turn_conversation() {
    let client = Arc::new(ScriptedClient::new(vec![
        ModelResponse::tool_calls(vec![call(
            "impute_missing",
            json!({"col": "Possession", "strategy": "mean"}),
        )]),
        ModelResponse::tool_calls(vec![call("drop_column", json!({"col": "A"}))]),
        ModelResponse::text("CLEANING_COMPLETE, done."),
    ]));
    let mut cleaner = DataCleaner::new(table());

    let outcome = run_phase(
        &mut cleaner,
        client.clone(),
        "test-model",
        50,
        "Please audit and clean the raw dataset.",
    )
    .await;

    assert_eq!(outcome.text, "CLEANING_COMPLETE, done.");
    assert_eq!(outcome.turns, 3);
    assert_eq!(outcome.tool_calls, 2);
    assert!(outcome.is_success());
    assert_eq!(
        cleaner.actions(),
        &["Imputed Possession using mean", "Dropped column A"]
    );

    let df = cleaner.into_dataset();
    assert!(!df.has_column("A"));
    assert_eq!(df.column("Possession").unwrap().data.null_count(), 0);

    let requests = client.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(
        payloads(&requests[1].contents[2]),
        vec!["Imputed Possession using mean"]
    );
    assert_eq!(payloads(&requests[2].contents[4]), vec!["Dropped column A"]);
    assert!(requests
        .iter()
        .all(|r| r.system_instruction.contains("The Auditor") && r.tools.len() == 4));
}

#[tokio::test]
async fn refusal_ends_phase_with_diagnostic() {
    let client = Arc::new(ScriptedClient::new(vec![ModelResponse::refusal("SAFETY")]));
    let mut cleaner = DataCleaner::new(table());

    let outcome = run_phase(&mut cleaner, client.clone(), "m", 50, "go").await;

    assert_eq!(outcome.termination, Termination::Refused(Some("SAFETY".to_string())));
    assert_eq!(
        outcome.text,
        "[The Auditor] Error: No content in response. Finish reason: SAFETY"
    );
    assert_eq!(client.remaining(), 0);
    assert_eq!(cleaner.dataset(), &table());
}

#[tokio::test]
async fn unknown_tool_is_reported_and_loop_continues() {
    let client = Arc::new(ScriptedClient::new(vec![
        ModelResponse::tool_calls(vec![call("frobnicate", json!({"x": 1}))]),
        ModelResponse::text("sorry, done"),
    ]));
    let mut cleaner = DataCleaner::new(table());

    let outcome = run_phase(&mut cleaner, client.clone(), "m", 50, "go").await;

    assert_eq!(outcome.text, "sorry, done");
    let requests = client.requests();
    assert_eq!(
        payloads(&requests[1].contents[2]),
        vec!["Unknown tool: frobnicate"]
    );
    assert!(cleaner.actions().is_empty());
}

#[tokio::test]
async fn mutation_is_visible_to_the_next_call_in_the_same_turn() {
    let client = Arc::new(ScriptedClient::new(vec![
        ModelResponse::tool_calls(vec![
            call("drop_column", json!({"col": "A"})),
            call("get_column_stats", json!({"col": "A"})),
        ]),
        ModelResponse::text("ok"),
    ]));
    let mut cleaner = DataCleaner::new(table());

    run_phase(&mut cleaner, client.clone(), "m", 50, "go").await;

    assert_eq!(
        payloads(&client.requests()[1].contents[2]),
        vec!["Dropped column A", "Error: Column A not found"]
    );
}

#[tokio::test]
async fn n_calls_yield_one_results_turn_with_n_parts_in_order() {
    let client = Arc::new(ScriptedClient::new(vec![
        ModelResponse::tool_calls(vec![
            call("inspect_metadata", json!({})),
            call("get_column_stats", json!({"col": "Venue"})),
            call("impute_missing", json!({"col": "Venue", "strategy": "mean"})),
            call("get_column_stats", json!({})),
        ]),
        ModelResponse::text("done"),
    ]));
    let mut cleaner = DataCleaner::new(table());

    run_phase(&mut cleaner, client.clone(), "m", 50, "go").await;

    let requests = client.requests();
    let second = &requests[1].contents;
    assert_eq!(second.len(), 3);
    assert_eq!(second[1].role, Role::Model);
    assert_eq!(second[1].tool_calls().len(), 4);

    let results = payloads(&second[2]);
    assert_eq!(results.len(), 4);
    assert!(results[0].starts_with("{\"shape\":[3,4]"));
    assert!(results[1].contains("\"unique_values\""));
    assert!(results[2].starts_with("Error: "));
    assert!(results[3].starts_with("Error: Invalid arguments for get_column_stats"));

    let names: Vec<String> = second[2]
        .parts
        .iter()
        .filter_map(|p| match p {
            Part::FunctionResponse(r) => Some(r.name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        names,
        vec![
            "inspect_metadata",
            "get_column_stats",
            "impute_missing",
            "get_column_stats"
        ]
    );
}

#[tokio::test]
async fn repeated_reads_are_idempotent() {
    let client = Arc::new(ScriptedClient::new(vec![
        ModelResponse::tool_calls(vec![
            call("get_column_stats", json!({"col": "Possession"})),
            call("get_column_stats", json!({"col": "Possession"})),
        ]),
        ModelResponse::text("done"),
    ]));
    let mut cleaner = DataCleaner::new(table());

    run_phase(&mut cleaner, client.clone(), "m", 50, "go").await;

    let results = payloads(&client.requests()[1].contents[2]);
    assert_eq!(results[0], results[1]);
    assert_eq!(cleaner.dataset(), &table());
}

#[tokio::test]
async fn runaway_model_hits_turn_ceiling() {
    let client = Arc::new(ScriptedClient::new(
        (0..10).map(|_| ModelResponse::tool_calls(vec![call("inspect_metadata", json!({}))])),
    ));
    let mut cleaner = DataCleaner::new(table());

    let outcome = run_phase(&mut cleaner, client.clone(), "m", 4, "go").await;

    assert_eq!(outcome.termination, Termination::TurnLimit(4));
    assert_eq!(
        outcome.text,
        "[The Auditor] Error: Max turns (4) exceeded without a final answer"
    );
    assert_eq!(client.remaining(), 6);
}

#[tokio::test]
async fn engineer_prompt_carries_cleaner_summary() {
    let client = Arc::new(ScriptedClient::new(vec![ModelResponse::text(
        "ENGINEERING_COMPLETE",
    )]));
    let mut engineer = FeatureEngineer::new(table(), "ArsenalWin", "Dropped column A");

    let outcome = run_phase(&mut engineer, client.clone(), "m", 50, "go").await;

    assert_eq!(outcome.text, "ENGINEERING_COMPLETE");
    let requests = client.requests();
    let request = &requests[0];
    assert!(request
        .system_instruction
        .ends_with("Cleaner Summary: Dropped column A"));
    let tools: Vec<&str> = request.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        tools,
        vec![
            "create_interaction",
            "encode_categorical",
            "correlation_analysis",
            "select_top_features",
            "inspect_metadata"
        ]
    );
}

#[tokio::test]
async fn driver_accepts_any_toolbox() {
    let client: Arc<dyn LlmClient> = Arc::new(ScriptedClient::new(vec![
        ModelResponse::tool_calls(vec![call("drop_column", json!({"col": "Venue"}))]),
        ModelResponse::text("bye"),
    ]));
    let mut cleaner = DataCleaner::new(table());
    let declarations = cleaner.declarations();

    let mut driver = ConversationDriver::new(client, "m", "Custom", "prompt", declarations);
    let outcome = driver.run(&mut cleaner, "hello").await;

    assert_eq!(outcome.agent, "Custom");
    assert_eq!(driver.conversation().len(), 3);
    assert!(!cleaner.dataset().has_column("Venue"));
}
