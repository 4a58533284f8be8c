//! End-to-end pipeline runs over the scripted backend.
#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;

use automl_agents::config::{Config, SandboxConfig};
use automl_agents::data::{sample, Dataset};
use automl_agents::llm::{ModelResponse, Part, ScriptedClient, ToolCallRequest};
use automl_agents::pipeline::{render_report, Pipeline};
use serde_json::json;

fn config(root: &Path) -> Config {
    let mut config = Config::new("test-key");
    config.data_dir = root.join("data");
    config.report_path = root.join("FINAL_REPORT.md");
    // `sh` stands in for the interpreter so the run needs no Python install.
    config.sandbox = SandboxConfig {
        python_bin: "sh".to_string(),
        timeout_secs: 10,
        memory_limit_mb: 0,
    };
    config
}

fn call(name: &str, args: serde_json::Value) -> ToolCallRequest {
    ToolCallRequest::new(name, args)
}

#[tokio::test]
async fn full_run_writes_snapshots_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let script = "test -f \"$DATASET_PATH\" || exit 2\n\
                  n_estimators=200\n\
                  echo 'Accuracy: 0.80'\n\
                  echo 'F1 Score: 0.78'\n";

    let client = Arc::new(ScriptedClient::new(vec![
        // Cleaner
        ModelResponse::tool_calls(vec![
            call("inspect_metadata", json!({})),
            call("impute_missing", json!({"col": "Possession", "strategy": "median"})),
            call("impute_missing", json!({"col": "ShotsOnTarget", "strategy": "mode"})),
        ]),
        ModelResponse::tool_calls(vec![call("drop_column", json!({"col": "MatchID"}))]),
        ModelResponse::text("CLEANING_COMPLETE: imputed two columns, dropped MatchID."),
        // Engineer
        ModelResponse::tool_calls(vec![
            call(
                "create_interaction",
                json!({"col1": "Possession", "col2": "ShotsOnTarget", "operation": "multiply"}),
            ),
            call("encode_categorical", json!({"col": "Venue", "method": "onehot"})),
            call("encode_categorical", json!({"col": "Opponent", "method": "label"})),
        ]),
        ModelResponse::tool_calls(vec![call(
            "select_top_features",
            json!({"target": "ArsenalWin", "k": 4}),
        )]),
        ModelResponse::text("ENGINEERING_COMPLETE: kept the top 4 features."),
        // Trainer
        ModelResponse::tool_calls(vec![call("execute_python_code", json!({"code_string": script}))]),
        ModelResponse::text("TRAINING_COMPLETE: Accuracy 0.80, F1 0.78."),
    ]));

    let raw = sample::generate(7).unwrap();
    let report = Pipeline::new(config.clone(), client.clone())
        .with_workdir(dir.path())
        .run(raw)
        .await
        .unwrap();

    assert_eq!(client.remaining(), 0);
    assert_eq!(report.phases.len(), 3);
    assert!(report.phases.iter().all(|p| p.is_success()));

    let clean = Dataset::from_csv_path(&config.clean_data_path()).unwrap();
    assert_eq!(clean.n_rows(), 100);
    assert!(!clean.has_column("MatchID"));
    assert_eq!(clean.column("Possession").unwrap().data.null_count(), 0);
    assert_eq!(clean.column("ShotsOnTarget").unwrap().data.null_count(), 0);

    let engineered = Dataset::from_csv_path(&config.engineered_data_path()).unwrap();
    assert_eq!(engineered.n_cols(), 5);
    assert_eq!(engineered.column_names()[0], "ArsenalWin");
    assert_eq!(engineered, report.dataset);

    let expected = render_report(
        "CLEANING_COMPLETE: imputed two columns, dropped MatchID.",
        "ENGINEERING_COMPLETE: kept the top 4 features.",
        "TRAINING_COMPLETE: Accuracy 0.80, F1 0.78.",
    );
    assert_eq!(report.markdown, expected);
    assert_eq!(std::fs::read_to_string(&config.report_path).unwrap(), expected);

    let requests = client.requests();
    assert!(requests[3]
        .system_instruction
        .ends_with("Cleaner Summary: CLEANING_COMPLETE: imputed two columns, dropped MatchID."));
    assert!(requests[6]
        .system_instruction
        .ends_with("Engineering Summary: ENGINEERING_COMPLETE: kept the top 4 features."));
    assert_eq!(
        requests[6].contents[0].text(),
        format!(
            "Please train an XGBoost model on '{}' to predict 'ArsenalWin'.",
            config.engineered_data_path().display()
        )
    );

    let training_result = match &requests[7].contents[2].parts[0] {
        Part::FunctionResponse(result) => result.payload.clone(),
        other => panic!("expected a function response, got {:?}", other),
    };
    assert!(training_result.starts_with("Exit code: 0"));
    assert!(training_result.contains("Accuracy: 0.80"));
}

#[tokio::test]
async fn degraded_phase_still_produces_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let client = Arc::new(ScriptedClient::new(vec![
        ModelResponse::refusal("SAFETY"),
        ModelResponse::text("ENGINEERING_COMPLETE"),
        ModelResponse::text("TRAINING_COMPLETE"),
    ]));

    let raw = sample::generate(1).unwrap();
    let report = Pipeline::new(config.clone(), client.clone())
        .with_workdir(dir.path())
        .run(raw.clone())
        .await
        .unwrap();

    assert!(!report.phases[0].is_success());
    assert!(report.markdown.contains(
        "## Agent 1: The Auditor (Data Cleaner)\n[The Auditor] Error: No content in response. Finish reason: SAFETY\n"
    ));
    assert!(client.requests()[1]
        .system_instruction
        .ends_with("Cleaner Summary: [The Auditor] Error: No content in response. Finish reason: SAFETY"));

    // Nothing ran, so the raw table flows through untouched.
    assert_eq!(report.dataset, raw);
    assert!(config.report_path.exists());
}

#[tokio::test]
async fn exhausted_backend_degrades_every_phase() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let client = Arc::new(ScriptedClient::new(vec![]));

    let report = Pipeline::new(config, client)
        .with_workdir(dir.path())
        .run(sample::generate(3).unwrap())
        .await
        .unwrap();

    assert!(report.phases.iter().all(|p| !p.is_success()));
    assert!(report
        .markdown
        .contains("[The Coder] Error: Model backend failed"));
}
