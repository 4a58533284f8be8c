//! A relative data directory combined with a separate script workdir.
//!
//! Changes the process working directory, so it lives in its own test
//! binary with a single test.
#![cfg(unix)]

use std::path::PathBuf;
use std::sync::Arc;

use automl_agents::config::{Config, SandboxConfig};
use automl_agents::data::sample;
use automl_agents::llm::{ModelResponse, Part, ScriptedClient, ToolCallRequest};
use automl_agents::pipeline::Pipeline;
use serde_json::json;

#[tokio::test]
async fn trainer_finds_snapshot_from_another_workdir() {
    let cwd = tempfile::tempdir().unwrap();
    let scripts = tempfile::tempdir().unwrap();
    std::env::set_current_dir(cwd.path()).unwrap();

    let mut config = Config::new("test-key");
    config.data_dir = PathBuf::from("data");
    config.report_path = PathBuf::from("FINAL_REPORT.md");
    config.sandbox = SandboxConfig {
        python_bin: "sh".to_string(),
        timeout_secs: 10,
        memory_limit_mb: 0,
    };

    let script = "test -f \"$DATASET_PATH\" && echo FOUND || echo MISSING\n";
    let client = Arc::new(ScriptedClient::new(vec![
        ModelResponse::text("CLEANING_COMPLETE"),
        ModelResponse::text("ENGINEERING_COMPLETE"),
        ModelResponse::tool_calls(vec![ToolCallRequest::new(
            "execute_python_code",
            json!({"code_string": script}),
        )]),
        ModelResponse::text("TRAINING_COMPLETE"),
    ]));

    let report = Pipeline::new(config, client.clone())
        .with_workdir(scripts.path())
        .run(sample::generate(5).unwrap())
        .await
        .unwrap();
    assert!(report.phases.iter().all(|p| p.is_success()));
    assert!(cwd.path().join("data/engineered_data.csv").exists());

    let requests = client.requests();
    let kickoff = requests[2].contents[0].text();
    let quoted = kickoff
        .split('\'')
        .nth(1)
        .expect("kickoff quotes the dataset path");
    assert!(PathBuf::from(quoted).is_absolute(), "{}", kickoff);

    let payload = match &requests[3].contents[2].parts[0] {
        Part::FunctionResponse(result) => result.payload.clone(),
        other => panic!("expected a function response, got {:?}", other),
    };
    assert!(payload.contains("FOUND"), "{}", payload);
    assert!(!payload.contains("MISSING"), "{}", payload);
}
