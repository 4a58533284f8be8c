//! AutoML Agents - command-line entry point
//!
//! Loads the raw dataset (generating a sample one if absent) and runs the
//! three phases against the configured model.

use std::sync::Arc;

use automl_agents::{
    config::Config,
    data::{sample, Dataset},
    llm::{GeminiClient, LlmClient},
    pipeline::Pipeline,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SAMPLE_SEED: u64 = 42;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "automl_agents=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration: model={}", config.default_model);

    let raw_path = config.raw_data_path();
    if !raw_path.exists() {
        info!("No dataset at {}, generating sample data", raw_path.display());
        sample::generate(SAMPLE_SEED)?.to_csv_path(&raw_path)?;
    }
    let raw = Dataset::from_csv_path(&raw_path)?;
    info!(
        "Loaded {} ({} rows x {} columns)",
        raw_path.display(),
        raw.n_rows(),
        raw.n_cols()
    );

    let llm: Arc<dyn LlmClient> = Arc::new(GeminiClient::new(&config.api_key, &config.base_url));
    let report = Pipeline::new(config, llm).run(raw).await?;

    info!(
        "Run {} finished; report at {}",
        report.run_id,
        report.report_path.display()
    );

    Ok(())
}
