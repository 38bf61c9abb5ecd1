use gce_metrics::{api, config::Config, logging, telemetry, Result};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("gce_metrics: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize logging
    logging::init_logger(config.log_format)?;

    // Initialize telemetry
    telemetry::init_telemetry();

    tracing::info!(
        policy = ?config.failure_policy,
        request_timeout = ?config.request_timeout,
        static_token = config.access_token.is_some(),
        "Loaded configuration"
    );

    let state = api::AppState::from_config(&config)?;
    api::serve(&config, state).await
}
