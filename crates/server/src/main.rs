use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use assistants::HttpAssistantsClient;
use clap::Parser;
use driver::RunDriver;
use gateway::GatewayServer;
use types::{AssistantsApi, ServiceConfig, init_tracing};

#[derive(Debug, Parser)]
#[command(name = "assistant-relay", about = "Chat relay over the hosted assistant service")]
struct CliArgs {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
}

#[derive(Debug, thiserror::Error)]
enum ServerError {
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ServerError> {
    init_tracing();
    let args = CliArgs::parse();

    let config = ServiceConfig::from_env();
    // Keep serving on bad config: requests answer 500 until the operator
    // fixes the environment, which beats crash-looping under a supervisor.
    if let Err(error) = config.validate() {
        tracing::warn!(%error, "configuration incomplete, requests will be rejected");
    }

    let api: Arc<dyn AssistantsApi> = Arc::new(HttpAssistantsClient::new(&config));
    let driver = RunDriver::new(Arc::clone(&api), tools::knowledge_registry());
    let server = GatewayServer::new(config, api, driver);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(bind = %args.bind, "listening");
    axum::serve(listener, server.router()).await?;
    Ok(())
}
