use clap::Parser;
use scenario_mock_server::{Config, MockHttpServer, MockServer};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scenario-mock-server")]
#[command(author, version, about = "Scenario-driven HTTP and GraphQL mock server")]
struct Args {
    /// Scenario file (.yaml, .yml or .json)
    #[arg(short, long, env = "MOCK_CONFIG")]
    config: PathBuf,

    #[arg(short, long, env = "MOCK_PORT")]
    port: Option<u16>,

    #[arg(long, env = "MOCK_HOST")]
    host: Option<String>,

    /// Keep each client's session in a cookie instead of server memory
    #[arg(long, env = "MOCK_COOKIE_MODE")]
    cookie_mode: bool,

    #[arg(long)]
    select_scenario_path: Option<String>,

    #[arg(long)]
    scenarios_path: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let Config {
        mut options,
        scenarios,
    } = Config::from_file(&args.config)?;

    if let Some(port) = args.port {
        options.port = port;
    }
    if let Some(host) = args.host {
        options.host = host;
    }
    if args.cookie_mode {
        options.cookie_mode = true;
    }
    if let Some(path) = args.select_scenario_path {
        options.select_scenario_path = path;
    }
    if let Some(path) = args.scenarios_path {
        options.scenarios_path = path;
    }

    let server = MockHttpServer::bind(MockServer::new(scenarios, options)?).await?;
    server
        .serve_with_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C");
            }
        })
        .await
}
