use clap::Parser;
use reqwest::Client;
use sensechat_proxy::config::Config;
use sensechat_proxy::{AppState, BUILD_TIME, GIT_HASH, VERSION, app};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sensechat-proxy")]
#[command(about = "OpenAI-compatible proxy for the SenseNova chat API")]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, env = "SENSECHAT_PROXY_HOST")]
    host: Option<String>,

    /// Port to bind to
    #[arg(short, long, env = "SENSECHAT_PROXY_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::from_env().expect("Invalid configuration");

    let host = args.host.unwrap_or_else(|| config.host.clone());
    let port = args.port.unwrap_or(config.port);

    let http_client = Client::builder()
        .build()
        .expect("Failed to create HTTP client");

    let state = Arc::new(AppState::new(&config, http_client));

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Invalid address");
    info!(
        "Starting sensechat-proxy v{}-{} (built {})",
        VERSION, GIT_HASH, BUILD_TIME
    );
    info!("Upstream: {}", config.upstream_url);
    match &config.passthrough_url {
        Some(url) => info!("Passthrough: {}", url),
        None => info!("Passthrough: host named by each request"),
    }
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app(state))
        .await
        .expect("Server error");
}
