use clap::Parser;
use dotenvy::dotenv;
use quickdrop::config::{AppConfig, DEFAULT_BASE_URL, EXAMPLE_TOKEN};
use quickdrop::infrastructure::storage::FileStore;
use quickdrop::services::upload::UploadService;
use quickdrop::utils::ident::RandomIds;
use quickdrop::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides the PORT environment variable)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quickdrop=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }

    match config.token.as_deref() {
        None => warn!("⚠️  No TOKEN set, anyone will be able to use this server!"),
        Some(EXAMPLE_TOKEN) => {
            warn!("⚠️  TOKEN is set to the example value, please change it to a secure one!")
        }
        Some(_) => {}
    }
    if config.base_url == DEFAULT_BASE_URL {
        warn!("⚠️  No BASE_URL set, defaulting to {}", DEFAULT_BASE_URL);
    }
    info!(
        "📏 Maximum file size set to {} MB",
        config.max_file_size / 1024 / 1024
    );

    let config = Arc::new(config);
    let store = Arc::new(FileStore::open(&config.storage_path).await?);
    let uploads = Arc::new(UploadService::new(store.clone(), Arc::new(RandomIds)));

    let state = AppState {
        config: config.clone(),
        store,
        uploads,
    };

    let trace_layer = TraceLayer::new_for_http()
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    let app = create_app(state).layer(trace_layer);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ Server is now running on http://0.0.0.0:{}", config.port);

    // Faults escaping the router are fatal: log, stop listening, exit
    // nonzero rather than limp along in an unknown state.
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        error!("❌ Server runtime error: {}", e);
        std::process::exit(1);
    }

    info!("👋 Server exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
