use clap::Parser;
use dotenvy::dotenv;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use video_ingest::config::{IngestConfig, StorageConfig};
use video_ingest::infrastructure::{database, media, storage};
use video_ingest::services::access_url::AccessUrlIssuer;
use video_ingest::services::ingest::IngestService;
use video_ingest::services::video_repository::SeaOrmVideoRepository;
use video_ingest::{AppState, create_app};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the API server to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port for the API server
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "video_ingest=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Video Ingest...");

    let ingest_config = IngestConfig::from_env();
    let storage_config = StorageConfig::from_env()?;
    info!(
        "🎛️  Ingest Config: Max Size={}MB, Type={}, Temp Dir={}, URL Expiry={}s",
        ingest_config.max_upload_size / 1024 / 1024,
        ingest_config.allowed_media_type,
        ingest_config.temp_dir.display(),
        ingest_config.presign_expiry_secs
    );

    let db = database::setup_database().await?;
    let storage_service = storage::setup_storage(&storage_config).await;
    let media_tool = media::setup_media_tool(&ingest_config).await;

    let videos = Arc::new(SeaOrmVideoRepository::new(db.clone()));
    let urls = Arc::new(AccessUrlIssuer::new(
        storage_service.clone(),
        ingest_config.presign_expiry(),
    ));
    let ingest = Arc::new(IngestService::new(
        media_tool,
        storage_service.clone(),
        videos.clone(),
        urls.clone(),
        ingest_config.clone(),
    ));

    let state = AppState {
        db,
        storage: storage_service,
        videos,
        ingest,
        urls,
        config: ingest_config,
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
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
    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ API Server listening on: http://{}", addr);
    info!("📖 Swagger UI documentation: http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Video Ingest exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
