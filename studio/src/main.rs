use axum::http::{header, HeaderValue, Method};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use studio::api;
use studio::app_state::AppState;
use studio::completion::{HttpCompletionClient, SharedCompletionClient};
use studio::config::StudioConfig;
use studio::storage::{SharedStorage, SqliteStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studio=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StudioConfig::from_env()?;
    info!(port = config.port, "studio starting");

    let storage = SqliteStorage::connect(&config.database_url)
        .await
        .map_err(|e| anyhow::anyhow!("database connection failed: {e}"))?;
    let storage: SharedStorage = Arc::new(storage);

    let completion: Option<SharedCompletionClient> = match &config.completion_endpoint {
        Some(endpoint) => {
            let client = HttpCompletionClient::new(
                endpoint.clone(),
                config.completion_api_key.clone(),
                config.completion_model.clone(),
                config.completion_timeout_ms,
            )?;
            info!(endpoint = %client.endpoint(), "completion client configured");
            let client: SharedCompletionClient = Arc::new(client);
            Some(client)
        }
        None => {
            tracing::warn!("COMPLETION_ENDPOINT not set; assistant routes will return UPSTREAM errors");
            None
        }
    };

    let app_state = Arc::new(AppState::new(storage, completion, config.autosave));
    tokio::spawn(
        app_state
            .clone()
            .run_idle_watchdog(config.session_idle_timeout),
    );

    let allowed_origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| anyhow::anyhow!("invalid CORS origin {origin}: {e}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600));

    let api_state = api::ApiState {
        app_state: app_state.clone(),
    };
    let app = api::router()
        .with_state(api_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    info!("listening on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush every open document before exiting.
    app_state.close_all_sessions().await;
    info!("studio stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
