use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use agora_server::auth::session::new_session_map;
use agora_server::categories::seed_default_categories;
use agora_server::config::{generate_config_template, Config};
use agora_server::notify::dispatcher::Dispatcher;
use agora_server::routes::build_router;
use agora_server::state::AppState;
use agora_server::storage::memory::MemStorage;
use agora_server::storage::Storage;
use agora_server::ws::new_connection_registry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "agora_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "agora_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("Agora server v{} starting", env!("CARGO_PKG_VERSION"));

    // In-memory storage; everything starts empty on boot.
    let store: Arc<dyn Storage> = Arc::new(MemStorage::new());
    seed_default_categories(store.as_ref()).await?;

    let sessions = new_session_map();
    let connections = new_connection_registry();

    // Notification dispatch channel: handlers emit created records, the
    // dispatcher task pushes them to connected recipients.
    let (notification_tx, notification_rx) = tokio::sync::mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(connections.clone());
    tokio::spawn(dispatcher.run(notification_rx));

    let app_state = AppState {
        store,
        sessions,
        connections,
        notification_tx,
    };

    let app = build_router(app_state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
