//! Main entry point for the Generation Gateway

use gen_fault_gateway::{
    api,
    config::Settings,
    datastore::{Datastore, DatastoreMonitor, TcpDatastore},
    lifecycle::{
        FaultEventKind, FaultReport, GuardianConfig, ProcessExit, ProcessGuardian, ServerHandle,
    },
    logging, AppState,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    logging::init(&settings.logging);
    info!("Starting Generation Gateway");
    info!(
        "Loaded configuration: server={}:{} mode={:?}",
        settings.server.host, settings.server.port, settings.mode
    );

    // Guardian goes in before anything can fault
    let guardian = ProcessGuardian::new(
        GuardianConfig::from(&settings.guardian),
        Arc::new(ProcessExit),
    );
    guardian.install()?;

    // Datastore must be reachable before we listen
    let datastore = Arc::new(TcpDatastore::from_config(&settings.datastore));
    let datastore_url = settings.datastore.url.clone();
    if let Some(url) = &datastore_url {
        if let Err(e) = datastore.connect(url).await {
            guardian.emit(
                FaultEventKind::DatastoreConnectError,
                FaultReport::from_error("DatastoreError", &e),
            );
            guardian.terminated().await;
            return Ok(());
        }
    } else {
        warn!("No datastore URL configured; skipping datastore connection");
    }

    let datastore_settings = settings.datastore.clone();
    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    // Create application state
    let app_state = Arc::new(AppState::new(settings, guardian.clone()));
    app_state.providers.warn_missing_keys();

    // Build the router
    let app = api::create_router(app_state.clone());

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            guardian.emit(
                FaultEventKind::UncaughtException,
                FaultReport::from_error("BindError", &e),
            );
            guardian.terminated().await;
            return Ok(());
        }
    };
    info!("Server listening on {}", addr);

    // Only now does a fault have a server to close
    let server = ServerHandle::new();
    guardian.attach_server(server.clone());

    let monitor = DatastoreMonitor::new(datastore, guardian.clone(), &datastore_settings);
    if datastore_url.is_some() {
        monitor.start().await;
    }

    let shutdown = server.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown.shutdown_requested() => {}
                _ = tokio::signal::ctrl_c() => info!("Received ctrl-c, shutting down"),
            }
        })
        .await;

    monitor.stop().await;
    server.mark_closed();

    if let Err(e) = served {
        guardian.emit(
            FaultEventKind::UncaughtException,
            FaultReport::from_error("ServeError", &e),
        );
        guardian.terminated().await;
    } else if !guardian.is_running() {
        // A fault is being handled; the guardian decides how we exit
        guardian.terminated().await;
    }

    info!("Server stopped");
    Ok(())
}
