use std::{process::ExitCode, sync::Arc};

use portfolio_server::{
    api::new_api_router,
    config::ServerConfig,
    db::{clients::sqlite::SqliteClient, interface::DatabaseClient},
    models::Collection,
    uploads::UploadStore,
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!("starting with {config}");

    let db = match SqliteClient::open(&config.db_path).await {
        Ok(db) => db,
        Err(err) => {
            error!("failed to open database: {err}");
            return ExitCode::FAILURE;
        }
    };

    let uploads = match UploadStore::open(&config.upload_dir).await {
        Ok(uploads) => uploads,
        Err(err) => {
            error!(
                "failed to create upload directory {}: {err}",
                config.upload_dir.display()
            );
            return ExitCode::FAILURE;
        }
    };

    info!("storing uploads in {}", uploads.dir().display());
    for collection in Collection::ALL {
        match db.count_documents(collection).await {
            Ok(count) => info!("collection {collection} holds {count} documents"),
            Err(err) => {
                error!("failed to read collection {collection}: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    let router = new_api_router(Arc::new(db), uploads, config.max_upload_bytes);

    let listener = match TcpListener::bind(config.listen_addr).await {
        Ok(l) => l,
        Err(err) => {
            error!("failed to listen on {}: {err}", config.listen_addr);
            return ExitCode::FAILURE;
        }
    };
    info!("listening on {}", config.listen_addr);

    if let Err(err) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {err}");
        return ExitCode::FAILURE;
    }

    info!("server shut down");
    ExitCode::SUCCESS
}

/// Resolves once the process is asked to stop.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(err) => {
                error!("failed to install terminate signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
