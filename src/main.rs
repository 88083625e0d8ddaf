//! # Speech Transcription Backend - Main Application Entry Point
//!
//! Actix-web HTTP server wrapping the transcription request pipeline:
//! decode an uploaded recording, normalize it with an external transcoder,
//! and delegate recognition to an external speech-to-text service.
//!
//! ## Application Architecture:
//! - **config**: Application configuration (TOML files + environment variables)
//! - **state**: Shared application state and metrics
//! - **error**: The pipeline's error taxonomy and HTTP error responses
//! - **health**: Liveness probe and metrics endpoints
//! - **middleware**: Request telemetry (logging + metrics)
//! - **handlers**: HTTP request handlers for the API endpoints
//! - **audio**: Payload decoding and external-process transcoding
//! - **pipeline**: The orchestrator and its transient-artifact manager
//! - **recognition**: Segment extraction and the speech service client
//! - **keywords**: Transcript keyword highlighting

mod audio;
mod config;
mod error;
mod handlers;
mod health;
mod keywords;
mod middleware;
mod pipeline;
mod recognition;
mod state;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use config::AppConfig;
use error::AppError;
use pipeline::TranscriptionPipeline;
use recognition::GoogleSpeechClient;
use state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on request bodies. Base64-encoded recordings run about a
/// third larger than the raw audio, so this comfortably fits a minute of
/// compressed speech.
const JSON_PAYLOAD_LIMIT: usize = 10 * 1024 * 1024;

/// Global shutdown signal, set by the signal handler task and polled by the
/// main task to stop the server gracefully.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!(
        "Starting speech-transcription-backend v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);

    // Build the pipeline once; it is stateless and shared by every request.
    let recognizer = GoogleSpeechClient::new(&config.recognition)
        .context("failed to build recognition client")?;
    let transcoder = audio::Transcoder::new(config.transcode.clone());
    let pipeline = TranscriptionPipeline::new(transcoder, Arc::new(recognizer));

    let app_state = AppState::new(config.clone(), pipeline);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        // The frontend is a browser app served from a different origin.
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Shape JSON deserialization failures into the same response
        // envelope the pipeline errors use.
        let json_config = web::JsonConfig::default()
            .limit(JSON_PAYLOAD_LIMIT)
            .error_handler(|err, _req| {
                AppError::Input(format!("Invalid request body: {}", err)).into()
            });

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(json_config)
            .wrap(cors)
            .wrap(middleware::Telemetry)
            .service(
                web::scope("/api")
                    .route(
                        "/transcribe/audio",
                        web::post().to(handlers::transcribe_audio),
                    )
                    .route(
                        "/keywords/highlight",
                        web::post().to(handlers::highlight_transcript),
                    )
                    .route("/v1/metrics", web::get().to(health::detailed_metrics)),
            )
            // Liveness probe at root level for load balancers
            .route("/health", web::get().to(health::health_check))
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    // Race the server against the shutdown signal.
    tokio::select! {
        result = server_task => {
            match result {
                Ok(server_result) => {
                    if let Err(e) = server_result {
                        error!("Server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Server task error: {}", e);
                }
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Initialize structured logging.
///
/// `RUST_LOG` controls the filter; the default keeps this crate at debug and
/// the framework at info.
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "speech_transcription_backend=debug,actix_web=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// Listen for SIGTERM/SIGINT and set the global shutdown flag, so the server
/// can finish in-flight requests before exiting.
fn setup_signal_handlers() {
    tokio::spawn(async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

/// Poll the shutdown flag without busy-waiting.
async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}
