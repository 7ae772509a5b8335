mod application;
mod domain;
mod infrastructure;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;

use crate::application::editor_service::EditorService;
use crate::domain::canvas::CanvasSize;
use crate::infrastructure::axum_handler::{build_router, AppState};
use crate::infrastructure::config::Settings;
use crate::infrastructure::font_book::FontBook;
use crate::infrastructure::image_decoder::DefaultImageDecoder;
use crate::infrastructure::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::parse();
    init_logging(&settings.log_level, settings.log_json);

    let fonts = FontBook::load(&settings.fonts_dir).await;

    let image_decoder = DefaultImageDecoder::new(settings.decode_limits());
    let canvas = CanvasSize::REFERENCE;
    let editor_service = EditorService::new(canvas, Arc::new(fonts), Arc::new(image_decoder))
        .context("failed to render the initial frame")?;
    let state = AppState { editor_service: Arc::new(editor_service) };

    let app = build_router(state, &settings.static_dir, settings.max_upload_bytes);

    tracing::info!(
        addr = %settings.bind,
        width = canvas.width,
        height = canvas.height,
        "Editor listening"
    );
    axum::Server::bind(&settings.bind)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Editor stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
