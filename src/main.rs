use std::sync::Arc;

use clap::Parser;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

use webcam_sentinel::{
    adapters::{
        http::{router, state::HttpState},
        onnx::model_catalog::{OnnxCapabilityLoader, OnnxRuntime},
        v4l2::video_source::V4l2VideoSource,
        webhook::http_webhook::HttpWebhook,
    },
    application::{
        alert::AlertNotifier,
        blob_registry::ObjectUrlRegistry,
        capability::{load_capability, CapabilitySlot},
        services::DetectionService,
    },
    config::Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logs (RUST_LOG=info por defecto)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();

    tracing::info!("🔧 Inicializando adaptadores de infraestructura...");

    // 2. Adaptadores
    let video = Arc::new(V4l2VideoSource::spawn(config.capture()));
    let webhook = Arc::new(HttpWebhook::new(config.webhook_url.clone(), config.webhook_timeout()));
    let blobs = Arc::new(ObjectUrlRegistry::new(config.public_origin.clone(), config.blob_capacity));

    // 3. Carga asíncrona del modelo; el dashboard arranca sin esperarla
    let inference = config.inference();
    let capability = Arc::new(CapabilitySlot::new());
    tokio::spawn(load_capability(
        Arc::new(OnnxRuntime::new(inference.model.clone())),
        Arc::new(OnnxCapabilityLoader::new(inference)),
        capability.clone(),
    ));

    // 4. Controlador de detección
    let alerts = AlertNotifier::new(video.clone(), webhook, blobs.clone(), config.alert());
    let detection = DetectionService::new(capability, video, alerts, config.interval());

    let state = HttpState {
        detection,
        blobs,
        preview_interval: config.preview_interval(),
    };

    let app = router(state).fallback_service(ServeDir::new(&config.static_dir));

    tracing::info!("🚀 Dashboard iniciado en http://{}", config.bind);
    tracing::info!("📂 Archivos estáticos servidos desde '{}'", config.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
