use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::{
    blob_registry::ObjectUrlRegistry,
    dto::WebhookPayload,
    ports::{VideoSource, WebhookPort},
};
use crate::domain::{
    data_uri::data_uri_to_blob,
    errors::{DomainError, DomainResult},
    frame::FrameSize,
};

#[derive(Debug, Clone)]
pub struct AlertSettings {
    pub username: String,
    pub color: String,
    pub snapshot_size: FrameSize,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            username: "Webcam".into(),
            color: "2007457".into(),
            snapshot_size: FrameSize::new(1920, 1080),
        }
    }
}

/// Envía una captura al webhook cada vez que un ciclo ve a una persona.
/// Sin reintentos ni enfriamiento: un envío por ciclo positivo.
#[derive(Clone)]
pub struct AlertNotifier {
    video: Arc<dyn VideoSource>,
    webhook: Arc<dyn WebhookPort>,
    blobs: Arc<ObjectUrlRegistry>,
    settings: AlertSettings,
}

impl AlertNotifier {
    pub fn new(
        video: Arc<dyn VideoSource>,
        webhook: Arc<dyn WebhookPort>,
        blobs: Arc<ObjectUrlRegistry>,
        settings: AlertSettings,
    ) -> Self {
        Self {
            video,
            webhook,
            blobs,
            settings,
        }
    }

    /// Lanza el envío en segundo plano; los fallos solo se registran.
    pub fn notify(&self) -> JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            match notifier.send_alert().await {
                Ok(status) if (200..300).contains(&status) => {
                    info!("📨 Alerta enviada (HTTP {status})");
                }
                Ok(status) => warn!("Webhook respondió HTTP {status}"),
                Err(e) => warn!("No se pudo enviar la alerta: {e}"),
            }
        })
    }

    pub async fn send_alert(&self) -> DomainResult<u16> {
        let snapshot = self.capture_snapshot().await?;
        let blob = data_uri_to_blob(&snapshot)?;
        let bytes = blob.len();
        let object_url = self.blobs.create_object_url(blob);
        info!("Captura de alerta registrada en {object_url} ({bytes} bytes)");

        let payload = WebhookPayload::person_detected(
            &self.settings.username,
            &self.settings.color,
            &object_url,
        );
        self.webhook.post(&payload).await
    }

    async fn capture_snapshot(&self) -> DomainResult<String> {
        let video = self.video.clone();
        let size = self.settings.snapshot_size;
        // Redimensionar y codificar a 1080p no debe bloquear el runtime.
        tokio::task::spawn_blocking(move || video.screenshot(size))
            .await
            .map_err(|e| DomainError::OperationFailed(format!("tarea de captura abortada: {e}")))?
    }
}
