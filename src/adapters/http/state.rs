use std::sync::Arc;
use std::time::Duration;

use crate::application::blob_registry::ObjectUrlRegistry;
use crate::application::services::DetectionService;

/// Estado compartido para los manejadores HTTP de Axum.
#[derive(Clone)]
pub struct HttpState {
    /// Controlador de detección (toggle, estado y eventos de UI).
    pub detection: Arc<DetectionService>,
    /// Capturas de alerta servidas por id.
    pub blobs: Arc<ObjectUrlRegistry>,
    /// Intervalo entre frames de vista previa enviados por WebSocket.
    pub preview_interval: Duration,
}
