use std::sync::Arc;

use async_trait::async_trait;

use crate::application::dto::WebhookPayload;
use crate::domain::{
    detection::Detection,
    errors::DomainResult,
    frame::{Frame, FrameSize},
};

/// Señal de que el runtime de inferencia puede cargar modelos.
#[async_trait]
pub trait InferenceRuntime: Send + Sync {
    async fn ready(&self) -> DomainResult<()>;
}

#[async_trait]
pub trait CapabilityLoader: Send + Sync {
    async fn load(&self) -> DomainResult<Arc<dyn DetectionCapability>>;
}

/// Detector de objetos ya cargado. Se comparte entre ciclos solapados.
#[async_trait]
pub trait DetectionCapability: Send + Sync {
    async fn detect(&self, frame: &Frame) -> DomainResult<Vec<Detection>>;
}

pub trait VideoSource: Send + Sync {
    /// Tamaño real del vídeo que se está mostrando.
    fn dimensions(&self) -> Option<FrameSize>;
    fn current_frame(&self) -> Option<Frame>;
    /// Último frame en JPEG para la vista previa del dashboard.
    fn preview_jpeg(&self) -> Option<Arc<Vec<u8>>>;
    /// Captura fija como `data:image/jpeg;base64,...` a calidad máxima.
    fn screenshot(&self, size: FrameSize) -> DomainResult<String>;
}

#[async_trait]
pub trait WebhookPort: Send + Sync {
    /// Devuelve el código HTTP de la respuesta.
    async fn post(&self, payload: &WebhookPayload) -> DomainResult<u16>;
}
