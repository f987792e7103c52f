use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::adapters::onnx::yolo_engine::{OnnxYoloCapability, OnnxYoloEngine};
use crate::application::ports::{CapabilityLoader, DetectionCapability, InferenceRuntime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{InferenceConfig, ModelId};

fn validate_model(model: &ModelId) -> DomainResult<()> {
    if model.onnx_path.trim().is_empty() {
        return Err(DomainError::InvalidInput("onnx_path empty".into()));
    }
    let meta = std::fs::metadata(Path::new(&model.onnx_path))
        .map_err(|_| DomainError::NotFound(format!("model file not found: {}", model.onnx_path)))?;
    if meta.len() == 0 {
        return Err(DomainError::InvalidInput(format!("model file is empty: {}", model.onnx_path)));
    }
    Ok(())
}

/// El runtime ONNX está listo cuando el modelo configurado existe en disco.
pub struct OnnxRuntime {
    model: ModelId,
}

impl OnnxRuntime {
    pub fn new(model: ModelId) -> Self {
        Self { model }
    }
}

#[async_trait]
impl InferenceRuntime for OnnxRuntime {
    async fn ready(&self) -> DomainResult<()> {
        validate_model(&self.model)
    }
}

pub struct OnnxCapabilityLoader {
    config: InferenceConfig,
}

impl OnnxCapabilityLoader {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CapabilityLoader for OnnxCapabilityLoader {
    async fn load(&self) -> DomainResult<Arc<dyn DetectionCapability>> {
        let path = self.config.model.onnx_path.clone();
        info!("Cargando modelo {} desde {}", self.config.model.name, path);

        let engine = tokio::task::spawn_blocking(move || OnnxYoloEngine::load(&path))
            .await
            .map_err(|e| DomainError::OperationFailed(format!("model load task aborted: {e}")))?
            .map_err(|e| DomainError::OperationFailed(format!("model load failed: {e}")))?;

        Ok(Arc::new(OnnxYoloCapability::new(engine, self.config.params.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(path: &str) -> ModelId {
        ModelId { name: "yolo".into(), onnx_path: path.into() }
    }

    #[tokio::test]
    async fn empty_path_is_invalid() {
        let runtime = OnnxRuntime::new(model("  "));
        assert!(matches!(runtime.ready().await, Err(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let runtime = OnnxRuntime::new(model("/definitely/not/here.onnx"));
        assert!(matches!(runtime.ready().await, Err(DomainError::NotFound(_))));
    }
}
