use std::sync::Arc;

use image::RgbImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Preferencia de cámara: frontal (`user`) o trasera (`environment`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

/// Restricciones pedidas a la fuente de vídeo. El driver puede ajustar el
/// tamaño real al más cercano soportado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
    pub facing_mode: FacingMode,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            facing_mode: FacingMode::User,
        }
    }
}

/// Frame de cámara listo para inferencia. Compartido sin copias entre el
/// hilo de captura y los ciclos de detección.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: Arc<RgbImage>,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image: Arc::new(image) }
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.image.width(), self.image.height())
    }
}
