use std::sync::{Arc, PoisonError, RwLock};

use tracing::{error, info, warn};

use crate::application::ports::{CapabilityLoader, DetectionCapability, InferenceRuntime};
use crate::domain::stream::CapabilityStatus;

enum SlotState {
    Loading,
    Ready(Arc<dyn DetectionCapability>),
    Failed(String),
}

/// Contenedor del único detector de la sesión. Solo se publica una vez.
pub struct CapabilitySlot {
    state: RwLock<SlotState>,
}

impl CapabilitySlot {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SlotState::Loading),
        }
    }

    pub fn get(&self) -> Option<Arc<dyn DetectionCapability>> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            SlotState::Ready(capability) => Some(capability.clone()),
            _ => None,
        }
    }

    pub fn status(&self) -> CapabilityStatus {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            SlotState::Loading => CapabilityStatus::Loading,
            SlotState::Ready(_) => CapabilityStatus::Ready,
            SlotState::Failed(_) => CapabilityStatus::Failed,
        }
    }

    pub fn failure(&self) -> Option<String> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            SlotState::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Devuelve `false` si ya había un detector publicado.
    pub fn publish(&self, capability: Arc<dyn DetectionCapability>) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, SlotState::Ready(_)) {
            return false;
        }
        *state = SlotState::Ready(capability);
        true
    }

    pub fn fail(&self, reason: String) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, SlotState::Loading) {
            *state = SlotState::Failed(reason);
        }
    }
}

impl Default for CapabilitySlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Espera al runtime y carga el detector una sola vez. Un fallo es
/// definitivo para esta sesión: se registra y la detección queda inactiva.
pub async fn load_capability(
    runtime: Arc<dyn InferenceRuntime>,
    loader: Arc<dyn CapabilityLoader>,
    slot: Arc<CapabilitySlot>,
) {
    if let Err(e) = runtime.ready().await {
        error!("Runtime de inferencia no disponible: {e}");
        slot.fail(e.to_string());
        return;
    }

    match loader.load().await {
        Ok(capability) => {
            if slot.publish(capability) {
                info!("✅ Modelo de detección cargado");
            } else {
                warn!("Ya había un modelo cargado; se descarta la segunda carga");
            }
        }
        Err(e) => {
            error!("❌ No se pudo cargar el modelo de detección: {e}");
            slot.fail(e.to_string());
        }
    }
}
