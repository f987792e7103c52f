use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use rand::RngCore;

use crate::domain::data_uri::Blob;

#[derive(Default)]
struct Entries {
    by_id: HashMap<String, Arc<Blob>>,
    order: VecDeque<String>,
}

/// Referencias locales `blob:` a las capturas de alerta. Se guardan las
/// `capacity` más recientes y se sirven desde `/api/blobs/{id}`.
pub struct ObjectUrlRegistry {
    origin: String,
    capacity: usize,
    entries: Mutex<Entries>,
}

impl ObjectUrlRegistry {
    pub fn new(origin: impl Into<String>, capacity: usize) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            capacity: capacity.max(1),
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Registra el blob y devuelve `blob:{origin}/{id}`.
    pub fn create_object_url(&self, blob: Blob) -> String {
        let mut raw = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut raw);
        let id = hex::encode(raw);

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        while entries.order.len() >= self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.by_id.remove(&oldest);
            }
        }
        entries.by_id.insert(id.clone(), Arc::new(blob));
        entries.order.push_back(id.clone());

        format!("blob:{}/{}", self.origin, id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Blob>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
