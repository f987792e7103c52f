use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::application::{
    alert::AlertNotifier,
    capability::CapabilitySlot,
    controller::{reduce, DetectorState, Effect, Event},
    dto::StatusResponse,
    ports::VideoSource,
    scheduler::DetectionScheduler,
};
use crate::domain::{
    detection::DetectionSet,
    overlay::DisplayList,
    stream::UiEvent,
};

/// Controlador de la página: dueño del estado, del timer y de los efectos.
///
/// Los ciclos se lanzan como tareas independientes, así que pueden solaparse;
/// cada uno lleva un número de secuencia y el reductor descarta los
/// resultados que llegan después de uno más reciente.
pub struct DetectionService {
    state: Mutex<DetectorState>,
    scheduler: Mutex<DetectionScheduler>,
    capability: Arc<CapabilitySlot>,
    video: Arc<dyn VideoSource>,
    alerts: AlertNotifier,
    tx: broadcast::Sender<UiEvent>,
    next_seq: AtomicU64,
}

impl DetectionService {
    pub fn new(
        capability: Arc<CapabilitySlot>,
        video: Arc<dyn VideoSource>,
        alerts: AlertNotifier,
        interval: Duration,
    ) -> Arc<Self> {
        let (tx, _) = broadcast::channel(64);
        Arc::new(Self {
            state: Mutex::new(DetectorState::default()),
            scheduler: Mutex::new(DetectionScheduler::new(interval)),
            capability,
            video,
            alerts,
            tx,
            next_seq: AtomicU64::new(0),
        })
    }

    /// Alterna entre Idle y Running. Devuelve si queda detectando.
    pub fn toggle(self: &Arc<Self>) -> bool {
        // El candado del timer se toma antes de la transición y se suelta tras
        // aplicar sus efectos: dos toggles concurrentes no pueden cruzarse.
        let mut scheduler = self.lock_scheduler();
        let effects = self.apply(Event::Toggle);
        let seq = self.lock_state().applied_seq;
        for effect in effects {
            match effect {
                Effect::StartTimer => self.start_timer(&mut scheduler),
                Effect::StopTimer => {
                    scheduler.stop();
                }
                other => self.run_effect(seq, other),
            }
        }
        let detecting = self.is_detecting();
        drop(scheduler);

        info!(
            "Detección {}",
            if detecting { "iniciada" } else { "detenida" }
        );
        self.publish(UiEvent::State {
            detecting,
            capability: self.capability.status(),
        });
        detecting
    }

    pub fn is_detecting(&self) -> bool {
        self.lock_state().detecting
    }

    pub fn timer_running(&self) -> bool {
        self.lock_scheduler().is_running()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    pub fn video(&self) -> &Arc<dyn VideoSource> {
        &self.video
    }

    pub fn snapshot(&self) -> StatusResponse {
        let state = self.lock_state();
        StatusResponse {
            detecting: state.detecting,
            capability: self.capability.status(),
            objects: state.objects.clone(),
            video: self.video.dimensions(),
        }
    }

    pub fn current_state(&self) -> UiEvent {
        UiEvent::State {
            detecting: self.is_detecting(),
            capability: self.capability.status(),
        }
    }

    /// Un disparo del timer: reserva secuencia y lanza el ciclo sin esperar.
    pub fn spawn_cycle(self: &Arc<Self>) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let service = self.clone();
        tokio::spawn(async move {
            service.run_cycle(seq).await;
        });
    }

    /// Ejecuta un ciclo de detección. Sin modelo o sin frame no hace nada;
    /// un fallo de inferencia se registra y el siguiente ciclo sigue.
    pub async fn run_cycle(self: &Arc<Self>, seq: u64) {
        let Some(capability) = self.capability.get() else {
            debug!("Ciclo {seq}: modelo no disponible");
            return;
        };
        let Some(frame) = self.video.current_frame() else {
            debug!("Ciclo {seq}: sin frame de vídeo");
            return;
        };

        match capability.detect(&frame).await {
            Ok(detections) => {
                let effects = self.apply(Event::CycleCompleted {
                    seq,
                    detections: DetectionSet::new(detections),
                });
                if effects.is_empty() {
                    debug!("Ciclo {seq}: resultado obsoleto descartado");
                }
                for effect in effects {
                    self.run_effect(seq, effect);
                }
            }
            Err(e) => warn!("Ciclo {seq}: fallo de detección: {e}"),
        }
    }

    fn apply(&self, event: Event) -> Vec<Effect> {
        let mut state = self.lock_state();
        let (next, effects) = reduce(std::mem::take(&mut *state), event);
        *state = next;
        effects
    }

    fn run_effect(self: &Arc<Self>, seq: u64, effect: Effect) {
        match effect {
            Effect::StartTimer => self.start_timer(&mut self.lock_scheduler()),
            Effect::StopTimer => {
                self.lock_scheduler().stop();
            }
            Effect::Redraw(detections) => {
                // Sin vídeo el área a limpiar es 0x0, igual que un canvas vacío.
                let size = self.video.dimensions().unwrap_or_default();
                let objects = detections.summaries();
                let overlay = DisplayList::render(&detections, size);
                self.publish(UiEvent::Detections { seq, objects, overlay });
            }
            Effect::Notify => {
                self.alerts.notify();
            }
        }
    }

    fn start_timer(self: &Arc<Self>, scheduler: &mut DetectionScheduler) {
        // El timer guarda una referencia débil: no mantiene vivo al servicio.
        let weak: Weak<Self> = Arc::downgrade(self);
        scheduler.start(move || {
            if let Some(service) = weak.upgrade() {
                service.spawn_cycle();
            }
        });
    }

    fn publish(&self, event: UiEvent) {
        // Sin suscriptores el envío falla; no es un error.
        let _ = self.tx.send(event);
    }

    fn lock_scheduler(&self) -> MutexGuard<'_, DetectionScheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_state(&self) -> MutexGuard<'_, DetectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
