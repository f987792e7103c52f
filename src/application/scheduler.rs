use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Temporizador periódico de detección. Como mucho un timer vivo a la vez.
pub struct DetectionScheduler {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl DetectionScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period, handle: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Arranca el timer; el primer disparo llega tras un periodo completo.
    /// Si ya estaba en marcha no hace nada.
    pub fn start<F>(&mut self, mut on_tick: F) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        if self.handle.is_some() {
            debug!("Scheduler ya activo; se ignora el arranque");
            return false;
        }

        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                on_tick();
            }
        }));
        true
    }

    /// Cancela disparos futuros. Los ciclos ya lanzados siguen su curso.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for DetectionScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
