use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::adapters::v4l2::capture::{CaptureConfig, V4l2Capture};
use crate::adapters::v4l2::snapshot::screenshot_data_uri;
use crate::application::ports::VideoSource;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::frame::{Frame, FrameSize};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Default)]
struct Latest {
    frame: Option<Frame>,
    jpeg: Option<Arc<Vec<u8>>>,
}

/// Fuente de vídeo en vivo: un hilo de captura mantiene siempre el último frame.
pub struct V4l2VideoSource {
    latest: Arc<RwLock<Latest>>,
}

impl V4l2VideoSource {
    pub fn spawn(cfg: CaptureConfig) -> Self {
        let latest = Arc::new(RwLock::new(Latest::default()));
        let shared = latest.clone();

        std::thread::spawn(move || capture_loop(cfg, shared));

        Self { latest }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Latest> {
        self.latest.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn capture_loop(cfg: CaptureConfig, latest: Arc<RwLock<Latest>>) {
    info!("Video source: hilo de captura iniciado ({})", cfg.device_path());

    loop {
        let mut capture = match V4l2Capture::open(&cfg) {
            Ok(c) => c,
            Err(e) => {
                error!("Error abriendo cámara: {:?}", e);
                std::thread::sleep(Duration::from_secs(1));
                continue;
            }
        };

        let mut failures: u32 = 0;
        loop {
            match capture.next_rgb_and_jpeg() {
                Ok((rgb, jpeg)) => {
                    if failures > 0 {
                        info!("Captura recuperada tras {failures} fallos");
                        failures = 0;
                    }
                    let mut slot = latest.write().unwrap_or_else(PoisonError::into_inner);
                    slot.frame = Some(Frame::new(rgb));
                    slot.jpeg = Some(Arc::new(jpeg));
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    if should_report(failures) {
                        warn!("Error capturando frame ({failures} seguidos): {}", e);
                    }
                    std::thread::sleep(retry_delay(failures));
                    // Un error persistente suele ser un dispositivo desconectado
                    if !std::path::Path::new(&cfg.device_path()).exists() {
                        let mut slot = latest.write().unwrap_or_else(PoisonError::into_inner);
                        *slot = Latest::default();
                        break;
                    }
                }
            }
        }
    }
}

/// Espera tras `failures` fallos seguidos: 10 ms duplicando hasta 1 s.
fn retry_delay(failures: u32) -> Duration {
    let exp = failures.saturating_sub(1).min(7);
    Duration::from_millis(10 << exp).min(MAX_RETRY_DELAY)
}

/// Primer fallo y luego uno de cada 50.
fn should_report(failures: u32) -> bool {
    failures == 1 || failures % 50 == 0
}

impl VideoSource for V4l2VideoSource {
    fn dimensions(&self) -> Option<FrameSize> {
        self.read().frame.as_ref().map(Frame::size)
    }

    fn current_frame(&self) -> Option<Frame> {
        self.read().frame.clone()
    }

    fn preview_jpeg(&self) -> Option<Arc<Vec<u8>>> {
        self.read().jpeg.clone()
    }

    fn screenshot(&self, size: FrameSize) -> DomainResult<String> {
        let frame = self
            .current_frame()
            .ok_or_else(|| DomainError::NotReady("no hay frame de cámara".into()))?;
        screenshot_data_uri(&frame.image, size)
            .map_err(|e| DomainError::OperationFailed(format!("captura fallida: {e}")))
    }
}
