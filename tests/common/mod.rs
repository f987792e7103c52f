#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;
use tokio::sync::broadcast;

use webcam_sentinel::application::{
    alert::{AlertNotifier, AlertSettings},
    blob_registry::ObjectUrlRegistry,
    capability::CapabilitySlot,
    dto::WebhookPayload,
    ports::{DetectionCapability, VideoSource, WebhookPort},
    services::DetectionService,
};
use webcam_sentinel::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    frame::{Frame, FrameSize},
    stream::UiEvent,
};

pub const INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct Step {
    pub delay: Duration,
    pub result: Result<Vec<Detection>, String>,
}

impl Step {
    pub fn ok(detections: Vec<Detection>) -> Self {
        Self { delay: Duration::ZERO, result: Ok(detections) }
    }

    pub fn fail(reason: &str) -> Self {
        Self { delay: Duration::ZERO, result: Err(reason.to_string()) }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Detector guionizado: consume pasos en orden y repite `fallback` al final.
pub struct ScriptedCapability {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    pub calls: AtomicUsize,
}

impl ScriptedCapability {
    pub fn new(script: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(detections: Vec<Detection>) -> Arc<Self> {
        Self::new(Vec::new(), Step::ok(detections))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DetectionCapability for ScriptedCapability {
    async fn detect(&self, _frame: &Frame) -> DomainResult<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.result.map_err(DomainError::OperationFailed)
    }
}

pub struct FakeCamera {
    frame: Option<Frame>,
}

impl FakeCamera {
    pub fn live() -> Arc<Self> {
        Arc::new(Self { frame: Some(Frame::new(RgbImage::new(64, 48))) })
    }

    pub fn dark() -> Arc<Self> {
        Arc::new(Self { frame: None })
    }
}

impl VideoSource for FakeCamera {
    fn dimensions(&self) -> Option<FrameSize> {
        self.frame.as_ref().map(Frame::size)
    }

    fn current_frame(&self) -> Option<Frame> {
        self.frame.clone()
    }

    fn preview_jpeg(&self) -> Option<Arc<Vec<u8>>> {
        None
    }

    fn screenshot(&self, _size: FrameSize) -> DomainResult<String> {
        match self.frame {
            Some(_) => Ok("data:image/jpeg;base64,AAAA".to_string()),
            None => Err(DomainError::NotReady("no frame".into())),
        }
    }
}

#[derive(Default)]
pub struct RecordingWebhook {
    pub sent: Mutex<Vec<WebhookPayload>>,
}

impl RecordingWebhook {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl WebhookPort for RecordingWebhook {
    async fn post(&self, payload: &WebhookPayload) -> DomainResult<u16> {
        self.sent.lock().unwrap().push(payload.clone());
        Ok(204)
    }
}

pub struct Harness {
    pub service: Arc<DetectionService>,
    pub webhook: Arc<RecordingWebhook>,
    pub blobs: Arc<ObjectUrlRegistry>,
    pub events: broadcast::Receiver<UiEvent>,
}

impl Harness {
    pub fn new(capability: Option<Arc<ScriptedCapability>>, camera: Arc<FakeCamera>) -> Self {
        let slot = Arc::new(CapabilitySlot::new());
        if let Some(capability) = capability {
            slot.publish(capability);
        }

        let webhook = Arc::new(RecordingWebhook::default());
        let blobs = Arc::new(ObjectUrlRegistry::new("http://localhost:8090", 16));
        let alerts = AlertNotifier::new(camera.clone(), webhook.clone(), blobs.clone(), AlertSettings::default());
        let service = DetectionService::new(slot, camera, alerts, INTERVAL);
        let events = service.subscribe();

        Self { service, webhook, blobs, events }
    }

    /// Vacía el canal y devuelve solo los eventos de detección.
    pub fn drain_detections(&mut self) -> Vec<UiEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if matches!(event, UiEvent::Detections { .. }) {
                out.push(event);
            }
        }
        out
    }
}

pub fn person(confidence: f32, bbox: [f32; 4]) -> Detection {
    Detection::new("person", confidence, bbox)
}
