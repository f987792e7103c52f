use std::time::Duration;

use clap::Parser;

use crate::application::alert::AlertSettings;
use crate::adapters::v4l2::capture::CaptureConfig;
use crate::domain::frame::{FacingMode, FrameSize, VideoConstraints};
use crate::domain::model::{InferenceConfig, ModelId, YoloParams};

/// Detector de personas por webcam con dashboard y alertas por webhook.
#[derive(Debug, Clone, Parser)]
#[command(name = "webcam-sentinel", version, about)]
pub struct Config {
    /// Dirección del servidor del dashboard.
    #[arg(long, env = "SENTINEL_BIND", default_value = "0.0.0.0:8090")]
    pub bind: String,

    /// Origen público usado en las referencias `blob:` de las alertas.
    #[arg(long, env = "SENTINEL_PUBLIC_ORIGIN", default_value = "http://localhost:8090")]
    pub public_origin: String,

    #[arg(long, env = "SENTINEL_STATIC_DIR", default_value = "static")]
    pub static_dir: String,

    /// Dispositivo V4L2; por defecto se elige según `--facing-mode`.
    #[arg(long, env = "SENTINEL_CAMERA")]
    pub camera: Option<String>,

    #[arg(long, env = "SENTINEL_FOURCC", default_value = "MJPG")]
    pub fourcc: String,

    #[arg(long, env = "SENTINEL_WIDTH", default_value_t = 1920)]
    pub width: u32,

    #[arg(long, env = "SENTINEL_HEIGHT", default_value_t = 1080)]
    pub height: u32,

    #[arg(long, env = "SENTINEL_FPS", default_value_t = 30)]
    pub fps: u32,

    #[arg(long, env = "SENTINEL_FACING_MODE", value_enum, default_value = "user")]
    pub facing_mode: FacingMode,

    #[arg(long, env = "SENTINEL_MODEL", default_value = "models/yolo11n.onnx")]
    pub model_path: String,

    #[arg(long, env = "SENTINEL_IMGSZ", default_value_t = 640)]
    pub input_size: u32,

    /// Umbral previo del modelo; la alerta y el overlay aplican después 0.7.
    #[arg(long, env = "SENTINEL_CONF", default_value_t = 0.25)]
    pub conf_threshold: f32,

    #[arg(long, env = "SENTINEL_IOU", default_value_t = 0.45)]
    pub iou_threshold: f32,

    #[arg(long, env = "SENTINEL_MAX_DET", default_value_t = 100)]
    pub max_detections: usize,

    /// Periodo del timer de detección en milisegundos.
    #[arg(long, env = "SENTINEL_INTERVAL_MS", default_value_t = 500)]
    pub interval_ms: u64,

    /// URL del webhook de alertas.
    #[arg(long, env = "WEBHOOK_URL")]
    pub webhook_url: String,

    #[arg(long, env = "WEBHOOK_USERNAME", default_value = "Webcam")]
    pub webhook_username: String,

    #[arg(long, env = "WEBHOOK_EMBED_COLOR", default_value = "2007457")]
    pub embed_color: String,

    #[arg(long, env = "WEBHOOK_TIMEOUT_SECS", default_value_t = 15)]
    pub webhook_timeout_secs: u64,

    #[arg(long, env = "SENTINEL_SNAPSHOT_WIDTH", default_value_t = 1920)]
    pub snapshot_width: u32,

    #[arg(long, env = "SENTINEL_SNAPSHOT_HEIGHT", default_value_t = 1080)]
    pub snapshot_height: u32,

    /// Capturas de alerta que se conservan en memoria.
    #[arg(long, env = "SENTINEL_BLOB_CAPACITY", default_value_t = 32)]
    pub blob_capacity: usize,

    #[arg(long, env = "SENTINEL_PREVIEW_FPS", default_value_t = 15)]
    pub preview_fps: u32,
}

impl Config {
    pub fn capture(&self) -> CaptureConfig {
        CaptureConfig {
            camera_path: self.camera.clone(),
            fourcc: self.fourcc.clone(),
            constraints: VideoConstraints {
                width: self.width,
                height: self.height,
                facing_mode: self.facing_mode,
            },
            fps: self.fps,
        }
    }

    pub fn inference(&self) -> InferenceConfig {
        InferenceConfig {
            model: ModelId {
                name: "yolo".into(),
                onnx_path: self.model_path.clone(),
            },
            params: YoloParams {
                input_size: self.input_size,
                conf_threshold: self.conf_threshold,
                iou_threshold: self.iou_threshold,
                max_detections: self.max_detections,
            },
        }
    }

    pub fn alert(&self) -> AlertSettings {
        AlertSettings {
            username: self.webhook_username.clone(),
            color: self.embed_color.clone(),
            snapshot_size: FrameSize::new(self.snapshot_width, self.snapshot_height),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn preview_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.preview_fps.max(1)))
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn defaults_match_dashboard_behaviour() {
        let cfg = Config::try_parse_from(["webcam-sentinel", "--webhook-url", "https://example.test/hook"]).unwrap();

        assert_eq!(cfg.interval(), Duration::from_millis(500));
        assert_eq!((cfg.width, cfg.height), (1920, 1080));
        assert_eq!(cfg.facing_mode, FacingMode::User);

        let alert = cfg.alert();
        assert_eq!(alert.username, "Webcam");
        assert_eq!(alert.color, "2007457");
        assert_eq!(alert.snapshot_size, FrameSize::new(1920, 1080));
    }

    #[test]
    fn webhook_url_is_required() {
        // Se inspecciona el comando, no el parseo: WEBHOOK_URL en el entorno no cuenta.
        let cmd = Config::command();
        let arg = cmd
            .get_arguments()
            .find(|a| a.get_id() == "webhook_url")
            .unwrap();

        assert!(arg.is_required_set());
        assert_eq!(arg.get_env(), Some(std::ffi::OsStr::new("WEBHOOK_URL")));
        assert!(arg.get_default_values().is_empty());
    }
}
