use std::fs;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayViewD, Axis, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;

use crate::application::ports::DetectionCapability;
use crate::domain::detection::Detection;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::frame::Frame;
use crate::domain::model::YoloParams;

const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana",
    "apple", "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza",
    "donut", "cake", "chair", "couch", "potted plant", "bed", "dining table", "toilet", "tv",
    "laptop", "mouse", "remote", "keyboard", "cell phone", "microwave", "oven", "toaster",
    "sink", "refrigerator", "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Candidato en coordenadas de esquina antes del NMS.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    class_id: usize,
}

impl Candidate {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    fn iou(&self, other: &Candidate) -> f32 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter = w * h;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }

    fn into_detection(self) -> Detection {
        Detection::new(
            COCO_CLASSES.get(self.class_id).copied().unwrap_or("object"),
            self.score,
            [self.x1, self.y1, self.x2 - self.x1, self.y2 - self.y1],
        )
    }
}

pub struct OnnxYoloEngine {
    session: Session,
}

impl OnnxYoloEngine {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self { session })
    }

    /// Inferencia YOLO (salida `[1, 4 + clases, N]`). Devuelve cajas
    /// `[x, y, w, h]` en píxeles del frame original.
    pub fn infer(&mut self, rgb: &RgbImage, params: &YoloParams) -> Result<Vec<Detection>> {
        let imgsz = params.input_size as usize;
        let resized = image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Nearest);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let (raw, _) = input.into_raw_vec_and_offset();
        let input_tensor = Value::from_array((input_shape, raw))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[1] <= 4 {
            return Err(anyhow!("Salida YOLO inesperada: {:?}", dims));
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0);

        let num_candidates = view.shape()[1];
        let sx = rgb.width() as f32 / imgsz as f32;
        let sy = rgb.height() as f32 / imgsz as f32;

        let mut candidates = Vec::new();
        for i in 0..num_candidates {
            let scores = view.slice(s![4.., i]);
            let Some((class_id, &max_score)) = scores
                .indexed_iter()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
            else {
                continue;
            };

            if max_score > params.conf_threshold {
                let cx = view[[0, i]];
                let cy = view[[1, i]];
                let w = view[[2, i]];
                let h = view[[3, i]];

                candidates.push(Candidate {
                    x1: ((cx - w / 2.0) * sx).max(0.0),
                    y1: ((cy - h / 2.0) * sy).max(0.0),
                    x2: (cx + w / 2.0) * sx,
                    y2: (cy + h / 2.0) * sy,
                    score: max_score,
                    class_id,
                });
            }
        }

        Ok(non_max_suppression(candidates, params.iou_threshold, params.max_detections)
            .into_iter()
            .map(Candidate::into_detection)
            .collect())
    }
}

/// NMS voraz por clase, de mayor a menor puntuación.
fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32, max_detections: usize) -> Vec<Candidate> {
    candidates.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if keep.len() >= max_detections {
            break;
        }
        let overlaps = keep
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);
        if !overlaps {
            keep.push(candidate);
        }
    }
    keep
}

/// Detector compartido entre ciclos. `ort` exige `&mut` para ejecutar, así
/// que la sesión va detrás de un mutex y la inferencia en un hilo bloqueante.
pub struct OnnxYoloCapability {
    engine: Arc<Mutex<OnnxYoloEngine>>,
    params: YoloParams,
}

impl OnnxYoloCapability {
    pub fn new(engine: OnnxYoloEngine, params: YoloParams) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            params,
        }
    }
}

#[async_trait]
impl DetectionCapability for OnnxYoloCapability {
    async fn detect(&self, frame: &Frame) -> DomainResult<Vec<Detection>> {
        let engine = self.engine.clone();
        let params = self.params.clone();
        let image = frame.image.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = engine.lock().unwrap_or_else(PoisonError::into_inner);
            guard.infer(&image, &params)
        })
        .await
        .map_err(|e| DomainError::OperationFailed(format!("tarea de inferencia abortada: {e}")))?
        .map_err(|e| DomainError::OperationFailed(format!("inferencia fallida: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(x1: f32, score: f32, class_id: usize) -> Candidate {
        Candidate { x1, y1: 0.0, x2: x1 + 10.0, y2: 10.0, score, class_id }
    }

    #[test]
    fn nms_drops_overlapping_boxes_of_same_class() {
        let kept = non_max_suppression(
            vec![candidate(0.0, 0.8, 0), candidate(1.0, 0.9, 0), candidate(1.0, 0.7, 16)],
            0.45,
            100,
        );

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].class_id, 16);
    }

    #[test]
    fn nms_respects_max_detections() {
        let kept = non_max_suppression(
            vec![candidate(0.0, 0.5, 0), candidate(100.0, 0.6, 0), candidate(200.0, 0.7, 0)],
            0.45,
            2,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn detection_uses_width_height_box() {
        let det = Candidate { x1: 10.0, y1: 20.0, x2: 110.0, y2: 100.0, score: 0.9, class_id: 0 }.into_detection();
        assert_eq!(det.label, "person");
        assert_eq!(det.bbox.0, [10.0, 20.0, 100.0, 80.0]);
    }
}
