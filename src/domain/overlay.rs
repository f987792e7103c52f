use serde::{Deserialize, Serialize};

use super::detection::DetectionSet;
use super::frame::FrameSize;

/// Estilo fijo del overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub fill: String,
    pub stroke: String,
    pub line_width: f32,
    pub font: String,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            fill: "red".into(),
            stroke: "#FF0000".into(),
            line_width: 3.0,
            font: "28px Arial".into(),
        }
    }
}

/// Superficie 2D mínima sobre la que se pinta el overlay.
pub trait DrawingSurface {
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn fill_text(&mut self, text: &str, x: f32, y: f32, style: &OverlayStyle);
    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, style: &OverlayStyle);
}

/// Limpia la superficie entera y dibuja etiqueta + rectángulo por cada
/// detección con confianza > 0.7.
pub fn render_overlay<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    detections: &DetectionSet,
    size: FrameSize,
) {
    let style = OverlayStyle::default();
    surface.clear_rect(0.0, 0.0, size.width as f32, size.height as f32);

    for det in detections.qualifying() {
        let left = det.bbox.left();
        let top = det.bbox.top();
        let label = format!("{}: {}%", det.label, det.percent());

        surface.fill_text(&label, left, top, &style);
        surface.stroke_rect(left, top, det.bbox.width(), det.bbox.overlay_height(), &style);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    ClearRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    FillText {
        text: String,
        x: f32,
        y: f32,
        font: String,
        fill: String,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        stroke: String,
        line_width: f32,
    },
}

/// Superficie que graba las operaciones; el dashboard las reproduce sobre
/// un canvas transparente encima del vídeo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayList {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn render(detections: &DetectionSet, size: FrameSize) -> Self {
        let mut list = Self {
            width: size.width,
            height: size.height,
            ops: Vec::new(),
        };
        render_overlay(&mut list, detections, size);
        list
    }

    pub fn rect_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::StrokeRect { .. }))
            .count()
    }

    pub fn label_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillText { .. }))
            .count()
    }
}

impl DrawingSurface for DisplayList {
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        // Un clear completo invalida todo lo anterior.
        if x <= 0.0 && y <= 0.0 && width >= self.width as f32 && height >= self.height as f32 {
            self.ops.clear();
        }
        self.ops.push(DrawOp::ClearRect { x, y, width, height });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, style: &OverlayStyle) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
            font: style.font.clone(),
            fill: style.fill.clone(),
        });
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, style: &OverlayStyle) {
        self.ops.push(DrawOp::StrokeRect {
            x,
            y,
            width,
            height,
            stroke: style.stroke.clone(),
            line_width: style.line_width,
        });
    }
}
