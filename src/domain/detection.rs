use serde::{Deserialize, Serialize};

/// Umbral compartido por la alerta de persona y por el overlay.
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;
pub const PERSON_LABEL: &str = "person";

/// Caja tal cual la entrega el modelo: `[x, y, width, height]` en píxeles del frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox(pub [f32; 4]);

impl BoundingBox {
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    pub fn top(&self) -> f32 {
        self.0[1]
    }

    pub fn width(&self) -> f32 {
        self.0[2]
    }

    /// Alto usado para dibujar: `bbox[3] - top`. El dashboard siempre lo ha
    /// calculado así y las cajas dibujadas dependen de ello.
    pub fn overlay_height(&self) -> f32 {
        self.0[3] - self.top()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: [f32; 4]) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox: BoundingBox(bbox),
        }
    }

    pub fn is_confident(&self) -> bool {
        self.confidence > CONFIDENCE_THRESHOLD
    }

    pub fn percent(&self) -> i64 {
        percent(self.confidence)
    }
}

/// `round(confidence * 100)`.
pub fn percent(confidence: f32) -> i64 {
    (f64::from(confidence) * 100.0).round() as i64
}

/// Resultado completo del último ciclo. Sustituye al anterior entero; no hay
/// seguimiento entre frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSet(pub Vec<Detection>);

impl DetectionSet {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self(detections)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Presence flag: hay una persona con confianza > 0.7.
    pub fn person_present(&self) -> bool {
        self.iter()
            .any(|d| d.label == PERSON_LABEL && d.is_confident())
    }

    pub fn qualifying(&self) -> impl Iterator<Item = &Detection> {
        self.iter().filter(|d| d.is_confident())
    }

    /// Lista que ve el usuario: todas las detecciones, no solo las que se dibujan.
    pub fn summaries(&self) -> Vec<String> {
        self.iter()
            .map(|d| format!("{} ({}%)", d.label, d.percent()))
            .collect()
    }
}

impl From<Vec<Detection>> for DetectionSet {
    fn from(detections: Vec<Detection>) -> Self {
        Self(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(label: &str, confidence: f32) -> DetectionSet {
        DetectionSet::new(vec![Detection::new(label, confidence, [0.0, 0.0, 10.0, 10.0])])
    }

    #[test]
    fn person_above_threshold_is_present() {
        assert!(set("person", 0.71).person_present());
    }

    #[test]
    fn person_below_threshold_is_absent() {
        assert!(!set("person", 0.69).person_present());
    }

    #[test]
    fn other_labels_never_count_as_person() {
        assert!(!set("dog", 0.99).person_present());
    }

    #[test]
    fn threshold_itself_does_not_qualify() {
        assert!(!set("person", 0.7).person_present());
        assert_eq!(set("cat", 0.7).qualifying().count(), 0);
    }

    #[test]
    fn summaries_include_every_detection() {
        let detections = DetectionSet::new(vec![
            Detection::new("person", 0.904, [0.0, 0.0, 1.0, 1.0]),
            Detection::new("cup", 0.305, [0.0, 0.0, 1.0, 1.0]),
        ]);
        assert_eq!(detections.summaries(), vec!["person (90%)", "cup (31%)"]);
    }

    #[test]
    fn overlay_height_subtracts_top() {
        let bbox = BoundingBox([10.0, 20.0, 100.0, 80.0]);
        assert_eq!(bbox.left(), 10.0);
        assert_eq!(bbox.top(), 20.0);
        assert_eq!(bbox.width(), 100.0);
        assert_eq!(bbox.overlay_height(), 60.0);
    }
}
