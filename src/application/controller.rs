use crate::domain::detection::DetectionSet;

/// Estado de la página de detección: todo lo que antes vivía suelto en la UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorState {
    pub detecting: bool,
    pub objects: Vec<String>,
    pub person: bool,
    /// Secuencia del último ciclo aplicado. Los resultados más viejos se descartan.
    pub applied_seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Toggle,
    CycleCompleted { seq: u64, detections: DetectionSet },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartTimer,
    StopTimer,
    Redraw(DetectionSet),
    Notify,
}

pub fn reduce(state: DetectorState, event: Event) -> (DetectorState, Vec<Effect>) {
    match event {
        Event::Toggle if state.detecting => (
            DetectorState { detecting: false, ..state },
            vec![Effect::StopTimer],
        ),
        Event::Toggle => (
            DetectorState { detecting: true, ..state },
            vec![Effect::StartTimer],
        ),
        Event::CycleCompleted { seq, .. } if seq <= state.applied_seq => (state, Vec::new()),
        Event::CycleCompleted { seq, detections } => {
            let person = detections.person_present();
            let next = DetectorState {
                objects: detections.summaries(),
                person,
                applied_seq: seq,
                ..state
            };

            let mut effects = vec![Effect::Redraw(detections)];
            if person {
                effects.push(Effect::Notify);
            }
            (next, effects)
        }
    }
}
