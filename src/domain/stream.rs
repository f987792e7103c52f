use serde::{Deserialize, Serialize};

use super::overlay::DisplayList;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityStatus {
    Loading,
    Ready,
    Failed,
}

/// Mensajes de texto que recibe el dashboard por WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    State {
        detecting: bool,
        capability: CapabilityStatus,
    },
    Detections {
        seq: u64,
        objects: Vec<String>,
        overlay: DisplayList,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let json = serde_json::to_value(UiEvent::State {
            detecting: true,
            capability: CapabilityStatus::Ready,
        })
        .unwrap();

        assert_eq!(json["type"], "state");
        assert_eq!(json["capability"], "ready");
    }
}
