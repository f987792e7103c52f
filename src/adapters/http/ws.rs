use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::adapters::http::state::HttpState;
use crate::domain::stream::UiEvent;

pub async fn ws_handler(ws: WebSocketUpgrade, State(st): State<HttpState>) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, st))
}

/// Eventos de UI como texto y la vista previa de la cámara como JPEG binario.
/// El cliente se da por desconectado en cuanto falla un envío.
async fn handle_socket(mut socket: WebSocket, st: HttpState) {
    let mut rx = st.detection.subscribe();
    let mut preview = tokio::time::interval(st.preview_interval);
    preview.set_missed_tick_behavior(MissedTickBehavior::Skip);

    if send_event(&mut socket, &st.detection.current_state()).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    if send_event(&mut socket, &event).await.is_err() { break; }
                }
                Err(RecvError::Lagged(skipped)) => debug!("Cliente WS retrasado, {skipped} eventos descartados"),
                Err(RecvError::Closed) => break,
            },
            _ = preview.tick() => {
                let Some(jpeg) = st.detection.video().preview_jpeg() else { continue };
                if socket.send(Message::Binary(jpeg.to_vec())).await.is_err() { break; }
            }
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &UiEvent) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).unwrap_or_default();
    socket.send(Message::Text(json)).await
}
