//! Websocket transport substrate: connection establishment, framing and
//! ping/pong belong to axum; the coordinator sees only inbound text payloads
//! and closure events, and sends through each connection's outbound channel.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;

use crate::handlers::commands::handle_message;
use crate::handlers::disconnect::handle_disconnect;
use crate::models::connection::ConnectionHandle;
use crate::models::registry::AppState;

pub async fn run(state: AppState, bind_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    log::info!("starting websocket server on {}", bind_addr);
    let listener = TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<serde_json::Value>();

    // Outbound pump: everything the coordinator sends to this connection is
    // serialized to text frames here, in order.
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(Message::Text(message.to_string())).await.is_err() {
                break;
            }
        }
    });

    let conn = ConnectionHandle::new(tx);
    log::info!("client {} connected", conn.id());

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                log::debug!("message from {}: {}", conn.id(), text);
                handle_message(&state, &conn, &text).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Reached on explicit close, stream end, or transport error alike.
    log::info!("client {} disconnected", conn.id());
    handle_disconnect(&state, conn.id()).await;
}
