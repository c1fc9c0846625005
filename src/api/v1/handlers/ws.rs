/*
 * Responsibility
 * - GET /ws: 認証済みハンドシェイクを WebSocket に upgrade する
 * - 検証は middleware 側で済んでいる。ここは接続を組み立てるだけ
 */
use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
};

use crate::api::v1::extractors::SessionCtx;
use crate::services::realtime::{self, Connection};
use crate::state::AppState;

pub async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    SessionCtx(context): SessionCtx,
) -> impl IntoResponse {
    let connection = Connection::new(context);

    ws.on_upgrade(move |socket| {
        realtime::connection::serve(socket, connection, state.rooms, state.max_send_queue)
    })
}
