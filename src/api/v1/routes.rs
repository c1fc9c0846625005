/*
 * Responsibility
 * - v1 の URL 構成
 * - /health は公開、/ws はハンドシェイクのガード配下
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{health::health, ws};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let realtime = Router::new().route("/ws", get(ws::upgrade));
    let realtime = middleware::auth::handshake::apply(realtime, state);

    Router::new().route("/health", get(health)).merge(realtime)
}
