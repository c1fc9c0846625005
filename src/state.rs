/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: ハンドシェイクのガード, rooms: コメントの配信先
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::{auth::WsAuthGuard, realtime::RoomRegistry};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<WsAuthGuard>,
    pub rooms: Arc<RoomRegistry>,
    pub max_send_queue: usize,
}

impl AppState {
    pub fn new(auth: Arc<WsAuthGuard>, rooms: Arc<RoomRegistry>, max_send_queue: usize) -> Self {
        Self {
            auth,
            rooms,
            max_send_queue,
        }
    }
}
