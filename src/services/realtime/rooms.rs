//! Track comment rooms.
//!
//! Each room maps connection ids to that connection's outbound queue. Rooms are
//! created on first join and dropped when the last member leaves.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};

use super::protocol::{CommentEvent, ServerMessage};
use super::session::ConnectionId;

type Members = HashMap<ConnectionId, mpsc::Sender<ServerMessage>>;

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Members>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the connection was already a member.
    pub async fn join(
        &self,
        track_id: &str,
        connection_id: ConnectionId,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> bool {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(track_id.to_string()).or_default();
        let joined = members.insert(connection_id, outbound).is_none();
        tracing::debug!(track_id, connection_id = %connection_id, members = members.len(), "room join");
        joined
    }

    /// Returns `false` if the connection was not a member.
    pub async fn leave(&self, track_id: &str, connection_id: ConnectionId) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(track_id) else {
            return false;
        };
        let left = members.remove(&connection_id).is_some();
        if members.is_empty() {
            rooms.remove(track_id);
        }
        left
    }

    /// Drop the connection from every room it joined.
    pub async fn leave_all(&self, connection_id: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, members| {
            members.remove(&connection_id);
            !members.is_empty()
        });
    }

    pub async fn is_member(&self, track_id: &str, connection_id: ConnectionId) -> bool {
        self.rooms
            .read()
            .await
            .get(track_id)
            .is_some_and(|members| members.contains_key(&connection_id))
    }

    /// Fan a comment out to every member of its room.
    ///
    /// Full queues drop the message for that member only. Returns the number of
    /// members the comment was queued for.
    pub async fn publish(&self, event: CommentEvent) -> usize {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(&event.track_id) else {
            return 0;
        };

        let mut delivered = 0;
        for (connection_id, outbound) in members {
            match outbound.try_send(ServerMessage::Comment(event.clone())) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        track_id = %event.track_id,
                        "send queue full, dropping comment"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }
}

#[cfg(test)]
impl RoomRegistry {
    async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    async fn member_count(&self, track_id: &str) -> usize {
        self.rooms
            .read()
            .await
            .get(track_id)
            .map_or(0, HashMap::len)
    }
}
