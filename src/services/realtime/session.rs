use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use uuid::Uuid;

use crate::services::auth::Claims;

/// Session key under which the handshake guard stores the verified claims.
pub const USER_KEY: &str = "user";

const ANONYMOUS_AUTHOR: &str = "anonymous";

/// Per-connection key-value store.
///
/// Created empty for every handshake and moved into the [`Connection`] on upgrade;
/// it is never shared between connections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    entries: HashMap<String, Value>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn set_user(&mut self, claims: Claims) {
        self.insert(USER_KEY, claims.into_value());
    }

    pub fn user(&self) -> Option<Claims> {
        match self.entries.get(USER_KEY) {
            Some(Value::Object(map)) => Some(Claims::new(map.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn_{}", self.0)
    }
}

/// An accepted real-time connection and the context it owns.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    context: SessionContext,
}

impl Connection {
    pub fn new(context: SessionContext) -> Self {
        Self {
            id: ConnectionId::new(),
            context,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Display name for comments: the `sub` claim of the session user.
    pub fn author(&self) -> String {
        self.context
            .user()
            .and_then(|claims| claims.subject().map(str::to_owned))
            .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string())
    }

    /// The session user as JSON (`null` when absent).
    pub fn user_value(&self) -> Value {
        self.context.get(USER_KEY).cloned().unwrap_or(Value::Null)
    }
}
