pub mod connection;
pub mod protocol;
pub mod rooms;
pub mod session;

pub use rooms::RoomRegistry;
pub use session::{Connection, SessionContext};
