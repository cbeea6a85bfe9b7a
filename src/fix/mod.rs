//! FIX 4.2 session layer: message model, wire codec and the blocking
//! initiator session.

pub mod codec;
pub mod message;
pub mod session;
pub mod tags;

pub use message::{FieldSlot, FixMessage, FixValue};
pub use session::{FixSession, SessionConfig};
