//! Protocol module containing the JSON envelope types and the codec.

pub mod codec;
pub mod correlation;
pub mod messages;

pub use codec::{classify_message, encode_command, ProtocolError};
pub use correlation::CorrelationIds;
pub use messages::*;
