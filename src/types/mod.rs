//! Core types for robochat.

pub mod message;
pub mod response;
pub mod stream;

pub use message::*;
pub use response::*;
pub use stream::*;
