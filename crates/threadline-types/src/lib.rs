//! Wire types shared by the threadline server and its workflow adapters
//!
//! Clients talk to threadline with LangChain-style messages (a `type` role tag
//! plus `content`) and read back a stream of event records. This crate holds
//! both sides of that contract so the HTTP layer and the workflow adapters
//! agree on one definition.
//!
//! ## Example
//!
//! ```rust
//! use threadline_types::{EventMessage, Message, MessageType};
//!
//! let message = Message::human("What is the weather in Oslo?");
//! assert_eq!(message.message_type(), Some(MessageType::Human));
//!
//! let echoed = EventMessage::from_input(&message);
//! assert_eq!(echoed.content(), message.content());
//! ```

pub mod error;
pub mod events;
pub mod ids;
pub mod types;

pub use error::*;
pub use events::*;
pub use types::*;
