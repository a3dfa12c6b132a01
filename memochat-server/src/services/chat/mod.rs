//! The chat turn pipeline.
//!
//! A turn is prepared once ([`prepare_turn`]) and then consumed by one of
//! two callers: [`run_relay`] for the SSE endpoint or [`complete_turn`] for
//! the buffered endpoint.

pub mod buffered;
pub mod context;
mod error;
pub mod prompt;
pub mod relay;
pub mod session;
pub mod turn;

pub use buffered::{complete_turn, BufferedReply};
pub use error::ChatError;
pub use relay::{run_relay, RelayOutcome, StreamEvent};
pub use turn::{prepare_turn, ChatBackend, ChatTurn, TurnInput};
