//! Weft Activity
//!
//! The activity boundary: the one call the engine makes into
//! node-specific processing logic. Node logic lives behind
//! [`ActivityHandler`]; the engine stays deterministic and delegates
//! all I/O, retry, and timeout concerns to the host side of this
//! boundary.
//!
//! [`RetryRunner`] implements the host delivery contract — automatic
//! retry with multiplicative backoff, a capped interval, a bounded
//! attempt count, and a start-to-close timeout per attempt — as a
//! wrapper around any handler.

mod call;
mod error;
mod handler;
mod retry;

pub use call::{ActivityCall, ActivityFailure, ActivityOutput};
pub use error::ActivityError;
pub use handler::ActivityHandler;
pub use retry::{RetryPolicy, RetryRunner};
