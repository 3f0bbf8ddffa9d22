//! Level macros used throughout the crate.
//!
//! With the `logging` feature these are the `tracing` macros themselves, so
//! call sites may use the full field syntax. Without it every level expands
//! to nothing and `tracing` is not linked.
//!
//! Levels used here:
//!
//! - `trace`: per-slot and per-field detail while marshaling
//! - `debug`: one line per native invocation
//! - `info`: module open and close
//! - `warn`: unions left unresolved
//! - `error`: a return check rejected a native result
//!
//! ```rust,ignore
//! use crate::logging::{debug, warn};
//!
//! debug!(symbol = %symbol, argc = args.len(), "invoking native function");
//! warn!(field = name, "union left unresolved");
//! ```

#[cfg(feature = "logging")]
pub(crate) use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "logging"))]
macro_rules! discard {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "logging"))]
pub(crate) use {discard as debug, discard as error, discard as info, discard as trace, discard as warn};
