//! Error types for plugin services.
//!
//! ## Key Invariant
//!
//! Errors raised by the work an instrumentation point wraps never pass
//! through [`Error`]. `execute_span()` and friends return the caller's own
//! `Result<T, E>` unchanged, bound or not. [`Error`] only describes failures
//! of the services themselves:
//!
//! ```rust,ignore
//! // NotReady - plugin skipped the is_enabled() check
//! let value = services.string_property("threshold")?;
//!
//! // the wrapped call's own error comes back as-is
//! let rows = services.execute_span(&metric, &detail, || query(&conn))?;
//! ```

mod core;
mod kind;

pub use core::Error;
pub use kind::ErrorKind;

/// A specialized `Result` type for plugin services operations.
pub type Result<T> = std::result::Result<T, Error>;
