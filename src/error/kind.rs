//! Error kind enumeration for categorizing plugin services errors.

/// Categorization of plugin services errors.
///
/// This enum provides a stable interface for matching on error types, so
/// instrumentation code can tell a contract violation (`NotReady`) apart from
/// a host startup defect (`AlreadyBound`, `EngineConstruction`).
///
/// ## Fatal vs Local
///
/// | ErrorKind            | Fatal | Raised by                              |
/// |----------------------|-------|----------------------------------------|
/// | `NotReady`           | No    | property/attribute access while unbound|
/// | `AlreadyBound`       | Yes   | second `bind` on the same services     |
/// | `EngineConstruction` | Yes   | engine factory failure during `bind`   |
/// | `Configuration`      | No    | invalid engine configuration           |
/// | `InvalidArgument`    | No    | invalid caller input                   |
/// | `Internal`           | No    | broken internal invariant              |
///
/// Errors returned by intercepted calls are never converted into this type;
/// they keep their own type end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The tracing engine has not finished initializing.
    ///
    /// Raised by property and trace-attribute accessors while the services
    /// are unbound. Plugins should check `is_enabled()` first; this error
    /// signals that they did not.
    #[error("not ready")]
    NotReady,

    /// The services were already bound to an engine.
    ///
    /// A second `bind` indicates a defect in the host startup sequence.
    #[error("already bound")]
    AlreadyBound,

    /// The engine factory failed while binding.
    ///
    /// Propagated to the host startup sequence, which decides whether to
    /// abort or retry.
    #[error("engine construction failed")]
    EngineConstruction,

    /// Configuration error (malformed JSON, out-of-range values).
    #[error("configuration error")]
    Configuration,

    /// Invalid caller input (empty plugin id, empty metric name).
    #[error("invalid argument")]
    InvalidArgument,

    /// Internal invariant violation.
    #[error("internal error")]
    Internal,
}

impl ErrorKind {
    /// Returns `true` if this error kind indicates a host startup defect.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tracehook::ErrorKind;
    ///
    /// assert!(ErrorKind::AlreadyBound.is_fatal());
    /// assert!(!ErrorKind::NotReady.is_fatal());
    /// ```
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::AlreadyBound | ErrorKind::EngineConstruction)
    }

    /// Returns `true` if this error signals a plugin contract violation.
    #[inline]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, ErrorKind::NotReady | ErrorKind::InvalidArgument)
    }
}
