//! Main error type for plugin services.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use super::ErrorKind;

/// The primary error type for plugin services operations.
///
/// `Error` carries:
/// - [`kind()`](Error::kind): Categorization for `match` statements
/// - [`plugin_id()`](Error::plugin_id): The plugin the failing services belong to
/// - [`source()`](StdError::source): The underlying cause, e.g. the factory error
///
/// ## Error Hierarchy
///
/// ```text
/// Error
/// ├── kind: ErrorKind          (category for matching)
/// ├── message: String          (human-readable description)
/// ├── plugin_id: Option        (owning plugin, when known)
/// └── source: Option           (underlying cause)
/// ```
///
/// ## Example
///
/// ```rust
/// use tracehook::{Error, ErrorKind};
///
/// fn describe(err: &Error) -> &'static str {
///     match err.kind() {
///         ErrorKind::NotReady => "check is_enabled() before reading properties",
///         kind if kind.is_fatal() => "host startup is broken",
///         _ => "local failure",
///     }
/// }
///
/// assert_eq!(describe(&Error::not_ready()), "check is_enabled() before reading properties");
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    plugin_id: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tracehook::{Error, ErrorKind};
    ///
    /// let err = Error::new(ErrorKind::InvalidArgument, "metric name cannot be empty");
    /// assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    /// ```
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self { kind, message: message.into(), plugin_id: None, source: None }
    }

    /// Creates an error from a kind with a default message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        let message = match kind {
            ErrorKind::NotReady => {
                "tracing engine hasn't finished initializing yet, plugins should check is_enabled() first"
            },
            ErrorKind::AlreadyBound => "plugin services are already bound to an engine",
            ErrorKind::EngineConstruction => "engine factory failed",
            ErrorKind::Configuration => "configuration error",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Internal => "internal error",
        };
        Self::new(kind, message)
    }

    /// Returns the error kind for categorization.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the plugin id this error relates to, if known.
    #[inline]
    pub fn plugin_id(&self) -> Option<&str> {
        self.plugin_id.as_deref()
    }

    /// Returns `true` if this error indicates a host startup defect.
    ///
    /// Equivalent to `self.kind().is_fatal()`.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    /// Sets the plugin id for this error.
    #[must_use]
    pub fn with_plugin_id(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugin_id = Some(plugin_id.into());
        self
    }

    /// Sets the source error for this error.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors for common error types

    /// Creates a not-ready error with the default message.
    pub fn not_ready() -> Self {
        Self::from_kind(ErrorKind::NotReady)
    }

    /// Creates an already-bound error with the default message.
    pub fn already_bound() -> Self {
        Self::from_kind(ErrorKind::AlreadyBound)
    }

    /// Creates an engine construction error.
    pub fn engine_construction(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::EngineConstruction, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;

        if let Some(ref plugin_id) = self.plugin_id {
            write!(f, " (plugin_id: {})", plugin_id)?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::from_kind(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::configuration(format!("I/O error: {}", err)).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::configuration(format!("JSON error: {}", err)).with_source(err)
    }
}
