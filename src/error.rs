//! Failure taxonomy for engine calls and harness plumbing.
//!
//! Engine-categorized failures keep their category so directive handlers
//! can pattern-match on kind; harness-internal failures are a distinct
//! variant so a plumbing bug is never mistaken for an expected rejection.

use thiserror::Error;

/// Opaque engine-reported trap category token.
///
/// Compared for equality only; the harness never interprets the content.
/// The exhaustion signature is captured by a startup probe, not assumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrapSignature(String);

impl TrapSignature {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrapSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Categorized failure crossing the engine boundary.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Malformed or invalid module bytes.
    #[error("compile error: {message}")]
    Compile { message: String },

    /// Import resolution failure at instantiation.
    #[error("link error: {message}")]
    Link { message: String },

    /// Trap during start or during an invoked export.
    #[error("runtime error: {message}")]
    Runtime {
        trap: Option<TrapSignature>,
        message: String,
    },

    /// Harness plumbing failure, wrapped with a descriptive message.
    #[error("harness internal error: {message}")]
    Internal { message: String },
}

/// Discriminant of [`EngineError`], used by handlers asserting on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Compile,
    Link,
    Runtime,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorKind::Compile => "Compile",
            ErrorKind::Link => "Link",
            ErrorKind::Runtime => "Runtime",
            ErrorKind::Internal => "Internal",
        })
    }
}

impl EngineError {
    pub fn compile(message: impl Into<String>) -> Self {
        EngineError::Compile {
            message: message.into(),
        }
    }

    pub fn link(message: impl Into<String>) -> Self {
        EngineError::Link {
            message: message.into(),
        }
    }

    pub fn runtime(trap: Option<TrapSignature>, message: impl Into<String>) -> Self {
        EngineError::Runtime {
            trap,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        EngineError::Internal {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Compile { .. } => ErrorKind::Compile,
            EngineError::Link { .. } => ErrorKind::Link,
            EngineError::Runtime { .. } => ErrorKind::Runtime,
            EngineError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Dotted diagnostic code carried in case reports.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Compile { .. } => "Compile.Error",
            EngineError::Link { .. } => "Link.Error",
            EngineError::Runtime { .. } => "Runtime.Trap",
            EngineError::Internal { .. } => "Harness.Internal",
        }
    }

    /// The bare message, without the category prefix `Display` adds.
    pub fn message(&self) -> &str {
        match self {
            EngineError::Compile { message }
            | EngineError::Link { message }
            | EngineError::Runtime { message, .. }
            | EngineError::Internal { message } => message,
        }
    }

    /// Trap signature, if the engine reported one.
    pub fn trap_signature(&self) -> Option<&TrapSignature> {
        match self {
            EngineError::Runtime { trap, .. } => trap.as_ref(),
            _ => None,
        }
    }
}
