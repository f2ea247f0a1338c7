//! Error taxonomy for surface access and mutation.
//!
//! None of these errors are ever shown to the user. Event handlers log them
//! and carry on; the worst visible outcome is an edit that did not happen.

use miette::Diagnostic;

/// Failure while reading or writing a text surface.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SurfaceError {
    /// The bound node was removed or replaced by the host page.
    #[error("surface is no longer attached to the document")]
    #[diagnostic(code(lingo::surface::detached))]
    Detached,

    /// The requested offset lies outside the surface text.
    #[error("offset {offset} out of bounds for text of length {len}")]
    #[diagnostic(code(lingo::surface::out_of_bounds))]
    OutOfBounds { offset: usize, len: usize },

    /// The platform refused the operation (a DOM exception, usually).
    #[error("platform error: {0}")]
    #[diagnostic(code(lingo::surface::platform))]
    Dom(String),
}

/// Failure of a mutation attempt.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum MutationError {
    /// Focus is outside any editable element.
    #[error("no active surface")]
    #[diagnostic(code(lingo::mutation::no_surface))]
    NoSurface,

    /// A strategy left text that is neither the original nor the result.
    #[error("strategy {strategy} left unexpected text")]
    #[diagnostic(
        code(lingo::mutation::diverged),
        help("the edit was abandoned rather than retried on top of a partial change")
    )]
    Diverged { strategy: &'static str },

    /// The text to replace is no longer before the caret.
    #[error("target text {original:?} not found before offset {caret}")]
    #[diagnostic(
        code(lingo::mutation::not_found),
        help("the host page probably changed the text after the trigger fired")
    )]
    TargetNotFound { original: String, caret: usize },

    /// One strategy was ignored or refused by the host editor.
    #[error("strategy {strategy} was rejected: {reason}")]
    #[diagnostic(code(lingo::mutation::rejected))]
    Rejected {
        strategy: &'static str,
        reason: String,
    },

    /// No strategy in the cascade took effect.
    #[error("all mutation strategies failed")]
    #[diagnostic(code(lingo::mutation::exhausted))]
    Exhausted,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Surface(#[from] SurfaceError),
}

impl MutationError {
    /// Shorthand for a rejection with a reason.
    pub fn rejected(strategy: &'static str, reason: impl Into<String>) -> Self {
        MutationError::Rejected {
            strategy,
            reason: reason.into(),
        }
    }
}

/// Settings could not be decoded from the store.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum SettingsError {
    #[error("invalid settings object: {0}")]
    #[diagnostic(code(lingo::settings::invalid))]
    Invalid(String),
}
