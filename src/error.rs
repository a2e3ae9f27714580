//! # Error Module
//!
//! A small, closed error type used across the dispatch pipeline. Every fallible
//! operation in the crate returns through [`HttpError`] (or, for truly unexpected
//! internal failures, `anyhow::Error`, which is downcast at the dispatch boundary).
//!
//! `HttpError` mirrors the error taxonomy of the request lifecycle: a route that
//! doesn't exist, a route that exists but rejects the method, a schema that rejects
//! its input, a body that can't be parsed, a user handler that raises a declared
//! error, or anything else that escapes as an opaque internal failure.

use std::fmt;

/// The kind of failure that produced an [`HttpError`].
///
/// This is deliberately small and closed — it exists to let call sites express
/// intent (`HttpError::not_found()`) instead of constructing ad hoc status/message
/// pairs, and to let the dispatcher pick the right wire shape for its responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotMatched,
    MethodMismatch,
    Validation,
    BodyParse,
    User,
    Internal,
}

/// The error type threaded through parsing, validation, middleware, and handlers.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: u16,
    pub kind: ErrorKind,
    pub message: String,
    /// Whether `message` is safe to send to the client. When `false`, the
    /// dispatcher substitutes a generic message for the given status.
    pub expose: bool,
}

impl HttpError {
    pub fn new(status: u16, kind: ErrorKind, message: impl Into<String>) -> Self {
        HttpError {
            status,
            kind,
            message: message.into(),
            expose: true,
        }
    }

    pub fn not_found() -> Self {
        HttpError::new(404, ErrorKind::NotMatched, "Not Found")
    }

    pub fn method_not_allowed(allowed: &[String]) -> Self {
        HttpError::new(
            405,
            ErrorKind::MethodMismatch,
            format!("Method not allowed for this endpoint (allowed: {})", allowed.join(", ")),
        )
    }

    pub fn validation(field: impl fmt::Display, reason: impl fmt::Display) -> Self {
        HttpError::new(
            400,
            ErrorKind::Validation,
            format!("{}: {}", field, reason),
        )
    }

    pub fn body_parse(message: impl Into<String>) -> Self {
        HttpError::new(400, ErrorKind::BodyParse, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        HttpError::new(500, ErrorKind::Internal, message)
    }

    /// Construct a user-raised error that is hidden from the client unless
    /// explicitly marked `expose`.
    pub fn user(status: u16, message: impl Into<String>) -> Self {
        HttpError {
            status,
            kind: ErrorKind::User,
            message: message.into(),
            expose: false,
        }
    }

    pub fn exposed(mut self) -> Self {
        self.expose = true;
        self
    }

    /// The message actually safe to surface to a client.
    pub fn public_message(&self) -> &str {
        if self.expose {
            &self.message
        } else {
            generic_message(self.status)
        }
    }
}

fn generic_message(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        _ => "Internal Server Error",
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}): {}", self.status, self.kind, self.message)
    }
}

impl std::error::Error for HttpError {}

impl From<HttpError> for anyhow::Error {
    fn from(err: HttpError) -> Self {
        anyhow::Error::msg(err.to_string()).context(ErrorContext(err))
    }
}

/// Carries the original [`HttpError`] through `anyhow::Error` so the dispatch
/// boundary can recover the status/kind instead of only a message string.
#[derive(Debug)]
struct ErrorContext(HttpError);

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ErrorContext {}

/// Attempt to recover an [`HttpError`] from a generic `anyhow::Error`, falling
/// back to a 500 Internal error for anything that wasn't constructed from one.
pub fn downcast(err: anyhow::Error) -> HttpError {
    if let Some(e) = err.downcast_ref::<HttpError>() {
        return e.clone();
    }
    for cause in err.chain() {
        if let Some(ctx) = cause.downcast_ref::<ErrorContext>() {
            return ctx.0.clone();
        }
    }
    HttpError::internal(err.to_string())
}
