//! Error types for the sheet-insights library.
//!
//! Internally, everything is an `anyhow::Error` carried in a `Res<T>`. At the boundary of a
//! command the error is tagged with an `ErrorType` so that the caller can tell authentication
//! problems from sheet problems, network problems and bad AI responses, while the user still
//! sees a single message.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration or home directory is missing or invalid.
    Config,
    /// The credential could not be read or the token exchange was rejected.
    Auth,
    /// The spreadsheet, the sheet or the range could not be read.
    SheetAccess,
    /// A network call failed before a response was received.
    Transport,
    /// The AI backend failed or returned something that does not fit the analysis schema.
    Analysis,
    /// A refresh was requested while another one was still running.
    Busy,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type. It pairs an `ErrorType` with the underlying error chain.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: anyhow::Error) -> Self {
        Self { error_type, inner }
    }

    /// Creates an error from a plain message.
    pub(crate) fn msg<M>(error_type: ErrorType, message: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Self::new(error_type, anyhow::Error::msg(message))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// The single user-visible message: the whole context chain on one line.
    pub fn message(&self) -> String {
        format!("{:#}", self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:#}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal `Res<T>` into a public `Result<T>`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Res<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| {
            let error_type = if is_transport(&e) {
                ErrorType::Transport
            } else {
                error_type
            };
            Error::new(error_type, e)
        })
    }
}

/// True when a `reqwest` failure that happened before any response arrived is in the chain.
fn is_transport(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .is_some_and(|r| r.is_connect() || r.is_timeout() || r.is_request())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_keeps_type() {
        let res: Res<()> = Err(anyhow::anyhow!("invalid_grant")).context("Auth Error");
        let err = res.pub_result(ErrorType::Auth).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Auth);
        assert_eq!(err.message(), "Auth Error: invalid_grant");
    }

    #[test]
    fn test_display_includes_type() {
        let err = Error::msg(ErrorType::SheetAccess, "Unable to parse range");
        assert_eq!(err.to_string(), "sheet_access error: Unable to parse range");
    }

    #[test]
    fn test_error_type_from_str() {
        let t: ErrorType = "busy".parse().unwrap();
        assert_eq!(t, ErrorType::Busy);
    }
    #[tokio::test]
    async fn test_pub_result_connection_refused_is_transport() {
        let res: Res<_> = reqwest::Client::new()
            .get("http://127.0.0.1:1")
            .send()
            .await
            .context("Failed to send the token request");
        let err = res.pub_result(ErrorType::Auth).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Transport);
        assert!(err.message().contains("Failed to send the token request"));
    }
}
