//! Error handling for shopdash.
//!
//! Internally everything is an `anyhow::Error`. At the command boundary an error is tagged with an
//! `ErrorType` so that the message printed to the user says which layer failed.

use serde::Serialize;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure, used as the outermost context of a command error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The home directory or `config.json` is missing or invalid.
    Config,
    /// There is no saved credential, or it could not be read or written.
    Credentials,
    /// A request to the remote API failed or was rejected.
    Request,
    /// The remote API answered with something we cannot use.
    Payload,
    /// The user gave arguments that do not make sense together.
    Input,
    /// A local file could not be written.
    Io,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// Adds an `ErrorType` context to any result whose error converts into `anyhow::Error`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| e.into().context(format!("{error_type} error")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_pub_result_adds_type() {
        let result: std::result::Result<(), Error> = Err(anyhow!("boom"));
        let err = result.pub_result(ErrorType::Request).unwrap_err();
        assert_eq!(err.to_string(), "request error");
        assert_eq!(format!("{err:#}"), "request error: boom");
    }

    #[test]
    fn test_pub_result_passes_ok() {
        let result: std::result::Result<u8, Error> = Ok(7);
        assert_eq!(result.pub_result(ErrorType::Config).unwrap(), 7);
    }
}
