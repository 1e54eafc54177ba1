//! Command handlers for the shopdash CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod auth;
mod dashboard;
mod init;
mod orders;
mod payments;
mod profile;

use crate::api::{self, Api, Mode};
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use tracing::info;

pub use auth::{login, logout, whoami, LoginOut, WhoAmI};
pub use dashboard::dashboard;
pub use init::init;
pub use orders::{orders_list, orders_set_status, OrdersListOptions, OrdersOut};
pub use payments::{payments_list, payments_toggle, payments_update};
pub use profile::{profile_show, profile_update, ProfileOut};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to stdout.
    pub fn print(&self) -> Result<()> {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            let json = serde_json::to_string_pretty(structure)
                .pub_result(ErrorType::Io)?;
            println!("{json}");
        }
        Ok(())
    }
}

/// Creates the `Api` for a command that needs to be logged in.
async fn logged_in_api(config: &Config, mode: Mode) -> Result<Box<dyn Api>> {
    let credentials = config
        .load_credentials()
        .await
        .pub_result(ErrorType::Credentials)?;
    let credential = credentials.data().credential(config.auth_scheme());
    api::api(config, mode, Some(credential)).pub_result(ErrorType::Config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_from_message() {
        let out: Out<()> = "done".into();
        assert_eq!(out.message(), "done");
        assert!(out.structure().is_none());
    }

    #[test]
    fn test_out_serializes() {
        let out = Out::new("two", vec![1, 2]);
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            serde_json::json!({"message": "two", "structure": [1, 2]})
        );
    }
}
