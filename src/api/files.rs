//! Serialization and deserialization structures for the saved credentials file.
//! - `credentials.json`: the API token obtained by `shopdash login`

use crate::api::AuthScheme;
use crate::api::Credential;
use crate::{utils, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Represents a file that we want to `Serialize`, `Deserialize`, and read from memory in-between
/// serializations and deserialization. Basically we are just holding the `path` and the `data`
/// here.
#[derive(Default, Debug, Clone)]
pub(crate) struct File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    path: PathBuf,
    data: F,
}

impl<F> File<F>
where
    F: Serialize + DeserializeOwned + Clone + Debug,
{
    /// Load data from a file and create a File instance
    pub(crate) async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data: F = utils::deserialize(&path).await?;
        Ok(Self { path, data })
    }

    /// Create a File instance with the given path and data
    pub(crate) fn new(path: impl Into<PathBuf>, data: F) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Save the current data to the file, readable only by its owner.
    pub(crate) async fn save(&self) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize data to JSON")?;
        utils::write(&self.path, json).await?;
        utils::restrict_permissions(&self.path)
    }

    /// Get a reference to the data
    pub(crate) fn data(&self) -> &F {
        &self.data
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

/// What `shopdash login` saves. The token is stored as the server returned it; the scheme used to
/// present it comes from the config.
///
/// Example:
/// ```json
/// {
///   "email": "admin@example.com",
///   "token": "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b",
///   "saved_at": "2024-06-15T12:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct CredentialsFile {
    email: String,
    token: String,
    saved_at: DateTime<Utc>,
    /// Overrides the scheme in the config when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scheme: Option<AuthScheme>,
}

impl CredentialsFile {
    pub(crate) fn new(email: impl Into<String>, token: impl Into<String>, saved_at: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            token: token.into(),
            saved_at,
            scheme: None,
        }
    }

    pub(crate) fn email(&self) -> &str {
        &self.email
    }

    pub(crate) fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }

    pub(crate) fn credential(&self, default_scheme: AuthScheme) -> Credential {
        Credential::new(&self.token, self.scheme.unwrap_or(default_scheme))
    }
}
