//! Configuration file handling for shopdash.
//!
//! The configuration file is stored at `$SHOPDASH_HOME/config.json` and contains settings for
//! the shopdash application including the API URL, the authorization scheme, and the path of the
//! saved credentials.

use crate::api::{AuthScheme, Credential, CredentialsFile, File, NOT_LOGGED_IN};
use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

const APP_NAME: &str = "shopdash";
const CONFIG_VERSION: u8 = 1;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const SECRETS: &str = ".secrets";
const CREDENTIALS_JSON: &str = "credentials.json";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$SHOPDASH_HOME` and from there it loads `$SHOPDASH_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the shopdash home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_url: Url,
}

impl Config {
    /// Creates the data directory, its subdirectories and an initial `config.json` file.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/shopdash`
    /// - `api_url` - The base URL of the storefront API, e.g. `https://shop.example.com`
    /// - `auth_scheme` - The scheme used to present the API token
    /// - `user_id` - The user whose analytics the dashboard shows, if the server needs one
    ///
    /// # Errors
    /// - Returns an error if `api_url` is not a usable base URL or if any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        api_url: &str,
        auth_scheme: AuthScheme,
        user_id: Option<i64>,
    ) -> Result<Self> {
        let api_url = parse_api_url(api_url)?;

        // Create the directory if it does not exist
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the shopdash home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;
        let config_path = root.join(CONFIG_JSON);

        let config_file = ConfigFile {
            api_url: api_url.to_string(),
            auth_scheme,
            user_id,
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            api_url,
        })
    }

    /// This will
    /// - validate that the `shopdash_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    pub async fn load(shopdash_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = shopdash_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The shopdash home directory is missing, run 'shopdash init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!(
                "The config file is missing '{}', run 'shopdash init' first",
                config_path.display()
            )
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let api_url = parse_api_url(&config_file.api_url)?;

        let config = Self {
            root: root.clone(),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            api_url,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn auth_scheme(&self) -> AuthScheme {
        self.config_file.auth_scheme
    }

    pub fn user_id(&self) -> Option<i64> {
        self.config_file.user_id
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.request_timeout_secs.max(1))
    }

    /// Returns the stored `credentials_path` if it is absolute, otherwise resolves the relative
    /// path.
    pub fn credentials_path(&self) -> PathBuf {
        let p = self.config_file.credentials_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Saves the token obtained at login.
    pub(crate) async fn save_credentials(
        &self,
        email: &str,
        token: &str,
        saved_at: DateTime<Utc>,
    ) -> Result<()> {
        let path = self.credentials_path();
        if let Some(parent) = path.parent() {
            utils::make_dir(parent).await?;
        }
        let file = File::new(path, CredentialsFile::new(email, token, saved_at));
        file.save()
            .await
            .context("Unable to save the credentials")?;
        debug!("Saved credentials to {}", file.path().display());
        Ok(())
    }

    /// Loads the saved credentials, failing with an instruction to log in when there are none.
    pub(crate) async fn load_credentials(&self) -> Result<File<CredentialsFile>> {
        let path = self.credentials_path();
        if !path.is_file() {
            bail!("{NOT_LOGGED_IN}");
        }
        File::load(&path)
            .await
            .with_context(|| format!("Unable to read the saved credentials. {NOT_LOGGED_IN}"))
    }

    /// The credential to send with requests, or `None` when nobody is logged in.
    pub(crate) async fn credential(&self) -> Result<Option<Credential>> {
        if !self.credentials_path().is_file() {
            return Ok(None);
        }
        let file = self.load_credentials().await?;
        Ok(Some(file.data().credential(self.auth_scheme())))
    }

    /// Deletes the saved credentials. Returns `false` if there were none.
    pub(crate) async fn clear_credentials(&self) -> Result<bool> {
        utils::remove_file(self.credentials_path()).await
    }
}

/// Parses the API base URL. Only `http` and `https` URLs are accepted.
fn parse_api_url(s: &str) -> Result<Url> {
    let url = Url::parse(s.trim()).with_context(|| format!("Invalid API URL '{s}'"))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        bail!("The API URL must be an http or https URL, got '{s}'");
    }
    Ok(url)
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "shopdash",
///   "config_version": 1,
///   "api_url": "https://shop.example.com/",
///   "auth_scheme": "token",
///   "user_id": 1,
///   "request_timeout_secs": 30,
///   "credentials_path": ".secrets/credentials.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "shopdash"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the storefront API
    api_url: String,

    #[serde(default)]
    auth_scheme: AuthScheme,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<i64>,

    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,

    /// Path to the saved credentials (optional, relative to config.json or absolute)
    /// Defaults to $SHOPDASH_HOME/.secrets/credentials.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials_path: Option<PathBuf>,
}

fn default_request_timeout_secs() -> u64 {
    REQUEST_TIMEOUT_SECS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: String::new(),
            auth_scheme: AuthScheme::default(),
            user_id: None,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            credentials_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "Unsupported config_version {} in config file, this version of shopdash supports {}",
            config.config_version,
            CONFIG_VERSION
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the credentials path.
    ///
    /// If the path is relative, it should be interpreted as relative to the config.json file.
    /// If None, defaults to $SHOPDASH_HOME/.secrets/credentials.json
    fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(CREDENTIALS_JSON))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    const URL: &str = "https://shop.example.com";

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("shopdash_home");

        let config = Config::create(&home_dir, URL, AuthScheme::Bearer, Some(3))
            .await
            .unwrap();
        assert_eq!(config.api_url().as_str(), "https://shop.example.com/");
        assert!(config.secrets().is_dir());
        assert!(config.config_path().is_file());

        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(loaded.auth_scheme(), AuthScheme::Bearer);
        assert_eq!(loaded.user_id(), Some(3));
        assert_eq!(loaded.request_timeout(), Duration::from_secs(30));
        assert_eq!(
            loaded.credentials_path(),
            loaded.root().join(SECRETS).join(CREDENTIALS_JSON)
        );
    }

    #[tokio::test]
    async fn test_config_create_bad_url() {
        let dir = TempDir::new().unwrap();
        for bad in ["not a url", "ftp://shop.example.com", "mailto:a@example.com"] {
            let result = Config::create(dir.path(), bad, AuthScheme::Token, None).await;
            assert!(result.is_err(), "{bad} should be rejected");
        }
    }

    #[tokio::test]
    async fn test_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert!(format!("{err:#}").contains("shopdash init"));
    }

    #[tokio::test]
    async fn test_credentials_lifecycle() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), URL, AuthScheme::Token, None)
            .await
            .unwrap();

        assert!(config.credential().await.unwrap().is_none());
        let err = config.load_credentials().await.unwrap_err();
        assert!(err.to_string().contains("shopdash login"));

        config
            .save_credentials("a@example.com", "tok", Utc::now())
            .await
            .unwrap();
        let credential = config.credential().await.unwrap().unwrap();
        assert_eq!(credential.header_value(), "Token tok");

        assert!(config.clear_credentials().await.unwrap());
        assert!(!config.clear_credentials().await.unwrap());
        assert!(config.credential().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "shopdash",
            "config_version": 1,
            "api_url": "https://shop.example.com"
        }"#;

        let mut file = tokio::fs::File::create(&config_path).await.unwrap();
        file.write_all(json.as_bytes()).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.auth_scheme, AuthScheme::Token);
        assert_eq!(config.request_timeout_secs, REQUEST_TIMEOUT_SECS);
        assert_eq!(
            config.credentials_path(),
            PathBuf::from(SECRETS).join(CREDENTIALS_JSON)
        );
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "api_url": "https://shop.example.com"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_load_future_version() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{"app_name": "shopdash", "config_version": 9, "api_url": "https://a.b"}"#;
        utils::write(&config_path, json).await.unwrap();
        assert!(ConfigFile::load(&config_path).await.is_err());
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let config = ConfigFile::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("credentials_path"));
        assert!(!json.contains("user_id"));
        assert!(json.contains("\"auth_scheme\":\"token\""));
    }
}
