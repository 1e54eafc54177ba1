use crate::api::AuthScheme;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and an initial `config.json` file.
///
/// # Arguments
/// - `shopdash_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/shopdash`
/// - `api_url` - The base URL of the storefront API, e.g. `https://shop.example.com`
/// - `auth_scheme` - How the API expects the token to be presented
/// - `user_id` - Sent with dashboard requests when the server needs it
///
/// # Errors
/// - Returns an error if the URL is invalid or if any file operations fail.
pub async fn init(
    shopdash_home: &Path,
    api_url: &str,
    auth_scheme: AuthScheme,
    user_id: Option<i64>,
) -> Result<Out<()>> {
    let config = Config::create(shopdash_home, api_url, auth_scheme, user_id)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the shopdash directory at {} for {}",
        config.root().display(),
        config.api_url()
    )
    .into())
}
