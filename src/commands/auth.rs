//! Authentication command handlers.
//!
//! This module implements the CLI commands for:
//! - `shopdash login` - Exchange an email and password for a token and save it
//! - `shopdash logout` - Forget the saved token
//! - `shopdash whoami` - Show who the saved token belongs to

use crate::api::{self, token_preview, AuthScheme, Mode};
use crate::commands::{logged_in_api, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::Profile;
use crate::{Config, Result};
use anyhow::ensure;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct LoginOut {
    pub email: String,
    pub token_preview: String,
}

/// Handles `shopdash login`. The token is saved to the credentials file, readable only by the
/// current user.
pub async fn login(config: &Config, mode: Mode, email: &str, password: &str) -> Result<Out<LoginOut>> {
    let email = email.trim();
    ensure!(!email.is_empty(), "An email address is required");
    ensure!(!password.is_empty(), "A password is required");

    let api = api::api(config, mode, None).pub_result(ErrorType::Config)?;
    let token = api
        .login(email, password)
        .await
        .pub_result(ErrorType::Request)?;
    debug!("Received token {}", token_preview(&token));
    config
        .save_credentials(email, &token, Utc::now())
        .await
        .pub_result(ErrorType::Credentials)?;

    Ok(Out::new(
        format!("Logged in as {email}"),
        LoginOut {
            email: email.to_string(),
            token_preview: token_preview(&token),
        },
    ))
}

/// Handles `shopdash logout`.
pub async fn logout(config: &Config) -> Result<Out<()>> {
    let removed = config
        .clear_credentials()
        .await
        .pub_result(ErrorType::Credentials)?;
    Ok(if removed {
        "Logged out".into()
    } else {
        "You were not logged in".into()
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct WhoAmI {
    pub email: String,
    pub saved_at: DateTime<Utc>,
    pub scheme: AuthScheme,
    pub token_preview: String,
    pub profile: Profile,
}

/// Handles `shopdash whoami`. Fetching the profile also proves that the saved token still works.
pub async fn whoami(config: &Config, mode: Mode) -> Result<Out<WhoAmI>> {
    let credentials = config
        .load_credentials()
        .await
        .pub_result(ErrorType::Credentials)?;
    let api = logged_in_api(config, mode).await?;
    let profile = api.profile().await.pub_result(ErrorType::Request)?;

    let data = credentials.data();
    let credential = data.credential(config.auth_scheme());
    Ok(Out::new(
        format!(
            "Logged in as {} ({}) since {}",
            profile.display_name(),
            data.email(),
            data.saved_at().format("%Y-%m-%d %H:%M UTC")
        ),
        WhoAmI {
            email: data.email().to_string(),
            saved_at: data.saved_at(),
            scheme: credential.scheme(),
            token_preview: credential.preview(),
            profile,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TEST_EMAIL, TEST_PASSWORD};
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_login_whoami_logout() {
        let env = TestEnv::new().await;
        let config = env.config();

        let out = login(&config, Mode::Test, TEST_EMAIL, TEST_PASSWORD)
            .await
            .unwrap();
        assert_eq!(out.message(), format!("Logged in as {TEST_EMAIL}"));
        assert!(out.structure().unwrap().token_preview.contains("..."));
        assert!(config.credentials_path().is_file());

        let out = whoami(&config, Mode::Test).await.unwrap();
        assert!(out.message().starts_with("Logged in as Asha Kulkarni"));
        assert_eq!(out.structure().unwrap().email, TEST_EMAIL);

        assert_eq!(logout(&config).await.unwrap().message(), "Logged out");
        assert_eq!(
            logout(&config).await.unwrap().message(),
            "You were not logged in"
        );
        let err = whoami(&config, Mode::Test).await.unwrap_err();
        assert!(format!("{err:#}").contains("shopdash login"));
    }

    #[tokio::test]
    async fn test_login_bad_password() {
        let env = TestEnv::new().await;
        let config = env.config();
        let err = login(&config, Mode::Test, TEST_EMAIL, "wrong")
            .await
            .unwrap_err();
        assert!(format!("{err:#}").starts_with("request error"));
        assert!(!config.credentials_path().is_file());
    }

    #[tokio::test]
    async fn test_login_requires_email() {
        let env = TestEnv::new().await;
        assert!(login(&env.config(), Mode::Test, "  ", "pw").await.is_err());
    }
}
