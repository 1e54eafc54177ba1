//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::{AuthScheme, Credential, TestApi, TestState, TEST_EMAIL, TEST_TOKEN};
use crate::clock::FixedClock;
use crate::Config;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;

static NEXT_SERVER: AtomicU64 = AtomicU64::new(1);

/// Test environment that sets up a shopdash home directory with a Config pointed at its own fake
/// server. Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with a Config and no saved credentials.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("shopdash");

        // Every environment gets a distinct base URL, and therefore a distinct fake server.
        let n = NEXT_SERVER.fetch_add(1, Ordering::SeqCst);
        let api_url = format!("https://test-{n}.shopdash.invalid");
        let config = Config::create(&root, &api_url, AuthScheme::Token, None)
            .await
            .unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Creates a test environment and saves the fake server's token, as `shopdash login` would.
    pub async fn logged_in() -> Self {
        let env = Self::new().await;
        env.config
            .save_credentials(TEST_EMAIL, TEST_TOKEN, Utc::now())
            .await
            .unwrap();
        env
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// A clock fixed at the current instant.
    pub fn clock(&self) -> FixedClock {
        FixedClock::new(Utc::now())
    }

    fn api(&self) -> TestApi {
        TestApi::new(
            self.config.api_url().as_str(),
            Some(Credential::new(TEST_TOKEN, AuthScheme::Token)),
        )
    }

    /// Gets the current state of the fake server associated with this environment.
    pub fn get_state(&self) -> TestState {
        self.api().get_state()
    }

    /// Sets the state of the fake server associated with this environment.
    pub fn set_state(&self, state: TestState) {
        self.api().set_state(state)
    }
}
