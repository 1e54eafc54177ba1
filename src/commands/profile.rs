use crate::api::Mode;
use crate::commands::{logged_in_api, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Profile, ProfileUpdate};
use crate::{Config, Result};
use anyhow::ensure;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ProfileOut {
    pub initials: String,
    pub display_name: String,
    pub profile: Profile,
}

impl From<Profile> for ProfileOut {
    fn from(profile: Profile) -> Self {
        Self {
            initials: profile.initials(),
            display_name: profile.display_name(),
            profile,
        }
    }
}

/// Handles `shopdash profile show`.
pub async fn profile_show(config: &Config, mode: Mode) -> Result<Out<ProfileOut>> {
    let api = logged_in_api(config, mode).await?;
    let profile = api.profile().await.pub_result(ErrorType::Request)?;
    let out = ProfileOut::from(profile);
    Ok(Out::new(
        format!("Profile of {} [{}]", out.display_name, out.initials),
        out,
    ))
}

/// Handles `shopdash profile update`. The current profile is fetched, the edit applied, and the
/// whole profile sent back.
pub async fn profile_update(
    config: &Config,
    mode: Mode,
    update: &ProfileUpdate,
) -> Result<Out<ProfileOut>> {
    ensure!(
        !update.is_empty(),
        "Nothing to update, pass at least one field to change"
    );
    let api = logged_in_api(config, mode).await?;
    let current = api.profile().await.pub_result(ErrorType::Request)?;
    let saved = api
        .update_profile(&current.with_update(update))
        .await
        .pub_result(ErrorType::Request)?;
    Ok(Out::new("Profile updated!", ProfileOut::from(saved)))
}
