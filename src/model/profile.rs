use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The signed-in administrator's profile. Fields the server adds beyond the known ones are kept in
/// `extra` and sent back unchanged on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// First letter of the first name and of the last name, upper-cased. `A` when neither is set.
    pub fn initials(&self) -> String {
        let first_letter = |name: &Option<String>| {
            name.as_deref()
                .and_then(|n| n.chars().next())
                .map(|c| c.to_uppercase().to_string())
                .unwrap_or_default()
        };
        let initials = first_letter(&self.first_name) + &first_letter(&self.last_name);
        if initials.is_empty() {
            "A".to_string()
        } else {
            initials
        }
    }

    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone().unwrap_or_default()
        } else {
            parts.join(" ")
        }
    }

    /// A copy of this profile with the edit applied, which is what gets sent to the server.
    pub fn with_update(&self, update: &ProfileUpdate) -> Profile {
        let mut next = self.clone();
        let fields = [
            (&mut next.first_name, &update.first_name),
            (&mut next.last_name, &update.last_name),
            (&mut next.bio, &update.bio),
            (&mut next.email, &update.email),
            (&mut next.image_url, &update.image_url),
        ];
        for (field, value) in fields {
            if let Some(v) = value {
                *field = Some(v.clone());
            }
        }
        next
    }
}

/// The editable profile fields. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }
}
