use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::Client;
use crate::error::{Error, Result};

const MAX_SMS_HOURS: u32 = 48;

/// The authenticated user's profile.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub sms: bool,
}

/// Profile fields to change; unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

pub struct UsersApi<'a> {
    pub(crate) client: &'a Client,
}

impl UsersApi<'_> {
    pub async fn me(&self) -> Result<User> {
        self.client.get("/users/me", &[]).await
    }

    pub async fn update(&self, update: UserUpdate) -> Result<User> {
        self.client
            .post("/users/update", serde_json::to_value(update)?)
            .await
    }

    /// Routes messages to SMS for up to 48 hours; `registration_id` is the
    /// push token to suppress while SMS mode is on.
    pub async fn enable_sms(&self, duration_hours: u32, registration_id: &str) -> Result<()> {
        if duration_hours > MAX_SMS_HOURS {
            return Err(Error::InvalidOperation(format!(
                "SMS mode duration must be at or below {} hours",
                MAX_SMS_HOURS
            )));
        }
        self.client
            .post_no_content(
                "/users/sms_mode",
                Some(json!({
                    "duration": duration_hours,
                    "registration_id": registration_id,
                })),
            )
            .await
    }

    pub async fn disable_sms(&self) -> Result<()> {
        self.client
            .post_no_content("/users/sms_mode/delete", None)
            .await
    }
}
