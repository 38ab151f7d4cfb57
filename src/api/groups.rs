use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::members::Member;
use crate::client::Client;
use crate::error::{Error, Result};

/// A group chat, as returned by the groups endpoints. Member objects come
/// embedded; message stats sit in the nested `messages` object.
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    #[serde(rename = "id")]
    pub group_id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub group_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub creator_user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub share_url: Option<String>,
    #[serde(default)]
    pub share_qr_code_url: Option<String>,
    #[serde(default)]
    pub office_mode: bool,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub messages: GroupMessageStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupMessageStats {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub last_message_id: Option<String>,
    #[serde(default)]
    pub last_message_created_at: Option<i64>,
}

impl Group {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
    }
}

/// Parameters for group creation. Only `name` is required.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewGroup {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share: Option<bool>,
}

impl NewGroup {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Fields to change on an existing group; unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share: Option<bool>,
}

pub struct GroupsApi<'a> {
    pub(crate) client: &'a Client,
}

impl GroupsApi<'_> {
    /// Groups the authenticated user belongs to.
    pub async fn list(&self) -> Result<Vec<Group>> {
        self.page(1, 100).await
    }

    pub async fn page(&self, page: u32, per_page: u32) -> Result<Vec<Group>> {
        self.client
            .get(
                "/groups",
                &[
                    ("page", page.to_string()),
                    ("per_page", per_page.to_string()),
                ],
            )
            .await
    }

    /// Groups the user has left but can rejoin.
    pub async fn former(&self) -> Result<Vec<Group>> {
        self.client.get("/groups/former", &[]).await
    }

    pub async fn get(&self, group_id: &str) -> Result<Group> {
        self.client
            .get(&format!("/groups/{}", group_id), &[])
            .await
    }

    /// Looks a group up by exact name. Fails if no group or more than one
    /// group carries the name.
    pub async fn find_named(&self, name: &str) -> Result<Group> {
        let mut matches: Vec<Group> = self
            .list()
            .await?
            .into_iter()
            .filter(|group| group.name == name)
            .collect();
        match matches.len() {
            0 => Err(Error::NotFound(format!("group named {:?}", name))),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::AmbiguousMatch(format!("group named {:?}", name))),
        }
    }

    pub async fn create(&self, group: NewGroup) -> Result<Group> {
        self.client
            .post("/groups", serde_json::to_value(group)?)
            .await
    }

    pub async fn update(&self, group_id: &str, update: GroupUpdate) -> Result<Group> {
        self.client
            .post(
                &format!("/groups/{}/update", group_id),
                serde_json::to_value(update)?,
            )
            .await
    }

    pub async fn destroy(&self, group_id: &str) -> Result<()> {
        self.client
            .post_no_content(&format!("/groups/{}/destroy", group_id), None)
            .await
    }

    pub async fn join(&self, group_id: &str, share_token: &str) -> Result<Group> {
        self.client
            .post(
                &format!("/groups/{}/join/{}", group_id, share_token),
                json!({}),
            )
            .await
    }

    /// Rejoin a group the user previously left.
    pub async fn rejoin(&self, group_id: &str) -> Result<Group> {
        self.client
            .post("/groups/join", json!({ "group_id": group_id }))
            .await
    }

    /// Transfers ownership. The API answers with a per-request result
    /// list; it is returned as-is.
    pub async fn change_owner(&self, group_id: &str, owner_id: &str) -> Result<Value> {
        self.client
            .post(
                "/groups/change_owners",
                json!({
                    "requests": [{ "group_id": group_id, "owner_id": owner_id }]
                }),
            )
            .await
    }
}
