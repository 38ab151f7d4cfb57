use serde::Deserialize;
use serde_json::json;

use crate::client::Client;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    #[serde(rename = "id")]
    pub member_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub nickname: String,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub autokicked: bool,
    #[serde(default)]
    pub app_installed: bool,
    #[serde(default)]
    pub guid: Option<String>,
}

/// Exactly one way to identify the person being added to a group.
#[derive(Debug, Clone)]
pub enum MemberIdentifier {
    UserId(String),
    PhoneNumber(String),
    Email(String),
}

impl MemberIdentifier {
    fn field(&self) -> (&'static str, &str) {
        match self {
            Self::UserId(user_id) => ("user_id", user_id),
            Self::PhoneNumber(phone_number) => ("phone_number", phone_number),
            Self::Email(email) => ("email", email),
        }
    }
}

pub struct MembersApi<'a> {
    pub(crate) client: &'a Client,
    pub(crate) group_id: String,
}

impl MembersApi<'_> {
    /// Adds a member. The API processes additions asynchronously and
    /// answers with a results id to poll via [`MembersApi::results`].
    pub async fn add(&self, nickname: &str, identifier: MemberIdentifier) -> Result<String> {
        let (field, value) = identifier.field();

        #[derive(Deserialize)]
        struct AddResponse {
            results_id: String,
        }

        let response: AddResponse = self
            .client
            .post(
                &format!("/groups/{}/members/add", self.group_id),
                json!({ "members": [{ "nickname": nickname, field: value }] }),
            )
            .await?;
        Ok(response.results_id)
    }

    /// Polls the outcome of a prior add.
    pub async fn results(&self, results_id: &str) -> Result<Vec<Member>> {
        #[derive(Deserialize)]
        struct ResultsResponse {
            members: Vec<Member>,
        }

        let response: ResultsResponse = self
            .client
            .get(
                &format!("/groups/{}/members/results/{}", self.group_id, results_id),
                &[],
            )
            .await?;
        Ok(response.members)
    }

    pub async fn remove(&self, member_id: &str) -> Result<()> {
        self.client
            .post_no_content(
                &format!("/groups/{}/members/{}/remove", self.group_id, member_id),
                None,
            )
            .await
    }

    /// Changes the authenticated user's own nickname in the group.
    pub async fn update_nickname(&self, nickname: &str) -> Result<Member> {
        self.client
            .post(
                &format!("/groups/{}/memberships/update", self.group_id),
                json!({ "membership": { "nickname": nickname } }),
            )
            .await
    }
}
