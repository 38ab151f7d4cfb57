use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::message::{smart_split, Attachment, ComplexMessage, OutgoingMessage};

const MAX_PAGE_SIZE: u32 = 100;

/// One message in a group, incoming or just-posted.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(rename = "id")]
    pub message_id: String,
    #[serde(default)]
    pub source_guid: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// The API sends `null` for attachment-only messages; normalized to "".
    #[serde(default, deserialize_with = "crate::api::null_as_empty")]
    pub text: String,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub favorited_by: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub sender_type: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
}

impl Message {
    /// Reconstructs the composite form of the message from its text and
    /// mentions attachment.
    pub fn complex_text(&self) -> ComplexMessage {
        ComplexMessage::decompile(&self.text, &self.attachments)
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
    }
}

#[derive(Debug, Deserialize)]
struct MessagePage {
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: Message,
}

pub struct MessagesApi<'a> {
    pub(crate) client: &'a Client,
    pub(crate) group_id: String,
}

impl MessagesApi<'_> {
    pub async fn recent(&self, limit: u32) -> Result<Vec<Message>> {
        self.index(None, limit).await
    }

    /// Messages created before the given message id (older history).
    pub async fn before(&self, message_id: &str, limit: u32) -> Result<Vec<Message>> {
        self.index(Some(("before_id", message_id)), limit).await
    }

    /// Most recent messages created after the given id.
    pub async fn since(&self, message_id: &str, limit: u32) -> Result<Vec<Message>> {
        self.index(Some(("since_id", message_id)), limit).await
    }

    /// Messages immediately after the given id, in order.
    pub async fn after(&self, message_id: &str, limit: u32) -> Result<Vec<Message>> {
        self.index(Some(("after_id", message_id)), limit).await
    }

    /// Drains the whole history, paging backwards until a short page.
    pub async fn all(&self) -> Result<Vec<Message>> {
        let mut messages = self.recent(MAX_PAGE_SIZE).await?;
        loop {
            let Some(last_id) = messages.last().map(|message| message.message_id.clone()) else {
                return Ok(messages);
            };
            let page = self.before(&last_id, MAX_PAGE_SIZE).await?;
            let done = (page.len() as u32) < MAX_PAGE_SIZE;
            messages.extend(page);
            if done {
                return Ok(messages);
            }
        }
    }

    async fn index(&self, cursor: Option<(&str, &str)>, limit: u32) -> Result<Vec<Message>> {
        if limit > MAX_PAGE_SIZE {
            return Err(Error::InvalidOperation(format!(
                "message page limit must be at or below {}",
                MAX_PAGE_SIZE
            )));
        }
        let mut query = Vec::new();
        if let Some((name, id)) = cursor {
            query.push((name, id.to_string()));
        }
        query.push(("limit", limit.to_string()));

        // The API answers 304 with an empty body when there is nothing
        // on this side of the cursor.
        let page: Option<MessagePage> = self
            .client
            .get_optional(&format!("/groups/{}/messages", self.group_id), &query)
            .await?;
        Ok(page.map(|page| page.messages).unwrap_or_default())
    }

    /// Posts a message to the group. Accepts a plain string, an attachment,
    /// or a full composite message; a fresh source guid is generated.
    pub async fn post(&self, message: impl Into<OutgoingMessage>) -> Result<Message> {
        let (text, attachments) = smart_split(message);
        let envelope: MessageEnvelope = self
            .client
            .post(
                &format!("/groups/{}/messages", self.group_id),
                json!({
                    "message": {
                        "source_guid": Uuid::new_v4().to_string(),
                        "text": text,
                        "attachments": attachments,
                    }
                }),
            )
            .await?;
        Ok(envelope.message)
    }

    /// Fetches a single message. Undocumented endpoint.
    pub async fn get(&self, message_id: &str) -> Result<Message> {
        let envelope: MessageEnvelope = self
            .client
            .get(
                &format!("/groups/{}/messages/{}", self.group_id, message_id),
                &[],
            )
            .await?;
        Ok(envelope.message)
    }

    pub async fn like(&self, message_id: &str) -> Result<()> {
        self.client
            .post_no_content(
                &format!("/messages/{}/{}/like", self.group_id, message_id),
                None,
            )
            .await
    }

    pub async fn unlike(&self, message_id: &str) -> Result<()> {
        self.client
            .post_no_content(
                &format!("/messages/{}/{}/unlike", self.group_id, message_id),
                None,
            )
            .await
    }
}
