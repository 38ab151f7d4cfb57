use serde::Deserialize;
use serde_json::json;

use crate::client::Client;
use crate::error::Result;
use crate::message::{smart_split, Attachment, ComplexMessage, OutgoingMessage};

/// One direct-message conversation, as listed by the chats index.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub messages_count: u64,
    #[serde(default)]
    pub last_message: Option<DirectMessage>,
    pub other_user: ChatUser,
}

/// The conversation partner; the wire nests a trimmed user object here.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUser {
    #[serde(rename = "id")]
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectMessage {
    #[serde(rename = "id")]
    pub direct_message_id: String,
    #[serde(default)]
    pub source_guid: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub sender_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default, deserialize_with = "crate::api::null_as_empty")]
    pub text: String,
    #[serde(default)]
    pub favorited_by: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl DirectMessage {
    pub fn complex_text(&self) -> ComplexMessage {
        ComplexMessage::decompile(&self.text, &self.attachments)
    }
}

pub struct ChatsApi<'a> {
    pub(crate) client: &'a Client,
}

impl ChatsApi<'_> {
    pub async fn list(&self) -> Result<Vec<Chat>> {
        self.client.get("/chats", &[]).await
    }

    pub async fn page(&self, page: u32, per_page: u32) -> Result<Vec<Chat>> {
        self.client
            .get(
                "/chats",
                &[
                    ("page", page.to_string()),
                    ("per_page", per_page.to_string()),
                ],
            )
            .await
    }
}

#[derive(Debug, Deserialize)]
struct DirectMessagePage {
    direct_messages: Vec<DirectMessage>,
}

pub struct DirectMessagesApi<'a> {
    pub(crate) client: &'a Client,
    pub(crate) other_user_id: String,
}

impl DirectMessagesApi<'_> {
    pub async fn recent(&self) -> Result<Vec<DirectMessage>> {
        self.index(None).await
    }

    pub async fn before(&self, message_id: &str) -> Result<Vec<DirectMessage>> {
        self.index(Some(("before_id", message_id))).await
    }

    pub async fn since(&self, message_id: &str) -> Result<Vec<DirectMessage>> {
        self.index(Some(("since_id", message_id))).await
    }

    async fn index(&self, cursor: Option<(&str, &str)>) -> Result<Vec<DirectMessage>> {
        let mut query = vec![("other_user_id", self.other_user_id.clone())];
        if let Some((name, id)) = cursor {
            query.push((name, id.to_string()));
        }
        let page: Option<DirectMessagePage> = self
            .client
            .get_optional("/direct_messages", &query)
            .await?;
        Ok(page.map(|page| page.direct_messages).unwrap_or_default())
    }

    /// Sends a direct message. The conversation id is the recipient and
    /// sender ids joined with `+`, so the sender's own id is looked up
    /// first.
    pub async fn post(&self, message: impl Into<OutgoingMessage>) -> Result<DirectMessage> {
        let (text, attachments) = smart_split(message);
        let me = self.client.users().me().await?;

        #[derive(Deserialize)]
        struct DirectMessageEnvelope {
            direct_message: DirectMessage,
        }

        let envelope: DirectMessageEnvelope = self
            .client
            .post(
                "/direct_messages",
                json!({
                    "direct_message": {
                        "source_guid": uuid::Uuid::new_v4().to_string(),
                        "recipient_id": self.other_user_id,
                        "text": text,
                        "attachments": attachments,
                    },
                    "conversation_id": format!("{}+{}", self.other_user_id, me.user_id),
                }),
            )
            .await?;
        Ok(envelope.direct_message)
    }
}
