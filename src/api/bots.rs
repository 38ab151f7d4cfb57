use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::Client;
use crate::error::Result;
use crate::message::{smart_split, OutgoingMessage};

#[derive(Debug, Clone, Deserialize)]
pub struct Bot {
    pub bot_id: String,
    pub group_id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub dm_notification: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewBot {
    pub group_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dm_notification: Option<bool>,
}

impl NewBot {
    pub fn new(group_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

pub struct BotsApi<'a> {
    pub(crate) client: &'a Client,
}

impl BotsApi<'_> {
    /// All bots owned by the authenticated user.
    pub async fn list(&self) -> Result<Vec<Bot>> {
        self.client.get("/bots", &[]).await
    }

    /// Bots owned by the user in one group.
    pub async fn in_group(&self, group_id: &str) -> Result<Vec<Bot>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|bot| bot.group_id == group_id)
            .collect())
    }

    pub async fn create(&self, bot: NewBot) -> Result<Bot> {
        #[derive(Deserialize)]
        struct BotEnvelope {
            bot: Bot,
        }

        let envelope: BotEnvelope = self
            .client
            .post("/bots", json!({ "bot": serde_json::to_value(bot)? }))
            .await?;
        Ok(envelope.bot)
    }

    /// Pushes changed fields of an existing bot. Undocumented endpoint.
    pub async fn update(&self, bot: &Bot) -> Result<()> {
        let mut fields = json!({
            "bot_id": bot.bot_id,
            "group_id": bot.group_id,
            "name": bot.name,
            "dm_notification": bot.dm_notification,
        });
        if let Some(avatar_url) = &bot.avatar_url {
            fields["avatar_url"] = json!(avatar_url);
        }
        if let Some(callback_url) = &bot.callback_url {
            fields["callback_url"] = json!(callback_url);
        }
        self.client
            .post_no_content("/bots/update", Some(json!({ "bot": fields })))
            .await
    }

    pub async fn destroy(&self, bot_id: &str) -> Result<()> {
        self.client
            .post_no_content("/bots/destroy", Some(json!({ "bot_id": bot_id })))
            .await
    }

    /// Posts to the bot's group. The endpoint takes the bot id in the body
    /// and answers 201 with no envelope.
    pub async fn post(&self, bot_id: &str, message: impl Into<OutgoingMessage>) -> Result<()> {
        let (text, attachments) = smart_split(message);
        self.client
            .post_no_content(
                "/bots/post",
                Some(json!({
                    "bot_id": bot_id,
                    "text": text,
                    "attachments": attachments,
                })),
            )
            .await
    }
}
