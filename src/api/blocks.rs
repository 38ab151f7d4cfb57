use serde::Deserialize;

use crate::client::Client;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub user_id: String,
    pub blocked_user_id: String,
    #[serde(default)]
    pub created_at: Option<i64>,
}

pub struct BlocksApi<'a> {
    pub(crate) client: &'a Client,
}

impl BlocksApi<'_> {
    pub async fn list(&self, user_id: &str) -> Result<Vec<Block>> {
        #[derive(Deserialize)]
        struct BlocksResponse {
            blocks: Vec<Block>,
        }

        let response: BlocksResponse = self
            .client
            .get("/blocks", &[("user", user_id.to_string())])
            .await?;
        Ok(response.blocks)
    }

    /// Whether a block exists between the two users, in either direction.
    pub async fn between(&self, user_id: &str, other_user_id: &str) -> Result<bool> {
        #[derive(Deserialize)]
        struct BetweenResponse {
            between: bool,
        }

        let response: BetweenResponse = self
            .client
            .get(
                "/blocks/between",
                &[
                    ("user", user_id.to_string()),
                    ("otherUser", other_user_id.to_string()),
                ],
            )
            .await?;
        Ok(response.between)
    }

    pub async fn block(&self, user_id: &str, other_user_id: &str) -> Result<()> {
        self.client
            .post_query(
                "/blocks",
                &[
                    ("user", user_id.to_string()),
                    ("otherUser", other_user_id.to_string()),
                ],
            )
            .await
    }

    pub async fn unblock(&self, user_id: &str, other_user_id: &str) -> Result<()> {
        self.client
            .post_query(
                "/blocks/delete",
                &[
                    ("user", user_id.to_string()),
                    ("otherUser", other_user_id.to_string()),
                ],
            )
            .await
    }
}
