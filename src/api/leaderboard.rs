use serde::Deserialize;

use crate::api::messages::Message;
use crate::client::Client;
use crate::error::Result;

/// Time window for the group likes leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }
}

#[derive(Debug, Deserialize)]
struct LeaderboardPage {
    messages: Vec<Message>,
}

pub struct LeaderboardApi<'a> {
    pub(crate) client: &'a Client,
    pub(crate) group_id: String,
}

impl LeaderboardApi<'_> {
    /// The group's most-liked messages in the given window.
    pub async fn for_period(&self, period: Period) -> Result<Vec<Message>> {
        let page: LeaderboardPage = self
            .client
            .get(
                &format!("/groups/{}/likes", self.group_id),
                &[("period", period.as_str().to_string())],
            )
            .await?;
        Ok(page.messages)
    }

    pub async fn for_today(&self) -> Result<Vec<Message>> {
        self.for_period(Period::Day).await
    }

    pub async fn for_week(&self) -> Result<Vec<Message>> {
        self.for_period(Period::Week).await
    }

    pub async fn for_month(&self) -> Result<Vec<Message>> {
        self.for_period(Period::Month).await
    }

    /// Messages of the authenticated user that others liked.
    pub async fn my_likes(&self) -> Result<Vec<Message>> {
        let page: LeaderboardPage = self
            .client
            .get(&format!("/groups/{}/likes/mine", self.group_id), &[])
            .await?;
        Ok(page.messages)
    }

    /// Messages the authenticated user liked.
    pub async fn my_hits(&self) -> Result<Vec<Message>> {
        let page: LeaderboardPage = self
            .client
            .get(&format!("/groups/{}/likes/for_me", self.group_id), &[])
            .await?;
        Ok(page.messages)
    }
}
