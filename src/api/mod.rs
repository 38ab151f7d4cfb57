use serde::{Deserialize, Deserializer};

pub mod blocks;
pub mod bots;
pub mod chats;
pub mod groups;
pub mod images;
pub mod leaderboard;
pub mod members;
pub mod messages;
pub mod users;

/// Message text comes back as JSON `null` for attachment-only messages;
/// the library normalizes that to an empty string.
pub(crate) fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
