//! Client library for the GroupMe v3 REST API: typed access to groups,
//! bots, messages, members, chats, and users, plus a composite message
//! builder for rich text/attachment messages.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod message;

pub use api::blocks::Block;
pub use api::bots::Bot;
pub use api::chats::{Chat, DirectMessage};
pub use api::groups::Group;
pub use api::members::Member;
pub use api::messages::Message;
pub use api::users::User;
pub use client::Client;
pub use config::Config;
pub use error::{Error, Result};
pub use message::{
    smart_split, Attachment, ComplexMessage, MessageAttach, OutgoingMessage, EMOJI_PLACEHOLDER,
};
