use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use groupme_client::{Client, ComplexMessage, Config, MessageAttach};

const USAGE: &str = "usage: gmcli [--config <path>] <command>

commands:
  whoami                       show the authenticated user
  groups                       list groups
  messages <group_id> [count]  show recent messages in a group
  post <group_id> <text>       post a message (@user_id mentions everyone named)
  bots                         list bots";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,groupme_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let config_path = match args.first().map(String::as_str) {
        Some("--config") => {
            args.remove(0);
            if args.is_empty() {
                bail!("--config requires a path\n{}", USAGE);
            }
            PathBuf::from(args.remove(0))
        }
        _ => PathBuf::from("config.toml"),
    };

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let client =
        Client::new(&config.groupme.access_token).with_base_url(&config.groupme.api_root);

    match args.first().map(String::as_str) {
        Some("whoami") => {
            let me = client.users().me().await?;
            println!("{} ({})", me.name, me.user_id);
            if let Some(email) = me.email {
                println!("  email: {}", email);
            }
        }
        Some("groups") => {
            for group in client.groups().list().await? {
                println!(
                    "{}  {} ({} members, {} messages)",
                    group.group_id,
                    group.name,
                    group.members.len(),
                    group.messages.count
                );
            }
        }
        Some("messages") => {
            let group_id = args.get(1).context("messages requires a group id")?;
            let count = match args.get(2) {
                Some(raw) => raw.parse().context("count must be a number")?,
                None => 20,
            };
            for message in client.messages(group_id).recent(count).await? {
                println!(
                    "[{}] {}: {}",
                    message.message_id,
                    message.name.as_deref().unwrap_or("<system>"),
                    message.text
                );
            }
        }
        Some("post") => {
            let group_id = args.get(1).context("post requires a group id")?;
            let text = args[2..].join(" ");
            if text.is_empty() {
                bail!("post requires message text\n{}", USAGE);
            }
            let posted = client
                .messages(group_id)
                .post(build_message(&text))
                .await?;
            info!("Posted message {}", posted.message_id);
        }
        Some("bots") => {
            for bot in client.bots().list().await? {
                println!("{}  {} (group {})", bot.bot_id, bot.name, bot.group_id);
            }
        }
        _ => bail!("{}", USAGE),
    }

    Ok(())
}

/// Turns `@user_id` words into mention attachments so posts from the CLI
/// can ping people; everything else stays plain text.
fn build_message(text: &str) -> ComplexMessage {
    let mut message = ComplexMessage::new();
    let mut plain = String::new();
    for word in text.split_inclusive(' ') {
        if let Some(user_id) = word.trim_end().strip_prefix('@') {
            if !user_id.is_empty() {
                if !plain.is_empty() {
                    message.push(std::mem::take(&mut plain));
                }
                message.push(MessageAttach::mention_with_display(
                    user_id,
                    word.trim_end().to_string(),
                ));
                if word.ends_with(' ') {
                    plain.push(' ');
                }
                continue;
            }
        }
        plain.push_str(word);
    }
    if !plain.is_empty() {
        message.push(plain);
    }
    message
}
