use poise::serenity_prelude as serenity;
use stock::market_now;
use tracing::{debug, info};

use super::{check_reply, predict_reply};
use crate::config::Config;
use crate::relay::{TextCommand, parse_message};
use crate::{Data, Error};

/// Answers `!check` and `!predict` typed into any channel the bot can read.
pub async fn handle_message(
    ctx: &serenity::Context,
    data: &Data,
    message: &serenity::Message,
) -> Result<(), Error> {
    let Some(parsed) = parse_message(&message.content) else {
        return Ok(());
    };

    let author = &message.author;
    let Some(nick) = resolve_nick(
        &data.config,
        author.id.get(),
        &author.name,
        author.bot,
        parsed.relayed_nick,
    ) else {
        return Ok(());
    };

    info!(
        "text: command nick={} channel_id={} command={:?}",
        nick, message.channel_id, parsed.command
    );

    let reply = match parsed.command {
        TextCommand::Check { symbol } => check_reply(data, &nick, &symbol).await,
        TextCommand::Predict { symbol, percent } => {
            predict_reply(data, &nick, &symbol, percent, market_now()).await
        }
    };

    message
        .channel_id
        .send_message(&ctx.http, serenity::CreateMessage::new().content(reply))
        .await?;

    Ok(())
}

/// Who a command is attributed to. A relayed nick only counts when the author
/// is a configured relay bot; other bots are never answered directly.
pub fn resolve_nick(
    config: &Config,
    author_id: u64,
    author_name: &str,
    author_is_bot: bool,
    relayed_nick: Option<String>,
) -> Option<String> {
    match relayed_nick {
        Some(nick) if config.is_relay_bot(author_id, author_name) => Some(nick),
        Some(_) => {
            debug!(
                "text: relay prefix from non-relay user_id={} name={}",
                author_id, author_name
            );
            None
        }
        None if author_is_bot => None,
        None => Some(author_name.to_string()),
    }
}
