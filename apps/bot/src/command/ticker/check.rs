use tracing::{info, instrument, warn};

use crate::format::{check_line, unknown_symbol};
use crate::relay::parse_symbol;
use crate::{Context, Data, Error};

#[poise::command(slash_command)]
pub async fn check(
    ctx: Context<'_>,
    #[description = "Ticker symbol (e.g., AAPL)"] symbol: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    let nick = ctx.author().name.clone();
    info!("check: invoked nick={} symbol={}", nick, symbol);

    let reply = check_reply(ctx.data(), &nick, &symbol).await;
    ctx.say(reply).await?;

    Ok(())
}

/// Current value and daily change, or a hint that the symbol is wrong.
#[instrument(name = "check", skip(data))]
pub async fn check_reply(data: &Data, nick: &str, symbol: &str) -> String {
    let Some(symbol) = parse_symbol(symbol.trim()) else {
        return unknown_symbol(nick);
    };

    match data.client.daily(&symbol).await {
        Ok(quote) => check_line(&symbol, &quote),
        Err(e) => {
            warn!(error = %e, "Error trying to look up symbol");
            unknown_symbol(nick)
        }
    }
}
