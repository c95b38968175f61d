mod check;
mod predict;
mod text;

use crate::{Context, Error};
use check::check;
use predict::predict;

pub use check::check_reply;
pub use predict::predict_reply;
pub use text::handle_message;

#[poise::command(slash_command, rename = "ticker", subcommands("check", "predict"))]
pub async fn ticker_command(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}
