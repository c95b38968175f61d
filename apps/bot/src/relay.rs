//! Plain-text `!check` / `!predict` commands, including ones relayed from
//! another network by a bridge bot as `<nick> !check AAPL`.

use std::str::FromStr;

use anyhow::{Error, bail};

use crate::prediction::parse_percent;

/// A bridge bot allowed to speak for other users. Unset fields match anyone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayBot {
    pub id: Option<u64>,
    pub name: Option<String>,
}

impl RelayBot {
    pub fn matches(&self, id: u64, name: &str) -> bool {
        self.id.is_none_or(|bot_id| bot_id == id)
            && self.name.as_deref().is_none_or(|bot_name| bot_name == name)
    }
}

/// `name`, `@id` or `name@id`.
impl FromStr for RelayBot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, id) = match s.split_once('@') {
            Some((name, id)) => (name.trim(), Some(id.trim())),
            None => (s.trim(), None),
        };

        let id = match id {
            Some(id) => match id.parse::<u64>() {
                Ok(id) => Some(id),
                Err(_) => bail!("invalid relay bot id: {s}"),
            },
            None => None,
        };
        let name = (!name.is_empty()).then(|| name.to_string());

        if id.is_none() && name.is_none() {
            bail!("empty relay bot entry: {s}");
        }

        Ok(Self { id, name })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextCommand {
    Check { symbol: String },
    Predict { symbol: String, percent: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage {
    /// Nick from a `<nick>` prefix; only trusted from relay bots.
    pub relayed_nick: Option<String>,
    pub command: TextCommand,
}

pub fn parse_message(content: &str) -> Option<ParsedMessage> {
    let (relayed_nick, rest) = split_relay_prefix(content)?;
    let (name, args) = rest.split_once(' ')?;

    let command = match name {
        "!check" => TextCommand::Check {
            symbol: parse_symbol(args)?,
        },
        "!predict" => {
            let (symbol, change) = args.split_once(' ')?;
            TextCommand::Predict {
                symbol: parse_symbol(symbol)?,
                percent: parse_percent(change)?,
            }
        }
        _ => return None,
    };

    Some(ParsedMessage {
        relayed_nick,
        command,
    })
}

fn split_relay_prefix(content: &str) -> Option<(Option<String>, &str)> {
    let Some(rest) = content.strip_prefix('<') else {
        return Some((None, content));
    };

    // The nick ends at the first `>` followed by whitespace, so nicks may
    // themselves contain `>`.
    let (end, _) = rest
        .match_indices('>')
        .find(|(i, _)| *i > 0 && rest[i + 1..].starts_with(char::is_whitespace))?;

    Some((Some(rest[..end].to_string()), rest[end + 1..].trim_start()))
}

pub fn parse_symbol(raw: &str) -> Option<String> {
    (!raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphabetic())).then(|| raw.to_uppercase())
}
