use std::sync::Arc;

use stock::AlphaVantageClient;
use tokio::sync::Mutex;

use config::Config;
use prediction::PredictionBook;

pub mod command;
pub mod config;
pub mod digest;
pub mod format;
pub mod prediction;
pub mod relay;

#[cfg(test)]
mod test_support;

#[derive(Clone)]
pub struct Data {
    pub config: Arc<Config>,
    pub client: Arc<AlphaVantageClient>,
    pub predictions: Arc<Mutex<PredictionBook>>,
}

impl Data {
    pub fn new(config: Config, client: AlphaVantageClient) -> Self {
        Self {
            config: Arc::new(config),
            client: Arc::new(client),
            predictions: Arc::new(Mutex::new(PredictionBook::default())),
        }
    }
}

pub type Error = anyhow::Error;
pub type Context<'a> = poise::Context<'a, Data, Error>;
