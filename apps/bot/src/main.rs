use anyhow::Result;
use poise::{Framework, FrameworkOptions};
use serenity::all::{ClientBuilder, FullEvent, GatewayIntents};
use stock::{AlphaVantageClient, MARKET_TZ, market_now};
use ticker::{
    Data,
    command::{self, ticker::ticker_command},
    config::Config,
};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod report;

/// Quarter hours on weekdays, New York time. 09:30 and 16:00 are the bells.
const TICK_SCHEDULE: &str = "0 0,15,30,45 * * * Mon-Fri";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(
        version = %config.version,
        stocks = config.stocks.len(),
        channels = config.channels.len(),
        "starting ticker"
    );

    let client = AlphaVantageClient::new(config.api_url.clone(), config.api_key.clone())?;
    let data = Data::new(config, client);

    // Text commands need to read message bodies.
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;
    let commands = vec![ticker_command()];

    let framework = Framework::builder()
        .options(FrameworkOptions {
            event_handler: |serenity_ctx, event, _framework_ctx, data| {
                Box::pin(async move {
                    if let FullEvent::Message { new_message } = event
                        && let Err(e) =
                            command::ticker::handle_message(serenity_ctx, data, new_message).await
                    {
                        warn!(error = ?e, "text command failed");
                    }
                    Ok(())
                })
            },
            commands,
            ..Default::default()
        })
        .setup({
            let data = data.clone();

            move |ctx, ready, framework| {
                let data = data.clone();

                Box::pin(async move {
                    info!(
                        "{} [{}] connected successfully!",
                        ready.user.name, ready.user.id
                    );

                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                    Ok(data)
                })
            }
        })
        .build();

    let mut client = ClientBuilder::new(&data.config.discord_token, intents)
        .framework(framework)
        .await?;

    let http = client.http.clone();
    let shard_manager = client.shard_manager.clone();

    let mut sched = JobScheduler::new().await?;

    let data_job = data.clone();
    sched
        .add(Job::new_async_tz(
            TICK_SCHEDULE,
            MARKET_TZ,
            move |_uuid, _l| {
                let http = http.clone();
                let data = data_job.clone();

                Box::pin(async move {
                    if let Err(e) = report::run_tick(http, data, market_now()).await {
                        error!("run_tick failed: {:?}", e);
                    }
                })
            },
        )?)
        .await?;

    sched.start().await?;

    tokio::spawn(async move {
        if let Err(why) = client.start().await {
            error!("Client error: {why:?}");
        }
    });

    shutdown_signal().await;

    info!("Shutting down");
    if let Err(e) = sched.shutdown().await {
        warn!(error = ?e, "scheduler shutdown failed");
    }
    shard_manager.shutdown_all().await;

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::{
            select,
            signal::unix::{SignalKind, signal},
        };
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
