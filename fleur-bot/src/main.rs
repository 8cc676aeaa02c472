use std::env;
use std::sync::Arc;

use tokio::time::{Duration, sleep};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use twilight_gateway::{EventTypeFlags, Intents, Shard, ShardId, StreamExt as _};
use twilight_http::Client;
use twilight_model::{
    gateway::event::Event,
    id::{Id, marker::ApplicationMarker},
};

use rustls::crypto::ring::default_provider;

use fleur_commands::log::{Actor, log_action};
use fleur_commands::{handle_interaction, handle_message, slash_commands};
use fleur_core::{Config, Context};
use fleur_utils::embed::LogLevel;

/// Pause between the shutdown record and leaving the gateway loop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Load the .env file
    dotenvy::dotenv().ok();

    let token = env::var("DISCORD_TOKEN")?;
    let config = Config::from_env()?;

    // Create a single shared HTTP Client
    let http = Arc::new(Client::new(token.clone()));
    let ctx = Context::new(Arc::clone(&http), config);

    let intents = Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT;
    let mut shard = Shard::new(ShardId::new(0, 1), token, intents);

    info!("Fleur is connecting...");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let item = tokio::select! {
            item = shard.next_event(EventTypeFlags::all()) => item,
            () = &mut shutdown => {
                log_action(&ctx, &Actor::bot(), LogLevel::Error, "shutting down", None, false)
                    .await;
                sleep(SHUTDOWN_GRACE).await;
                break;
            }
        };

        let Some(item) = item else {
            break;
        };

        let event = match item {
            Ok(event) => event,
            Err(source) => {
                error!(?source, "gateway event stream error");
                continue;
            }
        };

        match event {
            Event::Ready(ready) => {
                register_commands(&ctx, ready.application.id).await;
                let extra = format!("{} guild(s)", ready.guilds.len());
                log_action(&ctx, &Actor::bot(), LogLevel::Success, "ready", Some(&extra), false)
                    .await;
            }
            Event::GatewayClose(frame) => {
                let extra = frame.map(|frame| format!("code {}", frame.code));
                log_action(
                    &ctx,
                    &Actor::bot(),
                    LogLevel::Warn,
                    "gateway connection closed",
                    extra.as_deref(),
                    false,
                )
                .await;
            }
            Event::MessageCreate(msg) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(source) = handle_message(ctx, msg).await {
                        error!(?source, "message handler failed");
                    }
                });
            }
            Event::InteractionCreate(interaction) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(source) = handle_interaction(ctx, interaction).await {
                        error!(?source, "interaction handler failed");
                    }
                });
            }
            _ => {} // Ignore unused events
        }
    }

    Ok(())
}

async fn register_commands(ctx: &Context, application_id: Id<ApplicationMarker>) {
    let commands = match slash_commands() {
        Ok(commands) => commands,
        Err(source) => {
            error!(?source, "invalid slash command definition");
            return;
        }
    };

    if let Err(source) = ctx
        .http
        .interaction(application_id)
        .set_global_commands(&commands)
        .await
    {
        error!(?source, "failed to register slash commands");
        let detail = source.to_string();
        log_action(
            ctx,
            &Actor::bot(),
            LogLevel::Error,
            "could not register slash commands",
            Some(&detail),
            false,
        )
        .await;
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(source) = tokio::signal::ctrl_c().await {
            error!(?source, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(source) => {
                error!(?source, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
