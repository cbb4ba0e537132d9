use std::sync::Arc;

use freight_intake::channels::{Channel, CliChannel, MessageSink, TelegramChannel};
use freight_intake::config::{BotConfig, Transport};
use freight_intake::dispatcher::Dispatcher;
use freight_intake::error::Result;
use freight_intake::intake::{ConversationEngine, SessionStore};
use freight_intake::relay::RelayRouter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut config = BotConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export INTAKE_OPERATOR_CHAT_ID=<operator chat id>");
        eprintln!("  export TELEGRAM_BOT_TOKEN=<bot token>   (or INTAKE_TRANSPORT=cli)");
        std::process::exit(1);
    });

    eprintln!("🚀 Freight intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Operator: {}", config.operator.identity());

    match config.transport {
        Transport::Telegram => {
            let Some(token) = config.bot_token.take() else {
                anyhow::bail!("TELEGRAM_BOT_TOKEN not set");
            };
            eprintln!("   Transport: telegram\n");
            serve(Arc::new(TelegramChannel::new(token)), &config).await?;
            Ok(())
        }
        Transport::Cli => {
            eprintln!("   Transport: cli (sending as {})", config.cli_user);
            eprintln!("   Prefix a line with @<id> to send as someone else.\n");
            serve(Arc::new(CliChannel::new(config.cli_user)), &config).await?;
            Ok(())
        }
    }
}

async fn serve<C: Channel + 'static>(channel: Arc<C>, config: &BotConfig) -> Result<()> {
    channel.health_check().await?;

    let sink: Arc<dyn MessageSink> = channel.clone();
    let store = Arc::new(SessionStore::new());
    let relay = Arc::new(RelayRouter::new(config.operator, Arc::clone(&sink)));
    let engine = Arc::new(ConversationEngine::new(
        store,
        Arc::clone(&relay),
        Arc::clone(&sink),
    ));
    let dispatcher = Dispatcher::new(engine, relay, sink, config.worker_idle_timeout);

    let stream = channel.start().await?;
    tracing::info!(channel = channel.name(), "Channel started");
    dispatcher.run(stream).await;

    channel.shutdown().await?;
    Ok(())
}
