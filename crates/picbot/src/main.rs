use std::sync::Arc;

use teloxide::Bot;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use picbot_board::BoardClient;
use picbot_core::{
    config::Config,
    discovery::DiscoveryLoop,
    dispatch::DispatchLoop,
    filter::{SharedFilter, SubjectFilter},
    ports::{BoardPort, DeliveryPort, SubscriberStore},
    refresh::run_pattern_refresh,
    registry::SubscriberRegistry,
};
use picbot_store::PgStore;
use picbot_telegram::TelegramDelivery;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    picbot_core::logging::init("picbot")?;

    let cfg = Config::load()?;

    let store: Arc<dyn SubscriberStore> = Arc::new(PgStore::connect(&cfg.database_url).await?);

    // Fatal if the stored pattern set is empty or does not compile.
    let patterns = store.load_patterns().await?;
    let filter = SharedFilter::new(SubjectFilter::compile(&patterns)?);

    let registry = Arc::new(SubscriberRegistry::new(store.clone()));
    registry.load_from_store().await?;

    let board: Arc<dyn BoardPort> =
        Arc::new(BoardClient::new(&cfg.board_base_url, &cfg.board, cfg.http_timeout)?);

    let bot = Bot::new(cfg.bot_token.clone());
    let delivery: Arc<dyn DeliveryPort> = Arc::new(TelegramDelivery::new(bot.clone()));

    let (tx, rx) = mpsc::channel(cfg.queue_capacity);
    let cancel = CancellationToken::new();

    let discovery = DiscoveryLoop::new(board, filter.clone(), tx, cfg.poll_interval);
    tokio::spawn(discovery.run(cancel.child_token()));

    let dispatch = DispatchLoop::new(rx, delivery, registry.clone(), cfg.send_delay);
    tokio::spawn(dispatch.run(cancel.child_token()));

    tokio::spawn(run_pattern_refresh(
        store,
        filter,
        cfg.pattern_refresh,
        cancel.child_token(),
    ));

    let router_registry = registry.clone();
    tokio::spawn(async move {
        if let Err(e) = picbot_telegram::router::run_polling(bot, router_registry).await {
            error!("command router failed: {e}");
        }
    });

    info!("picbot started");
    shutdown_signal().await?;

    info!("picbot stopping");
    cancel.cancel();

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
