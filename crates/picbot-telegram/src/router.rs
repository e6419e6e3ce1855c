use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use picbot_core::registry::SubscriberRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SubscriberRegistry>,
}

/// Long-polls Telegram for inbound commands and translates them into
/// registry mutations. Runs for the process lifetime.
pub async fn run_polling(bot: Bot, registry: Arc<SubscriberRegistry>) -> anyhow::Result<()> {
    if let Ok(me) = bot.get_me().await {
        info!("bot authorized as @{}", me.username());
    }

    let state = Arc::new(AppState { registry });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Commands only; everything else is ignored.
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if !text.starts_with('/') {
        return Ok(());
    }

    let chat_id = picbot_core::domain::ChatId(msg.chat.id.0);
    let username = msg.chat.username().unwrap_or_default().to_string();

    // First contact registers the chat as an inactive subscriber.
    match state.registry.register(chat_id, &username).await {
        Ok(true) => info!(chat = chat_id.0, %username, "new subscriber registered"),
        Ok(false) => {}
        Err(e) => warn!(chat = chat_id.0, "failed to persist new subscriber: {e}"),
    }

    let (cmd, _args) = parse_command(text);
    let reply = match cmd.as_str() {
        "start" => "Hit /disco to start the meme feed.",
        "help" => "Send /pause to stop the flood. /disco turns it back on.",
        "pause" => {
            if let Err(e) = state.registry.set_active(chat_id, false).await {
                warn!(chat = chat_id.0, "failed to pause subscriber: {e}");
            }
            info!(chat = chat_id.0, %username, "subscriber paused delivery");
            "Meme feed paused."
        }
        "disco" => {
            if let Err(e) = state.registry.set_active(chat_id, true).await {
                warn!(chat = chat_id.0, "failed to activate subscriber: {e}");
            }
            info!(chat = chat_id.0, %username, "subscriber activated delivery");
            "Meme feed enabled."
        }
        _ => "Unknown command.",
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}
