//! Telegram adapter (teloxide).
//!
//! Outbound delivery implements the core `DeliveryPort`; the inbound command
//! router in `router` feeds the subscriber registry.

use async_trait::async_trait;

use teloxide::{prelude::*, ApiError, RequestError};

pub mod router;

use picbot_core::{
    domain::ChatId,
    ports::{DeliveryPort, SendError},
};

#[derive(Clone)]
pub struct TelegramDelivery {
    bot: Bot,
}

impl TelegramDelivery {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }
}

/// Maps a teloxide failure onto the classification the dispatch loop
/// branches on: "recipient forbids bot" vs. everything else.
fn classify(e: RequestError) -> SendError {
    match e {
        RequestError::Api(ApiError::BotBlocked) | RequestError::Api(ApiError::UserDeactivated) => {
            SendError::Forbidden
        }
        RequestError::Api(ApiError::Unknown(ref s)) if s.starts_with("Forbidden") => {
            SendError::Forbidden
        }
        other => SendError::Other(other.to_string()),
    }
}

#[async_trait]
impl DeliveryPort for TelegramDelivery {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), SendError> {
        self.bot
            .send_message(Self::tg_chat(chat_id), text.to_string())
            .await
            .map_err(classify)?;
        Ok(())
    }
}
