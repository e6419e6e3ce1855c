use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    domain::ImageMessage,
    ports::{DeliveryPort, SendError},
    registry::SubscriberRegistry,
};

/// Consumer half of the pipeline.
///
/// Receives image messages from the bounded channel and fans each one out to
/// every active, non-blocked subscriber with a fixed delay between sends.
/// One message fully fans out before the next is dequeued; slow fan-out is
/// what backs discovery off through the channel.
pub struct DispatchLoop {
    rx: mpsc::Receiver<ImageMessage>,
    delivery: Arc<dyn DeliveryPort>,
    registry: Arc<SubscriberRegistry>,
    send_delay: Duration,
}

impl DispatchLoop {
    pub fn new(
        rx: mpsc::Receiver<ImageMessage>,
        delivery: Arc<dyn DeliveryPort>,
        registry: Arc<SubscriberRegistry>,
        send_delay: Duration,
    ) -> Self {
        Self {
            rx,
            delivery,
            registry,
            send_delay,
        }
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let msg = tokio::select! {
                _ = cancel.cancelled() => break,
                msg = self.rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };
            self.fan_out(&msg).await;
        }
    }

    /// Delivers one message to every eligible subscriber in the snapshot
    /// taken at the start of the fan-out.
    pub async fn fan_out(&self, msg: &ImageMessage) {
        for subscriber in self.registry.snapshot().await {
            if !subscriber.eligible() {
                continue;
            }

            match self.delivery.send_text(subscriber.chat_id, &msg.link).await {
                Ok(()) => {}
                Err(SendError::Forbidden) => {
                    self.registry.mark_blocked(subscriber.chat_id).await;
                    info!(
                        chat = subscriber.chat_id.0,
                        username = %subscriber.username,
                        "subscriber has blocked the bot"
                    );
                }
                Err(SendError::Other(e)) => {
                    warn!(chat = subscriber.chat_id.0, "delivery failed: {e}");
                }
            }

            sleep(self.send_delay).await;
        }
    }
}
