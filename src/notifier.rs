//! Fan-out of game notifications to subscribers.

use std::collections::HashMap;
use std::sync::Mutex;
use switcher_core::{GameError, GameId, Notification, NotificationPort};
use tokio::sync::broadcast;
use tracing::{debug, error, instrument};

/// One broadcast channel per game, created on first use.
///
/// Delivery is best effort: events published with no subscriber are
/// dropped, and subscribers that fall more than `buffer` events behind
/// skip ahead.
#[derive(Debug)]
pub struct BroadcastNotifier {
    channels: Mutex<HashMap<GameId, broadcast::Sender<Notification>>>,
    buffer: usize,
}

impl BroadcastNotifier {
    /// Creates a notifier buffering up to `buffer` events per game.
    pub fn new(buffer: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Receives every notification published for `game` from now on.
    #[instrument(skip(self))]
    pub fn subscribe(&self, game: GameId) -> Result<broadcast::Receiver<Notification>, GameError> {
        let mut channels = self.channels.lock().map_err(|_| {
            error!("Notifier lock poisoned");
            GameError::LockPoisoned
        })?;
        let sender = channels
            .entry(game)
            .or_insert_with(|| broadcast::channel(self.buffer).0);
        debug!(subscribers = sender.receiver_count() + 1, "Subscribed to game");
        Ok(sender.subscribe())
    }
}

impl NotificationPort for BroadcastNotifier {
    #[instrument(skip(self, notification), fields(game_id = %notification.game_id(), kind = %notification.kind()))]
    fn publish(&self, notification: Notification) {
        let Ok(channels) = self.channels.lock() else {
            error!("Notifier lock poisoned, dropping event");
            return;
        };
        match channels.get(notification.game_id()) {
            Some(sender) => match sender.send(notification) {
                Ok(delivered) => debug!(delivered, "Notification published"),
                Err(_) => debug!("No active subscribers"),
            },
            None => debug!("No subscribers for game"),
        }
    }

    #[instrument(skip(self))]
    fn retire(&self, game: GameId) {
        let Ok(mut channels) = self.channels.lock() else {
            error!("Notifier lock poisoned, channel kept");
            return;
        };
        if channels.remove(&game).is_some() {
            debug!("Channel closed");
        }
    }
}
