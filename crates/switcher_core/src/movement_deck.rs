//! Movement card hands.

use crate::{GameError, MovementType};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Cards a player holds once dealt.
pub const HAND_SIZE: usize = 3;

/// A movement card owned by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementCard {
    /// Pattern printed on the card.
    pub kind: MovementType,
    /// `false` once played this turn, until replaced at turn end.
    pub in_hand: bool,
}

/// A player's movement cards, in slot order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementHand {
    cards: Vec<MovementCard>,
}

fn draw<R: Rng>(rng: &mut R) -> MovementType {
    MovementType::ALL[rng.random_range(0..MovementType::ALL.len())]
}

impl MovementHand {
    /// Builds a hand from explicit cards.
    pub fn from_cards(cards: Vec<MovementCard>) -> Self {
        Self { cards }
    }

    /// Draws fresh in-hand cards until the hand holds three.
    ///
    /// Draws are independent and uniform over the seven types.
    #[instrument(skip(self, rng))]
    pub fn deal_initial<R: Rng>(&mut self, rng: &mut R) {
        while self.cards.len() < HAND_SIZE {
            let kind = draw(rng);
            debug!(%kind, "Dealt movement card");
            self.cards.push(MovementCard {
                kind,
                in_hand: true,
            });
        }
    }

    /// Replaces every played card with a fresh draw; held cards stay put.
    ///
    /// Returns how many cards were replaced.
    #[instrument(skip(self, rng))]
    pub fn replenish<R: Rng>(&mut self, rng: &mut R) -> usize {
        let mut replaced = 0;
        for card in self.cards.iter_mut().filter(|card| !card.in_hand) {
            *card = MovementCard {
                kind: draw(rng),
                in_hand: true,
            };
            replaced += 1;
        }
        debug!(replaced, "Movement hand replenished");
        replaced
    }

    /// Marks the first held card of `kind` as played and returns its slot.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CardNotInHand`] if no held card matches.
    #[instrument(skip(self))]
    pub fn discard(&mut self, kind: MovementType) -> Result<usize, GameError> {
        let slot = self
            .cards
            .iter()
            .position(|card| card.in_hand && card.kind == kind)
            .ok_or_else(|| {
                warn!(%kind, "Discard of card not in hand");
                GameError::CardNotInHand(kind)
            })?;
        self.cards[slot].in_hand = false;
        Ok(slot)
    }

    /// Puts a played card of `kind` back in hand and returns its slot.
    ///
    /// Picks the most recently played match, so discards undone in reverse
    /// order restore the exact slots.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CardNotInHand`] if no played card matches.
    #[instrument(skip(self))]
    pub fn restore(&mut self, kind: MovementType) -> Result<usize, GameError> {
        let slot = self
            .cards
            .iter()
            .rposition(|card| !card.in_hand && card.kind == kind)
            .ok_or_else(|| {
                warn!(%kind, "Restore of card that was not played");
                GameError::CardNotInHand(kind)
            })?;
        self.cards[slot].in_hand = true;
        Ok(slot)
    }

    /// All cards, played ones included.
    pub fn cards(&self) -> &[MovementCard] {
        &self.cards
    }

    /// Number of playable cards.
    pub fn playable(&self) -> usize {
        self.cards.iter().filter(|card| card.in_hand).count()
    }

    /// Drops every card.
    pub fn clear(&mut self) {
        self.cards.clear();
    }
}
