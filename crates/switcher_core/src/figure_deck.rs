//! Figure cards: deck partition at game start and face-up hands.
//!
//! The deck holds two copies of each of the 25 figure types. At start it is
//! partitioned among the players, each slot drawn uniformly among the types
//! of the slot's difficulty that still have a copy left. A player's share
//! starts face down and is flipped into a hand of three as the game goes.

use crate::GameError;
use crate::movement_deck::HAND_SIZE;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{EnumIter, IntoEnumIterator};
use tracing::{debug, error, instrument};

/// Distinct easy figure types.
pub const EASY_TYPES: usize = 7;

/// Distinct difficult figure types.
pub const DIFFICULT_TYPES: usize = 18;

/// Copies of each figure type in the deck.
pub const COPIES_PER_TYPE: u8 = 2;

/// Difficulty tier of a figure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    /// Small shapes.
    Easy,
    /// Large shapes.
    Difficult,
}

impl Difficulty {
    /// Number of distinct figure types in this tier.
    pub fn type_count(self) -> usize {
        match self {
            Self::Easy => EASY_TYPES,
            Self::Difficult => DIFFICULT_TYPES,
        }
    }

    /// Cards of this tier each player receives for a given roster size.
    pub fn cards_per_player(self, player_count: usize) -> usize {
        if player_count == 0 {
            return 0;
        }
        usize::from(COPIES_PER_TYPE) * self.type_count() / player_count
    }
}

/// The 25 figure shapes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    strum::Display,
)]
#[allow(missing_docs)]
pub enum FigureType {
    #[serde(rename = "FIG_01")]
    #[strum(serialize = "FIG_01")]
    Fig01,
    #[serde(rename = "FIG_02")]
    #[strum(serialize = "FIG_02")]
    Fig02,
    #[serde(rename = "FIG_03")]
    #[strum(serialize = "FIG_03")]
    Fig03,
    #[serde(rename = "FIG_04")]
    #[strum(serialize = "FIG_04")]
    Fig04,
    #[serde(rename = "FIG_05")]
    #[strum(serialize = "FIG_05")]
    Fig05,
    #[serde(rename = "FIG_06")]
    #[strum(serialize = "FIG_06")]
    Fig06,
    #[serde(rename = "FIG_07")]
    #[strum(serialize = "FIG_07")]
    Fig07,
    #[serde(rename = "FIG_08")]
    #[strum(serialize = "FIG_08")]
    Fig08,
    #[serde(rename = "FIG_09")]
    #[strum(serialize = "FIG_09")]
    Fig09,
    #[serde(rename = "FIG_10")]
    #[strum(serialize = "FIG_10")]
    Fig10,
    #[serde(rename = "FIG_11")]
    #[strum(serialize = "FIG_11")]
    Fig11,
    #[serde(rename = "FIG_12")]
    #[strum(serialize = "FIG_12")]
    Fig12,
    #[serde(rename = "FIG_13")]
    #[strum(serialize = "FIG_13")]
    Fig13,
    #[serde(rename = "FIG_14")]
    #[strum(serialize = "FIG_14")]
    Fig14,
    #[serde(rename = "FIG_15")]
    #[strum(serialize = "FIG_15")]
    Fig15,
    #[serde(rename = "FIG_16")]
    #[strum(serialize = "FIG_16")]
    Fig16,
    #[serde(rename = "FIG_17")]
    #[strum(serialize = "FIG_17")]
    Fig17,
    #[serde(rename = "FIG_18")]
    #[strum(serialize = "FIG_18")]
    Fig18,
    #[serde(rename = "FIGE_01")]
    #[strum(serialize = "FIGE_01")]
    FigE01,
    #[serde(rename = "FIGE_02")]
    #[strum(serialize = "FIGE_02")]
    FigE02,
    #[serde(rename = "FIGE_03")]
    #[strum(serialize = "FIGE_03")]
    FigE03,
    #[serde(rename = "FIGE_04")]
    #[strum(serialize = "FIGE_04")]
    FigE04,
    #[serde(rename = "FIGE_05")]
    #[strum(serialize = "FIGE_05")]
    FigE05,
    #[serde(rename = "FIGE_06")]
    #[strum(serialize = "FIGE_06")]
    FigE06,
    #[serde(rename = "FIGE_07")]
    #[strum(serialize = "FIGE_07")]
    FigE07,
}

impl FigureType {
    /// Difficulty tier of the figure.
    pub fn difficulty(self) -> Difficulty {
        if self >= Self::FigE01 {
            Difficulty::Easy
        } else {
            Difficulty::Difficult
        }
    }
}

/// A figure card owned by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FigureCard {
    /// Shape on the card.
    pub kind: FigureType,
    /// Face up and playable, or face down in reserve.
    pub in_hand: bool,
}

/// Copies handed out so far, per figure type, across the whole game.
#[derive(Debug, Clone, Default)]
pub struct FigurePartition {
    dealt: HashMap<FigureType, u8>,
}

impl FigurePartition {
    /// Creates a partition with every copy still available.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of `kind` handed out so far.
    pub fn dealt(&self, kind: FigureType) -> u8 {
        self.dealt.get(&kind).copied().unwrap_or(0)
    }

    /// Draws one type of the given tier among those with a copy left.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::FigurePoolExhausted`] if every type of the tier
    /// is used up, which the per-player quotas rule out.
    pub fn draw<R: Rng>(
        &mut self,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<FigureType, GameError> {
        let eligible: Vec<FigureType> = FigureType::iter()
            .filter(|kind| kind.difficulty() == difficulty)
            .filter(|kind| self.dealt(*kind) < COPIES_PER_TYPE)
            .collect();
        let kind = *eligible.choose(rng).ok_or_else(|| {
            error!(%difficulty, "Figure pool exhausted");
            GameError::FigurePoolExhausted(difficulty)
        })?;
        *self.dealt.entry(kind).or_insert(0) += 1;
        Ok(kind)
    }

    /// Deals every player's face-down share, in roster order.
    ///
    /// Each player gets `2·7/n` easy then `2·18/n` difficult cards.
    ///
    /// # Errors
    ///
    /// Propagates [`GameError::FigurePoolExhausted`].
    #[instrument(skip(rng))]
    pub fn deal_reserves<R: Rng>(
        player_count: usize,
        rng: &mut R,
    ) -> Result<Vec<FigureHand>, GameError> {
        let mut partition = Self::new();
        let mut hands = Vec::with_capacity(player_count);
        for _ in 0..player_count {
            let mut hand = FigureHand::default();
            for difficulty in [Difficulty::Easy, Difficulty::Difficult] {
                for _ in 0..difficulty.cards_per_player(player_count) {
                    let kind = partition.draw(difficulty, rng)?;
                    hand.cards.push(FigureCard {
                        kind,
                        in_hand: false,
                    });
                }
            }
            hands.push(hand);
        }
        debug!(
            player_count,
            easy = Difficulty::Easy.cards_per_player(player_count),
            difficult = Difficulty::Difficult.cards_per_player(player_count),
            "Figure deck partitioned"
        );
        Ok(hands)
    }
}

/// A player's figure cards, face up and face down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureHand {
    cards: Vec<FigureCard>,
}

impl FigureHand {
    /// Builds a hand from explicit cards.
    pub fn from_cards(cards: Vec<FigureCard>) -> Self {
        Self { cards }
    }

    /// Flips random face-down cards up until three are face up or the
    /// reserve runs out. Returns how many were flipped.
    #[instrument(skip(self, rng))]
    pub fn deal_to_hand<R: Rng>(&mut self, rng: &mut R) -> usize {
        let mut flipped = 0;
        while self.face_up().count() < HAND_SIZE {
            let reserve: Vec<usize> = self
                .cards
                .iter()
                .enumerate()
                .filter(|(_, card)| !card.in_hand)
                .map(|(slot, _)| slot)
                .collect();
            let Some(&slot) = reserve.choose(rng) else {
                debug!("Figure reserve exhausted");
                break;
            };
            self.cards[slot].in_hand = true;
            flipped += 1;
        }
        flipped
    }

    /// Face-up cards.
    pub fn face_up(&self) -> impl Iterator<Item = &FigureCard> {
        self.cards.iter().filter(|card| card.in_hand)
    }

    /// Number of face-down cards left.
    pub fn reserve_len(&self) -> usize {
        self.cards.iter().filter(|card| !card.in_hand).count()
    }

    /// All cards.
    pub fn cards(&self) -> &[FigureCard] {
        &self.cards
    }

    /// Drops every card.
    pub fn clear(&mut self) {
        self.cards.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_type_split() {
        let easy = FigureType::iter()
            .filter(|k| k.difficulty() == Difficulty::Easy)
            .count();
        let difficult = FigureType::iter()
            .filter(|k| k.difficulty() == Difficulty::Difficult)
            .count();
        assert_eq!(easy, EASY_TYPES);
        assert_eq!(difficult, DIFFICULT_TYPES);
    }

    #[test]
    fn test_quotas() {
        assert_eq!(Difficulty::Easy.cards_per_player(3), 4);
        assert_eq!(Difficulty::Difficult.cards_per_player(3), 12);
        assert_eq!(Difficulty::Easy.cards_per_player(2), 7);
        assert_eq!(Difficulty::Difficult.cards_per_player(4), 9);
    }

    #[test]
    fn test_partition_never_exceeds_two_copies() {
        for players in 2..=4 {
            let mut rng = StdRng::seed_from_u64(players as u64);
            let hands = FigurePartition::deal_reserves(players, &mut rng).expect("partition");
            let mut totals: HashMap<FigureType, usize> = HashMap::new();
            for hand in &hands {
                for card in hand.cards() {
                    *totals.entry(card.kind).or_default() += 1;
                    assert!(!card.in_hand);
                }
            }
            assert!(totals.values().all(|&n| n <= 2));
        }
    }

    #[test]
    fn test_draw_exhausts_tier() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut partition = FigurePartition::new();
        for _ in 0..(EASY_TYPES * 2) {
            partition.draw(Difficulty::Easy, &mut rng).expect("copy left");
        }
        assert_eq!(
            partition.draw(Difficulty::Easy, &mut rng),
            Err(GameError::FigurePoolExhausted(Difficulty::Easy))
        );
        assert!(partition.draw(Difficulty::Difficult, &mut rng).is_ok());
    }

    #[test]
    fn test_deal_to_hand_stops_at_three() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut hand = FigureHand::from_cards(
            FigureType::iter()
                .take(5)
                .map(|kind| FigureCard {
                    kind,
                    in_hand: false,
                })
                .collect(),
        );
        assert_eq!(hand.deal_to_hand(&mut rng), 3);
        assert_eq!(hand.face_up().count(), 3);
        assert_eq!(hand.reserve_len(), 2);
        assert_eq!(hand.deal_to_hand(&mut rng), 0);
    }

    #[test]
    fn test_deal_to_hand_with_short_reserve() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut hand = FigureHand::from_cards(vec![
            FigureCard {
                kind: FigureType::Fig01,
                in_hand: true,
            },
            FigureCard {
                kind: FigureType::FigE02,
                in_hand: false,
            },
        ]);
        assert_eq!(hand.deal_to_hand(&mut rng), 1);
        assert_eq!(hand.face_up().count(), 2);
        assert_eq!(hand.reserve_len(), 0);
    }
}
