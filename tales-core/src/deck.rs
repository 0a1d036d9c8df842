//! The deck: an ordered collection of story cards plus the cursor for
//! the card currently shown.

use crate::card::{seed_deck, ImageState, StoryCard};
use rand::Rng;

/// Ordered cards and the current-card cursor.
///
/// Insertion order is display order. All mutations keep the cursor in
/// bounds; an empty deck pins it at zero.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<StoryCard>,
    current: usize,
}

impl Deck {
    /// Adopt a previously loaded deck, or generate the seed deck when
    /// none (or an empty one) is available. The result is shuffled and
    /// the cursor reset.
    pub fn from_loaded(loaded: Option<Vec<StoryCard>>, rng: &mut impl Rng) -> Self {
        let cards = match loaded {
            Some(cards) if !cards.is_empty() => cards,
            _ => seed_deck(),
        };
        let mut deck = Self { cards, current: 0 };
        deck.shuffle(rng);
        deck
    }

    /// Adopt cards in the given order, cursor on the first card.
    pub fn from_cards(cards: Vec<StoryCard>) -> Self {
        Self { cards, current: 0 }
    }

    /// Uniformly random in-place permutation (Fisher-Yates); cursor
    /// resets to the first card.
    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        for i in (1..self.cards.len()).rev() {
            let j = rng.gen_range(0..=i);
            self.cards.swap(i, j);
        }
        self.current = 0;
    }

    /// Move the cursor to the next card, wrapping at the end. Skipped
    /// silently on an empty deck.
    pub fn advance(&mut self) {
        if !self.cards.is_empty() {
            self.current = (self.current + 1) % self.cards.len();
        }
    }

    /// Prepend a card; it becomes the current card.
    pub fn insert(&mut self, card: StoryCard) {
        self.cards.insert(0, card);
        self.current = 0;
    }

    /// The card at the cursor, if any.
    pub fn current_card(&self) -> Option<&StoryCard> {
        self.cards.get(self.current)
    }

    /// Replace the image of the card with the given id, leaving every
    /// other card and the deck order untouched. Returns false if no
    /// card matches.
    pub fn update_image(&mut self, id: &str, image: ImageState) -> bool {
        match self.cards.iter_mut().find(|c| c.id == id) {
            Some(card) => {
                card.image = image;
                true
            }
            None => false,
        }
    }

    pub fn cards(&self) -> &[StoryCard] {
        &self.cards
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
