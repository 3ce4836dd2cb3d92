//! Card catalog and per-player deck piles.
//!
//! Card archetypes are immutable data. A [`Card`] instance only carries its
//! type and a removal tag; everything else is looked up in the catalog.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of card archetypes
pub const CARD_TYPES: usize = 21;

/// Cards held at the start of every turn
pub const HAND_SIZE: usize = 4;

/// Count of cards per archetype, indexed by [`CardType::index`]
pub type CardCounts = [u8; CARD_TYPES];

/// Card archetypes, in observation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Explorer,
    Scout,
    Trailblazer,
    Pioneer,
    GiantMachete,
    Sailor,
    Captain,
    Traveler,
    Photographer,
    Journalist,
    TreasureChest,
    Millionaire,
    JackOfAllTrades,
    Adventurer,
    PropPlane,
    Transmitter,
    Cartographer,
    Compass,
    Scientist,
    TravelLog,
    Native,
}

/// The decision a special card takes over after it is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowUp {
    /// Take any in-stock shop card for free, into the discard pile
    Transmit,
    /// Tag cards from the action's removal vector, then remove up to this many
    RemoveTagged(u8),
    /// Move one hex in the action's direction without paying
    FreeMove,
}

/// A card's special ability: an immediate draw plus an optional follow-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Special {
    pub draw: u8,
    pub follow_up: Option<FollowUp>,
}

/// Immutable card template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Archetype {
    pub name: &'static str,
    pub cost: u8,
    /// Removed from the deck for good once played
    pub single_use: bool,
    pub machete: u8,
    pub paddle: u8,
    pub coins: u8,
    pub special: Option<Special>,
}

const fn plain(name: &'static str, cost: u8, single_use: bool, grants: [u8; 3]) -> Archetype {
    Archetype {
        name,
        cost,
        single_use,
        machete: grants[0],
        paddle: grants[1],
        coins: grants[2],
        special: None,
    }
}

const fn special(
    name: &'static str,
    cost: u8,
    single_use: bool,
    draw: u8,
    follow_up: Option<FollowUp>,
) -> Archetype {
    Archetype {
        name,
        cost,
        single_use,
        machete: 0,
        paddle: 0,
        coins: 0,
        special: Some(Special { draw, follow_up }),
    }
}

/// Indexed by `CardType as usize`
static ARCHETYPES: [Archetype; CARD_TYPES] = [
    plain("Explorer", 0, false, [1, 0, 0]),
    plain("Scout", 1, false, [2, 0, 0]),
    plain("Trailblazer", 3, false, [3, 0, 0]),
    plain("Pioneer", 5, false, [5, 0, 0]),
    plain("Giant Machete", 3, true, [6, 0, 0]),
    plain("Sailor", 0, false, [0, 1, 0]),
    plain("Captain", 2, false, [0, 3, 0]),
    plain("Traveler", 0, false, [0, 0, 1]),
    plain("Photographer", 2, false, [0, 0, 3]),
    plain("Journalist", 3, false, [0, 0, 3]),
    plain("Treasure Chest", 3, true, [0, 0, 4]),
    plain("Millionaire", 5, false, [0, 0, 4]),
    plain("Jack of All Trades", 2, false, [1, 1, 1]),
    plain("Adventurer", 4, false, [2, 2, 2]),
    plain("Prop Plane", 4, true, [4, 4, 4]),
    special("Transmitter", 4, true, 0, Some(FollowUp::Transmit)),
    special("Cartographer", 4, false, 2, None),
    special("Compass", 2, true, 3, None),
    special("Scientist", 4, false, 1, Some(FollowUp::RemoveTagged(1))),
    special("Travel Log", 3, true, 2, Some(FollowUp::RemoveTagged(2))),
    special("Native", 5, false, 0, Some(FollowUp::FreeMove)),
];

impl CardType {
    pub const ALL: [CardType; CARD_TYPES] = [
        CardType::Explorer,
        CardType::Scout,
        CardType::Trailblazer,
        CardType::Pioneer,
        CardType::GiantMachete,
        CardType::Sailor,
        CardType::Captain,
        CardType::Traveler,
        CardType::Photographer,
        CardType::Journalist,
        CardType::TreasureChest,
        CardType::Millionaire,
        CardType::JackOfAllTrades,
        CardType::Adventurer,
        CardType::PropPlane,
        CardType::Transmitter,
        CardType::Cartographer,
        CardType::Compass,
        CardType::Scientist,
        CardType::TravelLog,
        CardType::Native,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn archetype(self) -> &'static Archetype {
        &ARCHETYPES[self.index()]
    }

    pub fn cost(self) -> u8 {
        self.archetype().cost
    }

    pub fn special(self) -> Option<Special> {
        self.archetype().special
    }
}

/// The deck every player starts with
pub const STARTING_DECK: [(CardType, u8); 3] = [
    (CardType::Explorer, 3),
    (CardType::Sailor, 1),
    (CardType::Traveler, 4),
];

/// A card instance owned by one deck pile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub kind: CardType,
    /// Marked to pay for a rubble hex or a removal follow-up
    pub tagged: bool,
}

impl Card {
    pub fn new(kind: CardType) -> Self {
        Self {
            kind,
            tagged: false,
        }
    }
}

/// Tally cards by archetype
pub fn count_cards(cards: &[Card]) -> CardCounts {
    let mut counts = [0; CARD_TYPES];
    for card in cards {
        counts[card.kind.index()] += 1;
    }
    counts
}

/// A player's four piles, plus a tally of every card the player owns.
///
/// Every owned card sits in exactly one pile: `owned` always equals the
/// combined counts of draw, discard, hand and played.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    draw_pile: Vec<Card>,
    discard_pile: Vec<Card>,
    hand: Vec<Card>,
    played: Vec<Card>,
    owned: CardCounts,
}

impl Deck {
    /// The starting deck, shuffled, with an opening hand drawn
    pub fn starting<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Deck::default();
        for (kind, copies) in STARTING_DECK {
            for _ in 0..copies {
                deck.add(Card::new(kind));
            }
        }
        deck.draw(HAND_SIZE, rng);
        deck
    }

    /// A deck with a fixed hand and draw pile, for scripted scenarios
    pub fn from_piles(hand: &[CardType], draw_pile: &[CardType]) -> Self {
        let hand: Vec<Card> = hand.iter().map(|&kind| Card::new(kind)).collect();
        let draw_pile: Vec<Card> = draw_pile.iter().map(|&kind| Card::new(kind)).collect();
        let mut owned = count_cards(&hand);
        for (total, extra) in owned.iter_mut().zip(count_cards(&draw_pile)) {
            *total += extra;
        }
        Self {
            draw_pile,
            discard_pile: Vec::new(),
            hand,
            played: Vec::new(),
            owned,
        }
    }

    /// Draw up to `n` cards into the hand and return how many were drawn.
    ///
    /// If the draw pile runs short, the shuffled discard pile goes under it
    /// first. Fewer than `n` cards come back only when the deck is that small.
    pub fn draw<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> usize {
        if self.draw_pile.len() < n {
            self.discard_pile.shuffle(rng);
            self.draw_pile.append(&mut self.discard_pile);
        }
        let count = n.min(self.draw_pile.len());
        self.hand.extend(self.draw_pile.drain(..count));
        count
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn played(&self) -> &[Card] {
        &self.played
    }

    pub fn draw_pile(&self) -> &[Card] {
        &self.draw_pile
    }

    pub fn discard_pile(&self) -> &[Card] {
        &self.discard_pile
    }

    /// Hand position of the first card of this archetype
    pub fn find_in_hand(&self, kind: CardType) -> Option<usize> {
        self.hand.iter().position(|card| card.kind == kind)
    }

    pub fn hand_card_mut(&mut self, index: usize) -> Option<&mut Card> {
        self.hand.get_mut(index)
    }

    /// Move a hand card onto the played pile
    pub fn use_card(&mut self, index: usize) -> Option<CardType> {
        if index >= self.hand.len() {
            return None;
        }
        let card = self.hand.remove(index);
        self.played.push(card);
        Some(card.kind)
    }

    /// Take a hand card out of the deck for good
    pub fn remove(&mut self, index: usize) -> Option<CardType> {
        if index >= self.hand.len() {
            return None;
        }
        let card = self.hand.remove(index);
        let owned = &mut self.owned[card.kind.index()];
        *owned = owned.saturating_sub(1);
        Some(card.kind)
    }

    /// A newly acquired card goes to the discard pile
    pub fn add(&mut self, card: Card) {
        self.owned[card.kind.index()] += 1;
        self.discard_pile.push(card);
    }

    pub fn discard_played(&mut self) {
        self.discard_pile.append(&mut self.played);
    }

    /// Tag hand cards for removal, taking `counts[t]` cards of each archetype
    /// in hand order. Every other hand card loses its tag.
    pub fn tag(&mut self, counts: &CardCounts) {
        let mut remaining = *counts;
        for card in &mut self.hand {
            let left = &mut remaining[card.kind.index()];
            card.tagged = *left > 0;
            if card.tagged {
                *left -= 1;
            }
        }
    }

    pub fn clear_tags(&mut self) {
        for card in &mut self.hand {
            card.tagged = false;
        }
    }

    /// Hand positions of tagged cards
    pub fn tagged_positions(&self) -> Vec<usize> {
        self.hand
            .iter()
            .enumerate()
            .filter(|(_, card)| card.tagged)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn tagged_count(&self) -> usize {
        self.hand.iter().filter(|card| card.tagged).count()
    }

    pub fn hand_counts(&self) -> CardCounts {
        count_cards(&self.hand)
    }

    pub fn played_counts(&self) -> CardCounts {
        count_cards(&self.played)
    }

    pub fn draw_counts(&self) -> CardCounts {
        count_cards(&self.draw_pile)
    }

    pub fn discard_counts(&self) -> CardCounts {
        count_cards(&self.discard_pile)
    }

    pub fn owned_counts(&self) -> CardCounts {
        self.owned
    }

    /// Cards across all four piles
    pub fn len(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len() + self.hand.len() + self.played.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn owned_total(&self) -> usize {
        self.owned.iter().map(|&n| n as usize).sum()
    }
}
