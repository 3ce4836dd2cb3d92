//! The shared shop and its market board.

use crate::cards::CardType;
use crate::player::Coins;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Copies of each archetype in the shop at the start
pub const CARDS_PER_TYPE: u8 = 3;

/// Archetypes that can be on the market board at once
pub const MARKET_SLOTS: usize = 6;

/// Number of purchasable archetypes
pub const SHOP_TYPES: usize = 18;

/// Purchasable archetypes, in shop-index order
pub const BUYABLE: [CardType; SHOP_TYPES] = [
    CardType::Scout,
    CardType::Trailblazer,
    CardType::Pioneer,
    CardType::GiantMachete,
    CardType::Captain,
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

/// Shop indices on the market board when an episode begins
pub const INITIAL_MARKET: [usize; MARKET_SLOTS] = [0, 1, 5, 7, 9, 12];

/// Shop selection mask: index 0 declines, index `i + 1` selects `BUYABLE[i]`
pub type ShopMask = [bool; SHOP_TYPES + 1];

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopError {
    #[error("No shop card at index {0}")]
    UnknownCard(usize),

    #[error("Market board is full and {0:?} is not on it")]
    MarketFull(CardType),

    #[error("{0:?} is sold out")]
    OutOfStock(CardType),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    stock: [u8; SHOP_TYPES],
    in_market: [bool; SHOP_TYPES],
}

impl Default for Shop {
    fn default() -> Self {
        Self::new()
    }
}

impl Shop {
    pub fn new() -> Self {
        let mut in_market = [false; SHOP_TYPES];
        for index in INITIAL_MARKET {
            in_market[index] = true;
        }
        Self {
            stock: [CARDS_PER_TYPE; SHOP_TYPES],
            in_market,
        }
    }

    pub fn card(index: usize) -> Result<CardType, ShopError> {
        BUYABLE.get(index).copied().ok_or(ShopError::UnknownCard(index))
    }

    pub fn stock(&self, index: usize) -> u8 {
        self.stock.get(index).copied().unwrap_or(0)
    }

    pub fn is_in_market(&self, index: usize) -> bool {
        self.in_market.get(index).copied().unwrap_or(false)
    }

    pub fn market_count(&self) -> usize {
        self.in_market.iter().filter(|&&visible| visible).count()
    }

    pub fn is_market_full(&self) -> bool {
        self.market_count() >= MARKET_SLOTS
    }

    /// Check a purchase without making it
    pub fn check_buy(&self, index: usize) -> Result<CardType, ShopError> {
        let kind = Self::card(index)?;
        if self.stock[index] == 0 {
            return Err(ShopError::OutOfStock(kind));
        }
        if !self.in_market[index] && self.is_market_full() {
            return Err(ShopError::MarketFull(kind));
        }
        Ok(kind)
    }

    /// Buy one card, putting its archetype on the market board if there is room
    pub fn buy(&mut self, index: usize) -> Result<CardType, ShopError> {
        let kind = self.check_buy(index)?;
        self.in_market[index] = true;
        self.take(index);
        Ok(kind)
    }

    /// Take one card regardless of the market board
    pub fn transmit(&mut self, index: usize) -> Result<CardType, ShopError> {
        let kind = Self::card(index)?;
        if self.stock[index] == 0 {
            return Err(ShopError::OutOfStock(kind));
        }
        self.take(index);
        Ok(kind)
    }

    fn take(&mut self, index: usize) {
        self.stock[index] -= 1;
        if self.stock[index] == 0 {
            self.in_market[index] = false;
        }
    }

    /// Which cards a player holding `coins` may buy
    pub fn available_mask(&self, coins: Coins) -> ShopMask {
        let full = self.is_market_full();
        let mut mask = [false; SHOP_TYPES + 1];
        mask[0] = true;
        for (i, kind) in BUYABLE.iter().enumerate() {
            mask[i + 1] = coins.covers(kind.cost())
                && self.stock[i] > 0
                && (!full || self.in_market[i]);
        }
        mask
    }

    /// Every in-stock card, for a free pick
    pub fn transmit_mask(&self) -> ShopMask {
        let mut mask = [false; SHOP_TYPES + 1];
        mask[0] = true;
        for (i, stock) in self.stock.iter().enumerate() {
            mask[i + 1] = *stock > 0;
        }
        mask
    }

    /// `[stock, on market board]` per archetype
    pub fn observation(&self) -> [[u8; 2]; SHOP_TYPES] {
        std::array::from_fn(|i| [self.stock[i], u8::from(self.in_market[i])])
    }
}
