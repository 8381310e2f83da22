//! Settable price feed.

use odra::casper_types::U256;
use odra::prelude::*;

use crate::oracle::RoundData;

#[odra::module]
pub struct MockPriceFeed {
    decimals: Var<u8>,
    answer: Var<U256>,
    updated_at: Var<u64>,
}

#[odra::module]
impl MockPriceFeed {
    pub fn init(&mut self, decimals: u8, answer: U256) {
        self.decimals.set(decimals);
        self.set_price(answer);
    }

    /// Publish a new answer stamped with the current block time.
    pub fn set_price(&mut self, answer: U256) {
        self.answer.set(answer);
        self.updated_at.set(self.env().get_block_time());
    }

    /// Publish an answer with an explicit timestamp.
    pub fn set_round(&mut self, answer: U256, updated_at: u64) {
        self.answer.set(answer);
        self.updated_at.set(updated_at);
    }

    pub fn latest_round_data(&self) -> RoundData {
        RoundData {
            answer: self.answer.get_or_default(),
            updated_at: self.updated_at.get_or_default(),
        }
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get_or_default()
    }
}
