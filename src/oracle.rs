//! LP Price Oracle
//!
//! Prices one unit of an AMM LP token in USD (18 decimals).
//!
//! The pair's reserves are valued with external feed prices, never with the
//! pool's own spot price. The spot price is only used as a sanity check: if it
//! deviates from the feed-implied price by more than `max_percent_diff`, the
//! read reverts. That blocks single-block reserve manipulation from leaking
//! into mint and unlock valuation.
//!
//! Feeds:
//! - one feed: token0/USD, token1 is treated as the USD unit
//! - two feeds: token0/USD and token1/USD

use odra::casper_types::bytesrepr::Bytes;
use odra::casper_types::{PublicKey, U256};
use odra::prelude::*;
use odra::ContractRef;
use alloc::vec::Vec;

use crate::math::{self, BASE_DECIMALS};

/// Latest answer of a price feed.
#[odra::odra_type]
pub struct RoundData {
    pub answer: U256,
    pub updated_at: u64,
}

/// Pool reserves in token base units.
#[odra::odra_type]
pub struct Reserves {
    pub reserve0: U256,
    pub reserve1: U256,
}

/// External price feed (Chainlink-style aggregator).
#[odra::external_contract]
pub trait PriceFeed {
    fn latest_round_data(&self) -> RoundData;
    fn decimals(&self) -> u8;
}

/// The subset of a constant-product pair the protocol reads or calls.
#[odra::external_contract]
pub trait LpPair {
    fn get_reserves(&self) -> Reserves;
    fn total_supply(&self) -> U256;
    fn decimals(&self) -> u8;
    fn permit(
        &mut self,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: u64,
        public_key: PublicKey,
        signature: Bytes,
    );
}

/// Upper bound on the number of feeds (one per pair token).
const MAX_FEEDS: usize = 2;

#[odra::odra_error]
pub enum OracleError {
    InvalidArgument = 20001,
    TooManyFeeds = 20002,
    InvalidLpDecimals = 20003,
    StalePrice = 20004,
    PriceDeviation = 20005,
    InvalidPrice = 20006,
}

#[odra::module(errors = OracleError)]
pub struct PriceOracle {
    pair: Var<Address>,
    token0_decimals: Var<u8>,
    token1_decimals: Var<u8>,
    feeds: Var<Vec<Address>>,
}

#[odra::module]
impl PriceOracle {
    pub fn init(&mut self, pair: Address, token0_decimals: u8, token1_decimals: u8, feeds: Vec<Address>) {
        if feeds.is_empty() {
            self.env().revert(OracleError::InvalidArgument);
        }
        if feeds.len() > MAX_FEEDS {
            self.env().revert(OracleError::TooManyFeeds);
        }
        if token0_decimals > BASE_DECIMALS || token1_decimals > BASE_DECIMALS {
            self.env().revert(OracleError::InvalidArgument);
        }
        let lp = LpPairContractRef::new(self.env().clone(), pair);
        if lp.decimals() != BASE_DECIMALS {
            self.env().revert(OracleError::InvalidLpDecimals);
        }

        self.pair.set(pair);
        self.token0_decimals.set(token0_decimals);
        self.token1_decimals.set(token1_decimals);
        self.feeds.set(feeds);
    }

    /// USD value of one LP unit (18 decimals).
    ///
    /// Reverts with `StalePrice` if any feed answer is older than
    /// `allowed_delay` ms, and with `PriceDeviation` if the pool spot price is
    /// more than `max_percent_diff` (over `SECOND_BASE`) away from the feeds.
    pub fn lp_price(&self, max_percent_diff: u64, allowed_delay: u64) -> U256 {
        let pair = match self.pair.get() {
            Some(pair) => pair,
            None => self.env().revert(OracleError::InvalidArgument),
        };
        let lp = LpPairContractRef::new(self.env().clone(), pair);

        let reserves = lp.get_reserves();
        let total_supply = lp.total_supply();
        let reserve0 =
            math::normalize_decimals(reserves.reserve0, self.token0_decimals.get_or_default());
        let reserve1 =
            math::normalize_decimals(reserves.reserve1, self.token1_decimals.get_or_default());
        if reserve0.is_zero() || reserve1.is_zero() || total_supply.is_zero() {
            self.env().revert(OracleError::InvalidPrice);
        }

        let feeds = self.feeds.get_or_default();
        let price0 = match feeds.first() {
            Some(feed) => self.feed_price(*feed, allowed_delay),
            None => self.env().revert(OracleError::InvalidArgument),
        };
        let price1 = match feeds.get(1) {
            Some(feed) => self.feed_price(*feed, allowed_delay),
            None => math::base(),
        };

        let spot = math::mul_div(reserve1, math::base(), reserve0);
        let fair = math::mul_div(price0, math::base(), price1);
        if fair.is_zero() || math::relative_diff(spot, fair) > U256::from(max_percent_diff) {
            self.env().revert(OracleError::PriceDeviation);
        }

        (reserve0 * price0 + reserve1 * price1) / total_supply
    }

    pub fn pair(&self) -> Option<Address> {
        self.pair.get()
    }

    pub fn feeds(&self) -> Vec<Address> {
        self.feeds.get_or_default()
    }

    fn feed_price(&self, feed: Address, allowed_delay: u64) -> U256 {
        let feed = PriceFeedContractRef::new(self.env().clone(), feed);
        let round = feed.latest_round_data();
        let now = self.env().get_block_time();
        if now.saturating_sub(round.updated_at) > allowed_delay {
            self.env().revert(OracleError::StalePrice);
        }
        let decimals = feed.decimals();
        if round.answer.is_zero() || decimals > BASE_DECIMALS {
            self.env().revert(OracleError::InvalidPrice);
        }
        math::normalize_decimals(round.answer, decimals)
    }
}
