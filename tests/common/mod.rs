//! Shared fixtures: the full protocol deployed against mock AMM, feed and farm
//! contracts.
//!
//! The test VM derives contract addresses from a deploy counter that only
//! stays unique for the first nine contracts of an env, so the fixture keeps
//! its own deployments to six and the pair legs are plain accounts.
//!
//! Default market: 1 LP = $3200
//! - pair reserves: 1 token0 / 3200 token1, LP supply 2
//! - one feed: token0 = $3200 (8 decimals), token1 treated as $1
//! - LTV 50%, CR 150%, protocol fee 0.5%, stake fee 0.5%

#![allow(dead_code)]

use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
use odra::prelude::*;

use lp_vault_casper::farms::FarmKind;
use lp_vault_casper::math::BASE;
use lp_vault_casper::mocks::farms::{
    MockFairLaunch, MockFairLaunchHostRef, MockFairLaunchInitArgs, MockMasterChef,
    MockMasterChefHostRef, MockMasterChefInitArgs, MockRewardPool, MockRewardPoolHostRef,
    MockRewardPoolInitArgs, MockStakingRewards, MockStakingRewardsHostRef,
    MockStakingRewardsInitArgs,
};
use lp_vault_casper::mocks::pair::{MockPair, MockPairHostRef, MockPairInitArgs};
use lp_vault_casper::mocks::price_feed::{MockPriceFeed, MockPriceFeedHostRef, MockPriceFeedInitArgs};
use lp_vault_casper::mocks::token::{MockToken, MockTokenHostRef, MockTokenInitArgs};
use lp_vault_casper::oracle::{PriceOracle, PriceOracleHostRef, PriceOracleInitArgs};
use lp_vault_casper::timelock::GOVERNANCE_DELAY_MS;
use lp_vault_casper::tokens::{StableToken, StableTokenHostRef, StableTokenInitArgs};
use lp_vault_casper::vault::{Vault, VaultHostRef, VaultInitArgs};
use lp_vault_casper::vault_factory::{VaultFactory, VaultFactoryHostRef};
use lp_vault_casper::yield_wallet::{
    YieldWalletFactory, YieldWalletFactoryHostRef, YieldWalletFactoryInitArgs,
};

pub const LTV: u64 = 50_000_000;
pub const CR: u64 = 150_000_000;
pub const PROTOCOL_FEE: u64 = 500_000;
pub const STAKE_FEE: u64 = 500_000;
pub const SAFU_SHARE: u64 = 50_000_000;
pub const MAX_PERCENT_DIFF: u64 = 5_000_000;
pub const ALLOWED_DELAY_MS: u64 = 24 * 60 * 60 * 1000;
/// Team cut of farm rewards (10%)
pub const TEAM_SHARE: u64 = 10_000_000;

pub const FEED_DECIMALS: u8 = 8;
pub const LP_PRICE_USD: u64 = 3200;

/// `n` whole units at 18 decimals
pub fn units(n: u64) -> U256 {
    U256::from(n) * U256::from(BASE)
}

/// `percent`% of one 18-decimal unit
pub fn percent_of_unit(percent: u64) -> U256 {
    U256::from(BASE) * U256::from(percent) / U256::from(100u64)
}

pub fn feed_answer(price_usd: u64) -> U256 {
    U256::from(price_usd) * U256::from(100_000_000u64)
}

pub struct System {
    pub env: HostEnv,
    pub owner: Address,
    pub user: Address,
    pub funder: Address,
    pub staking: Address,
    pub safu: Address,
    pub team: Address,
    pub token0: Address,
    pub token1: Address,
    pub pair: MockPairHostRef,
    pub feed: MockPriceFeedHostRef,
    pub oracle: PriceOracleHostRef,
    pub registry: VaultFactoryHostRef,
    pub stable: StableTokenHostRef,
    pub vault: VaultHostRef,
}

impl System {
    /// Move the market to `price_usd` per LP: feed answer and pool reserves
    /// are updated together so the spot check passes.
    pub fn set_lp_price(&mut self, price_usd: u64) {
        self.env.set_caller(self.owner);
        self.feed.set_price(feed_answer(price_usd));
        self.pair.set_reserves(units(1), units(price_usd));
    }

    /// Re-stamp the feed at the current block time.
    pub fn refresh_feed(&mut self) {
        self.env.set_caller(self.owner);
        let answer = self.feed.latest_round_data().answer;
        self.feed.set_price(answer);
    }

    pub fn lock(&mut self, who: Address, lp_amount: U256) {
        self.lock_to(who, lp_amount, who);
    }

    pub fn lock_to(&mut self, who: Address, lp_amount: U256, mint_to: Address) {
        self.env.set_caller(who);
        self.pair.approve(self.vault.address(), lp_amount);
        self.vault.lock(lp_amount, mint_to, U256::zero());
    }

    /// `funder` locks its LP and sends the stable tokens to `user`.
    pub fn fund_user(&mut self) {
        let (funder, user) = (self.funder, self.user);
        self.lock_to(funder, units(1), user);
    }

    pub fn advance_past_timelock(&mut self) {
        self.env.advance_block_time(GOVERNANCE_DELAY_MS);
        self.refresh_feed();
    }

    pub fn deploy_reward_token(&self) -> MockTokenHostRef {
        self.env.set_caller(self.owner);
        MockToken::deploy(
            &self.env,
            MockTokenInitArgs {
                name: "Farm Reward".to_string(),
                symbol: "RWD".to_string(),
                decimals: 18,
            },
        )
    }

    /// Deploy a yield wallet factory of `kind` and enable it on the vault.
    pub fn deploy_yield_factory(&mut self, kind: FarmKind) -> YieldWalletFactoryHostRef {
        self.env.set_caller(self.owner);
        let factory = YieldWalletFactory::deploy(
            &self.env,
            YieldWalletFactoryInitArgs {
                kind,
                team_fee_address: self.team,
                team_share: TEAM_SHARE,
            },
        );
        self.vault.enable_yield_wallet_factory(factory.address());
        self.advance_past_timelock();
        self.env.set_caller(self.owner);
        self.vault.execute_enable_yield_wallet_factory(factory.address());
        factory
    }
}

/// Deploy the full protocol. The vault is already an enabled minter, the
/// feed is fresh and `user` / `funder` each hold 1 LP.
pub fn deploy_system() -> System {
    deploy_system_with(Some(4))
}

/// `staking_account`: account index of the stake-fee recipient, if any.
pub fn deploy_system_with(staking_account: Option<usize>) -> System {
    let env = odra_test::env();
    let owner = env.get_account(0);
    let user = env.get_account(1);
    let funder = env.get_account(2);
    let staking = env.get_account(4);
    let safu = env.get_account(5);
    let team = env.get_account(6);
    let token0 = env.get_account(8);
    let token1 = env.get_account(9);

    env.set_caller(owner);
    let mut registry = VaultFactory::deploy(&env, NoArgs);
    let stable = StableToken::deploy(
        &env,
        StableTokenInitArgs {
            symbol: "LPUSD".to_string(),
            name: "LP Vault USD".to_string(),
            vault_factory: registry.address(),
        },
    );
    let mut pair = MockPair::deploy(
        &env,
        MockPairInitArgs {
            token0,
            token1,
        },
    );
    pair.set_reserves(units(1), units(LP_PRICE_USD));
    pair.faucet_mint(user, units(1));
    pair.faucet_mint(funder, units(1));

    let feed = MockPriceFeed::deploy(
        &env,
        MockPriceFeedInitArgs {
            decimals: FEED_DECIMALS,
            answer: feed_answer(LP_PRICE_USD),
        },
    );
    let oracle = PriceOracle::deploy(
        &env,
        PriceOracleInitArgs {
            pair: pair.address(),
            token0_decimals: 18,
            token1_decimals: 18,
            feeds: vec![feed.address()],
        },
    );
    let vault = Vault::deploy(
        &env,
        VaultInitArgs {
            pair: pair.address(),
            stable_token: stable.address(),
            vault_factory: registry.address(),
            oracle: oracle.address(),
            ltv: LTV,
            cr: CR,
            protocol_fee: PROTOCOL_FEE,
            stake_fee: STAKE_FEE,
            safu_share: SAFU_SHARE,
            max_percent_diff: MAX_PERCENT_DIFF,
            allowed_delay: ALLOWED_DELAY_MS,
            staking_address: staking_account.map(|i| env.get_account(i)),
        },
    );

    registry.enable_vault(vault.address());
    env.advance_block_time(GOVERNANCE_DELAY_MS);
    registry.execute_enable_vault(vault.address());

    let mut system = System {
        env,
        owner,
        user,
        funder,
        staking,
        safu,
        team,
        token0,
        token1,
        pair,
        feed,
        oracle,
        registry,
        stable,
        vault,
    };
    system.refresh_feed();
    system
}

/// Reward-per-share farm for the system's pair.
pub fn deploy_reward_pool(system: &System, reward: &MockTokenHostRef) -> MockRewardPoolHostRef {
    system.env.set_caller(system.owner);
    MockRewardPool::deploy(
        &system.env,
        MockRewardPoolInitArgs {
            staking_token: system.pair.address(),
            reward_token: reward.address(),
        },
    )
}

/// MasterChef with the system's pair as pool 0.
pub fn deploy_master_chef(system: &System, reward: &MockTokenHostRef) -> MockMasterChefHostRef {
    system.env.set_caller(system.owner);
    let mut chef = MockMasterChef::deploy(
        &system.env,
        MockMasterChefInitArgs {
            reward_token: reward.address(),
        },
    );
    chef.add_pool(system.pair.address());
    chef
}

/// FairLaunch with the system's pair as pool 0.
pub fn deploy_fair_launch(system: &System, reward: &MockTokenHostRef) -> MockFairLaunchHostRef {
    system.env.set_caller(system.owner);
    let mut fair_launch = MockFairLaunch::deploy(
        &system.env,
        MockFairLaunchInitArgs {
            reward_token: reward.address(),
        },
    );
    fair_launch.add_pool(system.pair.address());
    fair_launch
}

pub fn deploy_staking_rewards(
    system: &System,
    reward: &MockTokenHostRef,
) -> MockStakingRewardsHostRef {
    system.env.set_caller(system.owner);
    MockStakingRewards::deploy(
        &system.env,
        MockStakingRewardsInitArgs {
            staking_token: system.pair.address(),
            reward_token: reward.address(),
        },
    )
}
