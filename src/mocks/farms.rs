//! Farm stand-ins, one per supported protocol shape.
//!
//! All four share `FarmLedger`: stakers earn a pro-rata share of every reward
//! amount announced with `notify_reward`. Reward tokens must already sit in the
//! farm's balance (mint them to the farm first).

use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;

use crate::math;
use crate::tokens::Cep18TokenContractRef;

#[odra::odra_error]
pub enum FarmError {
    InsufficientStake = 50001,
    NothingStaked = 50002,
    UnknownPool = 50003,
}

/// Per-pool staking balances with a reward-per-token accumulator.
#[odra::module]
pub struct FarmLedger {
    reward_token: Var<Address>,
    staking_tokens: Mapping<u32, Address>,
    pool_count: Var<u32>,
    total_staked: Mapping<u32, U256>,
    balances: Mapping<(u32, Address), U256>,
    reward_per_token: Mapping<u32, U256>,
    paid_per_token: Mapping<(u32, Address), U256>,
    rewards: Mapping<(u32, Address), U256>,
}

#[odra::module]
impl FarmLedger {
    pub fn init(&mut self, reward_token: Address) {
        self.reward_token.set(reward_token);
        self.pool_count.set(0);
    }

    pub fn add_pool(&mut self, staking_token: Address) -> u32 {
        let pid = self.pool_count.get_or_default();
        self.staking_tokens.set(&pid, staking_token);
        self.pool_count.set(pid + 1);
        pid
    }

    pub fn stake(&mut self, pid: u32, account: Address, amount: U256) {
        let staking_token = self.staking_token(pid);
        self.settle(pid, account);
        if amount.is_zero() {
            return;
        }
        let self_address = self.env().self_address();
        Cep18TokenContractRef::new(self.env().clone(), staking_token)
            .transfer_from(account, self_address, amount);
        let key = (pid, account);
        let balance = self.balances.get_or_default(&key);
        let total = self.total_staked.get_or_default(&pid);
        self.balances.set(&key, balance + amount);
        self.total_staked.set(&pid, total + amount);
    }

    pub fn unstake(&mut self, pid: u32, account: Address, amount: U256) {
        let staking_token = self.staking_token(pid);
        self.settle(pid, account);
        let key = (pid, account);
        let balance = self.balances.get_or_default(&key);
        if amount > balance {
            self.env().revert(FarmError::InsufficientStake);
        }
        let total = self.total_staked.get_or_default(&pid);
        self.balances.set(&key, balance - amount);
        self.total_staked.set(&pid, total - amount);
        if !amount.is_zero() {
            Cep18TokenContractRef::new(self.env().clone(), staking_token).transfer(account, amount);
        }
    }

    /// Pay out everything `account` has earned in `pid`.
    pub fn claim(&mut self, pid: u32, account: Address) -> U256 {
        self.settle(pid, account);
        let key = (pid, account);
        let amount = self.rewards.get_or_default(&key);
        if amount.is_zero() {
            return amount;
        }
        self.rewards.set(&key, U256::zero());
        let reward_token = match self.reward_token.get() {
            Some(token) => token,
            None => self.env().revert(FarmError::UnknownPool),
        };
        Cep18TokenContractRef::new(self.env().clone(), reward_token).transfer(account, amount);
        amount
    }

    pub fn notify_reward(&mut self, pid: u32, amount: U256) {
        let total = self.total_staked.get_or_default(&pid);
        if total.is_zero() {
            self.env().revert(FarmError::NothingStaked);
        }
        let increase = math::mul_div(amount, math::base(), total);
        let reward_per_token = self.reward_per_token.get_or_default(&pid);
        self.reward_per_token.set(&pid, reward_per_token + increase);
    }

    pub fn earned(&self, pid: u32, account: Address) -> U256 {
        let key = (pid, account);
        let balance = self.balances.get_or_default(&key);
        let delta = self.reward_per_token.get_or_default(&pid) - self.paid_per_token.get_or_default(&key);
        self.rewards.get_or_default(&key) + math::mul_div(balance, delta, math::base())
    }

    pub fn staked_of(&self, pid: u32, account: Address) -> U256 {
        self.balances.get_or_default(&(pid, account))
    }

    pub fn reward_token(&self) -> Option<Address> {
        self.reward_token.get()
    }

    fn settle(&mut self, pid: u32, account: Address) {
        let key = (pid, account);
        let earned = self.earned(pid, account);
        let reward_per_token = self.reward_per_token.get_or_default(&pid);
        self.rewards.set(&key, earned);
        self.paid_per_token.set(&key, reward_per_token);
    }

    fn staking_token(&self, pid: u32) -> Address {
        match self.staking_tokens.get(&pid) {
            Some(token) => token,
            None => self.env().revert(FarmError::UnknownPool),
        }
    }
}

/// Single-pool accumulator farm.
#[odra::module(errors = FarmError)]
pub struct MockRewardPool {
    ledger: SubModule<FarmLedger>,
}

#[odra::module]
impl MockRewardPool {
    pub fn init(&mut self, staking_token: Address, reward_token: Address) {
        self.ledger.init(reward_token);
        self.ledger.add_pool(staking_token);
    }

    pub fn deposit(&mut self, amount: U256) {
        let caller = self.env().caller();
        self.ledger.stake(0, caller, amount);
    }

    pub fn withdraw(&mut self, amount: U256) {
        let caller = self.env().caller();
        self.ledger.unstake(0, caller, amount);
    }

    pub fn harvest(&mut self) {
        let caller = self.env().caller();
        self.ledger.claim(0, caller);
    }

    pub fn notify_reward(&mut self, amount: U256) {
        self.ledger.notify_reward(0, amount);
    }

    pub fn pending_reward(&self, account: Address) -> U256 {
        self.ledger.earned(0, account)
    }

    pub fn staked_of(&self, account: Address) -> U256 {
        self.ledger.staked_of(0, account)
    }
}

/// MasterChef: pools by pid, deposits and withdrawals harvest first.
#[odra::module(errors = FarmError)]
pub struct MockMasterChef {
    ledger: SubModule<FarmLedger>,
}

#[odra::module]
impl MockMasterChef {
    pub fn init(&mut self, reward_token: Address) {
        self.ledger.init(reward_token);
    }

    pub fn add_pool(&mut self, staking_token: Address) -> u32 {
        self.ledger.add_pool(staking_token)
    }

    pub fn deposit(&mut self, pid: u32, amount: U256) {
        let caller = self.env().caller();
        self.ledger.claim(pid, caller);
        self.ledger.stake(pid, caller, amount);
    }

    pub fn withdraw(&mut self, pid: u32, amount: U256) {
        let caller = self.env().caller();
        self.ledger.claim(pid, caller);
        self.ledger.unstake(pid, caller, amount);
    }

    pub fn notify_reward(&mut self, pid: u32, amount: U256) {
        self.ledger.notify_reward(pid, amount);
    }

    pub fn pending_reward(&self, pid: u32, account: Address) -> U256 {
        self.ledger.earned(pid, account)
    }

    pub fn staked_of(&self, pid: u32, account: Address) -> U256 {
        self.ledger.staked_of(pid, account)
    }
}

/// Kyber FairLaunch: explicit `harvest(pid)`, optional harvest on deposit.
#[odra::module(errors = FarmError)]
pub struct MockFairLaunch {
    ledger: SubModule<FarmLedger>,
}

#[odra::module]
impl MockFairLaunch {
    pub fn init(&mut self, reward_token: Address) {
        self.ledger.init(reward_token);
    }

    pub fn add_pool(&mut self, staking_token: Address) -> u32 {
        self.ledger.add_pool(staking_token)
    }

    pub fn deposit(&mut self, pid: u32, amount: U256, should_harvest: bool) {
        let caller = self.env().caller();
        if should_harvest {
            self.ledger.claim(pid, caller);
        }
        self.ledger.stake(pid, caller, amount);
    }

    pub fn withdraw(&mut self, pid: u32, amount: U256) {
        let caller = self.env().caller();
        self.ledger.claim(pid, caller);
        self.ledger.unstake(pid, caller, amount);
    }

    pub fn harvest(&mut self, pid: u32) {
        let caller = self.env().caller();
        self.ledger.claim(pid, caller);
    }

    pub fn notify_reward(&mut self, pid: u32, amount: U256) {
        self.ledger.notify_reward(pid, amount);
    }

    pub fn pending_reward(&self, pid: u32, account: Address) -> U256 {
        self.ledger.earned(pid, account)
    }

    pub fn staked_of(&self, pid: u32, account: Address) -> U256 {
        self.ledger.staked_of(pid, account)
    }
}

/// Synthetix-style StakingRewards for a single staking token.
#[odra::module(errors = FarmError)]
pub struct MockStakingRewards {
    ledger: SubModule<FarmLedger>,
}

#[odra::module]
impl MockStakingRewards {
    pub fn init(&mut self, staking_token: Address, reward_token: Address) {
        self.ledger.init(reward_token);
        self.ledger.add_pool(staking_token);
    }

    pub fn stake(&mut self, amount: U256) {
        let caller = self.env().caller();
        self.ledger.stake(0, caller, amount);
    }

    pub fn withdraw(&mut self, amount: U256) {
        let caller = self.env().caller();
        self.ledger.unstake(0, caller, amount);
    }

    pub fn get_reward(&mut self) {
        let caller = self.env().caller();
        self.ledger.claim(0, caller);
    }

    pub fn notify_reward(&mut self, amount: U256) {
        self.ledger.notify_reward(0, amount);
    }

    pub fn earned(&self, account: Address) -> U256 {
        self.ledger.earned(0, account)
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.ledger.staked_of(0, account)
    }
}
