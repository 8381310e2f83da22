//! Third-party farm protocols a yield wallet can stake into.
//!
//! The set of supported protocols is closed, so dispatch is a `match` on
//! `FarmKind` rather than a trait object. Each arm talks to the farm through
//! its own external interface below.

use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;

/// Farm protocol a `YieldWalletFactory` forwards to.
#[odra::odra_type]
#[derive(Default)]
pub enum FarmKind {
    /// Single-pool reward-per-share farm: `deposit`/`withdraw`/`harvest`.
    #[default]
    RewardPerShare = 0,
    /// MasterChef pools addressed by pid; a zero deposit harvests.
    MasterChef = 1,
    /// Kyber FairLaunch; harvested rewards are vested by the wallet.
    KyberFairLaunch = 2,
    /// Synthetix StakingRewards: `stake`/`withdraw`/`get_reward`.
    StakingRewards = 3,
}

impl FarmKind {
    pub fn vests_rewards(&self) -> bool {
        matches!(self, FarmKind::KyberFairLaunch)
    }
}

/// Where a pair's LP is farmed.
#[odra::odra_type]
pub struct FarmPool {
    pub farm: Address,
    pub pool_id: u32,
    pub reward_token: Address,
}

#[odra::external_contract]
pub trait RewardPool {
    fn deposit(&mut self, amount: U256);
    fn withdraw(&mut self, amount: U256);
    fn harvest(&mut self);
}

#[odra::external_contract]
pub trait MasterChef {
    fn deposit(&mut self, pid: u32, amount: U256);
    fn withdraw(&mut self, pid: u32, amount: U256);
}

#[odra::external_contract]
pub trait FairLaunch {
    fn deposit(&mut self, pid: u32, amount: U256, should_harvest: bool);
    fn withdraw(&mut self, pid: u32, amount: U256);
    fn harvest(&mut self, pid: u32);
}

#[odra::external_contract]
pub trait StakingRewards {
    fn stake(&mut self, amount: U256);
    fn withdraw(&mut self, amount: U256);
    fn get_reward(&mut self);
}

/// Stake `amount` of LP (already approved to the farm) into `pool`.
pub fn deposit(env: Rc<ContractEnv>, kind: &FarmKind, pool: &FarmPool, amount: U256) {
    match kind {
        FarmKind::RewardPerShare => RewardPoolContractRef::new(env, pool.farm).deposit(amount),
        FarmKind::MasterChef => {
            MasterChefContractRef::new(env, pool.farm).deposit(pool.pool_id, amount)
        }
        FarmKind::KyberFairLaunch => {
            FairLaunchContractRef::new(env, pool.farm).deposit(pool.pool_id, amount, false)
        }
        FarmKind::StakingRewards => StakingRewardsContractRef::new(env, pool.farm).stake(amount),
    }
}

/// Unstake `amount` of LP from `pool` back to the caller.
pub fn withdraw(env: Rc<ContractEnv>, kind: &FarmKind, pool: &FarmPool, amount: U256) {
    match kind {
        FarmKind::RewardPerShare => RewardPoolContractRef::new(env, pool.farm).withdraw(amount),
        FarmKind::MasterChef => {
            MasterChefContractRef::new(env, pool.farm).withdraw(pool.pool_id, amount)
        }
        FarmKind::KyberFairLaunch => {
            FairLaunchContractRef::new(env, pool.farm).withdraw(pool.pool_id, amount)
        }
        FarmKind::StakingRewards => {
            StakingRewardsContractRef::new(env, pool.farm).withdraw(amount)
        }
    }
}

/// Pull every reward the farm owes the caller for `pool`.
pub fn harvest(env: Rc<ContractEnv>, kind: &FarmKind, pool: &FarmPool) {
    match kind {
        FarmKind::RewardPerShare => RewardPoolContractRef::new(env, pool.farm).harvest(),
        FarmKind::MasterChef => {
            MasterChefContractRef::new(env, pool.farm).deposit(pool.pool_id, U256::zero())
        }
        FarmKind::KyberFairLaunch => FairLaunchContractRef::new(env, pool.farm).harvest(pool.pool_id),
        FarmKind::StakingRewards => StakingRewardsContractRef::new(env, pool.farm).get_reward(),
    }
}
