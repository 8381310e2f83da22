//! Yield Wallet Tests
//!
//! Staking locked LP into farms, reward attribution, team share and
//! Kyber-style vesting

mod common;

use odra::casper_types::U256;
use odra::host::HostRef;
use odra::prelude::*;

use common::*;
use lp_vault_casper::farms::FarmKind;
use lp_vault_casper::math::BASE;
use lp_vault_casper::mocks::farms::MockRewardPoolHostRef;
use lp_vault_casper::mocks::token::MockTokenHostRef;
use lp_vault_casper::vault::{VaultError, YieldWalletRef};
use lp_vault_casper::yield_wallet::{
    YieldWalletError, YieldWalletFactoryHostRef, REWARD_VESTING_DURATION_MS,
};

const HALF_VESTING_MS: u64 = REWARD_VESTING_DURATION_MS / 2;

/// `tenths` / 10 whole units
fn tenths(tenths: u64) -> U256 {
    U256::from(tenths) * U256::from(BASE) / U256::from(10u64)
}

struct Farmed {
    sys: System,
    reward: MockTokenHostRef,
    farm: MockRewardPoolHostRef,
    factory: YieldWalletFactoryHostRef,
}

/// User has 1 LP locked and half of it staked in a reward-per-share farm.
fn setup_reward_pool() -> Farmed {
    let mut sys = deploy_system();
    let reward = sys.deploy_reward_token();
    let farm = deploy_reward_pool(&sys, &reward);
    let mut factory = sys.deploy_yield_factory(FarmKind::RewardPerShare);
    sys.env.set_caller(sys.owner);
    factory.set_pool(sys.pair.address(), farm.address(), 0, reward.address());

    let user = sys.user;
    sys.lock(user, units(1));
    sys.env.set_caller(user);
    sys.vault
        .stake_lp(factory.address(), percent_of_unit(50), false);

    Farmed {
        sys,
        reward,
        farm,
        factory,
    }
}

impl Farmed {
    fn fund_farm(&mut self, amount: U256) {
        self.sys.env.set_caller(self.sys.owner);
        self.reward.faucet_mint(self.farm.address(), amount);
        self.farm.notify_reward(amount);
    }
}

// ==========================================
// Stake / Unstake
// ==========================================

#[test]
fn test_stake_lp_moves_collateral_into_farm() {
    let f = setup_reward_pool();
    let sys = &f.sys;
    let user = sys.user;

    assert_eq!(sys.vault.yield_wallet_deposit_of(user), percent_of_unit(50));
    assert_eq!(sys.vault.collateral_of(user), units(1));
    assert_eq!(sys.vault.debt_of(user), units(1600));
    assert_eq!(sys.pair.balance_of(sys.vault.address()), percent_of_unit(50));
    assert_eq!(f.farm.staked_of(f.factory.address()), percent_of_unit(50));
    assert_eq!(
        sys.vault.yield_wallet_of(user),
        Some(YieldWalletRef {
            factory: f.factory.address(),
            wallet_id: 0
        })
    );

    let wallet = f.factory.get_wallet(0);
    assert_eq!(wallet.user, user);
    assert_eq!(wallet.vault, sys.vault.address());
    assert_eq!(wallet.staked_amount, percent_of_unit(50));
    assert!(wallet.active);
    assert_eq!(f.factory.wallet_of(user, sys.vault.address()), Some(0));
    assert!(sys.env.emitted(&sys.vault, "Staked"));
    assert!(sys.env.emitted(&f.factory, "YieldWalletCreated"));
}

#[test]
fn test_unstake_lp_returns_lp_to_vault() {
    let mut f = setup_reward_pool();
    let user = f.sys.user;

    f.sys.env.set_caller(user);
    f.sys.vault.unstake_lp(percent_of_unit(50));

    assert_eq!(f.sys.vault.yield_wallet_deposit_of(user), U256::zero());
    assert_eq!(f.sys.pair.balance_of(f.sys.vault.address()), units(1));
    assert_eq!(f.farm.staked_of(f.factory.address()), U256::zero());
    assert!(f.sys.env.emitted(&f.sys.vault, "Unstaked"));

    let result = f.sys.vault.try_unstake_lp(U256::one());
    assert_eq!(result, Err(VaultError::InsufficientStake.into()));
}

#[test]
fn test_stake_beyond_free_collateral_reverts() {
    let mut f = setup_reward_pool();
    let factory = f.factory.address();
    f.sys.env.set_caller(f.sys.user);

    let result = f.sys.vault.try_stake_lp(factory, percent_of_unit(60), false);
    assert_eq!(result, Err(VaultError::InsufficientCollateral.into()));
    let result = f.sys.vault.try_stake_lp(factory, U256::zero(), false);
    assert_eq!(result, Err(VaultError::ZeroAmount.into()));
}

#[test]
fn test_stake_into_disabled_factory_reverts() {
    let mut f = setup_reward_pool();
    let factory = f.factory.address();
    f.sys.env.set_caller(f.sys.owner);
    f.sys.vault.disable_yield_wallet_factory(factory);

    f.sys.env.set_caller(f.sys.user);
    let result = f.sys.vault.try_stake_lp(factory, percent_of_unit(10), false);
    assert_eq!(result, Err(VaultError::FactoryNotEnabled.into()));

    // Existing stake can still come back
    f.sys.vault.unstake_lp(percent_of_unit(50));
    assert_eq!(f.sys.vault.yield_wallet_deposit_of(f.sys.user), U256::zero());
}

#[test]
fn test_new_wallet_requires_full_unstake() {
    let mut f = setup_reward_pool();
    let factory = f.factory.address();
    let user = f.sys.user;
    f.sys.env.set_caller(user);

    let result = f.sys.vault.try_stake_lp(factory, percent_of_unit(10), true);
    assert_eq!(result, Err(VaultError::UnstakeRequired.into()));

    f.sys.vault.unstake_lp(percent_of_unit(50));
    f.sys.vault.stake_lp(factory, percent_of_unit(10), true);

    assert_eq!(f.factory.wallet_count(), 2);
    assert!(!f.factory.get_wallet(0).active);
    assert_eq!(f.factory.get_wallet(1).staked_amount, percent_of_unit(10));
    assert_eq!(f.factory.wallet_of(user, f.sys.vault.address()), Some(1));
    assert_eq!(f.sys.vault.yield_wallet_of(user).map(|w| w.wallet_id), Some(1));
}

#[test]
fn test_wallet_custody_is_vault_only() {
    let mut f = setup_reward_pool();
    let user = f.sys.user;
    f.sys.env.set_caller(user);

    assert_eq!(
        f.factory.try_withdraw(0, percent_of_unit(50)),
        Err(YieldWalletError::NotAuthorized.into())
    );
    assert_eq!(
        f.factory.try_deposit(0, U256::one()),
        Err(YieldWalletError::NotAuthorized.into())
    );

    f.sys.env.set_caller(f.sys.funder);
    assert_eq!(
        f.factory.try_harvest(0),
        Err(YieldWalletError::NotAuthorized.into())
    );
}

#[test]
fn test_set_pool_is_owner_only() {
    let mut f = setup_reward_pool();
    let (pair, farm, reward) = (f.sys.pair.address(), f.farm.address(), f.reward.address());
    f.sys.env.set_caller(f.sys.user);
    assert_eq!(
        f.factory.try_set_pool(pair, farm, 0, reward),
        Err(YieldWalletError::NotAuthorized.into())
    );
}

#[test]
fn test_switching_factory_requires_unstake() {
    let mut f = setup_reward_pool();
    let other = f.sys.env.get_account(7);
    f.sys.env.set_caller(f.sys.owner);
    f.sys.vault.enable_yield_wallet_factory(other);
    f.sys.advance_past_timelock();
    f.sys.env.set_caller(f.sys.owner);
    f.sys.vault.execute_enable_yield_wallet_factory(other);

    f.sys.env.set_caller(f.sys.user);
    let result = f.sys.vault.try_stake_lp(other, percent_of_unit(10), false);
    assert_eq!(result, Err(VaultError::UnstakeRequired.into()));
}

#[test]
fn test_stake_through_factory_without_pool_reverts() {
    let mut sys = deploy_system();
    let unconfigured = sys.deploy_yield_factory(FarmKind::MasterChef);
    let user = sys.user;
    sys.lock(user, units(1));

    sys.env.set_caller(user);
    let result = sys
        .vault
        .try_stake_lp(unconfigured.address(), percent_of_unit(10), false);
    assert_eq!(result, Err(YieldWalletError::PoolNotSupported.into()));
    assert_eq!(sys.vault.yield_wallet_deposit_of(user), U256::zero());
}

// ==========================================
// Collateral Interplay
// ==========================================

#[test]
fn test_unlock_unstakes_shortfall() {
    let mut f = setup_reward_pool();
    let user = f.sys.user;

    // Repay 75% of the debt: 0.75 LP released, only 0.5 held by the vault
    f.sys.env.set_caller(user);
    f.sys.vault.unlock(units(1200), U256::zero());

    assert_eq!(f.sys.pair.balance_of(user), percent_of_unit(75));
    assert_eq!(f.sys.vault.collateral_of(user), percent_of_unit(25));
    assert_eq!(f.sys.vault.yield_wallet_deposit_of(user), percent_of_unit(25));
    assert_eq!(f.farm.staked_of(f.factory.address()), percent_of_unit(25));
    assert_eq!(f.factory.get_wallet(0).staked_amount, percent_of_unit(25));
    assert_eq!(f.sys.pair.balance_of(f.sys.vault.address()), U256::zero());
}

#[test]
fn test_emergency_unlock_unstakes_everything() {
    let mut f = setup_reward_pool();
    let user = f.sys.user;
    f.sys.fund_user();

    f.sys.env.set_caller(user);
    f.sys.vault.emergency_unlock();

    assert_eq!(f.sys.pair.balance_of(user), units(1));
    assert_eq!(f.sys.vault.yield_wallet_deposit_of(user), U256::zero());
    assert_eq!(f.farm.staked_of(f.factory.address()), U256::zero());
    assert_eq!(f.factory.get_wallet(0).staked_amount, U256::zero());
}

// ==========================================
// Rewards
// ==========================================

#[test]
fn test_harvest_pays_user_minus_team_share() {
    let mut f = setup_reward_pool();
    let user = f.sys.user;
    f.fund_farm(units(100));

    f.sys.env.set_caller(user);
    f.factory.harvest(0);

    assert_eq!(f.reward.balance_of(user), units(90));
    assert_eq!(f.reward.balance_of(f.sys.team), units(10));
    let info = f.factory.get_wallet_info(0);
    assert_eq!(info.pending_reward, U256::zero());
    assert_eq!(info.unclaimed, U256::zero());
    assert!(f.sys.env.emitted(&f.factory, "RewardWithdrawn"));
}

#[test]
fn test_harvest_collects_rewards_sent_to_factory() {
    let mut f = setup_reward_pool();
    let user = f.sys.user;
    let factory = f.factory.address();
    f.sys.env.set_caller(f.sys.owner);
    f.reward.faucet_mint(factory, units(100));

    f.sys.env.set_caller(user);
    f.factory.harvest(0);

    assert_eq!(f.reward.balance_of(user), units(90));
    assert_eq!(f.reward.balance_of(f.sys.team), units(10));
    assert_eq!(f.reward.balance_of(factory), U256::zero());
    assert_eq!(f.factory.accounted_reward_of(f.reward.address()), U256::zero());
}

#[test]
fn test_direct_rewards_add_to_settled_ones() {
    let mut f = setup_reward_pool();
    let user = f.sys.user;
    let factory = f.factory.address();
    f.fund_farm(units(100));

    // Farm payout is settled into `unclaimed` and stays in the factory
    f.sys.env.set_caller(user);
    f.sys.vault.stake_lp(factory, percent_of_unit(25), false);
    assert_eq!(f.factory.accounted_reward_of(f.reward.address()), units(100));

    f.sys.env.set_caller(f.sys.owner);
    f.reward.faucet_mint(factory, units(50));

    f.sys.env.set_caller(user);
    f.factory.claim(0, f.reward.address(), user);
    assert_eq!(f.reward.balance_of(user), units(135));
    assert_eq!(f.reward.balance_of(f.sys.team), units(15));
    assert_eq!(
        f.factory.try_claim(0, f.reward.address(), user),
        Err(YieldWalletError::NothingToClaim.into())
    );
}

#[test]
fn test_rewards_split_by_stake() {
    let mut f = setup_reward_pool();
    let (user, funder) = (f.sys.user, f.sys.funder);
    let factory = f.factory.address();
    f.sys.lock(funder, units(1));
    f.sys.env.set_caller(funder);
    f.sys.vault.stake_lp(factory, percent_of_unit(25), false);

    f.fund_farm(units(75));

    f.sys.env.set_caller(user);
    f.factory.harvest(0);
    f.sys.env.set_caller(funder);
    f.factory.harvest(1);

    assert_eq!(f.reward.balance_of(user), units(45));
    assert_eq!(f.reward.balance_of(funder), tenths(225));
    assert_eq!(f.reward.balance_of(f.sys.team), tenths(75));
}

#[test]
fn test_pending_reward_settles_on_stake_change() {
    let mut f = setup_reward_pool();
    let user = f.sys.user;
    let factory = f.factory.address();
    f.fund_farm(units(100));

    f.sys.env.set_caller(user);
    f.sys.vault.stake_lp(factory, percent_of_unit(25), false);

    let info = f.factory.get_wallet_info(0);
    assert_eq!(info.staked_amount, percent_of_unit(75));
    assert_eq!(info.unclaimed, units(100));
    assert_eq!(info.pending_reward, U256::zero());
    assert_eq!(info.kind, FarmKind::RewardPerShare);
}

#[test]
fn test_master_chef_claim() {
    let mut sys = deploy_system();
    let mut reward = sys.deploy_reward_token();
    let mut chef = deploy_master_chef(&sys, &reward);
    let mut factory = sys.deploy_yield_factory(FarmKind::MasterChef);
    sys.env.set_caller(sys.owner);
    factory.set_pool(sys.pair.address(), chef.address(), 0, reward.address());

    let user = sys.user;
    sys.lock(user, units(1));
    sys.env.set_caller(user);
    sys.vault.stake_lp(factory.address(), percent_of_unit(50), false);
    assert_eq!(chef.staked_of(0, factory.address()), percent_of_unit(50));

    reward.faucet_mint(chef.address(), units(100));
    chef.notify_reward(0, units(100));

    // Adding stake harvests and settles into `unclaimed`
    sys.env.set_caller(user);
    sys.vault.stake_lp(factory.address(), percent_of_unit(25), false);
    assert_eq!(factory.get_wallet_info(0).unclaimed, units(100));

    let wrong_token = sys.stable.address();
    assert_eq!(
        factory.try_claim(0, wrong_token, user),
        Err(YieldWalletError::InvalidToken.into())
    );
    factory.claim(0, reward.address(), user);
    assert_eq!(reward.balance_of(user), units(90));
    assert_eq!(reward.balance_of(sys.team), units(10));

    assert_eq!(
        factory.try_claim(0, reward.address(), user),
        Err(YieldWalletError::NothingToClaim.into())
    );
}

#[test]
fn test_staking_rewards_get_reward() {
    let mut sys = deploy_system();
    let mut reward = sys.deploy_reward_token();
    let mut staking_rewards = deploy_staking_rewards(&sys, &reward);
    let mut factory = sys.deploy_yield_factory(FarmKind::StakingRewards);
    sys.env.set_caller(sys.owner);
    factory.set_pool(sys.pair.address(), staking_rewards.address(), 0, reward.address());

    let user = sys.user;
    sys.lock(user, units(1));
    sys.env.set_caller(user);
    sys.vault.stake_lp(factory.address(), percent_of_unit(50), false);
    assert_eq!(
        staking_rewards.balance_of(factory.address()),
        percent_of_unit(50)
    );

    reward.faucet_mint(staking_rewards.address(), units(100));
    staking_rewards.notify_reward(units(100));

    sys.env.set_caller(user);
    factory.get_reward(0);
    assert_eq!(reward.balance_of(user), units(90));
    assert_eq!(reward.balance_of(sys.team), units(10));

    sys.vault.unstake_lp(percent_of_unit(50));
    assert_eq!(staking_rewards.balance_of(factory.address()), U256::zero());
}

#[test]
fn test_vesting_entry_points_require_kyber_wallets() {
    let f = setup_reward_pool();
    let reward = f.reward.address();
    assert_eq!(
        f.factory.try_num_vesting_schedules(0, reward),
        Err(YieldWalletError::NotSupported.into())
    );
}

// ==========================================
// Kyber FairLaunch Vesting
// ==========================================

#[test]
fn test_kyber_rewards_vest_linearly() {
    let mut sys = deploy_system();
    let mut reward = sys.deploy_reward_token();
    let mut fair_launch = deploy_fair_launch(&sys, &reward);
    let mut factory = sys.deploy_yield_factory(FarmKind::KyberFairLaunch);
    sys.env.set_caller(sys.owner);
    factory.set_pool(sys.pair.address(), fair_launch.address(), 0, reward.address());

    let user = sys.user;
    sys.lock(user, units(1));
    sys.env.set_caller(user);
    sys.vault.stake_lp(factory.address(), percent_of_unit(50), false);

    reward.faucet_mint(fair_launch.address(), units(100));
    fair_launch.notify_reward(0, units(100));

    // Harvest schedules instead of paying
    sys.env.set_caller(user);
    factory.harvest(0);
    let token = reward.address();
    assert_eq!(reward.balance_of(user), U256::zero());
    assert_eq!(factory.num_vesting_schedules(0, token), 1);
    let schedule = factory.get_vesting_schedule_at_index(0, token, 0);
    assert_eq!(schedule.quantity, units(100));
    assert_eq!(schedule.end_time - schedule.start_time, REWARD_VESTING_DURATION_MS);
    assert!(sys.env.emitted(&factory, "VestingScheduleAdded"));

    assert_eq!(
        factory.try_vest_completed_schedules(0, token),
        Err(YieldWalletError::NoVestingAmount.into())
    );

    sys.env.advance_block_time(HALF_VESTING_MS);
    factory.vest_schedule_at_indices(0, token, vec![0]);
    assert_eq!(reward.balance_of(user), units(45));
    assert_eq!(reward.balance_of(sys.team), units(5));
    assert_eq!(
        factory.get_vesting_schedule_at_index(0, token, 0).vested_quantity,
        units(50)
    );

    sys.env.advance_block_time(HALF_VESTING_MS);
    factory.vest_completed_schedules(0, token);
    assert_eq!(reward.balance_of(user), units(90));
    assert_eq!(reward.balance_of(sys.team), units(10));

    assert_eq!(
        factory.try_vest_schedules_in_range(0, token, 0, 0),
        Err(YieldWalletError::NoVestingAmount.into())
    );
    assert_eq!(
        factory.try_vest_schedules_in_range(0, token, 0, 1),
        Err(YieldWalletError::InvalidIndex.into())
    );
    assert_eq!(
        factory.try_get_vesting_schedule_at_index(0, token, 3),
        Err(YieldWalletError::InvalidIndex.into())
    );

    sys.env.set_caller(sys.funder);
    assert_eq!(
        factory.try_vest_schedule_at_indices(0, token, vec![0]),
        Err(YieldWalletError::NotAuthorized.into())
    );
}

#[test]
fn test_kyber_stake_changes_append_schedules() {
    let mut sys = deploy_system();
    let mut reward = sys.deploy_reward_token();
    let mut fair_launch = deploy_fair_launch(&sys, &reward);
    let mut factory = sys.deploy_yield_factory(FarmKind::KyberFairLaunch);
    sys.env.set_caller(sys.owner);
    factory.set_pool(sys.pair.address(), fair_launch.address(), 0, reward.address());

    let user = sys.user;
    sys.lock(user, units(1));
    sys.env.set_caller(user);
    sys.vault.stake_lp(factory.address(), percent_of_unit(50), false);

    for _ in 0..2 {
        reward.faucet_mint(fair_launch.address(), units(10));
        fair_launch.notify_reward(0, units(10));
        sys.env.set_caller(user);
        sys.vault.unstake_lp(percent_of_unit(10));
    }

    let token = reward.address();
    let schedules = factory.get_vesting_schedules(0, token);
    assert_eq!(schedules.len(), 2);
    assert!(schedules.iter().all(|s| s.quantity == units(10)));
    assert_eq!(factory.get_wallet_info(0).unclaimed, U256::zero());

    sys.env.advance_block_time(REWARD_VESTING_DURATION_MS);
    factory.vest_schedules_in_range(0, token, 0, 1);
    assert_eq!(reward.balance_of(user), units(18));
}
