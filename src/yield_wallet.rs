//! Yield Wallet Factory
//!
//! Lets LP locked in a `Vault` be farmed without leaving the vault's books.
//!
//! The factory owns an arena of `YieldWallet` records, one active record per
//! `(user, vault)`. A wallet is created lazily on the user's first stake and
//! replaced only once fully unstaked. The factory is the depositor the farm
//! sees for all of its wallets; farm rewards it receives are attributed to
//! wallets with a reward-per-share accumulator per pair.
//!
//! Roles:
//! - the wallet's vault moves LP in and out (`deposit`, `withdraw`)
//! - the wallet's user collects rewards (`claim`, `harvest`, `get_reward`, `vest_*`)
//!
//! Every reward payout skims `team_share` to `team_fee_address`.
//!
//! ## Kyber FairLaunch wallets
//! Rewards are not paid out on harvest. Each settlement appends a linear
//! vesting schedule of `REWARD_VESTING_DURATION_MS`; the user releases vested
//! amounts with the `vest_*` entry points.

use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;
use alloc::vec::Vec;

use crate::farms::{self, FarmKind, FarmPool};
use crate::math::{self, SECOND_BASE};
use crate::tokens::Cep18TokenContractRef;

/// Vesting length of one harvested reward amount (30 days, in ms).
pub const REWARD_VESTING_DURATION_MS: u64 = 30 * 24 * 60 * 60 * 1000;

// ==========================================
// Events
// ==========================================

pub mod events {
    use odra::casper_types::U256;
    use odra::prelude::*;

    #[odra::event]
    pub struct PoolSet {
        pub pair: Address,
        pub farm: Address,
        pub pool_id: u32,
        pub reward_token: Address,
    }

    #[odra::event]
    pub struct YieldWalletCreated {
        pub wallet_id: u32,
        pub user: Address,
        pub vault: Address,
        pub pair: Address,
    }

    #[odra::event]
    pub struct Deposited {
        pub wallet_id: u32,
        pub amount: U256,
    }

    #[odra::event]
    pub struct Withdrawn {
        pub wallet_id: u32,
        pub amount: U256,
    }

    #[odra::event]
    pub struct RewardWithdrawn {
        pub wallet_id: u32,
        pub token: Address,
        pub to: Address,
        pub amount: U256,
    }

    #[odra::event]
    pub struct VestingScheduleAdded {
        pub wallet_id: u32,
        pub token: Address,
        pub index: u32,
        pub quantity: U256,
        pub end_time: u64,
    }

    #[odra::event]
    pub struct Vested {
        pub wallet_id: u32,
        pub token: Address,
        pub amount: U256,
    }
}

// ==========================================
// Types
// ==========================================

/// Per-user delegate holding staked collateral on behalf of a vault.
#[odra::odra_type]
pub struct YieldWallet {
    pub id: u32,
    pub kind: FarmKind,
    pub pair: Address,
    pub user: Address,
    pub vault: Address,
    pub farm: Address,
    pub staked_amount: U256,
    /// `staked_amount * acc_reward_per_share / BASE` at the last settlement.
    pub reward_debt: U256,
    /// Accumulator value at the last settlement.
    pub reward_checkpoint: U256,
    /// Settled rewards not yet paid out (never used by vesting wallets).
    pub unclaimed: U256,
    pub active: bool,
}

/// Linear release of one harvested reward amount.
#[odra::odra_type]
pub struct VestingSchedule {
    pub start_time: u64,
    pub end_time: u64,
    pub quantity: U256,
    pub vested_quantity: U256,
}

impl VestingSchedule {
    pub fn new(start_time: u64, quantity: U256) -> Self {
        Self {
            start_time,
            end_time: start_time + REWARD_VESTING_DURATION_MS,
            quantity,
            vested_quantity: U256::zero(),
        }
    }

    /// Amount unlocked at `now`: `quantity * min(now - start, duration) / duration`.
    pub fn vested_amount(&self, now: u64) -> U256 {
        if now <= self.start_time {
            return U256::zero();
        }
        if now >= self.end_time {
            return self.quantity;
        }
        let duration = self.end_time - self.start_time;
        let elapsed = now - self.start_time;
        math::mul_div(self.quantity, U256::from(elapsed), U256::from(duration))
    }

    /// Unlocked but not yet released.
    pub fn releasable(&self, now: u64) -> U256 {
        self.vested_amount(now).saturating_sub(self.vested_quantity)
    }

    pub fn is_completed(&self, now: u64) -> bool {
        self.end_time <= now
    }
}

/// Snapshot returned by `get_wallet_info`.
#[odra::odra_type]
pub struct WalletInfo {
    pub kind: FarmKind,
    pub staked_amount: U256,
    pub reward_debt: U256,
    pub reward_checkpoint: U256,
    /// Attributed to the wallet but not settled yet.
    pub pending_reward: U256,
    pub unclaimed: U256,
}

// ==========================================
// Errors
// ==========================================

#[odra::odra_error]
pub enum YieldWalletError {
    NotAuthorized = 40001,
    InvalidArgument = 40002,
    PoolNotSupported = 40003,
    UnstakeRequired = 40004,
    UnknownWallet = 40005,
    InsufficientStake = 40006,
    InvalidToken = 40007,
    NothingToClaim = 40008,
    NotSupported = 40009,
    InvalidIndex = 40010,
    NoVestingAmount = 40011,
}

// ==========================================
// Contract
// ==========================================

#[odra::module(
    events = [
        events::PoolSet,
        events::YieldWalletCreated,
        events::Deposited,
        events::Withdrawn,
        events::RewardWithdrawn,
        events::VestingScheduleAdded,
        events::Vested
    ],
    errors = YieldWalletError
)]
pub struct YieldWalletFactory {
    owner: Var<Address>,
    kind: Var<FarmKind>,
    team_fee_address: Var<Address>,
    team_share: Var<u64>,

    pools: Mapping<Address, FarmPool>,
    acc_reward_per_share: Mapping<Address, U256>,
    total_staked: Mapping<Address, U256>,
    /// Reward balance per token already attributed to wallets.
    accounted_reward: Mapping<Address, U256>,

    wallets: Mapping<u32, YieldWallet>,
    wallet_count: Var<u32>,
    wallet_of: Mapping<(Address, Address), u32>,

    schedules: Mapping<(u32, Address), Vec<VestingSchedule>>,
}

#[odra::module]
impl YieldWalletFactory {
    pub fn init(&mut self, kind: FarmKind, team_fee_address: Address, team_share: u64) {
        if team_share > SECOND_BASE {
            self.env().revert(YieldWalletError::InvalidArgument);
        }
        self.owner.set(self.env().caller());
        self.kind.set(kind);
        self.team_fee_address.set(team_fee_address);
        self.team_share.set(team_share);
        self.wallet_count.set(0);
    }

    // ==========================================
    // Admin Functions
    // ==========================================

    /// Route LP of `pair` to `pool_id` of `farm`. Approves the farm once.
    pub fn set_pool(&mut self, pair: Address, farm: Address, pool_id: u32, reward_token: Address) {
        self.require_owner();
        if !self.total_staked.get_or_default(&pair).is_zero() {
            self.env().revert(YieldWalletError::InvalidArgument);
        }
        self.pools.set(
            &pair,
            FarmPool {
                farm,
                pool_id,
                reward_token,
            },
        );
        Cep18TokenContractRef::new(self.env().clone(), pair).approve(farm, U256::MAX);
        self.env().emit_event(events::PoolSet {
            pair,
            farm,
            pool_id,
            reward_token,
        });
    }

    pub fn set_team_fee_address(&mut self, team_fee_address: Address) {
        self.require_owner();
        self.team_fee_address.set(team_fee_address);
    }

    pub fn set_team_share(&mut self, team_share: u64) {
        self.require_owner();
        if team_share > SECOND_BASE {
            self.env().revert(YieldWalletError::InvalidArgument);
        }
        self.team_share.set(team_share);
    }

    // ==========================================
    // Vault Functions
    // ==========================================

    /// Open a wallet for `user` in the calling vault; returns its id.
    /// The previous wallet of the pair `(user, vault)` must be fully unstaked.
    pub fn create_yield_wallet(&mut self, user: Address, pair: Address) -> u32 {
        let vault = self.env().caller();
        let pool = self.pool(pair);

        if let Some(current_id) = self.wallet_of.get(&(user, vault)) {
            let mut current = self.wallet(current_id);
            if !current.staked_amount.is_zero() {
                self.env().revert(YieldWalletError::UnstakeRequired);
            }
            current.active = false;
            self.wallets.set(&current_id, current);
        }

        let id = self.wallet_count.get_or_default();
        self.wallet_count.set(id + 1);
        let wallet = YieldWallet {
            id,
            kind: self.kind.get_or_default(),
            pair,
            user,
            vault,
            farm: pool.farm,
            staked_amount: U256::zero(),
            reward_debt: U256::zero(),
            reward_checkpoint: self.acc_reward_per_share.get_or_default(&pair),
            unclaimed: U256::zero(),
            active: true,
        };
        self.wallets.set(&id, wallet);
        self.wallet_of.set(&(user, vault), id);

        self.env().emit_event(events::YieldWalletCreated {
            wallet_id: id,
            user,
            vault,
            pair,
        });
        id
    }

    /// Pull `amount` LP from the wallet's vault and stake it in the farm.
    pub fn deposit(&mut self, wallet_id: u32, amount: U256) {
        let mut wallet = self.wallet(wallet_id);
        self.require_vault(&wallet);
        if amount.is_zero() {
            self.env().revert(YieldWalletError::InvalidArgument);
        }
        let pool = self.pool(wallet.pair);
        let kind = self.kind.get_or_default();
        let self_address = self.env().self_address();

        Cep18TokenContractRef::new(self.env().clone(), wallet.pair)
            .transfer_from(wallet.vault, self_address, amount);

        if !self.total_staked.get_or_default(&wallet.pair).is_zero() {
            farms::harvest(self.env().clone(), &kind, &pool);
        }
        farms::deposit(self.env().clone(), &kind, &pool, amount);
        self.credit_rewards(wallet.pair, &pool);
        self.settle(&mut wallet, &pool);

        wallet.staked_amount += amount;
        let total = self.total_staked.get_or_default(&wallet.pair);
        self.total_staked.set(&wallet.pair, total + amount);
        self.checkpoint(&mut wallet);
        self.wallets.set(&wallet_id, wallet);

        self.env().emit_event(events::Deposited { wallet_id, amount });
    }

    /// Unstake `amount` LP from the farm and return it to the wallet's vault.
    pub fn withdraw(&mut self, wallet_id: u32, amount: U256) {
        let mut wallet = self.wallet(wallet_id);
        self.require_vault(&wallet);
        if amount.is_zero() {
            self.env().revert(YieldWalletError::InvalidArgument);
        }
        if amount > wallet.staked_amount {
            self.env().revert(YieldWalletError::InsufficientStake);
        }
        let pool = self.pool(wallet.pair);
        let kind = self.kind.get_or_default();

        farms::harvest(self.env().clone(), &kind, &pool);
        farms::withdraw(self.env().clone(), &kind, &pool, amount);
        self.credit_rewards(wallet.pair, &pool);
        self.settle(&mut wallet, &pool);

        wallet.staked_amount -= amount;
        let total = self.total_staked.get_or_default(&wallet.pair);
        self.total_staked.set(&wallet.pair, total - amount);
        self.checkpoint(&mut wallet);
        let vault = wallet.vault;
        let pair = wallet.pair;
        self.wallets.set(&wallet_id, wallet);

        Cep18TokenContractRef::new(self.env().clone(), pair).transfer(vault, amount);
        self.env().emit_event(events::Withdrawn { wallet_id, amount });
    }

    // ==========================================
    // User Functions
    // ==========================================

    /// Pay the wallet's settled `token` rewards to `to`, minus the team share.
    pub fn claim(&mut self, wallet_id: u32, token: Address, to: Address) {
        let mut wallet = self.wallet(wallet_id);
        self.require_user(&wallet);
        let pool = self.pool(wallet.pair);
        if token != pool.reward_token {
            self.env().revert(YieldWalletError::InvalidToken);
        }
        self.credit_rewards(wallet.pair, &pool);
        self.settle(&mut wallet, &pool);
        if wallet.unclaimed.is_zero() {
            self.env().revert(YieldWalletError::NothingToClaim);
        }
        self.pay_out(wallet, token, to);
    }

    /// Collect rewards from the farm.
    /// Vesting wallets get a new schedule, others are paid out to the user.
    pub fn harvest(&mut self, wallet_id: u32) {
        let mut wallet = self.wallet(wallet_id);
        self.require_user(&wallet);
        let pool = self.pool(wallet.pair);
        let kind = self.kind.get_or_default();

        if !self.total_staked.get_or_default(&wallet.pair).is_zero() {
            farms::harvest(self.env().clone(), &kind, &pool);
        }
        self.credit_rewards(wallet.pair, &pool);
        self.settle(&mut wallet, &pool);

        if wallet.unclaimed.is_zero() {
            self.wallets.set(&wallet_id, wallet);
            return;
        }
        let user = wallet.user;
        self.pay_out(wallet, pool.reward_token, user);
    }

    /// StakingRewards naming of `harvest`.
    pub fn get_reward(&mut self, wallet_id: u32) {
        self.harvest(wallet_id);
    }

    // ==========================================
    // Vesting (Kyber FairLaunch wallets)
    // ==========================================

    pub fn num_vesting_schedules(&self, wallet_id: u32, token: Address) -> u32 {
        self.require_vesting();
        self.schedules_of(wallet_id, token).len() as u32
    }

    pub fn get_vesting_schedules(&self, wallet_id: u32, token: Address) -> Vec<VestingSchedule> {
        self.require_vesting();
        self.schedules_of(wallet_id, token)
    }

    pub fn get_vesting_schedule_at_index(&self, wallet_id: u32, token: Address, index: u32) -> VestingSchedule {
        self.require_vesting();
        match self.schedules_of(wallet_id, token).get(index as usize) {
            Some(schedule) => schedule.clone(),
            None => self.env().revert(YieldWalletError::InvalidIndex),
        }
    }

    /// Release whatever has vested in the listed schedules.
    pub fn vest_schedule_at_indices(&mut self, wallet_id: u32, token: Address, indices: Vec<u32>) {
        self.require_vesting();
        let wallet = self.wallet(wallet_id);
        self.require_user(&wallet);
        let len = self.schedules_of(wallet_id, token).len() as u32;
        if indices.iter().any(|index| *index >= len) {
            self.env().revert(YieldWalletError::InvalidIndex);
        }
        self.vest(wallet, token, indices);
    }

    /// Release whatever has vested in schedules `start_index..=end_index`.
    pub fn vest_schedules_in_range(&mut self, wallet_id: u32, token: Address, start_index: u32, end_index: u32) {
        self.require_vesting();
        let wallet = self.wallet(wallet_id);
        self.require_user(&wallet);
        let len = self.schedules_of(wallet_id, token).len() as u32;
        if start_index > end_index || end_index >= len {
            self.env().revert(YieldWalletError::InvalidIndex);
        }
        self.vest(wallet, token, (start_index..=end_index).collect());
    }

    /// Release the remainder of every schedule whose end has passed.
    pub fn vest_completed_schedules(&mut self, wallet_id: u32, token: Address) {
        self.require_vesting();
        let wallet = self.wallet(wallet_id);
        self.require_user(&wallet);
        let now = self.env().get_block_time();
        let completed = self
            .schedules_of(wallet_id, token)
            .iter()
            .enumerate()
            .filter(|(_, schedule)| schedule.is_completed(now))
            .map(|(index, _)| index as u32)
            .collect();
        self.vest(wallet, token, completed);
    }

    // ==========================================
    // View Functions
    // ==========================================

    pub fn get_wallet_info(&self, wallet_id: u32) -> WalletInfo {
        let wallet = self.wallet(wallet_id);
        let accrued = self.accrued(wallet.staked_amount, wallet.pair);
        WalletInfo {
            kind: wallet.kind,
            staked_amount: wallet.staked_amount,
            reward_debt: wallet.reward_debt,
            reward_checkpoint: wallet.reward_checkpoint,
            pending_reward: accrued.saturating_sub(wallet.reward_debt),
            unclaimed: wallet.unclaimed,
        }
    }

    pub fn get_wallet(&self, wallet_id: u32) -> YieldWallet {
        self.wallet(wallet_id)
    }

    /// Current wallet of `user` in `vault`.
    pub fn wallet_of(&self, user: Address, vault: Address) -> Option<u32> {
        self.wallet_of.get(&(user, vault))
    }

    pub fn wallet_count(&self) -> u32 {
        self.wallet_count.get_or_default()
    }

    pub fn pool_of(&self, pair: Address) -> Option<FarmPool> {
        self.pools.get(&pair)
    }

    pub fn total_staked_of(&self, pair: Address) -> U256 {
        self.total_staked.get_or_default(&pair)
    }

    pub fn acc_reward_per_share_of(&self, pair: Address) -> U256 {
        self.acc_reward_per_share.get_or_default(&pair)
    }

    /// Reward balance of `token` owed to wallets (unclaimed or still vesting).
    pub fn accounted_reward_of(&self, token: Address) -> U256 {
        self.accounted_reward.get_or_default(&token)
    }

    pub fn kind(&self) -> FarmKind {
        self.kind.get_or_default()
    }

    pub fn team_share(&self) -> u64 {
        self.team_share.get_or_default()
    }

    pub fn team_fee_address(&self) -> Option<Address> {
        self.team_fee_address.get()
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner.get()
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(YieldWalletError::NotAuthorized);
        }
    }

    fn require_vault(&self, wallet: &YieldWallet) {
        if self.env().caller() != wallet.vault {
            self.env().revert(YieldWalletError::NotAuthorized);
        }
    }

    fn require_user(&self, wallet: &YieldWallet) {
        if self.env().caller() != wallet.user {
            self.env().revert(YieldWalletError::NotAuthorized);
        }
    }

    fn require_vesting(&self) {
        if !self.kind.get_or_default().vests_rewards() {
            self.env().revert(YieldWalletError::NotSupported);
        }
    }

    fn wallet(&self, wallet_id: u32) -> YieldWallet {
        match self.wallets.get(&wallet_id) {
            Some(wallet) => wallet,
            None => self.env().revert(YieldWalletError::UnknownWallet),
        }
    }

    fn pool(&self, pair: Address) -> FarmPool {
        match self.pools.get(&pair) {
            Some(pool) => pool,
            None => self.env().revert(YieldWalletError::PoolNotSupported),
        }
    }

    fn schedules_of(&self, wallet_id: u32, token: Address) -> Vec<VestingSchedule> {
        self.schedules.get(&(wallet_id, token)).unwrap_or_default()
    }

    fn reward_balance(&self, pool: &FarmPool) -> U256 {
        Cep18TokenContractRef::new(self.env().clone(), pool.reward_token)
            .balance_of(self.env().self_address())
    }

    /// Spread reward tokens not yet attributed (farm payouts and direct
    /// transfers alike) over everything staked for `pair`.
    fn credit_rewards(&mut self, pair: Address, pool: &FarmPool) {
        let total = self.total_staked.get_or_default(&pair);
        if total.is_zero() {
            return;
        }
        let accounted = self.accounted_reward.get_or_default(&pool.reward_token);
        let gained = self.reward_balance(pool).saturating_sub(accounted);
        if gained.is_zero() {
            return;
        }
        self.accounted_reward.set(&pool.reward_token, accounted + gained);
        let acc = self.acc_reward_per_share.get_or_default(&pair);
        self.acc_reward_per_share
            .set(&pair, acc + math::mul_div(gained, math::base(), total));
    }

    fn accrued(&self, staked: U256, pair: Address) -> U256 {
        let acc = self.acc_reward_per_share.get_or_default(&pair);
        math::mul_div(staked, acc, math::base())
    }

    /// Move rewards attributed since the last checkpoint into the wallet.
    fn settle(&mut self, wallet: &mut YieldWallet, pool: &FarmPool) {
        let pending = self
            .accrued(wallet.staked_amount, wallet.pair)
            .saturating_sub(wallet.reward_debt);
        if !pending.is_zero() {
            if wallet.kind.vests_rewards() {
                self.add_schedule(wallet.id, pool.reward_token, pending);
            } else {
                wallet.unclaimed += pending;
            }
        }
        self.checkpoint(wallet);
    }

    fn checkpoint(&self, wallet: &mut YieldWallet) {
        wallet.reward_checkpoint = self.acc_reward_per_share.get_or_default(&wallet.pair);
        wallet.reward_debt = self.accrued(wallet.staked_amount, wallet.pair);
    }

    fn add_schedule(&mut self, wallet_id: u32, token: Address, quantity: U256) {
        let schedule = VestingSchedule::new(self.env().get_block_time(), quantity);
        let end_time = schedule.end_time;
        let mut schedules = self.schedules_of(wallet_id, token);
        schedules.push(schedule);
        let index = (schedules.len() - 1) as u32;
        self.schedules.set(&(wallet_id, token), schedules);
        self.env().emit_event(events::VestingScheduleAdded {
            wallet_id,
            token,
            index,
            quantity,
            end_time,
        });
    }

    fn vest(&mut self, wallet: YieldWallet, token: Address, indices: Vec<u32>) {
        let now = self.env().get_block_time();
        let mut schedules = self.schedules_of(wallet.id, token);
        let mut total = U256::zero();
        for index in indices {
            if let Some(schedule) = schedules.get_mut(index as usize) {
                let delta = schedule.releasable(now);
                schedule.vested_quantity += delta;
                total += delta;
            }
        }
        if total.is_zero() {
            self.env().revert(YieldWalletError::NoVestingAmount);
        }
        self.schedules.set(&(wallet.id, token), schedules);
        self.env().emit_event(events::Vested {
            wallet_id: wallet.id,
            token,
            amount: total,
        });
        self.transfer_with_fee(wallet.id, token, wallet.user, total);
    }

    fn pay_out(&mut self, mut wallet: YieldWallet, token: Address, to: Address) {
        let amount = wallet.unclaimed;
        wallet.unclaimed = U256::zero();
        let wallet_id = wallet.id;
        self.wallets.set(&wallet_id, wallet);
        self.transfer_with_fee(wallet_id, token, to, amount);
    }

    fn transfer_with_fee(&mut self, wallet_id: u32, token: Address, to: Address, amount: U256) {
        let accounted = self.accounted_reward.get_or_default(&token);
        self.accounted_reward.set(&token, accounted.saturating_sub(amount));
        let fee = math::apply_rate(amount, self.team_share.get_or_default());
        let user_amount = amount - fee;
        let mut reward = Cep18TokenContractRef::new(self.env().clone(), token);

        if !fee.is_zero() {
            let team = match self.team_fee_address.get() {
                Some(team) => team,
                None => self.env().revert(YieldWalletError::InvalidArgument),
            };
            reward.transfer(team, fee);
            self.env().emit_event(events::RewardWithdrawn {
                wallet_id,
                token,
                to: team,
                amount: fee,
            });
        }
        if !user_amount.is_zero() {
            reward.transfer(to, user_amount);
            self.env().emit_event(events::RewardWithdrawn {
                wallet_id,
                token,
                to,
                amount: user_amount,
            });
        }
    }
}
