//! LP Vault Contract
//!
//! A collateralized-debt vault for AMM LP tokens on Casper Network.
//! - Users lock LP as collateral and receive the stable token at `ltv` of
//!   its oracle value, minus the protocol and staking fees
//! - Repayment returns collateral under the token-return policy (see `unlock`)
//! - Locked LP can be staked into a farm through a yield wallet without
//!   leaving the vault's books
//! - Risk parameters change through a two-phase timelock
//!
//! ## Units
//! - LP, stable token and USD prices: 18 decimals (`BASE`)
//! - Rates and ratios: over `SECOND_BASE` (1e8)
//!
//! ## Out of Scope
//! There are no liquidations and no interest: debt only changes on lock,
//! unlock and emergency unlock.

use odra::casper_types::account::AccountHash;
use odra::casper_types::bytesrepr::Bytes;
use odra::casper_types::{PublicKey, U256};
use odra::prelude::*;
use odra::ContractRef;

use crate::math::{self, SECOND_BASE};
use crate::oracle::{LpPairContractRef, PriceOracleContractRef};
use crate::timelock::{PendingChange, GOVERNANCE_DELAY_MS};
use crate::tokens::{Cep18TokenContractRef, StableTokenContractRef};
use crate::vault_factory::VaultFactoryContractRef;
use crate::yield_wallet::YieldWalletFactoryContractRef;

// ==========================================
// Events
// ==========================================

pub mod events {
    use super::VaultParam;
    use odra::casper_types::U256;
    use odra::prelude::*;

    #[odra::event]
    pub struct Lock {
        pub user: Address,
        pub lp_amount: U256,
        pub minted_amount: U256,
    }

    #[odra::event]
    pub struct Unlock {
        pub user: Address,
        pub lp_returned: U256,
        pub debt_repaid: U256,
    }

    #[odra::event]
    pub struct EmergencyUnlock {
        pub user: Address,
        pub lp_returned: U256,
        pub debt_repaid: U256,
    }

    #[odra::event]
    pub struct FeeDistributed {
        pub safu_amount: U256,
        pub team_amount: U256,
    }

    #[odra::event]
    pub struct Staked {
        pub user: Address,
        pub factory: Address,
        pub wallet_id: u32,
        pub amount: U256,
    }

    #[odra::event]
    pub struct Unstaked {
        pub user: Address,
        pub factory: Address,
        pub wallet_id: u32,
        pub amount: U256,
    }

    #[odra::event]
    pub struct ParamChangeProposed {
        pub param: VaultParam,
        pub new_value: U256,
        pub eligible_at: u64,
    }

    #[odra::event]
    pub struct ParamChanged {
        pub param: VaultParam,
        pub new_value: U256,
    }

    #[odra::event]
    pub struct FactoryEnableProposed {
        pub factory: Address,
        pub eligible_at: u64,
    }

    #[odra::event]
    pub struct FactoryEnabled {
        pub factory: Address,
    }

    #[odra::event]
    pub struct FactoryDisabled {
        pub factory: Address,
    }

    #[odra::event]
    pub struct OwnershipTransferred {
        pub previous_owner: Address,
        pub new_owner: Address,
    }
}

// ==========================================
// Types
// ==========================================

/// Timelocked vault parameters
#[odra::odra_type]
pub enum VaultParam {
    Ltv = 0,
    Cr = 1,
    ProtocolFee = 2,
    StakeFee = 3,
    SafuShare = 4,
}

/// The yield wallet currently holding a user's staked collateral
#[odra::odra_type]
pub struct YieldWalletRef {
    pub factory: Address,
    pub wallet_id: u32,
}

/// Position info returned by get_position
#[odra::odra_type]
pub struct PositionInfo {
    pub collateral: U256,
    pub debt: U256,
    pub yield_wallet_deposit: U256,
    /// USD value of the collateral at the live oracle price
    pub collateral_value: U256,
    /// Over `SECOND_BASE`; `u64::MAX` without debt
    pub collateral_ratio: u64,
}

/// Current parameter set returned by params
#[odra::odra_type]
pub struct VaultParams {
    pub ltv: u64,
    pub cr: u64,
    pub protocol_fee: u64,
    pub stake_fee: u64,
    pub safu_share: u64,
    pub max_percent_diff: u64,
    pub allowed_delay: u64,
}

// ==========================================
// Errors
// ==========================================

#[odra::odra_error]
pub enum VaultError {
    InvalidArgument = 1,
    ZeroMintTo = 2,
    NotAuthorized = 3,
    FactoryNotEnabled = 4,
    ZeroParameter = 5,
    MinNotMet = 6,
    InsufficientBalance = 7,
    InvalidConfig = 8,
    InsufficientDebt = 9,
    InsufficientCollateral = 10,
    InsufficientStake = 11,
    UnstakeRequired = 12,
    NoPosition = 13,
    NoPendingChange = 14,
    TimelockActive = 15,
    ZeroAmount = 16,
}

// ==========================================
// Contract
// ==========================================

#[odra::module(
    events = [
        events::Lock,
        events::Unlock,
        events::EmergencyUnlock,
        events::FeeDistributed,
        events::Staked,
        events::Unstaked,
        events::ParamChangeProposed,
        events::ParamChanged,
        events::FactoryEnableProposed,
        events::FactoryEnabled,
        events::FactoryDisabled,
        events::OwnershipTransferred
    ],
    errors = VaultError
)]
pub struct Vault {
    // Collaborators
    pair: Var<Address>,
    stable_token: Var<Address>,
    vault_factory: Var<Address>,
    oracle: Var<Address>,

    // Fee recipients
    staking_address: Var<Address>,
    safu_address: Var<Address>,
    team_address: Var<Address>,

    // Parameters (over SECOND_BASE, allowed_delay in ms)
    ltv: Var<u64>,
    cr: Var<u64>,
    protocol_fee: Var<u64>,
    stake_fee: Var<u64>,
    safu_share: Var<u64>,
    max_percent_diff: Var<u64>,
    allowed_delay: Var<u64>,

    // Per-user ledger
    collateral: Mapping<Address, U256>,
    debt: Mapping<Address, U256>,
    yield_wallet_deposit: Mapping<Address, U256>,
    yield_wallet: Mapping<Address, YieldWalletRef>,

    // Totals
    total_collateral: Var<U256>,
    total_debt: Var<U256>,

    // Governance
    owner: Var<Address>,
    pending_params: Mapping<VaultParam, Option<PendingChange>>,
    pending_factories: Mapping<Address, u64>, // eligible_at, 0 = none
    enabled_factories: Mapping<Address, bool>,
}

#[odra::module]
impl Vault {
    // ==========================================
    // Initialization
    // ==========================================

    #[allow(clippy::too_many_arguments)]
    pub fn init(
        &mut self,
        pair: Address,
        stable_token: Address,
        vault_factory: Address,
        oracle: Address,
        ltv: u64,
        cr: u64,
        protocol_fee: u64,
        stake_fee: u64,
        safu_share: u64,
        max_percent_diff: u64,
        allowed_delay: u64,
        staking_address: Option<Address>,
    ) {
        self.validate_param(&VaultParam::Ltv, ltv);
        self.validate_param(&VaultParam::Cr, cr);
        self.validate_param(&VaultParam::SafuShare, safu_share);
        if protocol_fee as u128 + stake_fee as u128 > SECOND_BASE as u128 {
            self.env().revert(VaultError::InvalidArgument);
        }

        self.pair.set(pair);
        self.stable_token.set(stable_token);
        self.vault_factory.set(vault_factory);
        self.oracle.set(oracle);

        if let Some(staking_address) = staking_address {
            self.staking_address.set(staking_address);
        }

        self.ltv.set(ltv);
        self.cr.set(cr);
        self.protocol_fee.set(protocol_fee);
        self.stake_fee.set(stake_fee);
        self.safu_share.set(safu_share);
        self.max_percent_diff.set(max_percent_diff);
        self.allowed_delay.set(allowed_delay);

        self.total_collateral.set(U256::zero());
        self.total_debt.set(U256::zero());
        self.owner.set(self.env().caller());
    }

    // ==========================================
    // User Functions
    // ==========================================

    /// Lock `lp_amount` LP (approved to the vault) and mint stable tokens to
    /// `mint_to`. Reverts with `MinNotMet` if the user leg is below
    /// `min_mint_amount`.
    #[odra(non_reentrant)]
    pub fn lock(&mut self, lp_amount: U256, mint_to: Address, min_mint_amount: U256) {
        let caller = self.env().caller();
        self.lock_for(caller, lp_amount, mint_to, min_mint_amount);
    }

    /// `lock` with a signed LP approval instead of a prior `approve`.
    #[odra(non_reentrant)]
    #[allow(clippy::too_many_arguments)]
    pub fn lock_with_permit(
        &mut self,
        lp_amount: U256,
        mint_to: Address,
        min_mint_amount: U256,
        deadline: u64,
        public_key: PublicKey,
        signature: Bytes,
    ) {
        let caller = self.env().caller();
        let self_address = self.env().self_address();
        LpPairContractRef::new(self.env().clone(), self.pair_address()).permit(
            caller,
            self_address,
            lp_amount,
            deadline,
            public_key,
            signature,
        );
        self.lock_for(caller, lp_amount, mint_to, min_mint_amount);
    }

    /// Repay `debt_amount` and take back collateral.
    ///
    /// Full repayment returns everything. A position below `cr` gets back
    /// only the excess over `cr` for the remaining debt; a healthy position
    /// gets back the repaid share of its collateral. LP staked in the user's
    /// yield wallet is unstaked as needed.
    #[odra(non_reentrant)]
    pub fn unlock(&mut self, debt_amount: U256, min_collateral_amount: U256) {
        let caller = self.env().caller();
        let debt = self.debt.get_or_default(&caller);
        let collateral = self.collateral.get_or_default(&caller);
        if debt.is_zero() && collateral.is_zero() {
            self.env().revert(VaultError::NoPosition);
        }
        if debt_amount > debt {
            self.env().revert(VaultError::InsufficientDebt);
        }
        let cr = self.cr.get_or_default();

        let full_repayment = debt.is_zero() || debt_amount == debt;
        let price = if full_repayment {
            U256::zero()
        } else {
            self.lp_price()
        };
        let released = math::collateral_to_release(collateral, debt, debt_amount, price, cr);
        if released < min_collateral_amount {
            self.env().revert(VaultError::MinNotMet);
        }

        // Effects
        let deposit = self.yield_wallet_deposit.get_or_default(&caller);
        let held = collateral - deposit;
        let shortfall = released.saturating_sub(held);
        self.debt.set(&caller, debt - debt_amount);
        self.collateral.set(&caller, collateral - released);
        self.yield_wallet_deposit.set(&caller, deposit - shortfall);
        let total_debt = self.total_debt.get_or_default();
        let total_collateral = self.total_collateral.get_or_default();
        self.total_debt.set(total_debt - debt_amount);
        self.total_collateral.set(total_collateral - released);

        // Interactions
        if !debt_amount.is_zero() {
            self.stable().burn(caller, debt_amount);
        }
        if !shortfall.is_zero() {
            self.withdraw_from_wallet(caller, shortfall);
        }
        if !released.is_zero() {
            self.lp_token().transfer(caller, released);
        }

        self.env().emit_event(events::Unlock {
            user: caller,
            lp_returned: released,
            debt_repaid: debt_amount,
        });
    }

    /// Repay the whole debt and take back all collateral without reading the
    /// oracle. The caller must hold the full debt in stable tokens.
    #[odra(non_reentrant)]
    pub fn emergency_unlock(&mut self) {
        let caller = self.env().caller();
        let collateral = self.collateral.get_or_default(&caller);
        if collateral.is_zero() {
            self.env().revert(VaultError::NoPosition);
        }
        let debt = self.debt.get_or_default(&caller);
        if self.stable().balance_of(caller) < debt {
            self.env().revert(VaultError::InsufficientBalance);
        }

        // Effects
        let deposit = self.yield_wallet_deposit.get_or_default(&caller);
        self.debt.set(&caller, U256::zero());
        self.collateral.set(&caller, U256::zero());
        self.yield_wallet_deposit.set(&caller, U256::zero());
        let total_debt = self.total_debt.get_or_default();
        let total_collateral = self.total_collateral.get_or_default();
        self.total_debt.set(total_debt - debt);
        self.total_collateral.set(total_collateral - collateral);

        // Interactions
        if !deposit.is_zero() {
            self.withdraw_from_wallet(caller, deposit);
        }
        if !debt.is_zero() {
            self.stable().burn(caller, debt);
        }
        self.lp_token().transfer(caller, collateral);

        self.env().emit_event(events::EmergencyUnlock {
            user: caller,
            lp_returned: collateral,
            debt_repaid: debt,
        });
        self.env().emit_event(events::Unlock {
            user: caller,
            lp_returned: collateral,
            debt_repaid: debt,
        });
    }

    /// Send the accumulated protocol fee: `safu_share` to the SAFU address,
    /// the rest to the team address.
    #[odra(non_reentrant)]
    pub fn distribute_fee(&mut self) {
        let mut stable = self.stable();
        let balance = stable.balance_of(self.env().self_address());
        let safu = match self.safu_address.get() {
            Some(safu) => safu,
            None => self.env().revert(VaultError::InvalidConfig),
        };
        let safu_amount = math::apply_rate(balance, self.safu_share.get_or_default());
        let team_amount = balance - safu_amount;
        let team = self.team_address.get();
        if !team_amount.is_zero() && team.is_none() {
            self.env().revert(VaultError::InvalidConfig);
        }

        if !safu_amount.is_zero() {
            stable.transfer(safu, safu_amount);
        }
        if let Some(team) = team {
            if !team_amount.is_zero() {
                stable.transfer(team, team_amount);
            }
        }

        self.env().emit_event(events::FeeDistributed {
            safu_amount,
            team_amount,
        });
    }

    // ==========================================
    // Yield Wallet Bridge
    // ==========================================

    /// Stake `amount` of the caller's free collateral through `factory`.
    /// `create_new` opens a fresh wallet (the current one must be empty).
    #[odra(non_reentrant)]
    pub fn stake_lp(&mut self, factory: Address, amount: U256, create_new: bool) {
        let caller = self.env().caller();
        if !self.enabled_factories.get_or_default(&factory) {
            self.env().revert(VaultError::FactoryNotEnabled);
        }
        if amount.is_zero() {
            self.env().revert(VaultError::ZeroAmount);
        }
        let collateral = self.collateral.get_or_default(&caller);
        let deposit = self.yield_wallet_deposit.get_or_default(&caller);
        if amount > collateral - deposit {
            self.env().revert(VaultError::InsufficientCollateral);
        }

        let mut factory_ref = YieldWalletFactoryContractRef::new(self.env().clone(), factory);
        let wallet_id = match self.yield_wallet.get(&caller) {
            Some(current) if current.factory == factory && !create_new => current.wallet_id,
            current => {
                if current.is_some() && !deposit.is_zero() {
                    self.env().revert(VaultError::UnstakeRequired);
                }
                factory_ref.create_yield_wallet(caller, self.pair_address())
            }
        };

        // Effects
        self.yield_wallet_deposit.set(&caller, deposit + amount);
        self.yield_wallet
            .set(&caller, YieldWalletRef { factory, wallet_id });

        // Interactions
        self.lp_token().approve(factory, amount);
        factory_ref.deposit(wallet_id, amount);

        self.env().emit_event(events::Staked {
            user: caller,
            factory,
            wallet_id,
            amount,
        });
    }

    /// Bring `amount` of staked collateral back into the vault.
    #[odra(non_reentrant)]
    pub fn unstake_lp(&mut self, amount: U256) {
        let caller = self.env().caller();
        if amount.is_zero() {
            self.env().revert(VaultError::ZeroAmount);
        }
        let deposit = self.yield_wallet_deposit.get_or_default(&caller);
        if amount > deposit {
            self.env().revert(VaultError::InsufficientStake);
        }

        self.yield_wallet_deposit.set(&caller, deposit - amount);
        let wallet = self.withdraw_from_wallet(caller, amount);

        self.env().emit_event(events::Unstaked {
            user: caller,
            factory: wallet.factory,
            wallet_id: wallet.wallet_id,
            amount,
        });
    }

    // ==========================================
    // Governance
    // ==========================================

    pub fn change_ltv(&mut self, ltv: u64) {
        self.propose_param(VaultParam::Ltv, ltv);
    }

    pub fn change_cr(&mut self, cr: u64) {
        self.propose_param(VaultParam::Cr, cr);
    }

    pub fn change_fee(&mut self, protocol_fee: u64) {
        self.propose_param(VaultParam::ProtocolFee, protocol_fee);
    }

    pub fn change_stake_fee(&mut self, stake_fee: u64) {
        self.propose_param(VaultParam::StakeFee, stake_fee);
    }

    pub fn change_safu_share(&mut self, safu_share: u64) {
        self.propose_param(VaultParam::SafuShare, safu_share);
    }

    /// Apply a proposed parameter change once its delay has passed.
    pub fn execute_param_change(&mut self, param: VaultParam) {
        self.require_owner();
        let pending = match self.pending_params.get(&param).flatten() {
            Some(pending) => pending,
            None => self.env().revert(VaultError::NoPendingChange),
        };
        if !pending.is_ready(self.env().get_block_time()) {
            self.env().revert(VaultError::TimelockActive);
        }
        let value = pending.new_value.as_u64();
        self.validate_param(&param, value);

        match param {
            VaultParam::Ltv => self.ltv.set(value),
            VaultParam::Cr => self.cr.set(value),
            VaultParam::ProtocolFee => self.protocol_fee.set(value),
            VaultParam::StakeFee => self.stake_fee.set(value),
            VaultParam::SafuShare => self.safu_share.set(value),
        }
        self.pending_params.set(&param, None);

        self.env().emit_event(events::ParamChanged {
            param,
            new_value: pending.new_value,
        });
    }

    /// Propose allowing `factory` to hold staked collateral.
    pub fn enable_yield_wallet_factory(&mut self, factory: Address) {
        self.require_owner();
        let eligible_at = self.env().get_block_time() + GOVERNANCE_DELAY_MS;
        self.pending_factories.set(&factory, eligible_at);
        self.env().emit_event(events::FactoryEnableProposed {
            factory,
            eligible_at,
        });
    }

    pub fn execute_enable_yield_wallet_factory(&mut self, factory: Address) {
        self.require_owner();
        let eligible_at = self.pending_factories.get_or_default(&factory);
        if eligible_at == 0 {
            self.env().revert(VaultError::NoPendingChange);
        }
        if self.env().get_block_time() < eligible_at {
            self.env().revert(VaultError::TimelockActive);
        }
        self.pending_factories.set(&factory, 0);
        self.enabled_factories.set(&factory, true);
        self.env().emit_event(events::FactoryEnabled { factory });
    }

    /// Takes effect immediately. Existing stakes can still be unstaked.
    pub fn disable_yield_wallet_factory(&mut self, factory: Address) {
        self.require_owner();
        self.pending_factories.set(&factory, 0);
        self.enabled_factories.set(&factory, false);
        self.env().emit_event(events::FactoryDisabled { factory });
    }

    pub fn set_safu_address(&mut self, safu_address: Address) {
        self.require_owner();
        self.safu_address.set(safu_address);
    }

    pub fn set_team_address(&mut self, team_address: Address) {
        self.require_owner();
        self.team_address.set(team_address);
    }

    pub fn set_staking_address(&mut self, staking_address: Address) {
        self.require_owner();
        self.staking_address.set(staking_address);
    }

    pub fn change_max_percent_diff(&mut self, max_percent_diff: u64) {
        self.require_owner();
        if max_percent_diff > SECOND_BASE {
            self.env().revert(VaultError::InvalidArgument);
        }
        self.max_percent_diff.set(max_percent_diff);
    }

    pub fn change_allowed_delay(&mut self, allowed_delay: u64) {
        self.require_owner();
        self.allowed_delay.set(allowed_delay);
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) {
        self.require_owner();
        let previous_owner = self.env().caller();
        self.owner.set(new_owner);
        self.env().emit_event(events::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
    }

    // ==========================================
    // View Functions
    // ==========================================

    pub fn collateral_of(&self, user: Address) -> U256 {
        self.collateral.get_or_default(&user)
    }

    pub fn debt_of(&self, user: Address) -> U256 {
        self.debt.get_or_default(&user)
    }

    pub fn yield_wallet_deposit_of(&self, user: Address) -> U256 {
        self.yield_wallet_deposit.get_or_default(&user)
    }

    pub fn yield_wallet_of(&self, user: Address) -> Option<YieldWalletRef> {
        self.yield_wallet.get(&user)
    }

    /// Position valued at the live oracle price.
    pub fn get_position(&self, user: Address) -> PositionInfo {
        let collateral = self.collateral.get_or_default(&user);
        let debt = self.debt.get_or_default(&user);
        let price = if collateral.is_zero() {
            U256::zero()
        } else {
            self.lp_price()
        };
        PositionInfo {
            collateral,
            debt,
            yield_wallet_deposit: self.yield_wallet_deposit.get_or_default(&user),
            collateral_value: math::mul_div(collateral, price, math::base()),
            collateral_ratio: math::collateral_ratio(collateral, debt, price),
        }
    }

    pub fn params(&self) -> VaultParams {
        VaultParams {
            ltv: self.ltv.get_or_default(),
            cr: self.cr.get_or_default(),
            protocol_fee: self.protocol_fee.get_or_default(),
            stake_fee: self.stake_fee.get_or_default(),
            safu_share: self.safu_share.get_or_default(),
            max_percent_diff: self.max_percent_diff.get_or_default(),
            allowed_delay: self.allowed_delay.get_or_default(),
        }
    }

    pub fn pending_param_change(&self, param: VaultParam) -> Option<PendingChange> {
        self.pending_params.get(&param).flatten()
    }

    /// Eligibility time of a proposed factory, if any.
    pub fn pending_factory(&self, factory: Address) -> Option<u64> {
        match self.pending_factories.get_or_default(&factory) {
            0 => None,
            eligible_at => Some(eligible_at),
        }
    }

    pub fn is_factory_enabled(&self, factory: Address) -> bool {
        self.enabled_factories.get_or_default(&factory)
    }

    pub fn total_collateral(&self) -> U256 {
        self.total_collateral.get_or_default()
    }

    pub fn total_debt(&self) -> U256 {
        self.total_debt.get_or_default()
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner.get()
    }

    pub fn pair(&self) -> Option<Address> {
        self.pair.get()
    }

    pub fn stable_token(&self) -> Option<Address> {
        self.stable_token.get()
    }

    pub fn oracle(&self) -> Option<Address> {
        self.oracle.get()
    }

    pub fn staking_address(&self) -> Option<Address> {
        self.staking_address.get()
    }

    pub fn safu_address(&self) -> Option<Address> {
        self.safu_address.get()
    }

    pub fn team_address(&self) -> Option<Address> {
        self.team_address.get()
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    fn lock_for(&mut self, caller: Address, lp_amount: U256, mint_to: Address, min_mint_amount: U256) {
        let ltv = self.ltv.get_or_default();
        if ltv == 0 {
            self.env().revert(VaultError::ZeroParameter);
        }
        let self_address = self.env().self_address();
        let factory = match self.vault_factory.get() {
            Some(factory) => factory,
            None => self.env().revert(VaultError::InvalidConfig),
        };
        if !VaultFactoryContractRef::new(self.env().clone(), factory).is_minter(self_address) {
            self.env().revert(VaultError::NotAuthorized);
        }
        if mint_to == Address::Account(AccountHash::new([0u8; 32])) {
            self.env().revert(VaultError::ZeroMintTo);
        }
        if lp_amount.is_zero() {
            self.env().revert(VaultError::ZeroAmount);
        }

        let split = math::split_mint(
            lp_amount,
            self.lp_price(),
            ltv,
            self.protocol_fee.get_or_default(),
            self.stake_fee.get_or_default(),
        );
        if split.user_amount < min_mint_amount {
            self.env().revert(VaultError::MinNotMet);
        }
        let staking_address = self.staking_address.get();
        if !split.stake_fee.is_zero() && staking_address.is_none() {
            self.env().revert(VaultError::InvalidConfig);
        }

        // Effects
        let collateral = self.collateral.get_or_default(&caller);
        let debt = self.debt.get_or_default(&caller);
        self.collateral.set(&caller, collateral + lp_amount);
        self.debt.set(&caller, debt + split.mint_amount);
        let total_collateral = self.total_collateral.get_or_default();
        let total_debt = self.total_debt.get_or_default();
        self.total_collateral.set(total_collateral + lp_amount);
        self.total_debt.set(total_debt + split.mint_amount);

        // Interactions
        self.lp_token().transfer_from(caller, self_address, lp_amount);
        let mut stable = self.stable();
        if !split.protocol_fee.is_zero() {
            stable.mint(self_address, split.protocol_fee);
        }
        if let Some(staking_address) = staking_address {
            if !split.stake_fee.is_zero() {
                stable.mint(staking_address, split.stake_fee);
            }
        }
        if !split.user_amount.is_zero() {
            stable.mint(mint_to, split.user_amount);
        }

        self.env().emit_event(events::Lock {
            user: caller,
            lp_amount,
            minted_amount: split.user_amount,
        });
    }

    /// Pull `amount` LP back from the user's current wallet into the vault.
    fn withdraw_from_wallet(&mut self, user: Address, amount: U256) -> YieldWalletRef {
        let wallet = match self.yield_wallet.get(&user) {
            Some(wallet) => wallet,
            None => self.env().revert(VaultError::InsufficientStake),
        };
        YieldWalletFactoryContractRef::new(self.env().clone(), wallet.factory)
            .withdraw(wallet.wallet_id, amount);
        wallet
    }

    fn propose_param(&mut self, param: VaultParam, value: u64) {
        self.require_owner();
        self.validate_param(&param, value);
        let pending = PendingChange::new(U256::from(value), self.env().get_block_time());
        self.env().emit_event(events::ParamChangeProposed {
            param: param.clone(),
            new_value: pending.new_value,
            eligible_at: pending.eligible_at,
        });
        self.pending_params.set(&param, Some(pending));
    }

    fn validate_param(&self, param: &VaultParam, value: u64) {
        let valid = match param {
            VaultParam::Ltv | VaultParam::SafuShare => value <= SECOND_BASE,
            VaultParam::Cr => value >= SECOND_BASE,
            VaultParam::ProtocolFee => {
                value as u128 + self.stake_fee.get_or_default() as u128 <= SECOND_BASE as u128
            }
            VaultParam::StakeFee => {
                value as u128 + self.protocol_fee.get_or_default() as u128 <= SECOND_BASE as u128
            }
        };
        if !valid {
            self.env().revert(VaultError::InvalidArgument);
        }
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(VaultError::NotAuthorized);
        }
    }

    fn lp_price(&self) -> U256 {
        let oracle = match self.oracle.get() {
            Some(oracle) => oracle,
            None => self.env().revert(VaultError::InvalidConfig),
        };
        PriceOracleContractRef::new(self.env().clone(), oracle).lp_price(
            self.max_percent_diff.get_or_default(),
            self.allowed_delay.get_or_default(),
        )
    }

    fn pair_address(&self) -> Address {
        match self.pair.get() {
            Some(pair) => pair,
            None => self.env().revert(VaultError::InvalidConfig),
        }
    }

    fn lp_token(&self) -> Cep18TokenContractRef {
        Cep18TokenContractRef::new(self.env().clone(), self.pair_address())
    }

    fn stable(&self) -> StableTokenContractRef {
        let stable = match self.stable_token.get() {
            Some(stable) => stable,
            None => self.env().revert(VaultError::InvalidConfig),
        };
        StableTokenContractRef::new(self.env().clone(), stable)
    }
}
