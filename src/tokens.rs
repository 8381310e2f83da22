//! CEP-18 tokens used by the protocol
//!
//! - `StableToken`: the debt token. Only vaults the `VaultFactory` reports as
//!   minters can mint or burn it.
//! - `Cep18Token`: external interface for any CEP-18 token the protocol moves
//!   around (LP shares, farm rewards, the stable token itself).

use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;
use odra_modules::cep18::events::{
    Burn, DecreaseAllowance, IncreaseAllowance, Mint, SetAllowance, Transfer, TransferFrom,
};
use odra_modules::cep18_token::Cep18;

use crate::vault_factory::VaultFactoryContractRef;

/// Minimal CEP-18 surface the vault and the yield wallets call into.
#[odra::external_contract]
pub trait Cep18Token {
    fn balance_of(&self, owner: Address) -> U256;
    fn allowance(&self, owner: Address, spender: Address) -> U256;
    fn transfer(&mut self, recipient: Address, amount: U256);
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
    fn approve(&mut self, spender: Address, amount: U256);
}

pub mod events {
    use odra::prelude::*;

    #[odra::event]
    pub struct VaultFactorySet {
        pub vault_factory: Address,
    }
}

/// Errors for token operations (aligned with CEP-18 codes where applicable)
#[odra::odra_error]
pub enum TokenError {
    InsufficientBalance = 60001,
    InsufficientAllowance = 60002,
    CannotTargetSelfUser = 60003,
    Unauthorized = 60004,
    PermitExpired = 60005,
    InvalidSignature = 60006,
}

/// Stablecoin minted against LP collateral.
#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        IncreaseAllowance,
        DecreaseAllowance,
        Transfer,
        TransferFrom,
        events::VaultFactorySet
    ],
    errors = TokenError
)]
pub struct StableToken {
    token: SubModule<Cep18>,
    vault_factory: Var<Address>,
}

#[odra::module]
impl StableToken {
    /// Initialize the token; minting rights are delegated to `vault_factory`.
    pub fn init(&mut self, symbol: String, name: String, vault_factory: Address) {
        self.token.init(symbol, name, 18u8, U256::zero());
        self.vault_factory.set(vault_factory);
        self.env()
            .emit_event(events::VaultFactorySet { vault_factory });
    }

    pub fn vault_factory(&self) -> Option<Address> {
        self.vault_factory.get()
    }

    pub fn name(&self) -> String {
        self.token.name()
    }

    pub fn symbol(&self) -> String {
        self.token.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.token.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.token.total_supply()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.token.balance_of(&owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.token.allowance(&owner, &spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        self.token.transfer(&recipient, &amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        self.token.approve(&spender, &amount);
    }

    pub fn increase_allowance(&mut self, spender: Address, amount: U256) {
        self.token.increase_allowance(&spender, &amount);
    }

    pub fn decrease_allowance(&mut self, spender: Address, amount: U256) {
        self.token.decrease_allowance(&spender, &amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        self.token.transfer_from(&owner, &recipient, &amount);
    }

    /// Mint tokens (authorized vaults only)
    pub fn mint(&mut self, to: Address, amount: U256) {
        self.require_minter();
        self.token.raw_mint(&to, &amount);
    }

    /// Burn tokens held by `from` (authorized vaults only)
    pub fn burn(&mut self, from: Address, amount: U256) {
        self.require_minter();
        if self.token.balance_of(&from) < amount {
            self.env().revert(TokenError::InsufficientBalance);
        }
        self.token.raw_burn(&from, &amount);
    }

    fn require_minter(&self) {
        let caller = self.env().caller();
        let factory = match self.vault_factory.get() {
            Some(factory) => factory,
            None => self.env().revert(TokenError::Unauthorized),
        };
        let registry = VaultFactoryContractRef::new(self.env().clone(), factory);
        if !registry.is_minter(caller) {
            self.env().revert(TokenError::Unauthorized);
        }
    }
}
