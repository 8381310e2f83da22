//! Open-mint CEP-18 token and the raw ledger shared with `MockPair`.

use alloc::string::String;
use odra::casper_types::U256;
use odra::prelude::*;
use odra_modules::cep18::events::{Burn, Mint, SetAllowance, Transfer, TransferFrom};
use odra_modules::cep18::storage::{
    Cep18AllowancesStorage, Cep18BalancesStorage, Cep18DecimalsStorage, Cep18NameStorage,
    Cep18SymbolStorage, Cep18TotalSupplyStorage,
};

use crate::tokens::TokenError;

/// CEP-18 storage plus the raw balance moves. Not deployed on its own.
#[odra::module]
pub struct TokenLedger {
    name: SubModule<Cep18NameStorage>,
    symbol: SubModule<Cep18SymbolStorage>,
    decimals: SubModule<Cep18DecimalsStorage>,
    total_supply: SubModule<Cep18TotalSupplyStorage>,
    balances: SubModule<Cep18BalancesStorage>,
    allowances: SubModule<Cep18AllowancesStorage>,
}

#[odra::module]
impl TokenLedger {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
        self.allowances.init();
        self.balances.init();
    }

    pub fn name(&self) -> String {
        self.name.get()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get()
    }

    pub fn balance_of(&self, owner: &Address) -> U256 {
        self.balances.get(owner).unwrap_or_default()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances.get_or_default(owner, spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        let sender = self.env().caller();
        if sender == recipient {
            self.env().revert(TokenError::CannotTargetSelfUser);
        }
        self.raw_transfer(&sender, &recipient, &amount);
        self.env().emit_event(Transfer {
            sender,
            recipient,
            amount,
        });
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        if owner == recipient {
            self.env().revert(TokenError::CannotTargetSelfUser);
        }
        if amount.is_zero() {
            return;
        }
        let spender = self.env().caller();
        let allowance = self.allowances.get_or_default(&owner, &spender);
        if allowance < amount {
            self.env().revert(TokenError::InsufficientAllowance);
        }
        self.allowances.set(&owner, &spender, allowance - amount);
        self.raw_transfer(&owner, &recipient, &amount);
        self.env().emit_event(TransferFrom {
            spender,
            owner,
            recipient,
            amount,
        });
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        let owner = self.env().caller();
        self.set_allowance(owner, spender, amount);
    }

    pub fn set_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        if owner == spender {
            self.env().revert(TokenError::CannotTargetSelfUser);
        }
        self.allowances.set(&owner, &spender, amount);
        self.env().emit_event(SetAllowance {
            owner,
            spender,
            allowance: amount,
        });
    }

    pub fn mint(&mut self, owner: &Address, amount: &U256) {
        self.total_supply.add(*amount);
        self.balances.add(owner, *amount);
        self.env().emit_event(Mint {
            recipient: *owner,
            amount: *amount,
        });
    }

    pub fn burn(&mut self, owner: &Address, amount: &U256) {
        let balance = self.balances.get(owner).unwrap_or_default();
        if balance < *amount {
            self.env().revert(TokenError::InsufficientBalance);
        }
        self.balances.subtract(owner, *amount);
        self.total_supply.subtract(*amount);
        self.env().emit_event(Burn {
            owner: *owner,
            amount: *amount,
        });
    }

    fn raw_transfer(&mut self, sender: &Address, recipient: &Address, amount: &U256) {
        let balance = self.balances.get(sender).unwrap_or_default();
        if balance < *amount {
            self.env().revert(TokenError::InsufficientBalance);
        }
        if !amount.is_zero() {
            self.balances.subtract(sender, *amount);
            self.balances.add(recipient, *amount);
        }
    }
}

/// Test token with faucet mint. Stands in for reward tokens and pair legs.
#[odra::module(
    events = [Mint, Burn, SetAllowance, Transfer, TransferFrom],
    errors = TokenError
)]
pub struct MockToken {
    ledger: SubModule<TokenLedger>,
}

#[odra::module]
impl MockToken {
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        self.ledger.init(name, symbol, decimals);
    }

    pub fn name(&self) -> String {
        self.ledger.name()
    }

    pub fn symbol(&self) -> String {
        self.ledger.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.ledger.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.ledger.total_supply()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.ledger.balance_of(&owner)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.ledger.allowance(&owner, &spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        self.ledger.transfer(recipient, amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        self.ledger.transfer_from(owner, recipient, amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        self.ledger.approve(spender, amount);
    }

    /// Anyone can mint
    pub fn faucet_mint(&mut self, to: Address, amount: U256) {
        self.ledger.mint(&to, &amount);
    }
}
