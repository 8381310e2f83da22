//! Constant-product pair stand-in: an LP share token with settable reserves
//! and signature-based approvals (`permit`).

use alloc::string::String;
use alloc::vec::Vec;
use odra::casper_types::account::AccountHash;
use odra::casper_types::bytesrepr::{Bytes, ToBytes};
use odra::casper_types::{PublicKey, U256};
use odra::prelude::*;
use odra_modules::cep18::events::{Burn, Mint, SetAllowance, Transfer, TransferFrom};

use super::token::TokenLedger;
use crate::oracle::Reserves;
use crate::tokens::TokenError;

#[odra::module(
    events = [Mint, Burn, SetAllowance, Transfer, TransferFrom],
    errors = TokenError
)]
pub struct MockPair {
    ledger: SubModule<TokenLedger>,
    token0: Var<Address>,
    token1: Var<Address>,
    reserve0: Var<U256>,
    reserve1: Var<U256>,
    nonces: Mapping<Address, u64>,
}

#[odra::module]
impl MockPair {
    pub fn init(&mut self, token0: Address, token1: Address) {
        self.ledger
            .init(String::from("Mock LP"), String::from("MLP"), 18u8);
        self.token0.set(token0);
        self.token1.set(token1);
        self.reserve0.set(U256::zero());
        self.reserve1.set(U256::zero());
    }

    pub fn token0(&self) -> Option<Address> {
        self.token0.get()
    }

    pub fn token1(&self) -> Option<Address> {
        self.token1.get()
    }

    pub fn get_reserves(&self) -> Reserves {
        Reserves {
            reserve0: self.reserve0.get_or_default(),
            reserve1: self.reserve1.get_or_default(),
        }
    }

    /// Overwrite the reserves (simulates swaps and liquidity changes).
    pub fn set_reserves(&mut self, reserve0: U256, reserve1: U256) {
        self.reserve0.set(reserve0);
        self.reserve1.set(reserve1);
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

    /// Mint LP shares (stands in for adding liquidity)
    pub fn faucet_mint(&mut self, to: Address, amount: U256) {
        self.ledger.mint(&to, &amount);
    }

    pub fn nonce_of(&self, owner: Address) -> u64 {
        self.nonces.get_or_default(&owner)
    }

    /// Message `owner` must sign to approve `spender` via `permit`.
    pub fn permit_message(&self, owner: Address, spender: Address, value: U256, deadline: u64) -> Bytes {
        let nonce = self.nonces.get_or_default(&owner);
        self.encode_permit(owner, spender, value, nonce, deadline)
    }

    /// Approve by signature. `public_key` must belong to `owner`.
    pub fn permit(
        &mut self,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: u64,
        public_key: PublicKey,
        signature: Bytes,
    ) {
        if self.env().get_block_time() > deadline {
            self.env().revert(TokenError::PermitExpired);
        }
        if Address::Account(AccountHash::from(&public_key)) != owner {
            self.env().revert(TokenError::InvalidSignature);
        }
        let nonce = self.nonces.get_or_default(&owner);
        let message = self.encode_permit(owner, spender, value, nonce, deadline);
        if !self.env().verify_signature(&message, &signature, &public_key) {
            self.env().revert(TokenError::InvalidSignature);
        }
        self.nonces.set(&owner, nonce + 1);
        self.ledger.set_allowance(owner, spender, value);
    }

    fn encode_permit(&self, owner: Address, spender: Address, value: U256, nonce: u64, deadline: u64) -> Bytes {
        let parts = [
            self.env().self_address().to_bytes(),
            owner.to_bytes(),
            spender.to_bytes(),
            value.to_bytes(),
            nonce.to_bytes(),
            deadline.to_bytes(),
        ];
        let mut message = Vec::new();
        for part in parts {
            match part {
                Ok(bytes) => message.extend(bytes),
                Err(_) => self.env().revert(TokenError::InvalidSignature),
            }
        }
        Bytes::from(message)
    }
}
