//! LP Vault x Casper — LP-Collateralized Stablecoin Vault (Odra)
//!
//! This crate implements a collateralized-debt protocol on Casper using Odra framework.
//! - PriceOracle: manipulation-resistant USD price of an AMM LP token
//! - Vault: locks LP, mints the stable token, returns collateral on repayment
//! - YieldWalletFactory: stakes locked LP into external farms per user
//! - StableToken / VaultFactory: the debt token and its minter registry
//! - mocks: pair, feed, token and farm stand-ins for tests and testnet

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

pub mod math;
pub mod timelock;
pub mod tokens;
pub mod vault_factory;
pub mod oracle;
pub mod farms;
pub mod vault;
pub mod yield_wallet;
pub mod mocks;
