//! Wasm entry crate for the LP vault contracts.
//!
//! Links the vault, its collaborators and the mock market so the Odra wasm
//! build can emit entry points for each of them.

#![cfg_attr(target_arch = "wasm32", no_std)]
#![cfg_attr(target_arch = "wasm32", no_main)]

#[cfg(target_arch = "wasm32")]
extern crate odra_casper_wasm_env;

#[cfg(target_arch = "wasm32")]
#[allow(unused_imports)]
use lp_vault_casper::{
    mocks::{
        farms::{MockFairLaunch, MockMasterChef, MockRewardPool, MockStakingRewards},
        pair::MockPair,
        price_feed::MockPriceFeed,
        token::MockToken,
    },
    oracle::PriceOracle,
    tokens::StableToken,
    vault::Vault,
    vault_factory::VaultFactory,
    yield_wallet::YieldWalletFactory,
};

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    panic!("build lp_vault_casper_build_contract with --target wasm32-unknown-unknown");
}
