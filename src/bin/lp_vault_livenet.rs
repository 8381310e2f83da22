//! Livenet deploy and demo binary for the LP Vault.
//!
//! Deploys the protocol against mock AMM and price-feed contracts so the full
//! flow can be exercised on testnet.
//!
//! Run with:
//! - Deploy only:           LPVAULT_LIVENET_MODE=deploy cargo run --bin lp_vault_livenet --features=livenet
//! - Enable vault minting:  LPVAULT_LIVENET_MODE=enable LPVAULT_EXISTING_FACTORY=... LPVAULT_EXISTING_VAULT=... cargo run ...
//!                          (after the 2-day governance delay)
//! - Demo on existing:      LPVAULT_LIVENET_MODE=demo LPVAULT_EXISTING_*=... cargo run ...
//! - Query position:        LPVAULT_LIVENET_MODE=query LPVAULT_EXISTING_VAULT=... cargo run ...
//!
//! Required environment variables (Odra livenet):
//! - ODRA_CASPER_LIVENET_SECRET_KEY_PATH
//! - ODRA_CASPER_LIVENET_NODE_ADDRESS        (base URL; Odra appends "/rpc")
//! - ODRA_CASPER_LIVENET_EVENTS_URL          (required by Odra; placeholder URL is OK here)
//! - ODRA_CASPER_LIVENET_CHAIN_NAME
//!
//! Optional:
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS          (motes)
//! - ODRA_CASPER_LIVENET_CALL_GAS            (motes)
//! - LPVAULT_EXISTING_FACTORY, LPVAULT_EXISTING_STABLE, LPVAULT_EXISTING_PAIR,
//!   LPVAULT_EXISTING_FEED, LPVAULT_EXISTING_VAULT
//!                                           (64-hex or formatted "hash-..."/"contract-package-...")
//! - LPVAULT_LTV                             (over 1e8; default: 50_000_000)
//! - LPVAULT_CR                              (over 1e8; default: 150_000_000)
//! - LPVAULT_DEMO_LP                         (whole LP tokens to lock; default: 10)

use odra::casper_types::U256;
use odra::host::{Deployer, HostRef, HostRefLoader, NoArgs};
use odra::prelude::*;

use lp_vault_casper::math::BASE;
use lp_vault_casper::mocks::pair::{MockPair, MockPairHostRef, MockPairInitArgs};
use lp_vault_casper::mocks::price_feed::{MockPriceFeed, MockPriceFeedInitArgs};
use lp_vault_casper::mocks::token::{MockToken, MockTokenInitArgs};
use lp_vault_casper::oracle::{PriceOracle, PriceOracleInitArgs};
use lp_vault_casper::tokens::{StableToken, StableTokenHostRef, StableTokenInitArgs};
use lp_vault_casper::vault::{Vault, VaultHostRef, VaultInitArgs};
use lp_vault_casper::vault_factory::VaultFactory;

const DEFAULT_DEPLOY_GAS_MOTES: u64 = 500_000_000_000; // 500 CSPR
const DEFAULT_CALL_GAS_MOTES: u64 = 50_000_000_000; // 50 CSPR

const DEFAULT_LTV: u64 = 50_000_000; // 50%
const DEFAULT_CR: u64 = 150_000_000; // 150%
const PROTOCOL_FEE: u64 = 500_000; // 0.5%
const STAKE_FEE: u64 = 500_000; // 0.5%
const SAFU_SHARE: u64 = 50_000_000; // 50%
const MAX_PERCENT_DIFF: u64 = 5_000_000; // 5%
const ALLOWED_DELAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Feed price of token0 in USD, 8 decimals
const DEMO_TOKEN0_PRICE: u64 = 3_200_00000000;

fn main() {
    println!("============================================");
    println!("  LP Vault — Livenet");
    println!("============================================\n");

    let env = odra_casper_livenet_env::env();

    let mode = std::env::var("LPVAULT_LIVENET_MODE").unwrap_or_else(|_| "deploy".to_string());
    let deploy_gas = read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS", DEFAULT_DEPLOY_GAS_MOTES);
    let call_gas = read_u64_env("ODRA_CASPER_LIVENET_CALL_GAS", DEFAULT_CALL_GAS_MOTES);
    let ltv = read_u64_env("LPVAULT_LTV", DEFAULT_LTV);
    let cr = read_u64_env("LPVAULT_CR", DEFAULT_CR);
    let demo_lp = read_u64_env("LPVAULT_DEMO_LP", 10);

    println!("[INFO] Mode: {}", mode);
    println!("[INFO] Caller: {:?}", env.caller());
    println!("[INFO] Gas (motes): deploy={}, calls={}", deploy_gas, call_gas);
    println!("[INFO] Params: ltv={}, cr={}", ltv, cr);
    println!();

    match mode.as_str() {
        "deploy" => {
            let caller = env.caller();

            println!("[STEP 1] Deploying VaultFactory...");
            env.set_gas(deploy_gas);
            let mut factory = VaultFactory::deploy(&env, NoArgs);
            println!("[OK] VaultFactory deployed at: {:?}", factory.address());

            println!("[STEP 2] Deploying stable token...");
            let stable = StableToken::deploy(
                &env,
                StableTokenInitArgs {
                    symbol: "LPUSD".to_string(),
                    name: "LP Vault USD".to_string(),
                    vault_factory: factory.address(),
                },
            );
            println!("[OK] Stable token deployed at: {:?}", stable.address());

            println!("[STEP 3] Deploying mock pair legs, pair and price feed...");
            let token0 = MockToken::deploy(
                &env,
                MockTokenInitArgs {
                    name: "Mock Wrapped CSPR".to_string(),
                    symbol: "MWCSPR".to_string(),
                    decimals: 18,
                },
            );
            let token1 = MockToken::deploy(
                &env,
                MockTokenInitArgs {
                    name: "Mock USD".to_string(),
                    symbol: "MUSD".to_string(),
                    decimals: 18,
                },
            );
            let mut pair = MockPair::deploy(
                &env,
                MockPairInitArgs {
                    token0: token0.address(),
                    token1: token1.address(),
                },
            );
            let feed = MockPriceFeed::deploy(
                &env,
                MockPriceFeedInitArgs {
                    decimals: 8,
                    answer: U256::from(DEMO_TOKEN0_PRICE),
                },
            );
            env.set_gas(call_gas);
            pair.set_reserves(U256::from(BASE), U256::from(BASE) * U256::from(3_200u64));
            println!("[OK] Pair: {:?}", pair.address());
            println!("     Feed: {:?}", feed.address());

            println!("[STEP 4] Deploying PriceOracle...");
            env.set_gas(deploy_gas);
            let oracle = PriceOracle::deploy(
                &env,
                PriceOracleInitArgs {
                    pair: pair.address(),
                    token0_decimals: 18,
                    token1_decimals: 18,
                    feeds: vec![feed.address()],
                },
            );
            println!("[OK] PriceOracle deployed at: {:?}", oracle.address());

            println!("[STEP 5] Deploying Vault...");
            let vault = Vault::deploy(
                &env,
                VaultInitArgs {
                    pair: pair.address(),
                    stable_token: stable.address(),
                    vault_factory: factory.address(),
                    oracle: oracle.address(),
                    ltv,
                    cr,
                    protocol_fee: PROTOCOL_FEE,
                    stake_fee: STAKE_FEE,
                    safu_share: SAFU_SHARE,
                    max_percent_diff: MAX_PERCENT_DIFF,
                    allowed_delay: ALLOWED_DELAY_MS,
                    staking_address: Some(caller),
                },
            );
            println!("[OK] Vault deployed at: {:?}", vault.address());

            println!("[STEP 6] Proposing vault as minter...");
            env.set_gas(call_gas);
            factory.enable_vault(vault.address());
            println!(
                "[OK] Eligible at: {:?} (run LPVAULT_LIVENET_MODE=enable afterwards)",
                factory.pending_vault(vault.address())
            );
            println!();

            output_deploy_json(&[
                ("factory", factory.address()),
                ("stable", stable.address()),
                ("pair", pair.address()),
                ("feed", feed.address()),
                ("oracle", oracle.address()),
                ("vault", vault.address()),
            ]);
        }
        "enable" => {
            let factory_addr = existing("LPVAULT_EXISTING_FACTORY", &mode);
            let vault_addr = existing("LPVAULT_EXISTING_VAULT", &mode);
            println!("[STEP 1] Executing pending vault enable...");
            env.set_gas(call_gas);
            let mut factory = VaultFactory::load(&env, factory_addr);
            factory.execute_enable_vault(vault_addr);
            println!("[OK] Vault is minter: {}", factory.is_minter(vault_addr));
        }
        "demo" => {
            let caller = env.caller();
            let mut pair = MockPair::load(&env, existing("LPVAULT_EXISTING_PAIR", &mode));
            let mut feed = MockPriceFeed::load(&env, existing("LPVAULT_EXISTING_FEED", &mode));
            let stable = StableToken::load(&env, existing("LPVAULT_EXISTING_STABLE", &mode));
            let mut vault = Vault::load(&env, existing("LPVAULT_EXISTING_VAULT", &mode));
            let lp_amount = U256::from(demo_lp) * U256::from(BASE);
            env.set_gas(call_gas);

            println!("[DEMO 1] Refreshing feed and minting {} LP...", demo_lp);
            feed.set_price(U256::from(DEMO_TOKEN0_PRICE));
            pair.faucet_mint(caller, lp_amount);
            pair.approve(vault.address(), lp_amount);
            print_balances(&pair, &stable, caller);

            println!("[DEMO 2] Locking {} LP...", demo_lp);
            vault.lock(lp_amount, caller, U256::zero());
            println!("[OK] Lock complete.");
            print_position_info(&vault, caller);

            let repay = vault.debt_of(caller) / 2;
            println!("[DEMO 3] Repaying {} (half the debt)...", repay);
            vault.unlock(repay, U256::zero());
            println!("[OK] Unlock complete.");
            print_position_info(&vault, caller);
            print_balances(&pair, &stable, caller);
        }
        "query" => {
            let vault = VaultHostRef::new(existing("LPVAULT_EXISTING_VAULT", &mode), env.clone());
            let user = env.caller();
            let pos = vault.get_position(user);
            println!(
                "LPVAULT_POSITION_JSON={{\"collateral\":\"{}\",\"debt\":\"{}\",\"yield_wallet_deposit\":\"{}\",\"collateral_value\":\"{}\",\"collateral_ratio\":{},\"user\":\"{:?}\"}}",
                pos.collateral,
                pos.debt,
                pos.yield_wallet_deposit,
                pos.collateral_value,
                pos.collateral_ratio,
                user
            );
        }
        other => panic!("Unknown LPVAULT_LIVENET_MODE: {}", other),
    }
}

fn print_position_info(vault: &VaultHostRef, user: Address) {
    let pos = vault.get_position(user);
    println!("     collateral: {}", pos.collateral);
    println!("     debt: {}", pos.debt);
    println!("     staked: {}", pos.yield_wallet_deposit);
    println!("     collateral value (USD): {}", pos.collateral_value);
    println!("     collateral ratio: {} ({}%)", pos.collateral_ratio, pos.collateral_ratio as f64 / 1e6);
    println!("     total_collateral: {}", vault.total_collateral());
    println!("     total_debt: {}", vault.total_debt());
    println!();
}

fn print_balances(pair: &MockPairHostRef, stable: &StableTokenHostRef, user: Address) {
    println!("     LP balance: {}", pair.balance_of(user));
    println!("     stable balance: {}", stable.balance_of(user));
    println!();
}

fn existing(name: &str, mode: &str) -> Address {
    let raw = std::env::var(name).unwrap_or_else(|_| panic!("{} must be set for mode={}", name, mode));
    parse_contract_address(&raw)
}

fn read_u64_env(name: &str, default_value: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => {
            let cleaned = raw.trim().replace('_', "");
            cleaned.parse::<u64>().unwrap_or(default_value)
        }
        Err(_) => default_value,
    }
}

fn output_deploy_json(contracts: &[(&str, Address)]) {
    let chain_name =
        std::env::var("ODRA_CASPER_LIVENET_CHAIN_NAME").unwrap_or_else(|_| "casper-test".to_string());
    let node_url = std::env::var("ODRA_CASPER_LIVENET_NODE_ADDRESS")
        .unwrap_or_else(|_| "https://node.testnet.casper.network".to_string());

    let hashes = contracts
        .iter()
        .map(|(name, addr)| format!("\"{}_contract_hash\":\"{}\"", name, format_address_hash(addr)))
        .collect::<Vec<_>>()
        .join(",");

    println!(
        r#"LPVAULT_DEPLOY_JSON={{"chain_name":"{}","node_url":"{}",{},"deployed_at":"{}"}}"#,
        chain_name,
        node_url,
        hashes,
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
}

fn format_address_hash(addr: &Address) -> String {
    let debug_str = format!("{:?}", addr);
    if let (Some(start), Some(end)) = (debug_str.find('['), debug_str.rfind(']')) {
        return debug_str[start + 1..end]
            .split(", ")
            .filter_map(|part| part.strip_prefix("0x").or_else(|| part.strip_prefix("0X")))
            .collect();
    }
    debug_str
}

fn parse_contract_address(raw: &str) -> Address {
    use odra::casper_types::account::AccountHash;
    use odra::casper_types::contracts::ContractPackageHash;

    fn decode_hex_32(s: &str) -> [u8; 32] {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            panic!("Invalid address hash (expected 64 hex): {}", s);
        }
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .unwrap_or_else(|_| panic!("Invalid hex in address: {}", s));
        }
        out
    }

    let trimmed = raw.trim();
    if let Some(hex) = trimmed.strip_prefix("account-hash-") {
        return Address::Account(AccountHash::new(decode_hex_32(hex)));
    }
    let hex = ["contract-package-", "package-", "hash-"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    Address::Contract(ContractPackageHash::new(decode_hex_32(hex)))
}
