//! Vault Factory (minter registry)
//!
//! Keeps the set of vaults allowed to mint and burn the stable token.
//! Enabling a vault is two-phase: `enable_vault` records the proposal and
//! `execute_enable_vault` applies it once `GOVERNANCE_DELAY_MS` has passed.
//! Disabling is immediate.

use odra::prelude::*;

use crate::timelock::GOVERNANCE_DELAY_MS;

pub mod events {
    use odra::prelude::*;

    #[odra::event]
    pub struct VaultEnableProposed {
        pub vault: Address,
        pub eligible_at: u64,
    }

    #[odra::event]
    pub struct VaultEnabled {
        pub vault: Address,
    }

    #[odra::event]
    pub struct VaultDisabled {
        pub vault: Address,
    }
}

#[odra::odra_error]
pub enum FactoryError {
    Unauthorized = 30001,
    NoPendingChange = 30002,
    TimelockActive = 30003,
}

#[odra::module(
    events = [events::VaultEnableProposed, events::VaultEnabled, events::VaultDisabled],
    errors = FactoryError
)]
pub struct VaultFactory {
    owner: Var<Address>,
    minters: Mapping<Address, bool>,
    pending_vaults: Mapping<Address, u64>,
}

#[odra::module]
impl VaultFactory {
    pub fn init(&mut self) {
        self.owner.set(self.env().caller());
    }

    /// Propose `vault` as a minter.
    pub fn enable_vault(&mut self, vault: Address) {
        self.require_owner();
        let eligible_at = self.env().get_block_time() + GOVERNANCE_DELAY_MS;
        self.pending_vaults.set(&vault, eligible_at);
        self.env().emit_event(events::VaultEnableProposed { vault, eligible_at });
    }

    /// Apply a proposal made by `enable_vault` once its delay has passed.
    pub fn execute_enable_vault(&mut self, vault: Address) {
        self.require_owner();
        let eligible_at = self.pending_vaults.get_or_default(&vault);
        if eligible_at == 0 {
            self.env().revert(FactoryError::NoPendingChange);
        }
        if self.env().get_block_time() < eligible_at {
            self.env().revert(FactoryError::TimelockActive);
        }
        self.pending_vaults.set(&vault, 0);
        self.minters.set(&vault, true);
        self.env().emit_event(events::VaultEnabled { vault });
    }

    pub fn disable_vault(&mut self, vault: Address) {
        self.require_owner();
        self.pending_vaults.set(&vault, 0);
        self.minters.set(&vault, false);
        self.env().emit_event(events::VaultDisabled { vault });
    }

    pub fn is_minter(&self, vault: Address) -> bool {
        self.minters.get_or_default(&vault)
    }

    /// Time at which a pending proposal becomes executable, if any.
    pub fn pending_vault(&self, vault: Address) -> Option<u64> {
        match self.pending_vaults.get_or_default(&vault) {
            0 => None,
            eligible_at => Some(eligible_at),
        }
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner.get()
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(FactoryError::Unauthorized);
        }
    }
}
