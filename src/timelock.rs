//! Two-phase governance changes: propose now, execute after a fixed delay.

use odra::casper_types::U256;

/// Delay between proposing and executing a governance change (2 days, in ms).
pub const GOVERNANCE_DELAY_MS: u64 = 2 * 24 * 60 * 60 * 1000;

/// A proposed parameter change waiting for its delay to pass.
#[odra::odra_type]
pub struct PendingChange {
    pub new_value: U256,
    pub eligible_at: u64,
}

impl PendingChange {
    pub fn new(new_value: U256, now: u64) -> Self {
        Self {
            new_value,
            eligible_at: now + GOVERNANCE_DELAY_MS,
        }
    }

    pub fn is_ready(&self, now: u64) -> bool {
        now >= self.eligible_at
    }
}
