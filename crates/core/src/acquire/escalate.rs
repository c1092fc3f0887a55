use super::config::AcquireConfig;
use peerset_api::*;

/// The standard acquisition policy, shared by ledger-data and
/// transaction-set engines.
///
/// On progress the consecutive timeout count resets and the engine
/// keeps its current mode. On timeout it re-requests from a single
/// reachable peer while passive, escalates to aggressive broadcast once
/// `aggressive_after_timeouts` consecutive timeouts accumulate, and
/// declares failure at `fail_after_timeouts`.
#[derive(Debug, Clone)]
pub struct EscalatingPolicy {
    fail_after_timeouts: u32,
    aggressive_after_timeouts: u32,
}

impl EscalatingPolicy {
    /// Construct a policy with explicit bounds.
    pub fn new(fail_after_timeouts: u32, aggressive_after_timeouts: u32) -> Self {
        Self {
            fail_after_timeouts,
            aggressive_after_timeouts,
        }
    }

    /// Construct a policy from the engine config.
    pub fn from_config(config: &AcquireConfig) -> Self {
        Self::new(config.fail_after_timeouts, config.aggressive_after_timeouts)
    }
}

impl AcquirePolicy for EscalatingPolicy {
    fn on_timeout(&self, tick: &mut dyn AcquireTick, _first_timeout: bool) {
        if tick.timeouts() >= self.fail_after_timeouts {
            tracing::warn!(
                "giving up acquiring {} after {} timeouts",
                tick.target(),
                tick.timeouts(),
            );
            tick.fail();
            return;
        }

        if !tick.is_aggressive()
            && tick.timeouts() >= self.aggressive_after_timeouts
        {
            tracing::debug!("escalating acquisition of {}", tick.target());
            tick.set_aggressive();
        }

        if tick.is_aggressive() {
            tick.broadcast();
        } else {
            tick.request_one();
        }
    }

    fn on_progress(&self, tick: &mut dyn AcquireTick) {
        tick.reset_timeouts();
    }
}
