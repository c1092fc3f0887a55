use super::{Acquire, State};
use peerset_api::*;

/// Sends requested by a policy during an evaluation, performed by the
/// engine after the lock is released. A terminal transition during the
/// same evaluation drops them.
#[derive(Debug, Default)]
pub(crate) struct TickDirectives {
    pub(crate) broadcast: bool,
    pub(crate) request_one: bool,
}

/// The [AcquireTick] surface over an engine's locked state for the
/// duration of one policy callback.
pub(crate) struct TickCx<'a> {
    engine: &'a Acquire,
    state: &'a mut State,
    directives: &'a mut TickDirectives,
}

impl<'a> TickCx<'a> {
    pub(crate) fn new(
        engine: &'a Acquire,
        state: &'a mut State,
        directives: &'a mut TickDirectives,
    ) -> Self {
        Self {
            engine,
            state,
            directives,
        }
    }
}

impl AcquireTick for TickCx<'_> {
    fn target(&self) -> &ObjectId {
        self.engine.target()
    }

    fn kind(&self) -> AcquireKind {
        self.engine.kind()
    }

    fn timeouts(&self) -> u32 {
        self.state.timeouts
    }

    fn peer_count(&self) -> usize {
        self.state.peers.len()
    }

    fn is_aggressive(&self) -> bool {
        self.state.aggressive
    }

    fn set_aggressive(&mut self) {
        self.state.aggressive = true;
    }

    fn reset_timeouts(&mut self) {
        self.state.timeouts = 0;
    }

    fn fail(&mut self) {
        self.state.failed = true;
    }

    fn broadcast(&mut self) {
        self.directives.broadcast = true;
    }

    fn request_one(&mut self) {
        self.directives.request_one = true;
    }
}
