//! Acquisition policy types.
//!
//! The engine in peerset_core drives a fixed timer/retry state machine.
//! What happens on a timeout or on progress is policy, selected at
//! construction time through the [AcquirePolicy] trait rather than baked
//! into the engine. Policies act through the [AcquireTick] surface handed
//! to them during timer evaluation.

use crate::*;
use std::sync::Arc;

/// The kind of object an engine instance is acquiring.
///
/// The kind selects the [TaskCategory] timer work is dispatched under,
/// which in turn lets the owner apply different load policies to the
/// two acquisition paths.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum AcquireKind {
    /// Acquiring a ledger header and its supporting data.
    LedgerData,

    /// Acquiring a transaction-set.
    TxSetData,
}

impl AcquireKind {
    /// The task category timer evaluations for this kind run under.
    pub fn task_category(&self) -> TaskCategory {
        match self {
            AcquireKind::LedgerData => TaskCategory::LedgerData,
            AcquireKind::TxSetData => TaskCategory::TxData,
        }
    }
}

/// View and control surface handed to [AcquirePolicy] callbacks during
/// a single timer evaluation.
///
/// Mutations apply to the engine's locked state; requested sends
/// (broadcast / targeted re-request) are performed by the engine after
/// the lock is released, and are dropped if the policy also failed the
/// acquisition.
pub trait AcquireTick {
    /// The content identifier being acquired.
    fn target(&self) -> &ObjectId;

    /// The acquisition kind of this engine.
    fn kind(&self) -> AcquireKind;

    /// Consecutive timer fires without progress, including this one.
    fn timeouts(&self) -> u32;

    /// Current size of the peer set (reachable or not).
    fn peer_count(&self) -> usize;

    /// Whether the engine is in escalated request mode.
    fn is_aggressive(&self) -> bool;

    /// Escalate to aggressive (broadcast) request mode.
    fn set_aggressive(&mut self);

    /// Reset the consecutive timeout count to zero.
    fn reset_timeouts(&mut self);

    /// Declare the acquisition failed. Terminal.
    fn fail(&mut self);

    /// Request a broadcast to the whole peer set after this evaluation.
    fn broadcast(&mut self);

    /// Request a targeted re-request to a single reachable peer after
    /// this evaluation.
    fn request_one(&mut self);
}

/// Policy invoked by the engine's timer evaluation.
pub trait AcquirePolicy: 'static + Send + Sync + std::fmt::Debug {
    /// Called when a timer period elapsed with no progress.
    ///
    /// `first_timeout` is true iff this is the first timeout of the
    /// current no-progress run.
    fn on_timeout(&self, tick: &mut dyn AcquireTick, first_timeout: bool);

    /// Called when progress was marked within the timer period.
    fn on_progress(&self, tick: &mut dyn AcquireTick);
}

/// Trait-object [AcquirePolicy].
pub type DynAcquirePolicy = Arc<dyn AcquirePolicy>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kind_to_category() {
        assert_eq!(
            TaskCategory::LedgerData,
            AcquireKind::LedgerData.task_category(),
        );
        assert_eq!(
            TaskCategory::TxData,
            AcquireKind::TxSetData.task_category(),
        );
    }
}
