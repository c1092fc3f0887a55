//! Acquire is the peerset module for fetching a content-addressed
//! object from a swarm of peers.
//!
//! One [Acquire] instance exists per in-flight target. The owning sync
//! layer constructs it, feeds it peers and progress signals from inbound
//! responses, and drops it once it observes completion or decides to
//! abandon the acquisition.
//!
//! It consists of multiple parts:
//! - A locked state bundle tracking the peer set, the consecutive
//!   timeout count, the request mode and the terminal flags.
//! - A retry timer task that re-fires every `timer_interval_ms` for as
//!   long as the engine is active. Fires never run acquisition logic on
//!   the timer context; evaluation is dispatched through the injected
//!   [TaskQueue] under the category of the engine's [AcquireKind], and
//!   is deferred entirely when that category is saturated.
//! - Request fan-out that sends a targeted request to a single peer in
//!   passive mode and broadcasts to the whole set in aggressive mode.
//!   Peer snapshots are taken under the lock and sends happen outside
//!   it, so the lock is never held across network calls.
//! - An [AcquirePolicy] chosen at construction that decides what a
//!   timeout or progress means: escalate, re-request, or give up.

use peerset_api::*;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;

mod escalate;
pub use escalate::*;

mod tick;
use tick::{TickCx, TickDirectives};

/// The module name acquisition config is registered under.
pub const ACQUIRE_MOD_NAME: &str = "acquire";

/// Acquire configuration types.
pub mod config {
    use peerset_api::AcquireKind;

    /// Configuration parameters for [Acquire](super::Acquire) instances.
    ///
    /// Register defaults with
    /// [Config::add_default_module_config](peerset_api::config::Config::add_default_module_config)
    /// under [ACQUIRE_MOD_NAME](super::ACQUIRE_MOD_NAME).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct AcquireConfig {
        /// The fixed retry period in milliseconds. Must be greater than
        /// 10 and less than 30000. Default: 250.
        pub timer_interval_ms: u32,

        /// Pending-count admission limit for ledger-data timer work.
        /// When the ledger-data task category holds more pending work
        /// than this, a timer fire re-arms without submitting anything.
        /// `None` disables the check. Default: 4.
        pub ledger_admission_limit: Option<u32>,

        /// Pending-count admission limit for transaction-set timer
        /// work. Default: `None` (no admission check).
        pub tx_admission_limit: Option<u32>,

        /// Consecutive timeouts after which the standard policy declares
        /// the acquisition failed. Default: 8.
        pub fail_after_timeouts: u32,

        /// Consecutive timeouts after which the standard policy switches
        /// to aggressive (broadcast) mode. Default: 2.
        pub aggressive_after_timeouts: u32,
    }

    impl Default for AcquireConfig {
        fn default() -> Self {
            Self {
                timer_interval_ms: 250,
                ledger_admission_limit: Some(4),
                tx_admission_limit: None,
                fail_after_timeouts: 8,
                aggressive_after_timeouts: 2,
            }
        }
    }

    impl AcquireConfig {
        /// Get the retry period as a [std::time::Duration].
        pub fn timer_interval(&self) -> std::time::Duration {
            std::time::Duration::from_millis(self.timer_interval_ms as u64)
        }

        /// The admission limit that applies to an acquisition kind.
        pub fn admission_limit(&self, kind: AcquireKind) -> Option<u32> {
            match kind {
                AcquireKind::LedgerData => self.ledger_admission_limit,
                AcquireKind::TxSetData => self.tx_admission_limit,
            }
        }
    }

    impl peerset_api::config::ModConfig for AcquireConfig {}
}

pub use config::*;

// Exclusive bounds on the retry interval. Below the lower bound the
// timer degenerates into a busy-loop, above the upper bound an
// acquisition silently stalls.
const MIN_TIMER_INTERVAL: Duration = Duration::from_millis(10);
const MAX_TIMER_INTERVAL: Duration = Duration::from_millis(30_000);

#[derive(Debug)]
pub(crate) struct State {
    /// Peers believed to hold the target, with a count of targeted
    /// requests issued toward each.
    pub(crate) peers: HashMap<PeerId, u32>,
    pub(crate) timeouts: u32,
    pub(crate) complete: bool,
    pub(crate) failed: bool,
    pub(crate) aggressive: bool,
    pub(crate) progress: bool,
    pub(crate) last_action: Timestamp,
    pub(crate) timer: Option<AbortHandle>,
}

impl State {
    fn new() -> Self {
        Self {
            peers: HashMap::new(),
            timeouts: 0,
            complete: false,
            failed: false,
            aggressive: false,
            progress: false,
            last_action: Timestamp::now(),
            timer: None,
        }
    }

    pub(crate) fn is_done(&self) -> bool {
        self.complete || self.failed
    }
}

/// An in-flight acquisition of one content-addressed object.
///
/// Safe under true parallelism: inbound response handlers and timer
/// evaluations may call into it from any thread. Once the engine is
/// complete or failed it stops re-arming its timer and every further
/// send becomes a no-op, so the owner can drop it at any time.
#[derive(Debug)]
pub struct Acquire {
    target: ObjectId,
    kind: AcquireKind,
    interval: Duration,
    admission_limit: Option<u32>,
    peer_registry: DynPeerRegistry,
    task_queue: DynTaskQueue,
    policy: DynAcquirePolicy,
    pub(crate) state: Mutex<State>,
    weak: Weak<Acquire>,
}

impl Acquire {
    /// Construct a new acquisition engine for `target`.
    ///
    /// Errors if the configured timer interval is outside the exclusive
    /// (10ms, 30s) bound. Out-of-range intervals are refused, never
    /// clamped.
    ///
    /// The engine is passive until [Acquire::start] arms its timer.
    pub fn new(
        target: ObjectId,
        kind: AcquireKind,
        config: AcquireConfig,
        peer_registry: DynPeerRegistry,
        task_queue: DynTaskQueue,
        policy: DynAcquirePolicy,
    ) -> PsResult<Arc<Self>> {
        let interval = config.timer_interval();
        if interval <= MIN_TIMER_INTERVAL || interval >= MAX_TIMER_INTERVAL {
            return Err(PsError::other(format!(
                "timer interval {}ms out of bounds, must be within (10, 30000)",
                config.timer_interval_ms,
            )));
        }

        Ok(Arc::new_cyclic(|weak| Self {
            target,
            kind,
            interval,
            admission_limit: config.admission_limit(kind),
            peer_registry,
            task_queue,
            policy,
            state: Mutex::new(State::new()),
            weak: weak.clone(),
        }))
    }

    /// Construct an engine wired with the standard [EscalatingPolicy]
    /// derived from the same config.
    pub fn with_standard_policy(
        target: ObjectId,
        kind: AcquireKind,
        config: AcquireConfig,
        peer_registry: DynPeerRegistry,
        task_queue: DynTaskQueue,
    ) -> PsResult<Arc<Self>> {
        let policy = Arc::new(EscalatingPolicy::from_config(&config));
        Self::new(target, kind, config, peer_registry, task_queue, policy)
    }

    /// The content identifier being acquired.
    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    /// The acquisition kind of this engine.
    pub fn kind(&self) -> AcquireKind {
        self.kind
    }

    /// Arm the first retry timer. Call once after construction.
    pub fn start(&self) {
        self.arm_timer();
    }

    /// Register that a peer may hold the target.
    ///
    /// Returns true only if this peer was not already in the set.
    /// A newly-seen peer is immediately sent a targeted request so it
    /// contributes without waiting for the next timer fire.
    pub fn note_peer_has(&self, peer: PeerId) -> bool {
        let newly_seen = {
            let mut state = self.state.lock().unwrap();
            match state.peers.entry(peer.clone()) {
                Entry::Occupied(_) => false,
                Entry::Vacant(v) => {
                    v.insert(0);
                    true
                }
            }
        };

        if newly_seen {
            tracing::debug!("peer {peer} may have {}", self.target);
            self.send_request(Some(&peer));
        }

        newly_seen
    }

    /// Remove a peer from the set, e.g. because it reported it cannot
    /// serve the data or disconnected. Safe if absent.
    pub fn note_peer_bad(&self, peer: &PeerId) {
        self.state.lock().unwrap().peers.remove(peer);
    }

    /// Count of peers in the set that are still resolvable through the
    /// peer registry. Unresolvable peers stay in the set; removal only
    /// ever happens through [Acquire::note_peer_bad].
    pub fn reachable_peer_count(&self) -> usize {
        self.peer_snapshot()
            .iter()
            .filter(|peer| self.peer_registry.resolve(peer).is_some())
            .count()
    }

    /// Replace this engine's peer set with a copy of another engine's,
    /// used when a superseded acquisition for an overlapping target is
    /// merged into this one. Returns the count adopted.
    pub fn adopt_peers_from(&self, other: &Acquire) -> usize {
        let peers = other.peer_snapshot();

        let mut state = self.state.lock().unwrap();
        state.peers.clear();
        for peer in peers {
            state.peers.insert(peer, 0);
        }
        state.peers.len()
    }

    /// Send the object request for this target.
    ///
    /// With a peer given, the request goes to that peer alone and is
    /// silently dropped if the peer is no longer connected. With no
    /// peer, it is broadcast to every peer in the set that still
    /// resolves; unresolvable peers are skipped, not removed.
    ///
    /// No-op once the engine is complete or failed.
    pub fn send_request(&self, peer: Option<&PeerId>) {
        let request = ObjectRequest {
            target: self.target.clone(),
            interval_hint_ms: self.interval.as_millis() as u32,
        };

        match peer {
            Some(peer) => {
                {
                    let mut state = self.state.lock().unwrap();
                    if state.is_done() {
                        return;
                    }
                    if let Some(count) = state.peers.get_mut(peer) {
                        *count += 1;
                    }
                }
                self.send_to_peer(peer, request);
            }
            None => {
                let peers = {
                    let state = self.state.lock().unwrap();
                    if state.is_done() {
                        return;
                    }
                    state.peers.keys().cloned().collect::<Vec<_>>()
                };
                for peer in peers {
                    self.send_to_peer(&peer, request.clone());
                }
            }
        }
    }

    /// Resolve and send with the engine lock released. Peer churn is
    /// expected, so an unresolvable peer or a failed enqueue is logged
    /// and absorbed, never surfaced.
    fn send_to_peer(&self, peer: &PeerId, request: ObjectRequest) {
        match self.peer_registry.resolve(peer) {
            Some(connection) => {
                if let Err(err) = connection.send_request(request) {
                    tracing::debug!(
                        "could not send request for {} to peer {peer}: {err}",
                        self.target,
                    );
                }
            }
            None => {
                tracing::trace!("peer {peer} no longer connected, skipping");
            }
        }
    }

    /// Note that new data attributable to this target arrived. Whether
    /// the response completes the object is the owner's completion
    /// predicate's concern, not this engine's.
    pub fn mark_progress(&self) {
        let mut state = self.state.lock().unwrap();
        state.progress = true;
        state.last_action = Timestamp::now();
    }

    /// Terminal transition: the object is fully assembled. Idempotent.
    pub fn mark_complete(&self) {
        let timer = {
            let mut state = self.state.lock().unwrap();
            state.complete = true;
            state.timer.take()
        };
        if let Some(timer) = timer {
            timer.abort();
        }
    }

    /// Terminal transition: the acquisition is abandoned. Idempotent.
    pub fn mark_failed(&self) {
        let timer = {
            let mut state = self.state.lock().unwrap();
            state.failed = true;
            state.timer.take()
        };
        if let Some(timer) = timer {
            timer.abort();
        }
    }

    /// True iff neither complete nor failed. The owner uses this to
    /// decide whether to keep routing inbound responses here.
    pub fn is_active(&self) -> bool {
        !self.state.lock().unwrap().is_done()
    }

    /// True once [Acquire::mark_complete] has been called.
    pub fn is_complete(&self) -> bool {
        self.state.lock().unwrap().complete
    }

    /// True once the engine has failed.
    pub fn is_failed(&self) -> bool {
        self.state.lock().unwrap().failed
    }

    /// Whether the engine is in escalated (broadcast) request mode.
    pub fn is_aggressive(&self) -> bool {
        self.state.lock().unwrap().aggressive
    }

    /// Whether progress has been marked since the last timer evaluation.
    pub fn is_progressing(&self) -> bool {
        self.state.lock().unwrap().progress
    }

    /// Consecutive timer fires without progress.
    pub fn timeouts(&self) -> u32 {
        self.state.lock().unwrap().timeouts
    }

    /// Time of construction or last marked progress, for external
    /// staleness queries.
    pub fn last_action(&self) -> Timestamp {
        self.state.lock().unwrap().last_action
    }

    /// Arm the retry timer for one period from now. The timer task
    /// holds only a weak back-reference, so an engine dropped by its
    /// owner turns any still-pending fire into a no-op.
    fn arm_timer(&self) {
        let weak = self.weak.clone();
        let interval = self.interval;
        let handle = tokio::task::spawn(async move {
            tokio::time::sleep(interval).await;
            if let Some(acquire) = weak.upgrade() {
                acquire.timer_fired();
            }
        })
        .abort_handle();

        let mut state = self.state.lock().unwrap();
        if state.is_done() {
            // lost a race against a terminal transition
            handle.abort();
            return;
        }
        if let Some(old) = state.timer.replace(handle) {
            old.abort();
        }
    }

    /// A timer fire never runs acquisition logic on the timer context.
    /// Evaluation is submitted to the task queue under this engine's
    /// category, unless the category is saturated, in which case the
    /// fire only re-arms the timer and backs off without consuming a
    /// task slot.
    fn timer_fired(&self) {
        let category = self.kind.task_category();

        if let Some(limit) = self.admission_limit {
            let pending = self.task_queue.pending_count(category);
            if pending > limit as usize {
                tracing::debug!(
                    "deferring timer for {} due to load ({pending} pending {category})",
                    self.target,
                );
                self.arm_timer();
                return;
            }
        }

        let weak = self.weak.clone();
        let task: Task = Box::pin(async move {
            if let Some(acquire) = weak.upgrade() {
                acquire.evaluate_timer();
            }
        });

        if let Err(err) = self.task_queue.submit(category, "acquire_timer", task)
        {
            tracing::warn!(
                "could not submit timer evaluation for {}: {err}",
                self.target,
            );
            self.arm_timer();
        }
    }

    /// One pass of the retry state machine, run on the task queue.
    ///
    /// Fires for one engine are strictly serialized: the timer is only
    /// re-armed here, after the previous evaluation has completed and
    /// decided to continue.
    fn evaluate_timer(&self) {
        let directives = {
            let mut state = self.state.lock().unwrap();

            // the timer may race the completing event
            if state.is_done() {
                return;
            }

            let mut directives = TickDirectives::default();
            if !state.progress {
                state.timeouts += 1;
                tracing::warn!(
                    "timeout({}) pc={} acquiring {}",
                    state.timeouts,
                    state.peers.len(),
                    self.target,
                );
                let first_timeout = state.timeouts == 1;
                let mut tick = TickCx::new(self, &mut state, &mut directives);
                self.policy.on_timeout(&mut tick, first_timeout);
            } else {
                state.progress = false;
                let mut tick = TickCx::new(self, &mut state, &mut directives);
                self.policy.on_progress(&mut tick);
            }

            if state.is_done() {
                // the policy gave up; requested sends are dropped and
                // the timer is not re-armed
                if let Some(timer) = state.timer.take() {
                    timer.abort();
                }
                return;
            }

            directives
        };

        // sends happen with the lock released
        if directives.broadcast {
            self.send_request(None);
        } else if directives.request_one {
            if let Some(peer) = self.pick_reachable_peer() {
                self.send_request(Some(&peer));
            }
        }

        self.arm_timer();
    }

    fn peer_snapshot(&self) -> Vec<PeerId> {
        self.state.lock().unwrap().peers.keys().cloned().collect()
    }

    fn pick_reachable_peer(&self) -> Option<PeerId> {
        self.peer_snapshot()
            .into_iter()
            .find(|peer| self.peer_registry.resolve(peer).is_some())
    }
}

impl Drop for Acquire {
    fn drop(&mut self) {
        // cancellation here is an optimization; a fire that slips
        // through resolves a dead weak reference and does nothing
        if let Some(timer) = self.state.lock().unwrap().timer.take() {
            timer.abort();
        }
    }
}
