//! Session store
//!
//! The explicit registry of loaded sessions, owned by the engine and passed
//! by reference instead of living in a process-wide map. Each
//! [`SessionSlot`] carries the in-flight marker that makes phases mutually
//! exclusive: an atomic compare-and-set, so a conflicting request fails fast
//! instead of queueing behind the running phase.

use crate::use_cases::cost_ledger::CostLedger;
use crate::use_cases::peer_review::LiveReviews;
use crate::use_cases::progress_tracker::ProgressTracker;
use council_domain::{ModelPricing, PhaseKind, SessionId, SessionState};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

const IDLE: u8 = 0;
const DISCARD: u8 = u8::MAX;

/// What currently holds a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Phase(PhaseKind),
    Discard,
}

impl Claim {
    fn from_code(code: u8) -> Self {
        PhaseKind::from_code(code)
            .map(Claim::Phase)
            .unwrap_or(Claim::Discard)
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Claim::Phase(kind) => write!(f, "{}", kind),
            Claim::Discard => write!(f, "discard"),
        }
    }
}

/// One loaded session
pub struct SessionSlot {
    id: SessionId,
    state: RwLock<SessionState>,
    in_flight: AtomicU8,
    ledger: Arc<CostLedger>,
    cancel: Mutex<Option<CancellationToken>>,
    tracker: Mutex<Option<ProgressTracker>>,
    live_reviews: LiveReviews,
}

impl SessionSlot {
    pub fn new(state: SessionState, pricing: ModelPricing) -> Self {
        Self {
            id: state.id.clone(),
            ledger: Arc::new(CostLedger::with_totals(pricing, state.cost)),
            state: RwLock::new(state),
            in_flight: AtomicU8::new(IDLE),
            cancel: Mutex::new(None),
            tracker: Mutex::new(None),
            live_reviews: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Read the state. The lock is never held across an await point.
    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Swap in a state that has already been persisted
    pub fn replace(&self, state: SessionState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }

    pub fn snapshot(&self) -> SessionState {
        self.read(SessionState::clone)
    }

    pub fn ledger(&self) -> Arc<CostLedger> {
        self.ledger.clone()
    }

    /// The phase currently running, if any. A held discard is not a phase.
    pub fn in_flight(&self) -> Option<PhaseKind> {
        PhaseKind::from_code(self.in_flight.load(Ordering::Acquire))
    }

    /// Claim the session for `kind`.
    ///
    /// Fails with whatever already holds the session. The claim is released
    /// when the returned guard is dropped.
    pub fn try_begin(self: &Arc<Self>, kind: PhaseKind) -> Result<PhaseGuard, Claim> {
        match self
            .in_flight
            .compare_exchange(IDLE, kind.code(), Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                let token = CancellationToken::new();
                *self.cancel.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
                Ok(PhaseGuard {
                    slot: self.clone(),
                    kind,
                    token,
                })
            }
            Err(code) => Err(Claim::from_code(code)),
        }
    }

    /// Claim the session for removal. No phase can start until the guard
    /// is dropped.
    pub fn try_discard(self: &Arc<Self>) -> Result<DiscardGuard, Claim> {
        self.in_flight
            .compare_exchange(IDLE, DISCARD, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| DiscardGuard { slot: self.clone() })
            .map_err(Claim::from_code)
    }

    /// Trip the cancellation token of the running phase.
    ///
    /// Returns `false` when nothing is in flight.
    pub fn cancel(&self) -> bool {
        match self.cancel.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn set_tracker(&self, tracker: Option<ProgressTracker>) {
        *self.tracker.lock().unwrap_or_else(|e| e.into_inner()) = tracker;
    }

    /// Tracker of the running phase, if it reports progress
    pub fn tracker(&self) -> Option<ProgressTracker> {
        self.tracker.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn live_reviews(&self) -> LiveReviews {
        self.live_reviews.clone()
    }
}

/// Exclusive claim on a session for one phase
pub struct PhaseGuard {
    slot: Arc<SessionSlot>,
    kind: PhaseKind,
    token: CancellationToken,
}

impl PhaseGuard {
    pub fn kind(&self) -> PhaseKind {
        self.kind
    }

    pub fn slot(&self) -> &Arc<SessionSlot> {
        &self.slot
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        *self.slot.cancel.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.slot.set_tracker(None);
        self.slot.in_flight.store(IDLE, Ordering::Release);
    }
}

/// Exclusive claim on a session while it is being discarded
pub struct DiscardGuard {
    slot: Arc<SessionSlot>,
}

impl Drop for DiscardGuard {
    fn drop(&mut self) {
        self.slot.in_flight.store(IDLE, Ordering::Release);
    }
}

/// Registry of loaded sessions
#[derive(Default)]
pub struct SessionStore {
    slots: Mutex<HashMap<SessionId, Arc<SessionSlot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<SessionSlot>> {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    /// Insert a slot, keeping the existing one if the session is already loaded
    pub fn insert(&self, slot: SessionSlot) -> Arc<SessionSlot> {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(slot.id().clone())
            .or_insert_with(|| Arc::new(slot))
            .clone()
    }

    pub fn remove(&self, id: &SessionId) -> Option<Arc<SessionSlot>> {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
