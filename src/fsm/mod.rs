//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern, generic over the state set and the
//! context it drives:
//!
//! ```text
//!  [StateDescriptor<S, C>; N]   (indexed by S::index)
//!  ┌─────────────┬────────────┬────────────┬─────────────────────┐
//!  │ id          │ on_enter   │ on_exit    │ on_update           │
//!  ├─────────────┼────────────┼────────────┼─────────────────────┤
//!  │ LinkCheck   │ fn(&mut C) │ fn(&mut C) │ fn(&mut C) -> Opt<S>│
//!  │ Registering │ ...        │ ...        │ ...                 │
//!  └─────────────┴────────────┴────────────┴─────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  Handlers never perform I/O: they record the work
//! they want done in the context, and the driver that owns the FSM
//! ([`registration::RegistrationClient`], [`session::BrokerSession`])
//! carries it out against the port traits.

pub mod registration;
pub mod session;

use core::fmt::Debug;

use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// A closed set of states that index a state table.
pub trait StateSet: Copy + Eq + Debug {
    /// Total number of states, used to size the table array.
    const COUNT: usize;

    /// Position of this state in the table.
    fn index(self) -> usize;

    /// Convert an index back to a state.  Out-of-range indices are a
    /// programming error; implementations return a terminal state.
    fn from_index(idx: usize) -> Self;

    fn name(self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn<C> = fn(&mut C);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn<S, C> = fn(&mut C) -> Option<S>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor<S, C> {
    pub id: S,
    pub on_enter: Option<StateActionFn<C>>,
    pub on_exit: Option<StateActionFn<C>>,
    pub on_update: StateUpdateFn<S, C>,
}

/// A state change reported by [`Fsm::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    pub from: S,
    pub to: S,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table; the mutable context is threaded through every
/// handler call by the caller.
pub struct Fsm<S: StateSet, C, const N: usize> {
    machine: &'static str,
    /// Fixed-size table indexed by `S::index`.
    table: [StateDescriptor<S, C>; N],
    /// Index of the currently active state.
    current: usize,
}

impl<S: StateSet, C, const N: usize> Fsm<S, C, N> {
    /// Construct a new FSM with the given state table, starting in `initial`.
    ///
    /// `machine` names the FSM in log output.
    pub fn new(machine: &'static str, table: [StateDescriptor<S, C>; N], initial: S) -> Self {
        debug_assert_eq!(N, S::COUNT, "state table size mismatch");
        debug_assert!(
            table.iter().enumerate().all(|(i, d)| d.id.index() == i),
            "state table out of order"
        );
        Self {
            machine,
            table,
            current: initial.index(),
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut C) {
        info!("{}: starting in {}", self.machine, self.current_state().name());
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut C) -> Option<Transition<S>> {
        let next = (self.table[self.current].on_update)(ctx)?;
        Some(self.transition(next, ctx))
    }

    /// The current state's identity.
    pub fn current_state(&self) -> S {
        S::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: S, ctx: &mut C) -> Transition<S> {
        let from = self.current_state();

        info!("{}: {} -> {}", self.machine, from.name(), next.name());

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next.index();

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }

        Transition { from, to: next }
    }
}
