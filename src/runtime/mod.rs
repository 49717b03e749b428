//! Node runtimes.
//!
//! Each node runs its periodic tasks cooperatively on one
//! `edge_executor::LocalExecutor`, with `async-io-mini` timers providing
//! the wake-ups.  Threads outside the executor (MQTT receive, a resource
//! transport) talk to the tasks through [`crate::channels`].
//!
//! ```text
//!  connectivity task ──writes──▶ SharedConnection ──┐
//!  simulation task   ──writes──▶ SharedDeviceState ─┼──reads──▶ indicator task
//!  command handlers  ──writes──▶ SharedDeviceState ─┘
//! ```

pub mod cvd;
pub mod glucose;

use core::time::Duration;

use async_io_mini::Timer;

use crate::fsm::StateSet;
use crate::state::{ConnectionState, SharedConnection};

/// Executor shared by both nodes.  Eight task slots is ample for either.
pub type Executor<'a> = edge_executor::LocalExecutor<'a, 8>;

/// Drive every task spawned on `executor`.  Never returns.
pub fn run_forever(executor: &Executor<'_>) {
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}

/// Reactor-driven sleep.
pub async fn sleep(duration: Duration) {
    Timer::after(duration).await;
}

/// Publish a connectivity machine's state for the indicator task.
pub(crate) fn publish_connection<S: StateSet>(connection: &SharedConnection, state: S, online: bool) {
    connection.set(ConnectionState {
        state: state.name(),
        online,
    });
}
