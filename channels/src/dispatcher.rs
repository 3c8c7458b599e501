//! Admission control for the loss system.
//!
//! Responsibilities:
//! - Count arrivals and decide admit-or-reject against the channel pool.
//! - Spawn one service task per admitted request.
//! - Track system-wide idle time and the observation window.
//!
//! Everything the dispatcher owns (pool slots, counters, idle marker,
//! service handles) sits behind one `parking_lot::Mutex`. The lock is held
//! for each read-modify-write and is never held across an `.await`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument};

use crate::error::{DispatchError, PoolError};
use crate::pool::ChannelPool;
use crate::stats::{Counters, Snapshot};
use crate::types::{Admission, ChannelIndex, RequestId};

type ServiceHandle = JoinHandle<Result<(), PoolError>>;

struct State {
    pool: ChannelPool,
    counters: Counters,
    started_at: Instant,
    /// Set while every channel is idle: the instant the system last became idle.
    idle_since: Option<Instant>,
    services: Vec<ServiceHandle>,
}

impl State {
    fn touch(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.started_at);
        // Monotone even if a release observes an earlier clock reading.
        self.counters.total_elapsed = self.counters.total_elapsed.max(elapsed);
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            channels: self.pool.capacity(),
            busy: self.pool.busy_count(),
            counters: self.counters.clone(),
            busy_time: self.pool.busy_time(),
        }
    }
}

/// Routes requests to free channels, rejecting them when all are busy.
pub struct Dispatcher {
    state: Arc<Mutex<State>>,
    service_time: Duration,
    runtime: Handle,
}

impl Dispatcher {
    /// Creates a dispatcher over `channels` slots, each service holding its
    /// channel for exactly `service_time`.
    ///
    /// Must be called from inside a tokio runtime; service tasks are spawned
    /// onto it.
    pub fn new(channels: usize, service_time: Duration) -> Result<Self, DispatchError> {
        let runtime = Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;
        let pool = ChannelPool::new(channels)?;
        let now = Instant::now();

        Ok(Self {
            state: Arc::new(Mutex::new(State {
                pool,
                counters: Counters::default(),
                started_at: now,
                idle_since: Some(now),
                services: Vec::new(),
            })),
            service_time,
            runtime,
        })
    }

    pub fn service_time(&self) -> Duration {
        self.service_time
    }

    /// Submits one request. The idle-time check, the acquire attempt and
    /// the counter updates happen as one unit under the lock.
    pub fn submit(&self, id: RequestId) -> Admission {
        let mut st = self.state.lock();
        let now = Instant::now();

        st.counters.requests += 1;
        st.touch(now);
        info!(request_id = %id, busy = st.pool.busy_count(), "request arrived");

        if st.pool.is_idle() {
            if let Some(since) = st.idle_since.take() {
                st.counters.idle_time += now.saturating_duration_since(since);
            }
        }

        let Some(channel) = st.pool.try_acquire(now) else {
            st.counters.rejected += 1;
            info!(request_id = %id, "request rejected: no free channels");
            return Admission::Rejected;
        };

        st.counters.processed += 1;
        info!(request_id = %id, channel = %channel, "request admitted");

        let handle = self.runtime.spawn(serve(
            Arc::clone(&self.state),
            id,
            channel,
            self.service_time,
        ));
        st.services.push(handle);

        Admission::Admitted(channel)
    }

    pub fn busy_count(&self) -> usize {
        self.state.lock().pool.busy_count()
    }

    /// True once every channel is idle.
    pub fn drained(&self) -> bool {
        self.state.lock().pool.is_idle()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().snapshot()
    }

    /// Blocks until every channel is idle, polling every `poll`, then joins
    /// all service tasks and returns the final snapshot.
    ///
    /// There is no timeout. A service task that fails (panics, or reports a
    /// release on a free channel) ends the wait with an error instead.
    pub async fn wait_for_drain(&self, poll: Duration) -> Result<Snapshot, DispatchError> {
        loop {
            join_services(self.take_services(|h| h.is_finished())).await?;

            if self.drained() {
                break;
            }
            tokio::time::sleep(poll).await;
        }

        // Drained: whatever is left has already released its channel.
        join_services(self.take_services(|_| true)).await?;

        Ok(self.snapshot())
    }

    fn take_services(&self, pick: impl Fn(&ServiceHandle) -> bool) -> Vec<ServiceHandle> {
        let mut st = self.state.lock();
        let (taken, kept): (Vec<_>, Vec<_>) = st.services.drain(..).partition(|h| pick(h));
        st.services = kept;
        taken
    }
}

async fn join_services(handles: Vec<ServiceHandle>) -> Result<(), DispatchError> {
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(DispatchError::ServiceTask(e.to_string())),
            Err(join) => return Err(DispatchError::ServiceTask(join.to_string())),
        }
    }
    Ok(())
}

/// One service: hold `channel` for `service_time`, then give it back.
#[instrument(skip_all, fields(request_id = %id, channel = %channel))]
async fn serve(
    state: Arc<Mutex<State>>,
    id: RequestId,
    channel: ChannelIndex,
    service_time: Duration,
) -> Result<(), PoolError> {
    debug!("service started");

    tokio::time::sleep(service_time).await;

    let mut st = state.lock();
    let now = Instant::now();

    let held = st.pool.release(channel, now).inspect_err(|e| {
        error!(error = %e, "channel release failed");
    })?;

    st.touch(now);
    if st.pool.is_idle() {
        st.idle_since = Some(now);
    }

    info!(
        elapsed_ms = held.as_millis() as u64,
        busy = st.pool.busy_count(),
        "request served"
    );

    Ok(())
}
