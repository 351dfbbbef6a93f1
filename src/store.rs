//! Read-only access to thread states, as seen by the resolver.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use crate::db::{Database, ThreadState, ThreadStateId, ThreadStateQuery};

/// Source of thread-state rows. Implementations must tolerate concurrent reads.
#[async_trait]
pub trait ThreadStateStore: Send + Sync {
    async fn get_by_id(&self, id: ThreadStateId) -> Result<Option<ThreadState>>;

    async fn get_where(&self, query: &ThreadStateQuery) -> Result<Vec<ThreadState>>;
}

#[async_trait]
impl ThreadStateStore for Database {
    async fn get_by_id(&self, id: ThreadStateId) -> Result<Option<ThreadState>> {
        self.get_thread_state(id).await
    }

    async fn get_where(&self, query: &ThreadStateQuery) -> Result<Vec<ThreadState>> {
        self.get_thread_states_where(query).await
    }
}

/// Thread states held in a vector, filtered on every call. Rows come back in
/// insertion order unless the query asks for time order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    states: Vec<ThreadState>,
    queries: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(states: Vec<ThreadState>) -> Self {
        Self {
            states,
            queries: AtomicUsize::new(0),
        }
    }

    /// Number of lookups served so far.
    pub fn queries_issued(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThreadStateStore for InMemoryStore {
    async fn get_by_id(&self, id: ThreadStateId) -> Result<Option<ThreadState>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.states.iter().find(|state| state.id == id).cloned())
    }

    async fn get_where(&self, query: &ThreadStateQuery) -> Result<Vec<ThreadState>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let mut matched: Vec<ThreadState> = self
            .states
            .iter()
            .filter(|state| query.matches(state))
            .cloned()
            .collect();

        if query.order_by_ts {
            matched.sort_by_key(|state| (state.ts, state.id));
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }
}
