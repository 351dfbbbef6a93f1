//! Reconstructs the scheduling neighborhood of one thread state.
//!
//! Given an anchor id the resolver looks up the anchor, then:
//! - `prev`: the state on the same thread ending where the anchor starts,
//! - `next`: the state on the same thread starting where the anchor ends,
//! - `waker`: see [`waker::choose_waker_source`],
//! - `wakees`: states woken by the anchor outside interrupt context.
//!
//! `prev`, `next` and `wakees` are fetched concurrently. The waker is fetched
//! alongside `prev` when the anchor recorded it, and after `prev` otherwise.
//! Any failed lookup fails the whole resolution.

pub mod loader;
pub mod waker;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    db::{Constraint, ThreadState, ThreadStateId, ThreadStateQuery},
    log_debug, log_warn,
    settings::ResolverSettings,
    store::ThreadStateStore,
};

pub use loader::{DetailsLoader, LoaderSnapshot, LoaderStatus};
pub use waker::{choose_waker_source, WakerOrigin, WakerSource};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RelatedThreadStates {
    pub prev: Option<ThreadState>,
    pub next: Option<ThreadState>,
    pub waker: Option<ThreadState>,
    /// Interrupt flag of whichever record supplied the waker. Can be known
    /// even when `waker` is not.
    pub waker_interrupt_ctx: Option<bool>,
    pub waker_origin: Option<WakerOrigin>,
    /// Ascending by start time.
    pub wakees: Vec<ThreadState>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Resolution {
    NotFound,
    Found {
        anchor: ThreadState,
        related: RelatedThreadStates,
    },
}

impl Resolution {
    pub fn anchor(&self) -> Option<&ThreadState> {
        match self {
            Resolution::NotFound => None,
            Resolution::Found { anchor, .. } => Some(anchor),
        }
    }

    pub fn related(&self) -> Option<&RelatedThreadStates> {
        match self {
            Resolution::NotFound => None,
            Resolution::Found { related, .. } => Some(related),
        }
    }
}

#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn ThreadStateStore>,
    settings: ResolverSettings,
}

impl Resolver {
    pub fn new(store: Arc<dyn ThreadStateStore>, settings: ResolverSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub async fn resolve(&self, id: ThreadStateId) -> Result<Resolution> {
        let Some(anchor) = self.fetch_anchor(id).await? else {
            log_debug!("Thread state {id} not found");
            return Ok(Resolution::NotFound);
        };

        let related = self.resolve_related(&anchor).await?;
        Ok(Resolution::Found { anchor, related })
    }

    pub async fn fetch_anchor(&self, id: ThreadStateId) -> Result<Option<ThreadState>> {
        self.store
            .get_by_id(id)
            .await
            .with_context(|| format!("failed to look up thread state {id}"))
    }

    pub async fn resolve_related(&self, anchor: &ThreadState) -> Result<RelatedThreadStates> {
        let ((prev, waker, source), next, wakees) = tokio::try_join!(
            self.prev_and_waker(anchor),
            self.next_state(anchor),
            self.wakees(anchor),
        )?;

        Ok(RelatedThreadStates {
            prev,
            next,
            waker,
            waker_interrupt_ctx: source.interrupt_ctx,
            waker_origin: Some(source.origin),
            wakees,
        })
    }

    async fn prev_and_waker(
        &self,
        anchor: &ThreadState,
    ) -> Result<(Option<ThreadState>, Option<ThreadState>, WakerSource)> {
        if let Some(source) = waker::own_waker(anchor) {
            let (prev, waker) =
                tokio::try_join!(self.prev_state(anchor), self.fetch_waker(&source))?;
            return Ok((prev, waker, source));
        }

        let prev = self.prev_state(anchor).await?;
        let source = choose_waker_source(anchor, prev.as_ref(), &self.settings.running_state);
        let waker = self.fetch_waker(&source).await?;
        Ok((prev, waker, source))
    }

    async fn prev_state(&self, anchor: &ThreadState) -> Result<Option<ThreadState>> {
        let query = ThreadStateQuery::new()
            .with(Constraint::EndsAt(anchor.ts))
            .with(Constraint::OnThread(anchor.utid))
            .limit(self.settings.adjacency_probe_limit);
        self.adjacent(anchor, "previous", query).await
    }

    async fn next_state(&self, anchor: &ThreadState) -> Result<Option<ThreadState>> {
        let query = ThreadStateQuery::new()
            .with(Constraint::StartsAt(anchor.end_ts()))
            .with(Constraint::OnThread(anchor.utid))
            .limit(self.settings.adjacency_probe_limit);
        self.adjacent(anchor, "next", query).await
    }

    /// Intervals of one thread never overlap, so at most one row should match.
    /// Extra rows are reported and the first one wins.
    async fn adjacent(
        &self,
        anchor: &ThreadState,
        direction: &str,
        query: ThreadStateQuery,
    ) -> Result<Option<ThreadState>> {
        let matches = self
            .store
            .get_where(&query)
            .await
            .with_context(|| format!("failed to find {direction} state of {}", anchor.id))?;

        if matches.len() > 1 {
            log_warn!(
                "Thread {} has {} candidate {direction} states for {}; overlapping intervals in trace",
                anchor.utid,
                matches.len(),
                anchor.id
            );
        }
        Ok(matches.into_iter().next())
    }

    async fn fetch_waker(&self, source: &WakerSource) -> Result<Option<ThreadState>> {
        let Some(waker_id) = source.waker_id else {
            return Ok(None);
        };
        self.store
            .get_by_id(waker_id)
            .await
            .with_context(|| format!("failed to look up waker {waker_id}"))
    }

    async fn wakees(&self, anchor: &ThreadState) -> Result<Vec<ThreadState>> {
        let query = ThreadStateQuery::new()
            .with(Constraint::WokenBy(anchor.id))
            .with(Constraint::NotInterruptWakeup)
            .ordered_by_ts();
        self.store
            .get_where(&query)
            .await
            .with_context(|| format!("failed to find states woken by {}", anchor.id))
    }
}
