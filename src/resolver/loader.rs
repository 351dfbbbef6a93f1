use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    db::{ThreadState, ThreadStateId},
    log_debug, log_error,
};

use super::{RelatedThreadStates, Resolution, Resolver};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LoaderStatus {
    #[default]
    Empty,
    AnchorLoading {
        id: ThreadStateId,
    },
    NotFound {
        id: ThreadStateId,
    },
    NeighborhoodLoading {
        anchor: ThreadState,
    },
    Ready {
        anchor: ThreadState,
        related: RelatedThreadStates,
    },
    Failed {
        id: ThreadStateId,
        message: String,
    },
}

impl LoaderStatus {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            LoaderStatus::AnchorLoading { .. } | LoaderStatus::NeighborhoodLoading { .. }
        )
    }

    /// The finished resolution, once the request has settled on one.
    pub fn resolution(&self) -> Option<Resolution> {
        match self {
            LoaderStatus::NotFound { .. } => Some(Resolution::NotFound),
            LoaderStatus::Ready { anchor, related } => Some(Resolution::Found {
                anchor: anchor.clone(),
                related: related.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoaderSnapshot {
    pub request_id: Option<Uuid>,
    pub status: LoaderStatus,
}

#[derive(Debug, Default)]
struct LoaderState {
    request_id: Option<Uuid>,
    status: LoaderStatus,
}

/// Holds the current selection and walks it through
/// `Empty -> AnchorLoading -> (NotFound | NeighborhoodLoading -> Ready)`.
///
/// Selecting a new id starts a new request. Lookups still running for an older
/// request are left alone; whatever they produce is dropped on arrival.
#[derive(Clone)]
pub struct DetailsLoader {
    resolver: Resolver,
    state: Arc<Mutex<LoaderState>>,
}

impl DetailsLoader {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            state: Arc::new(Mutex::new(LoaderState::default())),
        }
    }

    pub async fn snapshot(&self) -> LoaderSnapshot {
        let guard = self.state.lock().await;
        LoaderSnapshot {
            request_id: guard.request_id,
            status: guard.status.clone(),
        }
    }

    pub async fn clear(&self) {
        let mut guard = self.state.lock().await;
        *guard = LoaderState::default();
    }

    /// Loads `id` as the current selection.
    ///
    /// Returns `Ok(false)` when a newer selection replaced this one before it
    /// finished. A failed lookup marks the request `Failed` and is returned as
    /// an error, unless the request was already superseded.
    pub async fn load(&self, id: ThreadStateId) -> Result<bool> {
        let request_id = self.begin(id).await;

        let anchor = match self.resolver.fetch_anchor(id).await {
            Ok(anchor) => anchor,
            Err(err) => return self.fail(request_id, id, err).await,
        };

        let Some(anchor) = anchor else {
            return Ok(self
                .advance(request_id, LoaderStatus::NotFound { id })
                .await);
        };

        let loading = LoaderStatus::NeighborhoodLoading {
            anchor: anchor.clone(),
        };
        if !self.advance(request_id, loading).await {
            return Ok(false);
        }

        match self.resolver.resolve_related(&anchor).await {
            Ok(related) => Ok(self
                .advance(request_id, LoaderStatus::Ready { anchor, related })
                .await),
            Err(err) => self.fail(request_id, id, err).await,
        }
    }

    async fn begin(&self, id: ThreadStateId) -> Uuid {
        let request_id = Uuid::new_v4();
        let mut guard = self.state.lock().await;
        *guard = LoaderState::default();
        guard.request_id = Some(request_id);
        guard.status = LoaderStatus::AnchorLoading { id };
        request_id
    }

    /// Applies `status` if `request_id` is still the current request.
    async fn advance(&self, request_id: Uuid, status: LoaderStatus) -> bool {
        let mut guard = self.state.lock().await;
        if guard.request_id != Some(request_id) {
            log_debug!("Discarding result of superseded request {request_id}");
            return false;
        }
        guard.status = status;
        true
    }

    async fn fail(&self, request_id: Uuid, id: ThreadStateId, err: anyhow::Error) -> Result<bool> {
        let failed = LoaderStatus::Failed {
            id,
            message: format!("{err:#}"),
        };
        if !self.advance(request_id, failed).await {
            return Ok(false);
        }
        log_error!("Failed to resolve thread state {id}: {err:#}");
        Err(err)
    }
}
