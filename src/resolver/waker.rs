//! Decides which record supplies the waker of a thread state.
//!
//! A wakeup is recorded on the runnable interval it ends, not on the running
//! interval that follows. A running interval with no waker of its own therefore
//! inherits the one recorded on its immediate predecessor. The lookup goes back
//! exactly one interval.

use serde::Serialize;

use crate::db::{ThreadState, ThreadStateId};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WakerOrigin {
    /// The anchor recorded its own waker.
    Anchor,
    /// Inherited from the previous interval of a running anchor.
    Previous,
    /// No waker is known. The interrupt flag may still be.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakerSource {
    pub origin: WakerOrigin,
    pub waker_id: Option<ThreadStateId>,
    pub interrupt_ctx: Option<bool>,
}

/// First step: the anchor's own waker, if it recorded one.
pub fn own_waker(anchor: &ThreadState) -> Option<WakerSource> {
    anchor.waker_id.map(|waker_id| WakerSource {
        origin: WakerOrigin::Anchor,
        waker_id: Some(waker_id),
        interrupt_ctx: anchor.waker_interrupt_ctx,
    })
}

/// Second step: a running anchor takes the waker of the interval before it.
pub fn inherited_waker(
    anchor: &ThreadState,
    prev: Option<&ThreadState>,
    running_state: &str,
) -> Option<WakerSource> {
    if !anchor.is_running(running_state) {
        return None;
    }
    let prev = prev?;
    prev.waker_id.map(|waker_id| WakerSource {
        origin: WakerOrigin::Previous,
        waker_id: Some(waker_id),
        interrupt_ctx: prev.waker_interrupt_ctx,
    })
}

/// Applies the two steps in order. When neither yields a waker the anchor's
/// own interrupt flag is kept, since an interrupt taken in the idle context
/// leaves a flag without a waking thread state.
pub fn choose_waker_source(
    anchor: &ThreadState,
    prev: Option<&ThreadState>,
    running_state: &str,
) -> WakerSource {
    own_waker(anchor)
        .or_else(|| inherited_waker(anchor, prev, running_state))
        .unwrap_or(WakerSource {
            origin: WakerOrigin::Unknown,
            waker_id: None,
            interrupt_ctx: anchor.waker_interrupt_ctx,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Utid;

    fn state(id: i64, ts: i64, dur: i64, code: &str) -> ThreadState {
        ThreadState {
            id: ThreadStateId(id),
            ts,
            dur,
            utid: Utid(1),
            state: code.to_string(),
            cpu: None,
            sched_id: None,
            priority: None,
            blocked_function: None,
            waker_id: None,
            waker_interrupt_ctx: None,
            thread: None,
        }
    }

    fn woken(mut s: ThreadState, waker: i64, irq: Option<bool>) -> ThreadState {
        s.waker_id = Some(ThreadStateId(waker));
        s.waker_interrupt_ctx = irq;
        s
    }

    #[test]
    fn own_waker_takes_priority_over_previous() {
        let anchor = woken(state(5, 100, 50, "Running"), 9, Some(true));
        let prev = woken(state(4, 80, 20, "R"), 2, Some(false));

        let source = choose_waker_source(&anchor, Some(&prev), "Running");
        assert_eq!(source.origin, WakerOrigin::Anchor);
        assert_eq!(source.waker_id, Some(ThreadStateId(9)));
        assert_eq!(source.interrupt_ctx, Some(true));
    }

    #[test]
    fn running_anchor_inherits_from_previous() {
        let anchor = state(5, 100, 50, "Running");
        let prev = woken(state(4, 80, 20, "R"), 2, Some(false));

        let source = choose_waker_source(&anchor, Some(&prev), "Running");
        assert_eq!(source.origin, WakerOrigin::Previous);
        assert_eq!(source.waker_id, Some(ThreadStateId(2)));
        assert_eq!(source.interrupt_ctx, Some(false));
    }

    #[test]
    fn non_running_anchor_does_not_inherit() {
        let anchor = state(5, 100, 50, "S");
        let prev = woken(state(4, 80, 20, "R"), 2, Some(false));

        let source = choose_waker_source(&anchor, Some(&prev), "Running");
        assert_eq!(source.origin, WakerOrigin::Unknown);
        assert_eq!(source.waker_id, None);
    }

    #[test]
    fn interrupt_flag_survives_without_waker() {
        let mut anchor = state(5, 100, 50, "R");
        anchor.waker_interrupt_ctx = Some(true);

        let source = choose_waker_source(&anchor, None, "Running");
        assert_eq!(source.origin, WakerOrigin::Unknown);
        assert_eq!(source.waker_id, None);
        assert_eq!(source.interrupt_ctx, Some(true));
    }

    #[test]
    fn previous_without_waker_keeps_anchor_flag() {
        let mut anchor = state(5, 100, 50, "Running");
        anchor.waker_interrupt_ctx = Some(false);
        let mut prev = state(4, 80, 20, "R");
        prev.waker_interrupt_ctx = Some(true);

        let source = choose_waker_source(&anchor, Some(&prev), "Running");
        assert_eq!(source.origin, WakerOrigin::Unknown);
        assert_eq!(source.interrupt_ctx, Some(false));
    }

    #[test]
    fn configured_running_code_is_respected() {
        let anchor = state(5, 100, 50, "Running");
        let prev = woken(state(4, 80, 20, "R"), 2, None);

        assert!(inherited_waker(&anchor, Some(&prev), "running").is_none());
        assert!(inherited_waker(&anchor, Some(&prev), "Running").is_some());
    }
}
