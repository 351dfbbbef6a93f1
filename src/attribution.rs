//! Describes who woke a thread state, and whom it woke, for presentation.

use serde::Serialize;

use crate::{
    db::{ThreadState, ThreadStateId},
    resolver::RelatedThreadStates,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WakerAttribution {
    /// Woken from interrupt context; any waker state is not meaningful.
    Interrupt,
    /// Woken by another thread state. `maybe_interrupt` is set on traces that
    /// predate interrupt context recording.
    #[serde(rename_all = "camelCase")]
    Thread {
        waker: ThreadStateId,
        name: Option<String>,
        maybe_interrupt: bool,
    },
    /// Not woken, or woken before the trace captured enough to say by whom.
    None,
}

pub fn attribute_waker(related: &RelatedThreadStates) -> WakerAttribution {
    if related.waker_interrupt_ctx == Some(true) {
        return WakerAttribution::Interrupt;
    }
    match &related.waker {
        Some(waker) => WakerAttribution::Thread {
            waker: waker.id,
            name: waker.thread.as_ref().map(|thread| thread.full_name()),
            maybe_interrupt: related.waker_interrupt_ctx.is_none(),
        },
        None => WakerAttribution::None,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WakeeEntry {
    pub id: ThreadStateId,
    /// Nanoseconds between the anchor's start and the wakee's start.
    pub offset: i64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WakeeAttribution {
    pub maybe_interrupt: bool,
    pub wakees: Vec<WakeeEntry>,
}

/// `None` when the anchor woke nobody.
pub fn attribute_wakees(
    anchor: &ThreadState,
    related: &RelatedThreadStates,
) -> Option<WakeeAttribution> {
    let first = related.wakees.first()?;
    Some(WakeeAttribution {
        maybe_interrupt: first.waker_interrupt_ctx.is_none(),
        wakees: related
            .wakees
            .iter()
            .map(|wakee| WakeeEntry {
                id: wakee.id,
                offset: wakee.ts.saturating_sub(anchor.ts),
                name: wakee.thread.as_ref().map(|thread| thread.full_name()),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ThreadInfo, Utid};

    fn state(id: i64, ts: i64) -> ThreadState {
        ThreadState {
            id: ThreadStateId(id),
            ts,
            dur: 10,
            utid: Utid(id),
            state: "R".into(),
            cpu: None,
            sched_id: None,
            priority: None,
            blocked_function: None,
            waker_id: None,
            waker_interrupt_ctx: None,
            thread: None,
        }
    }

    #[test]
    fn interrupt_flag_wins_over_waker() {
        let related = RelatedThreadStates {
            waker: Some(state(2, 0)),
            waker_interrupt_ctx: Some(true),
            ..Default::default()
        };
        assert_eq!(attribute_waker(&related), WakerAttribution::Interrupt);
    }

    #[test]
    fn waker_without_flag_may_be_interrupt() {
        let mut waker = state(2, 0);
        waker.thread = Some(ThreadInfo {
            utid: Utid(2),
            tid: Some(20),
            name: Some("binder".into()),
            process: None,
        });
        let related = RelatedThreadStates {
            waker: Some(waker),
            ..Default::default()
        };
        assert_eq!(
            attribute_waker(&related),
            WakerAttribution::Thread {
                waker: ThreadStateId(2),
                name: Some("binder [20]".into()),
                maybe_interrupt: true,
            }
        );
    }

    #[test]
    fn no_waker_and_no_flag_is_none() {
        assert_eq!(
            attribute_waker(&RelatedThreadStates::default()),
            WakerAttribution::None
        );
        let thread_flag_only = RelatedThreadStates {
            waker_interrupt_ctx: Some(false),
            ..Default::default()
        };
        assert_eq!(attribute_waker(&thread_flag_only), WakerAttribution::None);
    }

    #[test]
    fn wakees_are_offset_from_anchor() {
        let anchor = state(1, 100);
        let mut first = state(3, 130);
        first.waker_interrupt_ctx = Some(false);
        let related = RelatedThreadStates {
            wakees: vec![first, state(4, 180)],
            ..Default::default()
        };

        let wakees = attribute_wakees(&anchor, &related).unwrap();
        assert!(!wakees.maybe_interrupt);
        let offsets: Vec<_> = wakees.wakees.iter().map(|w| w.offset).collect();
        assert_eq!(offsets, vec![30, 80]);
    }

    #[test]
    fn extreme_timestamps_saturate_offset() {
        let anchor = state(1, i64::MIN);
        let related = RelatedThreadStates {
            wakees: vec![state(2, i64::MAX)],
            ..Default::default()
        };

        let wakees = attribute_wakees(&anchor, &related).unwrap();
        assert_eq!(wakees.wakees[0].offset, i64::MAX);
    }

    #[test]
    fn no_wakees_yields_nothing() {
        assert!(attribute_wakees(&state(1, 0), &RelatedThreadStates::default()).is_none());
    }
}
