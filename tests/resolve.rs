use std::sync::Arc;

use wakechain_lib::{
    db::{ThreadInfo, ThreadState, ThreadStateId, Utid},
    settings::ResolverSettings,
    Database, RelatedThreadStates, Resolution, Resolver,
};

fn thread(utid: i64) -> ThreadInfo {
    ThreadInfo {
        utid: Utid(utid),
        tid: Some(100 + utid),
        name: Some(format!("t{utid}")),
        process: None,
    }
}

fn state(id: i64, utid: i64, ts: i64, dur: i64, code: &str) -> ThreadState {
    ThreadState {
        id: ThreadStateId(id),
        ts,
        dur,
        utid: Utid(utid),
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

/// Three threads whose states tile [0, 300) without gaps.
fn trace() -> Vec<ThreadState> {
    let mut running = state(5, 1, 100, 50, "Running");
    running.cpu = Some(2);
    vec![
        // thread 1
        state(3, 1, 0, 80, "S"),
        woken(state(4, 1, 80, 20, "R"), 2, Some(false)),
        running,
        state(6, 1, 150, 150, "S"),
        // thread 2
        state(1, 2, 0, 60, "S"),
        state(2, 2, 60, 40, "Running"),
        woken(state(20, 2, 100, 10, "R"), 5, Some(true)),
        state(22, 2, 110, 190, "S"),
        // thread 3
        state(10, 3, 0, 120, "S"),
        woken(state(21, 3, 120, 30, "R"), 5, Some(false)),
        woken(state(23, 3, 150, 150, "R"), 5, None),
    ]
}

async fn resolver() -> (Resolver, Vec<ThreadState>) {
    let db = Database::open_in_memory().unwrap();
    db.insert_threads(&[thread(1), thread(2), thread(3)])
        .await
        .unwrap();
    let states = trace();
    db.insert_thread_states(&states).await.unwrap();
    (
        Resolver::new(Arc::new(db), ResolverSettings::default()),
        states,
    )
}

async fn resolve_found(resolver: &Resolver, id: i64) -> (ThreadState, RelatedThreadStates) {
    match resolver.resolve(ThreadStateId(id)).await.unwrap() {
        Resolution::Found { anchor, related } => (anchor, related),
        Resolution::NotFound => panic!("thread state {id} not found"),
    }
}

#[tokio::test]
async fn running_state_inherits_waker_of_preceding_runnable() {
    let (resolver, _) = resolver().await;
    let (_, related) = resolve_found(&resolver, 5).await;

    assert_eq!(related.prev.as_ref().map(|s| s.id), Some(ThreadStateId(4)));
    assert_eq!(related.waker.as_ref().map(|s| s.id), Some(ThreadStateId(2)));
    assert_eq!(related.waker_interrupt_ctx, Some(false));
    assert_eq!(
        related.waker.and_then(|w| w.thread).map(|t| t.display_name()).as_deref(),
        Some("t2 [102]")
    );
}

#[tokio::test]
async fn first_state_of_thread_has_no_previous() {
    let (resolver, _) = resolver().await;
    let (_, related) = resolve_found(&resolver, 10).await;
    assert!(related.prev.is_none());
    assert_eq!(related.next.map(|s| s.id), Some(ThreadStateId(21)));
}

#[tokio::test]
async fn interrupt_context_wakees_are_left_out() {
    let (resolver, _) = resolver().await;
    let (_, related) = resolve_found(&resolver, 5).await;
    let wakees: Vec<_> = related.wakees.iter().map(|s| s.id.0).collect();
    assert_eq!(wakees, vec![21, 23]);
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let (resolver, _) = resolver().await;
    assert_eq!(
        resolver.resolve(ThreadStateId(999)).await.unwrap(),
        Resolution::NotFound
    );
}

#[tokio::test]
async fn adjacency_is_symmetric() {
    let (resolver, states) = resolver().await;
    for state in &states {
        let (_, related) = resolve_found(&resolver, state.id.0).await;
        if let Some(prev) = related.prev {
            let (_, prev_related) = resolve_found(&resolver, prev.id.0).await;
            assert_eq!(prev_related.next.map(|s| s.id), Some(state.id));
        }
        if let Some(next) = related.next {
            let (_, next_related) = resolve_found(&resolver, next.id.0).await;
            assert_eq!(next_related.prev.map(|s| s.id), Some(state.id));
        }
    }
}

#[tokio::test]
async fn own_waker_always_wins() {
    let (resolver, states) = resolver().await;
    for state in states.iter().filter(|s| s.waker_id.is_some()) {
        let (_, related) = resolve_found(&resolver, state.id.0).await;
        assert_eq!(related.waker.map(|w| w.id), state.waker_id);
        assert_eq!(related.waker_interrupt_ctx, state.waker_interrupt_ctx);
    }
}

#[tokio::test]
async fn wakees_match_reverse_waker_relation() {
    let (resolver, states) = resolver().await;
    for anchor in &states {
        let (_, related) = resolve_found(&resolver, anchor.id.0).await;
        let mut expected: Vec<_> = states
            .iter()
            .filter(|s| s.waker_id == Some(anchor.id) && s.waker_interrupt_ctx != Some(true))
            .map(|s| (s.ts, s.id))
            .collect();
        expected.sort();

        let actual: Vec<_> = related.wakees.iter().map(|s| (s.ts, s.id)).collect();
        assert_eq!(actual, expected, "wakees of {}", anchor.id);
    }
}
