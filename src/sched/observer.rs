use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use crate::sched::dispatcher::Dispatcher;
use crate::sched::queue::QueueOrder;

/// Debug-build sanity checks run at event boundaries: every live job held
/// exactly once, the pending queue sorted under the active policy, the
/// completion counter monotone.
#[derive(Debug, Default)]
pub struct Observer {
    events: u64,
    last_completed: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, dispatcher: &Dispatcher) {
        self.events += 1;
        if cfg!(debug_assertions) {
            self.check(dispatcher);
        }
    }

    fn check(&mut self, dispatcher: &Dispatcher) {
        assert!(
            dispatcher.completed() >= self.last_completed,
            "completion counter went backwards"
        );
        self.last_completed = dispatcher.completed();

        let mut seen = FxHashSet::default();
        for core in 0..dispatcher.cores() {
            if let Some(job) = dispatcher.running(core) {
                assert!(
                    job.first_dispatch.is_some(),
                    "running job {} has no dispatch timestamp",
                    job.id
                );
                assert!(
                    job.remaining <= job.length,
                    "running job {} owes more than its length",
                    job.id
                );
                assert!(seen.insert(job.id), "job {} held twice", job.id);
            }
        }
        for job in dispatcher.pending_jobs() {
            assert!(
                job.remaining <= job.length,
                "queued job {} owes more than its length",
                job.id
            );
            assert!(seen.insert(job.id), "job {} held twice", job.id);
        }

        let order = dispatcher.policy();
        let queued: Vec<_> = dispatcher.pending_jobs().collect();
        for pair in queued.windows(2) {
            assert!(
                order.cmp(pair[1], pair[0]) != Ordering::Less,
                "pending queue out of order before job {}",
                pair[1].id
            );
        }
    }

    pub fn events(&self) -> u64 {
        self.events
    }
}
