//! Event-to-placement logic: reacts to arrivals, completions, and quantum
//! expiries, and decides which job holds which core next.

use std::fmt;

use tracing::debug;

use crate::policy::Policy;
use crate::sched::job::{CoreId, Job, JobId, Priority, Ticks};
use crate::sched::queue::PendingQueue;
use crate::sched::stats::SchedStats;

/// The scheduler proper: a fixed vector of core slots, the pending queue
/// ordered by the active policy, and the completion statistics.
///
/// The simulator owns the clock and re-enters one event at a time with
/// non-decreasing timestamps; everything here is synchronous. `None` from an
/// event handler means "no scheduling change".
pub struct Dispatcher {
    slots: Vec<Option<Job>>,
    pending: PendingQueue<Job, Policy>,
    policy: Policy,
    stats: SchedStats,
    last_event: Ticks,
}

impl Dispatcher {
    pub fn new(cores: usize, policy: Policy) -> Self {
        assert!(cores > 0, "scheduler requires at least one core");
        Self {
            slots: (0..cores).map(|_| None).collect(),
            pending: PendingQueue::new(policy),
            policy,
            stats: SchedStats::default(),
            last_event: 0,
        }
    }

    fn advance(&mut self, now: Ticks) {
        debug_assert!(now >= self.last_event, "event time went backwards");
        self.last_event = now;
    }

    /// A job has arrived. Returns the core it should start on, or `None`
    /// when it was queued instead.
    pub fn job_arrived(
        &mut self,
        id: JobId,
        now: Ticks,
        length: Ticks,
        priority: Priority,
    ) -> Option<CoreId> {
        debug_assert!(length > 0, "job {id} arrived with zero length");
        self.advance(now);
        let mut job = Job::new(id, now, length, priority);

        if let Some(core) = self.idle_core() {
            job.first_dispatch = Some(now);
            self.slots[core] = Some(job);
            debug!(job = id, core, "arrival: placed on idle core");
            return Some(core);
        }

        match self.policy {
            Policy::Ppri => self.preempt_least_urgent(job, now),
            Policy::Psjf => self.preempt_longest_remaining(job, now),
            _ => {
                self.enqueue(job);
                None
            }
        }
    }

    /// The job on `core` has finished. Accumulates its statistics and
    /// returns the id of the job dispatched into the freed slot, if any.
    pub fn job_finished(&mut self, core: CoreId, id: JobId, now: Ticks) -> Option<JobId> {
        self.advance(now);
        let job = self.slots[core]
            .take()
            .expect("completion reported for an idle core");
        debug_assert_eq!(job.id, id, "completion reported for a job not on core {core}");
        self.stats.record(&job, now);
        debug!(job = id, core, turnaround = now - job.arrival, "completed");

        let mut next = self.pending.poll()?;
        next.last_observed = now;
        if next.first_dispatch.is_none() {
            next.first_dispatch = Some(now);
        }
        let next_id = next.id;
        self.slots[core] = Some(next);
        debug!(job = next_id, core, "dispatched from queue");
        Some(next_id)
    }

    /// The round-robin quantum on `core` has run out: rotate the running
    /// job to the queue tail and dispatch the queue head. Returns the id of
    /// the job now on the core, or `None` when it stays idle.
    pub fn quantum_expired(&mut self, core: CoreId, now: Ticks) -> Option<JobId> {
        debug_assert_eq!(self.policy, Policy::Rr, "quantum expiry outside round robin");
        self.advance(now);
        if self.slots[core].is_none() && self.pending.is_empty() {
            return None;
        }

        if let Some(running) = self.slots[core].take() {
            debug!(job = running.id, core, "rotated out");
            self.pending.offer(running);
        }
        let mut next = self
            .pending
            .poll()
            .expect("queue cannot be empty after rotation");
        if next.first_dispatch.is_none() {
            next.first_dispatch = Some(now);
        }
        let next_id = next.id;
        self.slots[core] = Some(next);
        debug!(job = next_id, core, "rotated in");
        Some(next_id)
    }

    pub fn avg_waiting(&self) -> f64 {
        self.stats.avg_waiting()
    }

    pub fn avg_turnaround(&self) -> f64 {
        self.stats.avg_turnaround()
    }

    pub fn avg_response(&self) -> f64 {
        self.stats.avg_response()
    }

    pub fn completed(&self) -> u64 {
        self.stats.completed()
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn cores(&self) -> usize {
        self.slots.len()
    }

    /// The job currently holding `core`, if any.
    pub fn running(&self, core: CoreId) -> Option<&Job> {
        self.slots[core].as_ref()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_jobs(&self) -> impl Iterator<Item = &Job> {
        self.pending.iter()
    }

    fn idle_core(&self) -> Option<CoreId> {
        self.slots.iter().position(|slot| slot.is_none())
    }

    fn enqueue(&mut self, job: Job) {
        let id = job.id;
        let rank = self.pending.offer(job);
        debug!(job = id, rank, "arrival: queued");
    }

    /// PPRI arrival with no idle core: evict the least urgent running job
    /// if the newcomer beats it. Ties go to the younger job. A job that
    /// arrived this tick is immune.
    fn preempt_least_urgent(&mut self, job: Job, now: Ticks) -> Option<CoreId> {
        let mut victim: Option<(CoreId, Priority, Ticks)> = None;
        for (core, slot) in self.slots.iter().enumerate() {
            let running = slot
                .as_ref()
                .expect("preemption scan requires fully occupied slots");
            if running.arrival == now {
                continue;
            }
            let less_urgent = match victim {
                None => true,
                Some((_, priority, arrival)) => {
                    running.priority > priority
                        || (running.priority == priority && running.arrival > arrival)
                }
            };
            if less_urgent {
                victim = Some((core, running.priority, running.arrival));
            }
        }

        match victim {
            Some((core, priority, _)) if priority > job.priority => {
                Some(self.evict_and_install(core, job, now))
            }
            _ => {
                self.enqueue(job);
                None
            }
        }
    }

    /// PSJF arrival with no idle core: reconcile every running job's
    /// remaining time against the clock, then evict the one with the most
    /// left if the newcomer is shorter. Same-tick arrivals are immune.
    fn preempt_longest_remaining(&mut self, job: Job, now: Ticks) -> Option<CoreId> {
        for slot in self.slots.iter_mut() {
            slot.as_mut()
                .expect("preemption scan requires fully occupied slots")
                .observe(now);
        }

        let mut victim: Option<(CoreId, Ticks)> = None;
        for (core, slot) in self.slots.iter().enumerate() {
            let running = slot.as_ref().expect("slot emptied mid-scan");
            if running.arrival == now {
                continue;
            }
            let longer = match victim {
                // Strictly greater, so the lowest-index slot wins ties.
                None => true,
                Some((_, remaining)) => running.remaining > remaining,
            };
            if longer {
                victim = Some((core, running.remaining));
            }
        }

        match victim {
            Some((core, remaining)) if remaining > job.remaining => {
                Some(self.evict_and_install(core, job, now))
            }
            _ => {
                self.enqueue(job);
                None
            }
        }
    }

    fn evict_and_install(&mut self, core: CoreId, mut job: Job, now: Ticks) -> CoreId {
        let mut evicted = self.slots[core]
            .take()
            .expect("preemption victim vanished");
        // A victim that was dispatched this very tick never actually ran;
        // its response time must be recomputed at the next dispatch.
        if evicted.first_dispatch == Some(now) {
            evicted.first_dispatch = None;
        }
        debug!(job = job.id, victim = evicted.id, core, "arrival: preempted");
        self.pending.offer(evicted);

        job.first_dispatch = Some(now);
        self.slots[core] = Some(job);
        core
    }
}

impl fmt::Display for Dispatcher {
    /// Diagnostic listing: `id(core)` for running jobs, `id(-1)` for queued
    /// ones, e.g. `2(-1) 4(0) 1(-1)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for (core, slot) in self.slots.iter().enumerate() {
            if let Some(job) = slot {
                write!(f, "{sep}{}({core})", job.id)?;
                sep = " ";
            }
        }
        for rank in 0..self.pending.len() {
            if let Some(job) = self.pending.get(rank) {
                write!(f, "{sep}{}(-1)", job.id)?;
                sep = " ";
            }
        }
        Ok(())
    }
}
