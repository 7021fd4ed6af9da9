//! Deterministic event loop driving a [`Dispatcher`] through an arrival
//! trace: per-core completion and quantum timers plus the sorted arrivals,
//! delivered one event at a time in clock order.

use keyed_priority_queue::KeyedPriorityQueue;
use rustc_hash::FxHashMap;
use tracing::trace;

use super::trace::{Trace, TraceKind};
use super::workload::JobSpec;
use crate::policy::Policy;
use crate::sched::dispatcher::Dispatcher;
use crate::sched::job::{CoreId, JobId, Ticks};
use crate::sched::observer::Observer;

/// What the harness observed happen to one job.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub spec: JobSpec,
    /// First time the job actually held a core.
    pub first_run: Option<Ticks>,
    pub completion: Option<Ticks>,
}

impl Outcome {
    pub fn turnaround(&self) -> Option<Ticks> {
        self.completion.map(|t| t - self.spec.arrival)
    }

    pub fn waiting(&self) -> Option<Ticks> {
        self.turnaround().map(|t| t - self.spec.length)
    }

    pub fn response(&self) -> Option<Ticks> {
        self.first_run.map(|t| t - self.spec.arrival)
    }
}

/// Timeline keys: at most one completion and one quantum entry per core, so
/// preemption or rotation replaces the stale entry instead of leaving it to
/// fire on the wrong job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Pending {
    Completion(CoreId),
    Quantum(CoreId),
}

/// At equal times completions fire before quantum expiries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Class {
    Completion,
    Quantum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Moment {
    time: Ticks,
    class: Class,
}

// KeyedPriorityQueue is a max-heap, so Moment's Ord is reversed.
impl Ord for Moment {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.class.cmp(&self.class))
    }
}

impl PartialOrd for Moment {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub struct Sim {
    dispatcher: Dispatcher,
    observer: Observer,
    outcomes: Vec<Outcome>,
    // JobId -> outcomes index; mirrors dispatcher decisions back onto jobs
    index: FxHashMap<JobId, usize>,
    /// Service each job has received so far.
    executed: FxHashMap<JobId, Ticks>,
    /// Per core: the job it runs and since when.
    running: Vec<Option<(JobId, Ticks)>>,
    timeline: KeyedPriorityQueue<Pending, Moment>,
    cursor: usize,
    quantum: Option<Ticks>,
    trace: Trace,
}

impl Sim {
    pub fn new(
        mut specs: Vec<JobSpec>,
        cores: usize,
        policy: Policy,
        quantum: Option<Ticks>,
    ) -> Self {
        assert!(cores > 0, "simulation requires at least one core");
        if policy == Policy::Rr {
            assert!(
                quantum.is_some_and(|q| q > 0),
                "round robin requires a positive quantum"
            );
        } else {
            assert!(quantum.is_none(), "only round robin takes a quantum");
        }

        specs.sort_by(|a, b| a.arrival.cmp(&b.arrival).then_with(|| a.id.cmp(&b.id)));
        let outcomes: Vec<Outcome> = specs
            .into_iter()
            .map(|spec| Outcome {
                spec,
                first_run: None,
                completion: None,
            })
            .collect();
        let index: FxHashMap<JobId, usize> = outcomes
            .iter()
            .enumerate()
            .map(|(i, o)| (o.spec.id, i))
            .collect();
        debug_assert_eq!(index.len(), outcomes.len(), "job ids must be unique");

        Self {
            dispatcher: Dispatcher::new(cores, policy),
            observer: Observer::new(),
            outcomes,
            index,
            executed: FxHashMap::default(),
            running: vec![None; cores],
            timeline: KeyedPriorityQueue::new(),
            cursor: 0,
            quantum,
            trace: Trace::new(),
        }
    }

    /// Drain every event.
    pub fn run(&mut self) {
        while self.step() {}
    }

    /// Deliver the next event. Returns false once the trace is exhausted
    /// and every core is idle.
    fn step(&mut self) -> bool {
        let arrival = self.outcomes.get(self.cursor).map(|o| o.spec.arrival);
        let pending = self.timeline.peek().map(|(key, moment)| (*key, *moment));
        match (pending, arrival) {
            (None, None) => return false,
            // Timers win ties: a completion at t frees a core for an
            // arrival at t, and a stale same-tick quantum never outlives
            // the rotation that re-arms it.
            (Some((_, moment)), Some(at)) if at < moment.time => self.handle_arrival(),
            (None, Some(_)) => self.handle_arrival(),
            (Some((key, moment)), _) => {
                self.timeline.pop();
                match key {
                    Pending::Completion(core) => self.handle_completion(core, moment.time),
                    Pending::Quantum(core) => self.handle_quantum(core, moment.time),
                }
            }
        }
        self.observer.observe(&self.dispatcher);
        true
    }

    fn handle_arrival(&mut self) {
        let spec = self.outcomes[self.cursor].spec.clone();
        self.cursor += 1;
        let now = spec.arrival;
        self.trace.record(now, None, TraceKind::Arrived { job: spec.id });

        let placed = self
            .dispatcher
            .job_arrived(spec.id, now, spec.length, spec.priority);
        if let Some(core) = placed {
            self.displace(core, now, |job| TraceKind::Preempted { job });
            self.install(core, spec.id, now);
        }
        trace!(time = now, state = %self.dispatcher, "arrival");
    }

    fn handle_completion(&mut self, core: CoreId, now: Ticks) {
        let (job, since) = self.running[core]
            .take()
            .expect("completion fired on an idle core");
        *self.executed.entry(job).or_default() += now - since;
        self.outcomes[self.index[&job]].completion = Some(now);
        self.trace.record(now, Some(core), TraceKind::Completed { job });
        // Stale timer; re-armed if the slot is refilled.
        self.timeline.remove(&Pending::Quantum(core));

        match self.dispatcher.job_finished(core, job, now) {
            Some(next) => self.install(core, next, now),
            None => self.trace.record(now, Some(core), TraceKind::Idle),
        }
        trace!(time = now, state = %self.dispatcher, "completion");
    }

    fn handle_quantum(&mut self, core: CoreId, now: Ticks) {
        let quantum = self
            .quantum
            .expect("quantum event without a configured quantum");
        let previous = self.running[core].map(|(job, _)| job);
        match self.dispatcher.quantum_expired(core, now) {
            Some(next) if previous == Some(next) => {
                // Alone in the system: keep running, restart the timer.
                self.timeline.push(
                    Pending::Quantum(core),
                    Moment { time: now + quantum, class: Class::Quantum },
                );
            }
            Some(next) => {
                self.displace(core, now, |job| TraceKind::Rotated { job });
                self.install(core, next, now);
            }
            None => self.trace.record(now, Some(core), TraceKind::Idle),
        }
        trace!(time = now, state = %self.dispatcher, "quantum expiry");
    }

    /// Take the displaced job off `core` and charge it for its run.
    fn displace(&mut self, core: CoreId, now: Ticks, kind: fn(JobId) -> TraceKind) {
        if let Some((job, since)) = self.running[core].take() {
            *self.executed.entry(job).or_default() += now - since;
            let outcome = &mut self.outcomes[self.index[&job]];
            // Displaced in the very tick it was placed: it never ran, and
            // its response is whatever the next real dispatch yields.
            if outcome.first_run == Some(now) {
                outcome.first_run = None;
            }
            self.trace.record(now, Some(core), kind(job));
        }
    }

    fn install(&mut self, core: CoreId, job: JobId, now: Ticks) {
        let executed = self.executed.get(&job).copied().unwrap_or(0);
        let outcome = &mut self.outcomes[self.index[&job]];
        if outcome.first_run.is_none() {
            outcome.first_run = Some(now);
        }
        let finish = now + (outcome.spec.length - executed);

        self.running[core] = Some((job, now));
        self.timeline.push(
            Pending::Completion(core),
            Moment { time: finish, class: Class::Completion },
        );
        if let Some(quantum) = self.quantum {
            self.timeline.push(
                Pending::Quantum(core),
                Moment { time: now + quantum, class: Class::Quantum },
            );
        }
        self.trace.record(now, Some(core), TraceKind::Scheduled { job });
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn all_completed(&self) -> bool {
        self.outcomes.iter().all(|o| o.completion.is_some())
    }
}
