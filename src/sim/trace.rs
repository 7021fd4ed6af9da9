//! Recorded scheduling actions, one per decision the harness observed.

use crate::sched::job::{CoreId, JobId, Ticks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub time: Ticks,
    /// `None` for events with no core attached (arrivals).
    pub core: Option<CoreId>,
    pub kind: TraceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Arrived { job: JobId },
    /// The job started (or resumed) running on the event's core.
    Scheduled { job: JobId },
    /// Displaced by a more deserving arrival.
    Preempted { job: JobId },
    /// Displaced by quantum expiry.
    Rotated { job: JobId },
    Completed { job: JobId },
    /// The core was left with nothing to run.
    Idle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    events: Vec<TraceEvent>,
}

impl Trace {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, time: Ticks, core: Option<CoreId>, kind: TraceKind) {
        self.events.push(TraceEvent { time, core, kind });
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// How many times the job was put on a core.
    pub fn schedule_count(&self, job: JobId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, TraceKind::Scheduled { job: j } if j == job))
            .count()
    }

    /// When the job first reached a core.
    pub fn first_scheduled(&self, job: JobId) -> Option<Ticks> {
        self.events.iter().find_map(|e| match e.kind {
            TraceKind::Scheduled { job: j } if j == job => Some(e.time),
            _ => None,
        })
    }

    /// The half-open `[start, end)` intervals during which the job held a
    /// core, in order.
    pub fn run_intervals(&self, job: JobId) -> Vec<(Ticks, Ticks)> {
        let mut intervals = Vec::new();
        let mut started: Option<Ticks> = None;
        for event in &self.events {
            match event.kind {
                TraceKind::Scheduled { job: j } if j == job => {
                    started = Some(event.time);
                }
                TraceKind::Preempted { job: j }
                | TraceKind::Rotated { job: j }
                | TraceKind::Completed { job: j }
                    if j == job =>
                {
                    if let Some(start) = started.take() {
                        intervals.push((start, event.time));
                    }
                }
                _ => {}
            }
        }
        intervals
    }

    /// Pretty-print the schedule to stderr.
    pub fn dump(&self) {
        for event in &self.events {
            let core = event.core.map_or(-1, |c| c as i64);
            let desc = match event.kind {
                TraceKind::Arrived { job } => format!("ARRIVE   job={job}"),
                TraceKind::Scheduled { job } => format!("SCHED    job={job}"),
                TraceKind::Preempted { job } => format!("PREEMPT  job={job}"),
                TraceKind::Rotated { job } => format!("ROTATE   job={job}"),
                TraceKind::Completed { job } => format!("COMPLETE job={job}"),
                TraceKind::Idle => "IDLE".to_string(),
            };
            eprintln!("[t={:>6}] core={:<3} {desc}", event.time, core);
        }
    }
}
