pub type JobId = u64;
pub type CoreId = usize;
pub type Ticks = u64;
pub type Priority = i64;

/// A job as the dispatcher tracks it: created on arrival, owned by exactly
/// one core slot or pending-queue node until completion.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub arrival: Ticks,
    /// Total service the job needs. Immutable after arrival.
    pub length: Ticks,
    /// Service still owed. Decremented lazily, see [`Job::observe`].
    pub remaining: Ticks,
    /// Lower value = more urgent.
    pub priority: Priority,
    /// When the job first reached a core. `None` until then; cleared again
    /// if the job is preempted in the very tick it was placed.
    pub first_dispatch: Option<Ticks>,
    /// Last time `remaining` was reconciled against the clock.
    pub last_observed: Ticks,
}

impl Job {
    pub fn new(id: JobId, arrival: Ticks, length: Ticks, priority: Priority) -> Self {
        Self {
            id,
            arrival,
            length,
            remaining: length,
            priority,
            first_dispatch: None,
            last_observed: arrival,
        }
    }

    /// Charge the job for the time it has been running since the last
    /// observation. Only meaningful while the job holds a core.
    pub fn observe(&mut self, now: Ticks) {
        let elapsed = now - self.last_observed;
        self.remaining = self.remaining.saturating_sub(elapsed);
        self.last_observed = now;
    }

    /// First-dispatch delay, once the job has been dispatched.
    pub fn response(&self) -> Option<Ticks> {
        self.first_dispatch.map(|t| t - self.arrival)
    }
}
