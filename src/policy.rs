//! The six scheduling disciplines and how each orders the pending queue.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::sched::job::Job;
use crate::sched::queue::QueueOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// First come, first served.
    Fcfs,
    /// Shortest job first, non-preemptive.
    Sjf,
    /// Shortest remaining time first, preemptive.
    Psjf,
    /// Static priority, non-preemptive.
    Pri,
    /// Static priority, preemptive.
    Ppri,
    /// Round robin over a quantum timer.
    Rr,
}

impl Policy {
    pub const ALL: [Policy; 6] = [
        Policy::Fcfs,
        Policy::Sjf,
        Policy::Psjf,
        Policy::Pri,
        Policy::Ppri,
        Policy::Rr,
    ];

    /// Whether an arrival may displace a running job.
    pub fn preemptive(self) -> bool {
        matches!(self, Policy::Psjf | Policy::Ppri)
    }

    pub fn name(self) -> &'static str {
        match self {
            Policy::Fcfs => "fcfs",
            Policy::Sjf => "sjf",
            Policy::Psjf => "psjf",
            Policy::Pri => "pri",
            Policy::Ppri => "ppri",
            Policy::Rr => "rr",
        }
    }
}

impl QueueOrder<Job> for Policy {
    fn cmp(&self, new: &Job, queued: &Job) -> Ordering {
        match self {
            // New arrivals land at the tail; insertion order is the order.
            Policy::Fcfs | Policy::Rr => Ordering::Greater,
            Policy::Sjf | Policy::Psjf => new.remaining.cmp(&queued.remaining),
            Policy::Pri | Policy::Ppri => new
                .priority
                .cmp(&queued.priority)
                .then(new.arrival.cmp(&queued.arrival)),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown policy {s:?} (expected one of fcfs, sjf, psjf, pri, ppri, rr)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: u64, arrival: u64, remaining: u64, priority: i64) -> Job {
        let mut j = Job::new(id, arrival, remaining.max(1), priority);
        j.remaining = remaining;
        j
    }

    #[test]
    fn fifo_relations_always_append() {
        for policy in [Policy::Fcfs, Policy::Rr] {
            let a = job(1, 0, 1, 0);
            let b = job(2, 9, 9, 9);
            assert_eq!(policy.cmp(&a, &b), Ordering::Greater);
            assert_eq!(policy.cmp(&b, &a), Ordering::Greater);
        }
    }

    #[test]
    fn shortest_remaining_orders_ascending() {
        let short = job(1, 5, 2, 0);
        let long = job(2, 0, 8, 0);
        assert_eq!(Policy::Sjf.cmp(&short, &long), Ordering::Less);
        assert_eq!(Policy::Psjf.cmp(&long, &short), Ordering::Greater);
        assert_eq!(Policy::Sjf.cmp(&short, &short.clone()), Ordering::Equal);
    }

    #[test]
    fn priority_breaks_ties_on_arrival() {
        let urgent = job(1, 7, 5, 1);
        let lax = job(2, 2, 5, 4);
        assert_eq!(Policy::Pri.cmp(&urgent, &lax), Ordering::Less);

        let older = job(3, 1, 5, 2);
        let younger = job(4, 6, 5, 2);
        assert_eq!(Policy::Ppri.cmp(&older, &younger), Ordering::Less);
        assert_eq!(Policy::Ppri.cmp(&younger, &older), Ordering::Greater);
    }

    #[test]
    fn only_psjf_and_ppri_preempt() {
        let preemptive: Vec<Policy> = Policy::ALL.into_iter().filter(|p| p.preemptive()).collect();
        assert_eq!(preemptive, vec![Policy::Psjf, Policy::Ppri]);
    }

    #[test]
    fn fifo_queue_offers_land_at_the_tail() {
        use crate::sched::queue::PendingQueue;

        let mut q = PendingQueue::new(Policy::Rr);
        for (i, id) in [9u64, 3, 7].into_iter().enumerate() {
            assert_eq!(q.offer(job(id, i as u64, 5, 0)), i, "rank must equal prior size");
        }
        let ids: Vec<u64> = q.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![9, 3, 7]);
    }

    #[test]
    fn names_round_trip() {
        for policy in Policy::ALL {
            assert_eq!(policy.name().parse::<Policy>(), Ok(policy));
        }
        assert_eq!("FCFS".parse::<Policy>(), Ok(Policy::Fcfs));
        assert!("lifo".parse::<Policy>().is_err());
    }
}
