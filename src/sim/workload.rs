//! Arrival traces for the harness: synthetic generation and JSON loading.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::sched::job::{JobId, Priority, Ticks};

/// One job in an arrival trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub id: JobId,
    pub arrival: Ticks,
    pub length: Ticks,
    #[serde(default)]
    pub priority: Priority,
}

/// Seeded random arrivals: at most one per tick (so arrival times are
/// unique), short or long service, uniform priorities.
pub fn bernoulli(
    ticks: Ticks,
    p_arrival: f64,
    p_short: f64,
    short_ticks: Ticks,
    long_ticks: Ticks,
    max_priority: Priority,
    seed: u64,
) -> Vec<JobSpec> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut jobs = Vec::new();

    for t in 0..ticks {
        if rng.random::<f64>() < p_arrival {
            let length = if rng.random::<f64>() < p_short {
                short_ticks
            } else {
                long_ticks
            };

            jobs.push(JobSpec {
                id: jobs.len() as JobId,
                arrival: t,
                length,
                priority: rng.random_range(0..=max_priority),
            });
        }
    }

    jobs
}

/// Parse a JSON array of job specs.
pub fn from_json(json: &str) -> serde_json::Result<Vec<JobSpec>> {
    serde_json::from_str(json)
}
