use policy_sim::{JobSpec, Policy, Sim};

fn spec(id: u64, arrival: u64, length: u64, priority: i64) -> JobSpec {
    JobSpec { id, arrival, length, priority }
}

fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "{what}: expected {expected}, got {actual}"
    );
}

/// A short arrival takes the core from a long-running job and the long job
/// resumes afterwards.
#[test]
fn psjf_preempts_the_longer_remaining_job() {
    let specs = vec![spec(1, 0, 10, 0), spec(2, 2, 2, 0)];
    let mut sim = Sim::new(specs, 1, Policy::Psjf, None);
    sim.run();

    let trace = sim.trace();
    assert_eq!(trace.run_intervals(1), vec![(0, 2), (4, 12)]);
    assert_eq!(trace.run_intervals(2), vec![(2, 4)]);

    let d = sim.dispatcher();
    assert_close(d.avg_waiting(), 1.0, "avg waiting");
    assert_close(d.avg_turnaround(), 7.0, "avg turnaround");
    // Both jobs started the moment they arrived.
    assert_close(d.avg_response(), 0.0, "avg response");
}

/// An urgent arrival evicts the running low-priority job; the victim's
/// response is unchanged because it had already run.
#[test]
fn ppri_preempts_and_keeps_the_victims_response() {
    let specs = vec![spec(1, 0, 10, 5), spec(2, 3, 4, 2)];
    let mut sim = Sim::new(specs, 1, Policy::Ppri, None);
    sim.run();

    let trace = sim.trace();
    assert_eq!(trace.run_intervals(1), vec![(0, 3), (7, 14)]);
    assert_eq!(trace.run_intervals(2), vec![(3, 7)]);

    let outcomes = sim.outcomes();
    let j1 = outcomes.iter().find(|o| o.spec.id == 1).unwrap();
    assert_eq!(j1.first_run, Some(0));
    assert_eq!(j1.response(), Some(0));

    let d = sim.dispatcher();
    assert_close(d.avg_waiting(), 2.0, "avg waiting");
    assert_close(d.avg_turnaround(), 9.0, "avg turnaround");
    assert_close(d.avg_response(), 0.0, "avg response");
}

/// A job dispatched and preempted within the same tick never ran, so its
/// response is measured from its eventual real dispatch.
#[test]
fn ppri_same_tick_preemption_resets_the_response() {
    let specs = vec![spec(1, 0, 4, 1), spec(2, 1, 9, 9), spec(3, 4, 3, 2)];
    let mut sim = Sim::new(specs, 1, Policy::Ppri, None);
    sim.run();

    // Job 1 completes at t=4, which dispatches job 2; job 3 arrives in the
    // same tick and immediately preempts it.
    let trace = sim.trace();
    assert_eq!(trace.run_intervals(3), vec![(4, 7)]);

    let j2 = sim.outcomes().iter().find(|o| o.spec.id == 2).unwrap().clone();
    assert_eq!(j2.first_run, Some(7));
    assert_eq!(j2.response(), Some(6));
    assert_eq!(j2.completion, Some(16));

    let d = sim.dispatcher();
    // Responses: 0 (job 1), 6 (job 2), 0 (job 3).
    assert_close(d.avg_response(), 2.0, "avg response");
}

/// A job that arrived this very tick cannot be a preemption victim, even
/// when a more urgent job arrives an instant later in the same tick.
#[test]
fn same_tick_placements_are_immune() {
    let specs = vec![spec(1, 0, 9, 9), spec(2, 5, 5, 5), spec(3, 5, 5, 0)];
    let mut sim = Sim::new(specs, 1, Policy::Ppri, None);
    sim.run();

    let trace = sim.trace();
    // Job 2 preempts job 1 at t=5; job 3 outranks job 2 but must queue,
    // because job 2 arrived in this very tick. It runs at job 2's
    // completion, ahead of job 1.
    assert_eq!(trace.run_intervals(2), vec![(5, 10)]);
    assert_eq!(trace.run_intervals(3), vec![(10, 15)]);
    assert_eq!(trace.run_intervals(1), vec![(0, 5), (15, 19)]);
}

/// PSJF charges running jobs for elapsed time before comparing, so a job
/// that no longer strictly exceeds the newcomer keeps its core.
#[test]
fn psjf_does_not_preempt_on_equal_remaining() {
    let specs = vec![spec(1, 0, 4, 0), spec(2, 2, 2, 0)];
    let mut sim = Sim::new(specs, 1, Policy::Psjf, None);
    sim.run();

    // At t=2 job 1 has exactly 2 ticks left: no strict excess, no eviction.
    let trace = sim.trace();
    assert_eq!(trace.run_intervals(1), vec![(0, 4)]);
    assert_eq!(trace.run_intervals(2), vec![(4, 6)]);
}
