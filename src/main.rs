use std::path::PathBuf;

use anyhow::Context;
use average::Estimate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use policy_sim::sim::workload;
use policy_sim::{Policy, Sim};

/// Simulate classical multi-core scheduling policies over a job trace.
#[derive(Parser)]
#[command(name = "policy_sim")]
struct Cli {
    /// JSON job trace (array of {id, arrival, length, priority}).
    /// Without one, a seeded random workload is generated.
    workload: Option<PathBuf>,

    /// Scheduling policy: fcfs, sjf, psjf, pri, ppri, or rr.
    #[arg(short, long, default_value = "fcfs")]
    policy: Policy,

    /// Number of cores.
    #[arg(short, long, default_value_t = 2)]
    cores: usize,

    /// Round-robin quantum in ticks.
    #[arg(short, long)]
    quantum: Option<u64>,

    /// Ticks of synthetic arrivals when no trace file is given.
    #[arg(long, default_value_t = 500)]
    ticks: u64,

    /// Per-tick arrival probability for the synthetic workload.
    #[arg(long, default_value_t = 0.3)]
    p_arrival: f64,

    /// RNG seed for the synthetic workload.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Print the recorded schedule to stderr.
    #[arg(long)]
    dump_trace: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let specs = match &cli.workload {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            workload::from_json(&json)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => workload::bernoulli(cli.ticks, cli.p_arrival, 0.3, 2, 6, 9, cli.seed),
    };

    let quantum = if cli.policy == Policy::Rr {
        Some(cli.quantum.context("--quantum is required under rr")?)
    } else {
        anyhow::ensure!(
            cli.quantum.is_none(),
            "--quantum is only meaningful under rr"
        );
        None
    };

    let jobs = specs.len();
    let mut sim = Sim::new(specs, cli.cores, cli.policy, quantum);
    sim.run();

    if cli.dump_trace {
        sim.trace().dump();
    }

    let dispatcher = sim.dispatcher();
    println!(
        "{} jobs, {} cores, policy {}",
        jobs,
        cli.cores,
        cli.policy
    );
    println!("avg waiting time:    {:.2} ticks", dispatcher.avg_waiting());
    println!("avg turnaround time: {:.2} ticks", dispatcher.avg_turnaround());
    println!("avg response time:   {:.2} ticks", dispatcher.avg_response());

    // Cross-check the accumulators against the observed schedule.
    let observed = avg(sim.outcomes().iter().filter_map(|o| o.response()).map(|t| t as f64));
    println!("observed response:   {observed:.2} ticks");

    Ok(())
}

fn avg(iter: impl Iterator<Item = f64>) -> f64 {
    iter.collect::<average::Mean>().estimate()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
