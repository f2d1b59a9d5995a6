//! Circuit breaker simulator.
//!
//! Drives concurrent traffic through a breaker against a simulated dependency
//! that is overloaded for the first `--outage-secs` seconds and healthy
//! afterwards, then prints the breaker's final snapshot as JSON.
//!
//! ```text
//!  workers (tokio tasks)
//!      │  execute_async
//!      ▼
//!  CircuitBreaker ──admit──▶ simulated dependency (latency + failure rate)
//!      │
//!      ├── tracing: state transitions
//!      └── metrics: success / failure / fast_fail
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use thiserror::Error;

use circuit_breaker::config::watcher::ConfigWatcher;
use circuit_breaker::config::{load_config, CircuitConfig};
use circuit_breaker::observability::{logging, metrics};
use circuit_breaker::{BreakerError, BreakerRegistry, CircuitBreaker, Overloading};

#[derive(Parser)]
#[command(name = "breaker-sim")]
#[command(about = "Simulate traffic through a circuit breaker", long_about = None)]
struct Cli {
    /// TOML configuration file; watched for changes while running.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Breaker name (selects `[breakers.<name>]` from the config).
    #[arg(short, long, default_value = "sim-backend")]
    name: String,

    /// Total requests to issue.
    #[arg(short, long, default_value_t = 5_000)]
    requests: usize,

    /// Concurrent workers.
    #[arg(long, default_value_t = 16)]
    concurrency: usize,

    /// Simulated dependency latency in milliseconds.
    #[arg(long, default_value_t = 2)]
    latency_ms: u64,

    /// Probability (0.0-1.0) that a call fails during the outage.
    #[arg(long, default_value_t = 0.8)]
    failure_rate: f64,

    /// How long the simulated outage lasts.
    #[arg(long, default_value_t = 3)]
    outage_secs: u64,
}

#[derive(Debug, Error)]
#[error("simulated dependency overloaded")]
struct Overloaded;

struct Dependency {
    started: Instant,
    outage: Duration,
    latency: Duration,
    failure_rate: f64,
}

impl Dependency {
    async fn call(&self) -> (Result<u64, Overloaded>, Overloading) {
        tokio::time::sleep(self.latency).await;
        let in_outage = self.started.elapsed() < self.outage;
        if in_outage && fastrand::f64() < self.failure_rate {
            (Err(Overloaded), Overloading::Yes)
        } else {
            (Ok(fastrand::u64(..)), Overloading::No)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CircuitConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = BreakerRegistry::new();
    let breaker = registry.get_or_create(&cli.name, config.settings_for(&cli.name));

    tracing::info!(
        breaker = %cli.name,
        requests = cli.requests,
        concurrency = cli.concurrency,
        settings = ?breaker.settings(),
        "Simulation starting"
    );

    // Keep the watcher alive for the whole run.
    let _watcher = match &cli.config {
        Some(path) => Some(ConfigWatcher::new(path, registry.clone()).run()?),
        None => None,
    };

    let dependency = Arc::new(Dependency {
        started: Instant::now(),
        outage: Duration::from_secs(cli.outage_secs),
        latency: Duration::from_millis(cli.latency_ms),
        failure_rate: cli.failure_rate,
    });

    let workers = cli.concurrency.max(1);
    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let share = cli.requests / workers + usize::from(worker < cli.requests % workers);
        handles.push(tokio::spawn(run_worker(
            breaker.clone(),
            dependency.clone(),
            share,
        )));
    }
    for handle in handles {
        handle.await?;
    }

    println!("{}", serde_json::to_string_pretty(&breaker.snapshot())?);
    Ok(())
}

async fn run_worker(breaker: Arc<CircuitBreaker>, dependency: Arc<Dependency>, requests: usize) {
    for _ in 0..requests {
        match breaker.execute_async(|| dependency.call()).await {
            Ok(_) => {}
            Err(BreakerError::Open) => {
                // Back off briefly instead of spinning on a tripped breaker.
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            Err(BreakerError::Call(e)) => tracing::trace!(error = %e, "Call failed"),
        }
    }
}
