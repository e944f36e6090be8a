use crate::config::Config;
use crate::elements::{EventValue, FnEffect, Literal, LocalVariable, Log, LoopValue, SetLocal};
use crate::engine::Script;
use crate::event::Event;
use crate::host::{Dispatcher, MemoryVariableStore, Runtime, TokioScheduler};
use crate::syntax::{Statement, TriggerBuilder};
use crate::value::{Timespan, Value};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "tripwire")]
#[command(about = "Tripwire - an event-driven trigger engine", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Tick length in milliseconds (overrides config file and env vars)
    #[arg(long, global = true)]
    pub tick_millis: Option<u64>,

    /// Step ceiling for a single walk (overrides config file and env vars)
    #[arg(long, global = true)]
    pub max_steps: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the resolved configuration
    Config {
        /// Print as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Fire events at a demo trigger that loops and waits between iterations
    Simulate {
        /// Number of events to fire
        #[arg(short = 'e', long = "events", default_value = "2")]
        events: usize,

        /// Loop iterations per event
        #[arg(short = 'i', long = "iterations", default_value = "3")]
        iterations: usize,

        /// Ticks to wait inside each iteration
        #[arg(short = 'w', long = "wait-ticks", default_value = "2")]
        wait_ticks: u64,

        /// Give up after this many milliseconds
        #[arg(short = 't', long = "timeout-ms", default_value = "10000")]
        timeout_ms: u64,
    },
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    let config = Config::builder()
        .config_path(cli.config)
        .tick_millis(cli.tick_millis)
        .max_steps(cli.max_steps)
        .build()?;
    crate::logging::init(&config.logging);

    match cli.command {
        Commands::Config { json } => {
            let rendered = if json {
                serde_json::to_string_pretty(&config).context("Failed to render configuration")? + "\n"
            } else {
                toml::to_string_pretty(&config).context("Failed to render configuration")?
            };
            print!("{rendered}");
        }
        Commands::Simulate { events, iterations, wait_ticks, timeout_ms } => {
            simulate(&config, events, iterations, wait_ticks, Duration::from_millis(timeout_ms)).await?;
        }
    }
    Ok(())
}

/* ===================== Simulation ===================== */

async fn simulate(
    config: &Config,
    events: usize,
    iterations: usize,
    wait_ticks: u64,
    timeout: Duration,
) -> Result<()> {
    let (scheduler, host) =
        TokioScheduler::new(config.engine.tick()).context("Simulation needs a tokio runtime")?;
    let scheduler = Arc::new(scheduler);
    let runtime = Runtime::new(
        scheduler.clone(),
        Arc::new(MemoryVariableStore::new()),
        config.engine.clone(),
    );
    let dispatcher = Dispatcher::new(runtime.clone());

    let finished = Arc::new(AtomicUsize::new(0));
    let wait = config.engine.tick().saturating_mul(u32::try_from(wait_ticks).unwrap_or(u32::MAX));
    let script = Script::new("simulation");
    let trigger = TriggerBuilder::new(&script, "on demo (simulation:1)", "demo")
        .tick_length(config.engine.tick())
        .build(demo_statements(iterations, wait, &finished))
        .context("Demo trigger failed to load")?
        .into_inner();
    dispatcher.register(trigger);

    // Polled by one task with the host loop, so a fire never overlaps a resumed continuation
    let driver = async {
        for n in 0..events {
            let mut values = HashMap::new();
            values.insert("player".to_string(), Value::from(format!("player-{}", n + 1)));
            dispatcher.fire(&Event::with_values("demo", values));
        }

        let done = tokio::time::timeout(timeout, async {
            while finished.load(Ordering::SeqCst) < events {
                tokio::time::sleep(config.engine.tick()).await;
            }
        })
        .await;

        runtime.shutdown();
        scheduler.shutdown();
        done
    };
    let ((), done) = tokio::join!(host.run(), driver);

    let completed = finished.load(Ordering::SeqCst);
    match done {
        Ok(()) => info!(target: "tripwire::host", completed, "simulation finished"),
        Err(_) => anyhow::bail!("simulation timed out with {completed} of {events} invocations finished"),
    }
    Ok(())
}

/// set {_player} to the event's player, loop 1..n (wait, log player and loop-value), then count the invocation
fn demo_statements(iterations: usize, wait: Duration, finished: &Arc<AtomicUsize>) -> Vec<Statement> {
    let counter = Arc::clone(finished);
    let numbers = (1..=iterations).map(|n| Value::from(n as i64)).collect();
    vec![
        Statement::effect(SetLocal::new("player", Box::new(EventValue::new("player")))),
        Statement::loop_(
            Literal::list(numbers),
            vec![
                Statement::delay(Literal::new(Timespan::Finite(wait))),
                Statement::effect(Log::new(Box::new(LocalVariable::new("player")))),
                Statement::effect(Log::new(Box::new(LoopValue::innermost()))),
            ],
        ),
        Statement::effect(FnEffect::new("count finished invocation", move |_cx| {
            counter.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        })),
    ]
}
