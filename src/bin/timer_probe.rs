//! Runs a 1 ms timer for a few seconds and reports how precise it was.
//!
//! Log level comes from `MICROTIMER_LOG` (trace, debug, info, warn, error).

use std::time::Duration;

use anyhow::Context;
use microtimer::{GraphSource, IngestMode, TimerBuilder, TimerGraph, WaitPolicy, channel};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

const INTERVAL_MICROS: i64 = 1_000;
const LATE_THRESHOLD_MICROS: i64 = 500;
const RUN_FOR: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_level = match std::env::var("MICROTIMER_LOG")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_names(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let timer = TimerBuilder::new()
        .with_interval_micros(INTERVAL_MICROS)
        .with_late_threshold_micros(LATE_THRESHOLD_MICROS)
        .with_wait_policy(WaitPolicy::Balanced)
        .with_thread_name("timer-probe")
        .build()
        .context("timer unavailable on this host")?;

    let (delay_graph, _) = TimerGraph::attach(&timer, GraphSource::Delay, IngestMode::Push);
    let (execution_graph, _) =
        TimerGraph::attach(&timer, GraphSource::HandlerExecution, IngestMode::Push);
    let (sink, events) = channel(4_096);
    timer.subscribe(sink.clone());

    info!(interval = INTERVAL_MICROS, "starting timer");
    timer.start()?;

    let consumer = tokio::spawn(async move {
        let mut received = 0_u64;
        let mut worst_lateness = 0_i64;
        while let Ok(event) = events.recv().await {
            received += 1;
            worst_lateness = worst_lateness.max(event.lateness_micros);
        }
        (received, worst_lateness)
    });

    tokio::time::sleep(RUN_FOR).await;
    let stopped = tokio::task::spawn_blocking(move || {
        timer.stop(true);
        timer.stats()
    })
    .await?;
    // The timer and its sender clone are gone; closing ours ends the consumer.
    let dropped = sink.dropped();
    drop(sink);
    let (received, worst_lateness) = consumer.await?;

    info!(
        scheduled = stopped.scheduled,
        delivered = stopped.delivered,
        suppressed = stopped.suppressed,
        faults = stopped.handler_faults,
        received,
        dropped,
        worst_lateness,
        "timer stopped"
    );
    if stopped.suppressed > 0 {
        warn!(
            suppressed = stopped.suppressed,
            "ticks were later than {LATE_THRESHOLD_MICROS}us"
        );
    }

    for (name, graph) in [("delay", &delay_graph), ("handler", &execution_graph)] {
        if let Some(summary) = graph.summary() {
            println!(
                "{name:>8}: n={} min={:.0}us mean={:.1}us max={:.0}us",
                summary.count, summary.min, summary.mean, summary.max
            );
        }
        let line: String = graph.sparkline().chars().rev().take(100).collect();
        println!("{name:>8}: {}", line.chars().rev().collect::<String>());
    }

    Ok(())
}
