//! hydroctl: replay driver for the control engine.
//!
//! Feeds a recording of raw sensor deliveries through the engine on a
//! simulated 3 s cadence and writes every outbound actuator command to
//! stdout as a JSON line.  Logs go to stderr.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  edge_executor::LocalExecutor                                │
//! │                                                              │
//! │  ┌──────────────────────┐  CommandQueue  ┌────────────────┐  │
//! │  │ replay task          │───────────────▶│ forwarder task │──┼─▶ stdout
//! │  │ ReplaySource ─▶ App  │◀───────────────│ JsonLines      │  │
//! │  └──────────────────────┘   failures     └────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `hydroctl [--config settings.json] [recording.jsonl]`
//! (`HYDROCTL_CONFIG` is read when `--config` is absent.)

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use hydroctl::adapters::config_file::JsonConfigFile;
use hydroctl::adapters::json_channel::JsonLinesChannel;
use hydroctl::adapters::log_sink::LogEventSink;
use hydroctl::adapters::replay_source::ReplaySource;
use hydroctl::adapters::time::ManualClock;
use hydroctl::app::events::AppEvent;
use hydroctl::app::ports::{ConfigPort, EventSink, ReadingSource};
use hydroctl::app::service::{AppService, Delivery};
use hydroctl::config::Settings;
use hydroctl::dispatch::queue::{CommandQueue, forward_commands};
use hydroctl::error::Error;

/// Simulated delivery cadence of the sensor node.
const TICK_MS: u64 = 3_000;

/// Telemetry is logged every this many deliveries.
const TELEMETRY_EVERY: u64 = 10;

const DEFAULT_RECORDING: &str = "scenarios/demo.jsonl";

struct Args {
    config: Option<String>,
    recording: String,
}

fn parse_args() -> Result<Args> {
    let mut config = None;
    let mut recording = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                config = Some(args.next().context("--config needs a path")?);
            }
            flag if flag.starts_with('-') => bail!("unknown flag {flag}"),
            path => recording = Some(path.to_owned()),
        }
    }
    Ok(Args {
        config: config.or_else(|| std::env::var("HYDROCTL_CONFIG").ok()),
        recording: recording.unwrap_or_else(|| DEFAULT_RECORDING.to_owned()),
    })
}

fn load_settings(path: Option<&str>) -> Result<Settings> {
    match path {
        Some(path) => JsonConfigFile::new(path)
            .load()
            .with_context(|| format!("loading settings from {path}")),
        None => Ok(Settings::default()),
    }
}

/// Drive the whole recording through the service, yielding after each
/// delivery so the forwarder can drain the queue.
async fn replay(
    mut app: AppService<ManualClock>,
    source: &mut impl ReadingSource,
    queue: &CommandQueue,
    sink: &mut impl EventSink,
) -> AppService<ManualClock> {
    let mut deliveries = 0u64;
    loop {
        match app.poll(source, &mut queue.channel(), sink) {
            Ok(Delivery::Exhausted) => break,
            Ok(Delivery::Processed(_) | Delivery::Skipped) => {}
            Err(Error::DuplicateReading) => debug!("duplicate delivery dropped"),
            Err(e) => warn!("delivery {}: {}", deliveries + 1, e),
        }
        deliveries += 1;

        futures_lite::future::yield_now().await;
        app.absorb_transport_failures(queue, sink);

        if deliveries % TELEMETRY_EVERY == 0 {
            sink.emit(&AppEvent::Telemetry(Box::new(app.build_telemetry())));
        }
        app.clock().advance(TICK_MS);
        app.tick(sink);
    }

    // Let the forwarder flush whatever the last delivery queued.
    while queue.pending() > 0 {
        futures_lite::future::yield_now().await;
    }
    app.absorb_transport_failures(queue, sink);
    app
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let settings = load_settings(args.config.as_deref())?;
    let mut source = ReplaySource::open(&args.recording)
        .with_context(|| format!("opening recording {}", args.recording))?;
    info!("hydroctl: replaying {}", args.recording);

    let clock = ManualClock::new(0);
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(settings, clock).context("invalid settings")?;
    app.start(&mut sink);
    app.source_connected(&mut sink);

    let queue = CommandQueue::new();
    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
    executor
        .spawn(forward_commands(&queue, JsonLinesChannel::new(std::io::stdout())))
        .detach();

    let app = futures_lite::future::block_on(executor.run(replay(
        app,
        &mut source,
        &queue,
        &mut sink,
    )));

    let telemetry = app.shutdown(&mut sink);
    info!(
        "hydroctl: final state {}",
        serde_json::to_string(&telemetry).context("serialising telemetry")?
    );
    Ok(())
}
