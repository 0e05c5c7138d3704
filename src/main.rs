use clap::Parser;
use spotfinder::api::{JsonFormatter, NavigationPanel, TextFormatter};
use spotfinder::core::{Clock, HeadingReading, TokioClock};
use spotfinder::hardware::{MockOrientationSensor, MockPositionSource, OrientationEvent};
use spotfinder::processing::{HeadingSource, PositionAcquirer};
use spotfinder::reminder::{format_remaining, AlertError, AlertSink, CountdownTimer, ExpiryWatcher};
use spotfinder::storage::{JsonSpotStore, MemorySpotStore, SavedSpot, SpotStore};
use spotfinder::utils::{ConfigurationManager, SpotfinderConfig};
use spotfinder::NavigationState;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "spotfinder")]
#[command(about = "Find your way back to a parked car (scripted sensor session)", long_about = None)]
struct Args {
    /// Latitude of the parking spot
    #[arg(long, default_value_t = 47.4979, allow_hyphen_values = true)]
    spot_lat: f64,

    /// Longitude of the parking spot
    #[arg(long, default_value_t = 19.0402, allow_hyphen_values = true)]
    spot_lon: f64,

    /// Simulated compass heading while walking back (degrees)
    #[arg(long, default_value_t = 30.0)]
    heading: f64,

    /// Start a parking-meter countdown of this many minutes and wait for it
    #[arg(long)]
    minutes: Option<f64>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Persist the saved spot to this JSON file
    #[arg(long)]
    spot_file: Option<PathBuf>,

    /// Print panels as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

/// Logs the expiry instead of notifying a user
struct LogAlertSink;

#[async_trait::async_trait]
impl AlertSink for LogAlertSink {
    async fn notify(&mut self, title: &str, body: &str) -> Result<(), AlertError> {
        println!("*** {}: {} ***", title, body);
        Ok(())
    }

    async fn play_tone(&mut self) -> Result<(), AlertError> {
        info!("beep");
        Ok(())
    }
}

fn print_panel(panel: &NavigationPanel, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", JsonFormatter::new().format_json(panel)?);
    } else {
        println!("{}", TextFormatter::new().format_text(panel));
    }
    Ok(())
}

/// Scripted receiver warming up around `lat`/`lon`
fn scripted_fixes(clock: &TokioClock, lat: f64, lon: f64) -> MockPositionSource {
    let now = clock.now_ms();
    let mut source = MockPositionSource::new();
    source
        .push_fix(200, lat + 0.0004, lon - 0.0003, Some(60.0), now + 200)
        .push_fix(600, lat + 0.0001, lon + 0.0001, Some(35.0), now + 600)
        .push_fix(1_100, lat, lon, Some(12.0), now + 1_100);
    source
}

async fn run(args: Args, config: SpotfinderConfig) -> Result<(), Box<dyn Error>> {
    let clock = TokioClock::new();
    let mut store: Box<dyn SpotStore> = match &args.spot_file {
        Some(path) => Box::new(JsonSpotStore::new(path)),
        None => Box::new(MemorySpotStore::new()),
    };

    // Saving the spot
    let source = scripted_fixes(&clock, args.spot_lat, args.spot_lon);
    let mut acquirer = PositionAcquirer::with_config(source, clock, config.acquisition);
    let parked = match acquirer.acquire().await {
        Ok(sample) => sample,
        Err(error) => {
            let panel = NavigationPanel::from_fix(None).with_error(&error);
            return print_panel(&panel, args.json);
        }
    };
    let spot = SavedSpot::from_sample(&parked, clock.now_ms()).with_note("demo spot");
    store.save(&spot)?;
    println!("Saved spot at {:.6}, {:.6}\n", spot.lat, spot.lon);

    // Walking back from a few hundred meters away
    let spot = store.load()?.ok_or("saved spot disappeared")?;
    let mut state = NavigationState::with_target(spot.target());
    print_panel(&NavigationPanel::from_fix(state.fix().as_ref()), args.json)?;

    let source = scripted_fixes(&clock, spot.lat + 0.0025, spot.lon + 0.0030);
    let mut acquirer = PositionAcquirer::with_config(source, clock, config.acquisition);
    match acquirer.acquire().await {
        Ok(sample) => state.update_position(sample),
        Err(error) => {
            let panel = NavigationPanel::from_fix(None).with_error(&error);
            return print_panel(&panel, args.json);
        }
    }

    let (sensor, events) = MockOrientationSensor::channel();
    let heading = HeadingSource::new(sensor);
    if !heading.request_permission().await {
        warn!("compass unavailable, navigating north-up");
    }

    let (tx, mut readings) = mpsc::unbounded_channel::<HeadingReading>();
    let subscription = heading.start(move |reading| {
        let _ = tx.send(reading);
    });

    for event in [
        OrientationEvent::compass(args.heading),
        OrientationEvent::rotation(360.0 - args.heading),
        OrientationEvent::default(),
    ] {
        events.send(event)?;
    }
    drop(events);

    while let Some(reading) = readings.recv().await {
        state.update_heading(&reading);
        let panel = NavigationPanel::from_fix(state.fix().as_ref()).with_heading(&reading);
        print_panel(&panel, args.json)?;
    }
    if let Some(subscription) = subscription {
        subscription.stop();
    }

    // Parking meter
    if let Some(minutes) = args.minutes {
        let mut watcher = ExpiryWatcher::with_interval(
            CountdownTimer::new(clock),
            Duration::from_millis(config.reminder.tick_interval_ms),
        );
        let started = watcher.start(minutes);
        println!("Meter set for {}", format_remaining(started.remaining_ms));

        // One line per started minute
        let mut last_minute = None;
        let finished = watcher
            .run_with(&mut LogAlertSink, |tick| {
                let minute = tick.remaining_ms.div_ceil(60_000);
                if last_minute != Some(minute) {
                    println!("Meter: {}", format_remaining(tick.remaining_ms));
                    last_minute = Some(minute);
                }
            })
            .await;
        let panel = NavigationPanel::from_fix(state.fix().as_ref()).with_countdown(&finished);
        print_panel(&panel, args.json)?;
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => *ConfigurationManager::from_file(path)?.config(),
        None => SpotfinderConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(run(args, config))
}
