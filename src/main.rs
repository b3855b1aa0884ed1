//! Shutter Trigger CLI
//!
//! Replays sensor streams through the trigger engine and runs back-tap calibration.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use shutter_trigger::{
    activity::{create_shared_log_with_persistence, ActivityLog},
    collector::{Collector, CollectorConfig, InputEvent, ScriptEvent, SensorSample},
    config::Config,
    core::{CalibrationError, CalibrationSession, Trigger, TriggerEngine},
    driver::{Activation, EventClock},
    settings::{keys, JsonSettingsStore, SettingValue, Settings, SettingsStore},
    CALIBRATION_INSTRUCTIONS, VERSION,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shutter-trigger")]
#[command(version = VERSION)]
#[command(about = "Hands-free camera shutter triggers from device sensors", long_about = None)]
struct Cli {
    /// Log detector decisions
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed an event stream through the trigger engine
    Run {
        /// JSON-lines event script (reads stdin when omitted)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Stamp events with the wall clock instead of their `at_ms`
        #[arg(long)]
        live: bool,
    },

    /// Derive the back-tap threshold from three taps
    Calibrate {
        /// JSON-lines event script (reads stdin when omitted)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Stamp events with the wall clock instead of their `at_ms`
        #[arg(long)]
        live: bool,
    },

    /// Show the current trigger settings
    Settings,

    /// Change one trigger setting
    Set {
        /// Setting name, e.g. back_tap_enabled
        key: String,
        /// New value
        value: String,
    },

    /// Pause triggering
    Pause,

    /// Resume triggering
    Resume,

    /// Show configuration and cumulative activity
    Status,

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run { script, live } => cmd_run(script.as_deref(), live),
        Commands::Calibrate { script, live } => cmd_calibrate(script.as_deref(), live),
        Commands::Settings => cmd_settings(),
        Commands::Set { key, value } => cmd_set(&key, &value),
        Commands::Pause => cmd_set_paused(true),
        Commands::Resume => cmd_set_paused(false),
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "shutter_trigger=debug"
    } else {
        "shutter_trigger=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Config {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config, using defaults: {e}");
        Config::default()
    });
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }
    config
}

fn open_store(config: &Config) -> Result<JsonSettingsStore> {
    JsonSettingsStore::open(&config.settings_path)
        .with_context(|| format!("opening settings at {:?}", config.settings_path))
}

/// Start the collector on a script file or stdin.
fn start_collector(config: &Config, script: Option<&Path>) -> Result<Collector> {
    let mut collector = Collector::new(CollectorConfig {
        capacity: config.channel_capacity,
    });
    match script {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening script {path:?}"))?;
            collector.start(BufReader::new(file))?;
        }
        None => collector.start(BufReader::new(std::io::stdin()))?,
    }
    Ok(collector)
}

fn set_ctrlc_handler() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")?;
    Ok(running)
}

fn cmd_run(script: Option<&Path>, live: bool) -> Result<()> {
    println!("Shutter Trigger v{VERSION}");
    println!();

    let config = load_config();
    let store = open_store(&config)?;
    let settings = Settings::read(&store);
    print_enabled(&settings);
    if !settings.any_enabled() {
        eprintln!("Warning: No trigger is enabled. Use `shutter-trigger set <key> true`.");
    }

    let activity = create_shared_log_with_persistence(config.activity_path());
    let mut event_clock = EventClock::new(live);

    let sink = Arc::clone(&activity);
    let mut engine = TriggerEngine::new(store, event_clock.clock()).with_dispatcher(
        move |trigger: &Trigger| {
            sink.record_fire(trigger.kind);
            println!("[{:>8} ms] Take picture ({})", trigger.at_ms, trigger.kind);
        },
    );

    let running = set_ctrlc_handler()?;
    let mut collector = start_collector(&config, script)?;

    let mut activation = Activation::new(config.paused);
    activation.apply(&mut engine, &activity);
    if activation.is_paused() {
        println!("Triggering is currently paused.");
        println!("Run `shutter-trigger resume` to start.");
    }
    println!("Press Ctrl+C to stop");
    println!();

    let receiver: Receiver<ScriptEvent> = collector.receiver().clone();
    let mut last_config_check = Instant::now();

    while running.load(Ordering::SeqCst) {
        // Reload config so `shutter-trigger pause/resume` can control a running engine.
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(cfg) = Config::load() {
                if activation.set_paused(cfg.paused, &mut engine, &activity) {
                    if activation.is_paused() {
                        println!("Pausing...");
                    } else if activation.is_foreground() {
                        println!("Resuming...");
                    } else {
                        println!("Resumed, waiting for the camera app to return");
                    }
                }
            }
            last_config_check = Instant::now();
        }

        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                event_clock.stamp(event.at_ms);
                activation.handle_event(event.event, &mut engine, &activity);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    collector.stop();
    engine.stop();

    if collector.rejected_lines() > 0 {
        eprintln!(
            "Warning: {} malformed line(s) were skipped",
            collector.rejected_lines()
        );
    }
    if let Err(e) = activity.save() {
        eprintln!("Warning: Could not save activity stats: {e}");
    }

    println!();
    println!("{}", activity.summary());
    Ok(())
}

fn cmd_calibrate(script: Option<&Path>, live: bool) -> Result<()> {
    println!("{CALIBRATION_INSTRUCTIONS}");

    let config = load_config();
    let mut store = open_store(&config)?;
    let mut event_clock = EventClock::new(live);
    let mut session = CalibrationSession::new(event_clock.clock());

    let running = set_ctrlc_handler()?;
    let mut collector = start_collector(&config, script)?;
    session.start();

    let receiver = collector.receiver().clone();
    while running.load(Ordering::SeqCst) && !session.is_complete() {
        let event = match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        event_clock.stamp(event.at_ms);

        if let InputEvent::Sample(SensorSample::Accelerometer { x, y, z }) = event.event {
            if session.feed_accelerometer(x, y, z) {
                let (collected, required) = session.progress();
                println!("Tap {collected}/{required} recorded");
            }
        }
    }
    collector.stop();

    match session.commit(&mut store) {
        Ok(threshold) => {
            println!();
            println!("Back-tap threshold set to {threshold:.2}");

            let activity = ActivityLog::with_persistence(config.activity_path());
            activity.record_calibration();
            if let Err(e) = activity.save() {
                eprintln!("Warning: Could not save activity stats: {e}");
            }
            Ok(())
        }
        Err(CalibrationError::Incomplete {
            collected,
            required,
        }) => {
            session.abandon();
            bail!("calibration stopped after {collected} of {required} taps; threshold unchanged")
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_settings() -> Result<()> {
    let config = load_config();
    let store = open_store(&config)?;
    let settings = Settings::read(&store);

    println!("Trigger Settings");
    println!("================");
    println!();
    println!("Settings file: {:?}", config.settings_path);
    println!();
    for key in keys::ALL {
        let value = match key {
            keys::PROXIMITY_ENABLED => SettingValue::Bool(settings.proximity_enabled),
            keys::VIBRATION_ENABLED => SettingValue::Bool(settings.vibration_enabled),
            keys::VIBRATION_SENSITIVITY => SettingValue::Int(settings.vibration_sensitivity),
            keys::BACK_TAP_ENABLED => SettingValue::Bool(settings.back_tap_enabled),
            keys::BACK_TAP_THRESHOLD => SettingValue::Float(settings.back_tap_threshold),
            keys::FINGERPRINT_ENABLED => SettingValue::Bool(settings.fingerprint_enabled),
            _ => SettingValue::Bool(settings.volume_key_enabled),
        };
        let origin = if store.get(key).is_some() {
            ""
        } else {
            " (default)"
        };
        println!("  {key:<22} {value}{origin}");
    }
    Ok(())
}

fn cmd_set(key: &str, raw: &str) -> Result<()> {
    let config = load_config();
    let mut store = open_store(&config)?;
    let value = SettingValue::parse_for(key, raw)?;
    store.set(key, value).context("saving settings")?;
    println!("{key} = {value}");
    Ok(())
}

fn cmd_set_paused(paused: bool) -> Result<()> {
    let mut config = Config::load().unwrap_or_default();
    config.paused = paused;
    config.save().context("saving config")?;
    if paused {
        println!("Triggering paused. Use 'shutter-trigger resume' to continue.");
    } else {
        println!("Triggering resumed.");
    }
    Ok(())
}

fn cmd_status() -> Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("Shutter Trigger Status");
    println!("======================");
    println!();
    println!("Paused: {}", config.paused);

    let settings = JsonSettingsStore::open(&config.settings_path)
        .map(|store| Settings::read(&store))
        .unwrap_or_default();
    print_enabled(&settings);
    println!();

    let stats_path = config.activity_path();
    if stats_path.exists() {
        let stats = ActivityLog::with_persistence(stats_path).stats();
        println!("Cumulative Statistics:");
        println!("  Samples processed: {}", stats.samples.total());
        println!("  Pictures triggered: {}", stats.fires.total());
        println!("  Engine activations: {}", stats.activations);
        println!("  Calibrations: {}", stats.calibrations);
    } else {
        println!("No previous session data found.");
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn print_enabled(settings: &Settings) {
    let on_off = |enabled: bool| if enabled { "enabled" } else { "disabled" };
    println!("Triggers:");
    println!("  Proximity wave: {}", on_off(settings.proximity_enabled));
    println!(
        "  Shake: {} (sensitivity {})",
        on_off(settings.vibration_enabled),
        settings.vibration_sensitivity
    );
    println!(
        "  Back tap: {} (threshold {:.2})",
        on_off(settings.back_tap_enabled),
        settings.back_tap_threshold
    );
    println!("  Fingerprint swipe: {}", on_off(settings.fingerprint_enabled));
    println!("  Volume key: {}", on_off(settings.volume_key_enabled));
}
