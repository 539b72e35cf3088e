//! keepalive - keep the system and display awake

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keepalive::config::{Args, Command, KeepAliveConfig, RunOverrides};
use keepalive::instance::InstanceGuard;
use keepalive::keeper::{install_stop_handler, KeepAlive, RunOutcome};

fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = load_config(&args);

    // Initialize logging
    let file_level = loaded.as_ref().ok().map(|c| c.log_level.clone());
    init_logging(&args, file_level.as_deref())?;

    let mut config = loaded?;

    // Execute command
    match args.command.unwrap_or_default() {
        Command::Run(overrides) => cmd_run(config, &overrides),
        Command::Status { lock_name } => {
            if let Some(name) = lock_name {
                config.lock_name = name;
            }
            cmd_status(&config)
        }
        Command::Config { sample, write } => cmd_config(&config, sample, write),
    }
}

/// RUST_LOG > -v/-q flags > config file level
fn init_logging(args: &Args, file_level: Option<&str>) -> Result<()> {
    let level = match file_level {
        Some(level) if !args.has_level_flags() => level.to_string(),
        _ => args.log_level().to_string(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if let Some(log_file) = &args.log {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .with_context(|| format!("Failed to open log file {:?}", log_file))?;
        subscriber
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Defaults < config file < environment
///
/// Runs before logging is set up, so problems go to stderr.
fn load_config(args: &Args) -> Result<KeepAliveConfig> {
    let mut config = match &args.config {
        Some(path) => KeepAliveConfig::load(path)?,
        None => KeepAliveConfig::load_default().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config: {}, using defaults", e);
            KeepAliveConfig::default()
        }),
    };
    config.apply_env()?;
    Ok(config)
}

/// Keep the machine awake until stopped
fn cmd_run(mut config: KeepAliveConfig, overrides: &RunOverrides) -> Result<()> {
    overrides.apply(&mut config);
    let keeper = KeepAlive::from_config(&config)?;

    info!(
        "Logging activity to {:?}, heartbeat every {}s",
        config.log_path, config.interval_secs
    );

    // Ctrl+C, console close and logoff all end the loop cleanly
    let stop_rx = install_stop_handler()?;

    match keeper.run(&stop_rx)? {
        RunOutcome::AlreadyRunning => {
            println!("keepalive is already running.");
        }
        RunOutcome::Stopped { heartbeats } => {
            info!("Stopped after {} heartbeats", heartbeats);
        }
    }

    let status = keeper.activity_log().status();
    if status.failures > 0 {
        warn!(
            "{} activity log entries could not be written (last error: {})",
            status.failures,
            status.last_error.unwrap_or_default()
        );
    }

    Ok(())
}

/// Report whether an instance holds the lock
fn cmd_status(config: &KeepAliveConfig) -> Result<()> {
    if InstanceGuard::is_running(&config.lock_name)? {
        println!("keepalive is running (lock '{}').", config.lock_name);
    } else {
        println!("keepalive is not running (lock '{}').", config.lock_name);
    }
    Ok(())
}

/// Show, sample or write the configuration
fn cmd_config(
    config: &KeepAliveConfig,
    sample: bool,
    write: Option<std::path::PathBuf>,
) -> Result<()> {
    if sample {
        print!("{}", KeepAliveConfig::sample_config());
        return Ok(());
    }

    if let Some(path) = write {
        config.validate()?;
        config.save(&path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    println!("Effective configuration:\n");
    println!("  Log file:     {}", config.log_path.display());
    println!("  Interval:     {}s", config.interval_secs);
    println!("  Lock name:    {}", config.lock_name);
    println!(
        "  Keep display: {}",
        if config.keep_display { "Yes" } else { "No" }
    );
    println!("  Log level:    {}", config.log_level);
    Ok(())
}
