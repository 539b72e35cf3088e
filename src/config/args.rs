//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::KeepAliveConfig;

/// keepalive - keep the system and display awake
///
/// Re-asserts the Windows "system required / display required" execution
/// state on a fixed interval and logs each heartbeat.
#[derive(Parser, Debug)]
#[command(name = "keepalive")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write diagnostic output to file instead of stderr
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Keep the system awake until stopped (default)
    Run(RunOverrides),

    /// Report whether another instance is currently running
    Status {
        /// Lock name to probe
        #[arg(long)]
        lock_name: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Print a commented sample configuration file instead
        #[arg(long, conflicts_with = "write")]
        sample: bool,

        /// Write the effective configuration to this path
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

/// Per-run settings that take precedence over file and environment
#[derive(clap::Args, Debug, Default, Clone)]
pub struct RunOverrides {
    /// Activity log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Heartbeat interval in seconds
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Name of the single-instance mutex
    #[arg(long)]
    pub lock_name: Option<String>,

    /// Keep only the system awake, let the display turn off
    #[arg(long)]
    pub no_display: bool,
}

impl RunOverrides {
    /// Apply these overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut KeepAliveConfig) {
        if let Some(path) = &self.log_file {
            config.log_path = path.clone();
        }
        if let Some(secs) = self.interval {
            config.interval_secs = secs;
        }
        if let Some(name) = &self.lock_name {
            config.lock_name = name.clone();
        }
        if self.no_display {
            config.keep_display = false;
        }
    }
}

impl Args {
    /// Whether -v or -q was given explicitly
    pub fn has_level_flags(&self) -> bool {
        self.quiet || self.verbose > 0
    }

    /// Get the log level based on verbose/quiet flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else {
            match self.verbose {
                0 => tracing::Level::INFO,
                1 => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            }
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Command::Run(RunOverrides::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_run() {
        let args = Args::parse_from(["keepalive"]);
        assert_eq!(args.log_level(), tracing::Level::INFO);
        assert!(!args.has_level_flags());
        assert!(matches!(args.command.unwrap_or_default(), Command::Run(_)));
    }

    #[test]
    fn test_run_overrides_apply() {
        let args = Args::parse_from([
            "keepalive",
            "-vv",
            "run",
            "--interval",
            "30",
            "--lock-name",
            "TestMutex",
            "--no-display",
        ]);
        assert_eq!(args.log_level(), tracing::Level::TRACE);

        let Some(Command::Run(overrides)) = args.command else {
            panic!("expected run command");
        };
        let mut config = KeepAliveConfig::default();
        let default_log = config.log_path.clone();
        overrides.apply(&mut config);

        assert_eq!(config.interval_secs, 30);
        assert_eq!(config.lock_name, "TestMutex");
        assert!(!config.keep_display);
        assert_eq!(config.log_path, default_log);
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let args = Args::parse_from(["keepalive", "-q", "-v", "status"]);
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
