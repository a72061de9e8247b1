//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG: &str = "seisplot.json5";

/// Fetch, cache and plot seismic waveforms.
#[derive(Parser, Debug, Clone)]
#[command(name = "seisplot", version, about)]
pub struct Args {
    /// Path to configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// What to produce.
#[derive(Subcommand, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Command {
    /// Waveform timeline, then the station map.
    #[default]
    All,
    /// Fetch or load waveforms and render the timeline.
    Waveforms,
    /// Render the station map.
    Map,
    /// List the stations cached for the configured duration.
    Cache,
}

impl Args {
    /// The requested command, `all` when none was given.
    pub fn command_or_default(&self) -> Command {
        self.command.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["seisplot"]).unwrap();
        assert_eq!(args.config, PathBuf::from("seisplot.json5"));
        assert_eq!(args.log_level, None);
        assert_eq!(args.command_or_default(), Command::All);
    }

    #[test]
    fn test_config_and_subcommand() {
        let args = Args::try_parse_from([
            "seisplot",
            "--config",
            "quake.json5",
            "--log-level",
            "debug",
            "map",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("quake.json5"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.command_or_default(), Command::Map);
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(Args::try_parse_from(["seisplot", "plot"]).is_err());
    }
}
