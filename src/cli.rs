//! Command-line interface for ChatArena
//!
//! Runs a headless battle from a JSON config, or the built-in demo scenario.

use clap::Parser;
use std::path::PathBuf;

use crate::headless::HeadlessBattleConfig;

/// Chat-driven battle arena simulator
#[derive(Parser, Debug)]
#[command(name = "chatarena")]
#[command(about = "Chat-driven battle arena simulation for stream overlays")]
#[command(version)]
pub struct Args {
    /// Run in headless mode with the specified JSON config file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: Option<PathBuf>,

    /// Battle settings RON file
    #[arg(long, value_name = "RON_FILE")]
    pub settings: Option<PathBuf>,

    /// Output path for the battle report
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum run duration in seconds
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Random seed for a reproducible battle
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    /// Apply command-line overrides on top of a loaded config
    pub fn apply_to(&self, config: &mut HeadlessBattleConfig) {
        if let Some(path) = &self.settings {
            config.settings_path = Some(path.to_string_lossy().into_owned());
            config.settings = None;
        }
        if let Some(path) = &self.output {
            config.output_path = Some(path.to_string_lossy().into_owned());
        }
        if let Some(secs) = self.max_duration {
            config.max_duration_secs = secs;
        }
        if let Some(seed) = self.seed {
            config.random_seed = Some(seed);
        }
    }
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config_values() {
        let args = Args::parse_from([
            "chatarena",
            "--seed",
            "99",
            "--max-duration",
            "30",
            "--output",
            "out/report.json",
        ]);
        let mut config = HeadlessBattleConfig::demo();
        args.apply_to(&mut config);

        assert_eq!(config.random_seed, Some(99));
        assert_eq!(config.max_duration_secs, 30.0);
        assert_eq!(config.output_path.as_deref(), Some("out/report.json"));
        assert!(args.headless.is_none());
    }

    #[test]
    fn test_no_flags_keeps_config() {
        let args = Args::parse_from(["chatarena"]);
        let mut config = HeadlessBattleConfig::demo();
        args.apply_to(&mut config);
        assert_eq!(config.random_seed, Some(7));
        assert_eq!(config.max_duration_secs, 300.0);
    }
}
