//! ChatArena - chat-driven battle arena for stream overlays
//!
//! Runs a headless battle from a JSON config, or the built-in demo scenario
//! when no config is given.

use chatarena::cli;
use chatarena::headless::{run_headless_battle, HeadlessBattleConfig};
use chatarena::settings::BattleSettings;

fn main() {
    let args = cli::parse_args();

    let mut config = match &args.headless {
        Some(path) => match HeadlessBattleConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("No config given, running the demo scenario");
            HeadlessBattleConfig::demo()
        }
    };
    args.apply_to(&mut config);

    // Fall back to the settings file in the working directory
    if config.settings.is_none() && config.settings_path.is_none() {
        let default_path = BattleSettings::settings_path();
        if default_path.exists() {
            config.settings_path = Some(default_path.to_string_lossy().into_owned());
        }
    }

    match run_headless_battle(config) {
        Ok(report) => {
            match (&report.outcome, &report.winner_name) {
                (Some(_), Some(name)) => println!("Winner: {}", name),
                (Some(outcome), None) => println!("Outcome: {:?}", outcome),
                (None, _) => println!("No battle took place"),
            }
            for stat in &report.ranking {
                println!(
                    "  #{} {:<20} dmg {:>6.0}  kills {}  dps {:>5.1}",
                    stat.rank, stat.name, stat.damage_dealt, stat.kills, stat.dps
                );
            }
        }
        Err(e) => {
            eprintln!("Headless run failed: {}", e);
            std::process::exit(1);
        }
    }
}
