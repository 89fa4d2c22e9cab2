//! Command-line interface for the duel runner.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clash_core::ai::{Archetype, Difficulty};

/// Headless AI-vs-AI duel runner
#[derive(Parser, Debug)]
#[command(name = "clash")]
#[command(about = "Headless AI-vs-AI duel runner")]
#[command(version)]
pub struct Args {
    /// Match file describing the fighters (JSON)
    #[arg(long, value_name = "MATCH_FILE")]
    pub duel: Option<PathBuf>,

    /// Moveset override (JSON catalog)
    #[arg(long, value_name = "CATALOG_FILE")]
    pub catalog: Option<PathBuf>,

    /// Tuning override (JSON combat config)
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Master seed; overrides the match file
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum simulated seconds before declaring a draw
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Simulation ticks per second
    #[arg(long, default_value = "60")]
    pub tick_rate: u32,

    /// Play style of the first fighter when no match file is given
    #[arg(long, value_enum, default_value = "balanced")]
    pub red: StyleArg,

    /// Play style of the second fighter when no match file is given
    #[arg(long, value_enum, default_value = "balanced")]
    pub blue: StyleArg,

    /// Difficulty of both fighters when no match file is given
    #[arg(long, value_enum, default_value = "normal")]
    pub difficulty: DifficultyArg,

    /// Write the event log to this path (JSON)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Play style names accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleArg {
    Balanced,
    Aggressive,
    Defensive,
    Agile,
}

impl From<StyleArg> for Archetype {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Balanced => Self::Balanced,
            StyleArg::Aggressive => Self::Aggressive,
            StyleArg::Defensive => Self::Defensive,
            StyleArg::Agile => Self::Agile,
        }
    }
}

/// Difficulty names accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyArg {
    Easy,
    Normal,
    Hard,
    Expert,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Self::Easy,
            DifficultyArg::Normal => Self::Normal,
            DifficultyArg::Hard => Self::Hard,
            DifficultyArg::Expert => Self::Expert,
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
    fn defaults_parse() {
        let args = Args::try_parse_from(["clash"]).unwrap();
        assert_eq!(args.tick_rate, 60);
        assert_eq!(args.red, StyleArg::Balanced);
        assert!(args.duel.is_none());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn styles_and_verbosity() {
        let args =
            Args::try_parse_from(["clash", "--red", "aggressive", "--difficulty", "expert", "-vv"]).unwrap();
        assert_eq!(Archetype::from(args.red), Archetype::Aggressive);
        assert_eq!(Difficulty::from(args.difficulty), Difficulty::Expert);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn unknown_style_is_an_error() {
        assert!(Args::try_parse_from(["clash", "--blue", "sneaky"]).is_err());
    }
}
