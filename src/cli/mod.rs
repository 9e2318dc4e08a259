//! CLI Module
//!
//! Command-line interface for the Voxguard detector.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::Language;

/// Voxguard - AI-generated voice detection
#[derive(Parser, Debug)]
#[command(name = "voxguard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a single audio file
    #[command(name = "analyze")]
    Analyze {
        /// Audio file to classify
        file: PathBuf,

        /// Spoken language, reported back unchanged
        #[arg(short, long, default_value = "English", value_parser = parse_language)]
        language: Language,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify every audio file under a directory
    #[command(name = "scan")]
    Scan {
        /// Directory to walk
        dir: PathBuf,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the backend's label orientation against known clips
    #[command(name = "calibrate")]
    Calibrate {
        /// A clip known to be a human recording
        #[arg(long)]
        human: PathBuf,

        /// A clip known to be synthesized
        #[arg(long)]
        ai: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_language(s: &str) -> std::result::Result<Language, String> {
    Language::parse(s)
        .ok_or_else(|| format!("unsupported language '{}' (Tamil, English, Hindi, Malayalam, Telugu)", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from(["voxguard", "analyze", "clip.mp3", "-l", "hindi", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Analyze { file, language, json }) => {
                assert_eq!(file, PathBuf::from("clip.mp3"));
                assert_eq!(language, Language::Hindi);
                assert!(json);
            }
            other => panic!("Expected analyze, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_globals_after_subcommand() {
        let cli = Cli::try_parse_from([
            "voxguard", "calibrate", "--human", "h.wav", "--ai", "a.wav", "--config", "vg.json", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("vg.json")));
    }

    #[test]
    fn test_bad_language_rejected() {
        assert!(Cli::try_parse_from(["voxguard", "analyze", "clip.mp3", "-l", "klingon"]).is_err());
    }
}
