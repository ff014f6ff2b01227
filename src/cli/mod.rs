//! CLI module for Retouche.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{preview, Output};

use clap::{Parser, Subcommand};

/// Retouche - auditable transcript post-editing
///
/// Validates segment timing, infers domain context with an LLM, and applies
/// a small whitelist of confidence-gated text fixes. Timestamps and speaker
/// labels are never modified; every change is recorded.
#[derive(Parser, Debug)]
#[command(name = "retouche")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline: timing checks, context inference, editing
    Run {
        /// Input transcript (JSON)
        input: String,

        /// Output file ("-" or absent for stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// LLM model used for context inference
        #[arg(short, long, env = "RETOUCHE_MODEL")]
        model: Option<String>,
    },

    /// Check segment shape and timeline coherence
    Qa {
        /// Input transcript (JSON)
        input: String,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply the editor only, using the transcript's existing context_inferred
    Edit {
        /// Input transcript (JSON)
        input: String,

        /// Output file ("-" or absent for stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Check configuration and API access
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "retouche", "-vv", "run", "call.json", "-o", "out.json", "--model", "gpt-4o",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run { input, output, model } => {
                assert_eq!(input, "call.json");
                assert_eq!(output.as_deref(), Some("out.json"));
                assert_eq!(model.as_deref(), Some("gpt-4o"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["retouche", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }

    #[test]
    fn test_run_requires_input() {
        assert!(Cli::try_parse_from(["retouche", "run"]).is_err());
    }
}
