//! CLI - Command-line argument parsing
//!
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ticket triage CLI
#[derive(Parser, Debug)]
#[command(name = "triagectl")]
#[command(about = "Ticket triage - tier classification, priority and auto-fix lookup", long_about = None)]
#[command(version = env!("TRIAGECTL_VERSION"))]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Configuration file (overrides ~/.config/triage/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Generate a corpus, train, evaluate and save the model artifacts
    Train {
        /// Number of synthetic tickets
        #[arg(long)]
        samples: Option<usize>,

        /// Trees in the forest
        #[arg(long)]
        trees: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Train on a split and report metrics; nothing is saved
    Evaluate {
        #[arg(long)]
        samples: Option<usize>,

        /// Share of each tier used for training
        #[arg(long)]
        fraction: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        trees: Option<usize>,
    },

    /// Predict the support tier of a description
    Classify {
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },

    /// Priority for an urgency/impact pair (1 = high, 3 = low)
    Priority { urgency: u8, impact: u8 },

    /// Automated fix for a catalog issue
    Resolve {
        #[arg(required = true, num_args = 1..)]
        issue: Vec<String>,
    },

    /// List the issue catalog
    Issues {
        /// Only this category
        category: Option<String>,
    },

    /// Assemble an escalation ticket (fixes are dry-run)
    Ticket {
        /// Problem description
        #[arg(long = "desc")]
        description: String,

        #[arg(long, default_value = "2")]
        urgency: String,

        #[arg(long, default_value = "2")]
        impact: String,

        /// Catalog issue the user picked
        #[arg(long)]
        issue: Option<String>,
    },

    /// Show or update configuration
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,

        /// Set a configuration value (key=value)
        #[arg(long)]
        set: Option<String>,
    },
}

impl Commands {
    /// Name recorded in the invocation log
    pub fn name(&self) -> &'static str {
        match self {
            Self::Train { .. } => "train",
            Self::Evaluate { .. } => "evaluate",
            Self::Classify { .. } => "classify",
            Self::Priority { .. } => "priority",
            Self::Resolve { .. } => "resolve",
            Self::Issues { .. } => "issues",
            Self::Ticket { .. } => "ticket",
            Self::Config { .. } => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_joins_words() {
        let cli = Cli::try_parse_from(["triagectl", "classify", "excel", "crashing"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Classify {
                description: vec!["excel".into(), "crashing".into()]
            }
        );
        assert_eq!(cli.command.name(), "classify");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["triagectl", "priority", "1", "3", "-v", "--config", "/tmp/t.toml"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
        assert_eq!(cli.command, Commands::Priority { urgency: 1, impact: 3 });
    }

    #[test]
    fn test_ticket_defaults() {
        let cli = Cli::try_parse_from(["triagectl", "ticket", "--desc", "vpn drops"]).unwrap();
        match cli.command {
            Commands::Ticket {
                description,
                urgency,
                impact,
                issue,
            } => {
                assert_eq!(description, "vpn drops");
                assert_eq!(urgency, "2");
                assert_eq!(impact, "2");
                assert_eq!(issue, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_requires_text() {
        assert!(Cli::try_parse_from(["triagectl", "classify"]).is_err());
    }
}
