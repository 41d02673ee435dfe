//! Command-line interface definitions.
//!
//! Thin demo surface over the decision core: classify a log blob, produce
//! a recovery decision for a signature payload, or simulate a full
//! recovery episode.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "medic")]
#[command(author, version, about = "Error-recovery decision engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a config file (defaults are used when absent)
    #[arg(long, global = true, env = "MEDIC_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify raw log text into an error signature
    Classify {
        /// Log text; read from stdin when omitted
        logs: Option<String>,
    },

    /// Decide a recovery action for a JSON error payload
    ///
    /// The payload is an object with "signature" and "context" fields;
    /// missing fields coerce to safe defaults.
    Decide {
        /// Path to the JSON payload; read from stdin when omitted
        payload: Option<PathBuf>,
    },

    /// Simulate a bounded recovery episode for a JSON error payload
    Simulate {
        /// Path to the JSON payload; read from stdin when omitted
        payload: Option<PathBuf>,

        /// Seed for the outcome source; identical seeds reproduce episodes
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}
