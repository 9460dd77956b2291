//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Expand TypeScript interface annotations into apiDoc parameter directives
#[derive(Parser, Debug)]
#[command(name = "surveyor")]
#[command(about = "Expand TypeScript interface annotations into apiDoc parameter directives")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Expand annotations found under a path and print the generated directives
    Expand {
        /// File or directory to scan for annotations
        path: PathBuf,

        /// Output format (apidoc or json)
        #[arg(long, default_value = "apidoc")]
        format: String,

        /// Glob patterns to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// Verbose output with progress
        #[arg(short, long)]
        verbose: bool,
    },

    /// Expand all annotations and fail when any directive cannot be resolved
    Check {
        /// File or directory to scan for annotations
        path: PathBuf,

        /// Glob patterns to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,
    },
}
