//! # CLI Argument Definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI structure parsing command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "campus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Class registration engine over an in-process document store")]
pub struct Cli {
    /// TOML configuration file; built-in defaults apply when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON fixture of the form {"classes": {id: {...}}, "users": {id: {...}}}
    #[arg(short, long, global = true)]
    pub fixture: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a student into a section
    Register(RequestArgs),
    /// Remove a student from a section
    Unregister(RequestArgs),
    /// Show how a `days | periods | room | date-range` string is understood
    Parse {
        schedule: String,
    },
    /// List the students holding a section
    Roster {
        section: String,
    },
    /// List the sections of a term
    Sections {
        term: String,
    },
}

#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Student document id, uid or username
    pub student: String,
    pub section: String,
    pub term: String,
}
