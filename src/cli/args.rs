//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::{Division, LayoutPolicy, Point};

/// Employee compensation tracker: org hierarchy reconciliation, drag-and-drop re-parenting, raise reviews
#[derive(Parser, Debug)]
#[command(name = "comptrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Flat relation file, overrides `store_path` from config
    #[arg(long, global = true, env = "COMPTRACK_STORE", value_hint = ValueHint::FilePath)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the hierarchy as trees
    Tree,

    /// Build the hierarchy and report integrity
    Check,

    /// Print positioned boxes for rendering
    Layout {
        /// Layout policy (default from config)
        #[arg(long)]
        policy: Option<LayoutPolicy>,
        /// Canvas width
        #[arg(long)]
        width: Option<f64>,
        /// Canvas height
        #[arg(long)]
        height: Option<f64>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Re-parent an employee under a new supervisor
    Reassign {
        /// Employee id
        employee: String,
        /// New supervisor: id, or "First Last"
        #[arg(long = "to")]
        supervisor: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Move an employee into a division
    MoveDivision {
        /// Employee id
        employee: String,
        /// Target division
        division: Division,
        /// New supervisor in that division: id, or "First Last"
        #[arg(long)]
        under: Option<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Replay a drag gesture: grab an employee's box and drop it at X,Y
    Drag {
        /// Employee id
        employee: String,
        /// Drop point in canvas coordinates
        #[arg(long = "to", value_name = "X,Y")]
        to: Point,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Apply a persist request body (JSON) and print the response
    Apply {
        /// Request file, or "-" for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// List raise reviews that are due
    Review {
        /// Reference date (default: today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        today: Option<chrono::NaiveDate>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
