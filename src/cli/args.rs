//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::{DestroyPolicy, Traversal};

/// Ownership tree for scene objects: build, paint and tear down headless scenes
#[derive(Parser, Debug)]
#[command(name = "cobra")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding the local .cobra.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the ownership hierarchy of a scene
    Tree {
        /// Scene file (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        scene: String,
    },

    /// Paint a scene for a number of frames
    Run {
        /// Scene file (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        scene: String,
        /// Frames to paint (default from config)
        #[arg(short, long)]
        frames: Option<u64>,
        /// Destroy policy for objects expiring during the run
        #[arg(short, long)]
        policy: Option<DestroyPolicy>,
        /// Paint order within a subtree
        #[arg(short, long)]
        traversal: Option<Traversal>,
    },

    /// Destroy one object and show what is left
    Destroy {
        /// Scene file (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        scene: String,
        /// Name of the object to destroy
        name: String,
        /// cascade | reparent-orphans (default from config)
        #[arg(short, long)]
        policy: Option<DestroyPolicy>,
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
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
    /// Print a commented template config
    Template,
}
