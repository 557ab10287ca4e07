//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Orbital organization maps: hierarchy rules, ring-slot layout and drag-and-drop re-parenting
#[derive(Parser, Debug)]
#[command(name = "orbitmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Node document (default: settings nodes_file)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the starter organization
    Init {
        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },

    /// Place every unplaced node and save
    Layout {
        /// Drop all placements first
        #[arg(long)]
        reset: bool,
        /// Print the result instead of saving
        #[arg(long)]
        dry_run: bool,
    },

    /// List nodes with type, parent and position
    List,

    /// Show the hierarchy as a tree
    Tree,

    /// Show candidate slots for a node type
    Slots {
        /// Node type (primary, secondary, tertiary)
        #[arg(short = 't', long = "type", default_value = "primary")]
        node_type: String,
        /// Anchor node (default: the root)
        #[arg(short, long)]
        parent: Option<String>,
        /// Number of rings (default: configured rings)
        #[arg(short, long)]
        rings: Option<usize>,
    },

    /// Add a child node
    Add {
        /// Parent node id
        parent: String,
        /// Node name
        name: String,
        /// Node type (default: the parent's default child type)
        #[arg(short = 't', long = "type")]
        node_type: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long)]
        budget: Option<f64>,
    },

    /// Edit node attributes
    Update {
        /// Node id
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        progress: Option<u8>,
        #[arg(short, long)]
        budget: Option<f64>,
        #[arg(long)]
        spent: Option<f64>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Remove a node and its subtree
    Remove {
        /// Node id
        id: String,
    },

    /// Move a node under another parent
    Reparent {
        /// Node id
        id: String,
        /// New parent id
        parent: String,
        /// Keep the current screen position
        #[arg(long)]
        keep_position: bool,
    },

    /// Turn a secondary node into a primary
    Promote {
        /// Node id
        id: String,
    },

    /// Turn a childless primary into a secondary under PARENT
    Demote {
        /// Node id
        id: String,
        /// New parent (a primary)
        parent: String,
    },

    /// Detach a node to the root orbit
    Unlink {
        /// Node id
        id: String,
    },

    /// Clear a node's position so layout places it again
    Reset {
        /// Node id
        id: String,
    },

    /// Drag a node and drop it at X,Y
    Drag {
        /// Node id
        id: String,
        x: f64,
        y: f64,
        /// Drop under a new parent
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Show progress and health roll-ups
    Status,

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
    /// Show effective settings
    Show,
    /// Show config file locations
    Path,
    /// Write a template config file
    Init {
        /// Write the global config instead of the local one
        #[arg(short, long)]
        global: bool,
    },
}
