use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `sop-critic` - runs a standard operating procedure with a critic in the loop.
#[derive(Parser, Debug)]
#[command(name = "sop-critic")]
#[command(version)]
#[command(about = "An SOP-executing agent kept honest by a critic.", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.sop-critic/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute an SOP with the main agent and the critic taking turns
    Run {
        /// SOP document (defaults to `sop_path` from config, then the built-in example)
        #[arg(long)]
        sop: Option<PathBuf>,

        /// Instruction that seeds the transcript
        #[arg(long)]
        instruction: Option<String>,

        /// Override control.max_revisions
        #[arg(long)]
        max_revisions: Option<u32>,

        /// Override the model for both roles
        #[arg(long)]
        model: Option<String>,

        /// Print updates as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Execute an SOP with a single tool-using agent and no critic
    Solo {
        #[arg(long)]
        sop: Option<PathBuf>,
    },

    /// Write the state machine as a Mermaid diagram
    Graph {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List every tool available to the main agent
    Tools,
}
