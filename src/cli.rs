use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mediastats",
    version,
    about = "Chart-ready statistics for a media library + MCP server"
)]
pub struct Cli {
    /// Run as MCP (Model Context Protocol) JSON-RPC server over stdio
    #[arg(long)]
    pub mcp: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every dashboard panel from a directory of saved summaries
    Render {
        /// Directory holding stats.json, codec.json, ...
        #[arg(default_value = ".")]
        directory: String,

        /// Print the dashboard as JSON instead of a terminal view
        #[arg(long)]
        json: bool,

        /// Seed for generated chart colours
        #[arg(long)]
        seed: Option<u64>,

        /// Config file (default: <config dir>/mediastats/config.json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Append the share of the total to every distribution label
        #[arg(long)]
        percentages: bool,

        /// Number of codecs to chart
        #[arg(long)]
        codec_top: Option<usize>,

        /// Keep repeated labels as separate entries instead of summing them
        #[arg(long)]
        keep_duplicates: bool,
    },

    /// Format a byte count with binary units (e.g. "1.50 KB")
    Bytes {
        /// Byte count
        #[arg(allow_negative_numbers = true)]
        bytes: f64,

        /// Digits after the decimal point
        #[arg(long, default_value = "2")]
        decimals: usize,
    },

    /// Format a duration in milliseconds (e.g. "2 Std. 0 Min. 0 Sek.")
    Duration {
        /// Duration in milliseconds
        ms: u64,
    },
}
