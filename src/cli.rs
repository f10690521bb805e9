use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jobreel")]
#[command(author, version, about = "Turns job postings into short vertical videos")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Render one posting and print the finished job as JSON
    Render {
        /// Text file containing the job posting
        #[arg(long, required = true)]
        posting: PathBuf,

        /// Number of scenes
        #[arg(long)]
        scenes: Option<u32>,

        /// Total length in seconds, split evenly across scenes
        #[arg(long)]
        duration: Option<u32>,

        /// Brand tone (professional, friendly, energetic, premium)
        #[arg(long)]
        tone: Option<String>,

        /// Scene engine (template, generative, stub)
        #[arg(long)]
        engine: Option<String>,

        /// Brand primary color, #RRGGBB
        #[arg(long)]
        primary: Option<String>,

        /// Brand secondary color, #RRGGBB
        #[arg(long)]
        secondary: Option<String>,

        /// Reuse the newest existing scene clips from the work directory
        #[arg(long)]
        reuse: bool,

        /// Ask for per-scene pitch captions
        #[arg(long)]
        pitch: bool,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Check the text contrast between two hex colors
    Contrast {
        /// Foreground color, #RRGGBB
        foreground: String,

        /// Background color, #RRGGBB
        background: String,
    },

    /// Display version information
    Version,
}
