use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the HTTP service
    Serve,
    /// Renders a PDF from a `/generate-pdf` request body
    Render {
        /// JSON request file
        request: PathBuf,
        /// Output file, defaults to the title-derived name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Builds a ZIP bundle from a `/generate-zip` request body
    Bundle {
        /// JSON request file
        request: PathBuf,
        /// Output file, defaults to the title-derived name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}
