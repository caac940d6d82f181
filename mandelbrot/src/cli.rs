use clap::Parser;
use std::path::PathBuf;

/// Interactive Mandelbrot viewer rendered by a fragment shader.
///
/// Keys: H/L pan horizontally, J/K pan vertically, N/M zoom in/out, C resets the view and
/// Escape quits.
#[derive(Parser, Debug)]
#[command(name = "mandelbrot", version)]
pub struct Args {
    /// Directory containing the vertex and fragment shader sources
    pub shaders_dir: PathBuf,

    /// TOML configuration file overriding the defaults
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub dump_config: bool,
}
