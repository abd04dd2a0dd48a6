//! finger_ink: interactive entry point.

use std::path::PathBuf;

use clap::Parser;
use finger_ink::app::run;
use finger_ink::config::AppConfig;
use finger_ink::detector::SubprocessDetector;
use tracing_subscriber::EnvFilter;

/// Paint with your fingertips; strokes become physics bodies.
#[derive(Parser, Debug)]
#[command(name = "finger_ink", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Detector command line, e.g. "python3 hands.py"; overrides the config
    #[arg(long)]
    detector_cmd: Option<String>,

    /// Canvas width in pixels
    #[arg(long)]
    width: Option<usize>,

    /// Canvas height in pixels
    #[arg(long)]
    height: Option<usize>,

    /// Still image to use as the backdrop
    #[arg(long)]
    backdrop: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut cfg = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None       => AppConfig::default(),
    };

    if let Some(line) = &cli.detector_cmd {
        let detector = SubprocessDetector::from_command_line(line)?;
        cfg.detector.command = detector.command_line();
    }
    if let Some(w) = cli.width  { cfg.canvas.width = w; }
    if let Some(h) = cli.height { cfg.canvas.height = h; }
    if let Some(path) = cli.backdrop { cfg.canvas.backdrop = Some(path); }
    cfg.validate()?;

    if cli.print_config {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }

    run(cfg)?;
    Ok(())
}
