//! Command line front end for building and viewing camera flights.
//!
//! Subcommands:
//! - `generate`: build a flight file from a JSON keyframe sequence
//! - `inspect`: summarise an existing flight file
//! - `storyboard`: project catalog galaxies through every frame of a flight
//! - `config`: write a config file holding the defaults (plus any overrides)

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use flightpath::flight_file::FlightFile;
use flightpath::keyframe::KeyframeSequence;
use flightpath::shared_args::{load_catalog, SharedFlightArgs};
use flightpath::storyboard::{write_frame_views, Storyboard};

#[derive(Parser, Debug)]
#[command(name = "flightpath")]
#[command(about = "Camera flight paths through cosmological simulation boxes")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a flight file from a keyframe sequence
    Generate {
        /// Keyframe sequence (JSON)
        #[arg(short, long)]
        keyframes: PathBuf,

        /// Flight file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Galaxy catalog, needed when keyframes are anchored to galaxies
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[command(flatten)]
        shared: SharedFlightArgs,
    },

    /// Print a summary of a flight file
    Inspect {
        /// Flight file to read
        flight: PathBuf,
    },

    /// Project catalog galaxies through every frame of a flight
    Storyboard {
        /// Flight file to read
        flight: PathBuf,

        /// Galaxy catalog
        #[arg(long)]
        catalog: PathBuf,

        /// Where to write projected points (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        shared: SharedFlightArgs,
    },

    /// Write a config file
    Config {
        /// Config file to write
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        shared: SharedFlightArgs,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command {
        Command::Generate {
            keyframes,
            output,
            catalog,
            shared,
        } => cmd_generate(&keyframes, &output, catalog.as_ref(), &shared),
        Command::Inspect { flight } => cmd_inspect(&flight),
        Command::Storyboard {
            flight,
            catalog,
            output,
            shared,
        } => cmd_storyboard(&flight, &catalog, output.as_deref(), &shared),
        Command::Config { output, shared } => cmd_config(&output, &shared),
    }
}

fn cmd_generate(
    keyframes_path: &Path,
    output: &Path,
    catalog_path: Option<&PathBuf>,
    shared: &SharedFlightArgs,
) -> Result<()> {
    let config = shared.resolve_config()?;
    let keyframes = KeyframeSequence::load_from_file(keyframes_path)
        .with_context(|| format!("Failed to load keyframes from {}", keyframes_path.display()))?;
    let catalog = catalog_path
        .map(|path| load_catalog(path).map_err(|e| anyhow!("{e}")))
        .transpose()?;

    let trajectory = config
        .path_builder()
        .build(&keyframes, catalog.as_ref())
        .context("Failed to build camera path")?;

    FlightFile::new(config.simulation_label.clone(), trajectory)
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote flight file to {}", output.display());
    Ok(())
}

fn cmd_inspect(flight_path: &Path) -> Result<()> {
    let flight = FlightFile::load(flight_path)
        .with_context(|| format!("Failed to read {}", flight_path.display()))?;

    println!("Simulation:    {}", flight.header);
    match flight.trajectory.summary() {
        Some(summary) => println!("{summary}"),
        None => println!("Frames:        0"),
    }
    Ok(())
}

fn cmd_storyboard(
    flight_path: &Path,
    catalog_path: &PathBuf,
    output: Option<&Path>,
    shared: &SharedFlightArgs,
) -> Result<()> {
    let config = shared.resolve_config()?;
    let flight = FlightFile::load(flight_path)
        .with_context(|| format!("Failed to read {}", flight_path.display()))?;
    if flight.trajectory.is_empty() {
        bail!("{} has no frames", flight_path.display());
    }
    let catalog = load_catalog(catalog_path).map_err(|e| anyhow!("{e}"))?;

    let views = Storyboard::new(config.interpolator(), config.region)
        .render(&flight.trajectory, &catalog)
        .context("Failed to render storyboard")?;

    let visible: usize = views.iter().map(|v| v.galaxies.len()).sum();
    info!(
        "{} frames, {} projected galaxies in total",
        views.len(),
        visible
    );

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_frame_views(&views, BufWriter::new(file))?;
            info!("Wrote storyboard to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            write_frame_views(&views, stdout.lock())?;
        }
    }
    Ok(())
}

fn cmd_config(output: &Path, shared: &SharedFlightArgs) -> Result<()> {
    let config = shared.resolve_config()?;
    config
        .save_to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote config to {}", output.display());
    Ok(())
}
