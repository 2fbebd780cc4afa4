//! Accretion CLI - real-time black hole visualizer

use accretion_core::config;
use accretion_core::{SimulationParameters, ViewMode, WavelengthBand, pack};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "accretion")]
#[command(about = "Real-time raymarched black hole visualizer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive preview window
    Preview {
        #[command(flatten)]
        params: ParamArgs,

        /// Window width
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Window height
        #[arg(long, default_value = "720")]
        height: u32,

        /// Window title
        #[arg(long, default_value = "Accretion")]
        title: String,

        /// Hide the frame statistics overlay
        #[arg(long)]
        no_hud: bool,
    },

    /// Render a single frame to an image file
    Render {
        #[command(flatten)]
        params: ParamArgs,

        /// Output image file (format from the extension)
        #[arg(short, long, default_value = "render.png")]
        output: PathBuf,

        /// Image width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Image height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Simulated time of the frame, in seconds
        #[arg(long, default_value = "0")]
        time: f32,

        /// Renderer to use
        #[arg(long, value_enum, default_value_t = Backend::Gpu)]
        backend: Backend,
    },

    /// Measure frame times offscreen
    Bench {
        #[command(flatten)]
        params: ParamArgs,

        /// Number of frames to render
        #[arg(long, default_value = "300")]
        frames: u64,

        /// Frame width
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Frame height
        #[arg(long, default_value = "720")]
        height: u32,
    },

    /// Print the resolved parameters, or write them to a file
    Params {
        #[command(flatten)]
        params: ParamArgs,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// wgpu, offscreen
    Gpu,
    /// Software renderer, no graphics device needed
    Cpu,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// Close-up of the disk
    Default,
    /// Far view with the galaxy backdrop
    Backdrop,
}

/// Simulation parameters, layered as preset < file < flags
#[derive(Args, Debug)]
struct ParamArgs {
    /// Parameter file (JSON); fields it leaves out keep the preset's values
    #[arg(long = "params", value_name = "FILE")]
    file: Option<PathBuf>,

    /// Starting preset
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// classic, gravity-grid, matter-density or time-energy
    #[arg(long)]
    view_mode: Option<ViewMode>,

    /// visible, x-ray, radio or infrared
    #[arg(long)]
    band: Option<WavelengthBand>,

    /// Camera distance in horizon radii
    #[arg(long)]
    distance: Option<f32>,

    /// Camera pitch in radians
    #[arg(long, allow_hyphen_values = true)]
    pitch: Option<f32>,

    /// Camera yaw in radians
    #[arg(long, allow_hyphen_values = true)]
    yaw: Option<f32>,

    /// Show the polar jets
    #[arg(long, value_name = "BOOL")]
    jets: Option<bool>,

    /// Show the galaxy backdrop
    #[arg(long, value_name = "BOOL")]
    milky_way: Option<bool>,

    /// Simulated seconds per real second
    #[arg(long, allow_hyphen_values = true)]
    time_speed: Option<f32>,
}

impl ParamArgs {
    fn resolve(&self) -> Result<SimulationParameters> {
        let mut params = match self.preset {
            Some(Preset::Backdrop) => SimulationParameters::backdrop_preset(),
            Some(Preset::Default) | None => SimulationParameters::default(),
        };
        if let Some(path) = &self.file {
            params = config::load_parameters_over(path, &params)
                .with_context(|| format!("Failed to load parameters from {}", path.display()))?;
        }

        if let Some(mode) = self.view_mode {
            params.view_mode = mode;
        }
        if let Some(band) = self.band {
            params.wavelength_band = band;
        }
        if let Some(distance) = self.distance {
            params.camera_distance = distance;
        }
        if let Some(pitch) = self.pitch {
            params.camera_angle_x = pitch;
        }
        if let Some(yaw) = self.yaw {
            params.camera_angle_y = yaw;
        }
        if let Some(jets) = self.jets {
            params.show_jets = jets;
        }
        if let Some(milky_way) = self.milky_way {
            params.show_milky_way = milky_way;
        }
        if let Some(speed) = self.time_speed {
            anyhow::ensure!(
                speed.is_finite() && speed >= 0.0,
                "--time-speed must be a non-negative number"
            );
            params.time_speed = speed;
        }

        Ok(params.clamped())
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preview {
            params,
            width,
            height,
            title,
            no_hud,
        } => {
            run_preview(&params.resolve()?, width, height, title, !no_hud)?;
        }
        Commands::Render {
            params,
            output,
            width,
            height,
            time,
            backend,
        } => {
            run_render(&params.resolve()?, &output, width, height, time, backend)?;
        }
        Commands::Bench {
            params,
            frames,
            width,
            height,
        } => {
            run_bench(&params.resolve()?, frames, width, height)?;
        }
        Commands::Params { params, output } => {
            run_params(&params.resolve()?, output.as_deref())?;
        }
    }

    Ok(())
}

fn run_preview(
    params: &SimulationParameters,
    width: u32,
    height: u32,
    title: String,
    hud: bool,
) -> Result<()> {
    use accretion_render::WindowConfig;

    println!("Opening preview window...");
    println!("{}", accretion_render::controls_help());

    let config = WindowConfig {
        title,
        width,
        height,
        hud,
    };
    accretion_render::run_preview(config, *params)
}

fn run_render(
    params: &SimulationParameters,
    output: &Path,
    width: u32,
    height: u32,
    time: f32,
    backend: Backend,
) -> Result<()> {
    println!(
        "Rendering {}x{} ({}, {}) with the {:?} backend...",
        width, height, params.view_mode, params.wavelength_band, backend
    );

    match backend {
        Backend::Gpu => {
            let image = accretion_render::render_image(params, time, width, height)?;
            image
                .save(output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }
        Backend::Cpu => {
            let block = pack(params, time, [width as f32, height as f32]);
            accretion_core::render::render_to_file(&block, output)?;
        }
    }

    println!("Saved to: {}", output.display());
    Ok(())
}

fn run_bench(params: &SimulationParameters, frames: u64, width: u32, height: u32) -> Result<()> {
    println!("Benchmarking {frames} frames at {width}x{height}...");

    let report = accretion_render::run_benchmark(params, width, height, frames)?;

    println!(
        "{} frames in {:.2}s: {:.2} ms/frame ({:.1} FPS)",
        report.frames,
        report.elapsed.as_secs_f64(),
        report.mean_frame_ms(),
        report.fps()
    );
    Ok(())
}

fn run_params(params: &SimulationParameters, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            config::save_parameters(path, params)?;
            println!("Saved to: {}", path.display());
        }
        None => println!("{}", config::to_json(params)?),
    }
    Ok(())
}
