use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ooo_codec::{
    config::Config,
    container,
    presets::IDENTITY_PRESET,
    Encoder, OutputFormat, Reconstructor, VideoBackend,
};

#[derive(Parser)]
#[command(
    name = "ooo",
    version,
    about = "Encode videos into .ooo frame containers and decode them back",
    long_about = "ooo stores every frame of a video as a JPEG inside a single JSON container, and rebuilds a playable video from it, optionally running each frame through an enhancement preset."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Video backend: cli (ffmpeg executables) or native (libav)
    #[arg(short, long, global = true)]
    backend: Option<VideoBackend>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a video file into a .ooo container
    Encode {
        /// Source video (mp4, avi, mov, mkv, webm)
        video: PathBuf,

        /// Directory for the container (defaults to the configured output dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Rebuild a video from a .ooo container
    Decode {
        /// Container file
        container: PathBuf,

        /// Enhancement preset (see `ooo presets`)
        #[arg(short, long, default_value = IDENTITY_PRESET)]
        preset: String,

        /// Output container format: mp4, avi, mov, mkv or webm
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Directory for the video (defaults to the configured output dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Check that a file is a readable .ooo container
    Validate {
        /// Container file
        container: PathBuf,
    },

    /// List the available enhancement presets
    Presets,

    /// List the .ooo files in a directory
    List {
        /// Directory to scan (defaults to the configured output dir)
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG overrides the default level
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path).map_err(|e| anyhow::anyhow!(e.user_message()))?
        }
        None => Config::default(),
    };
    if let Some(backend) = cli.backend {
        config.video.backend = backend;
    }
    config.validate()?;

    match cli.command {
        Command::Encode { video, output_dir } => {
            if let Some(dir) = output_dir {
                config.video.output_dir = dir;
            }
            let report = Encoder::new(config)
                .encode_file(&video)
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .with_context(|| format!("Encoding {} failed", video.display()))?;

            println!("{}", report.container_path.display());
        }

        Command::Decode { container, preset, format, output_dir } => {
            let format = format.unwrap_or(config.video.output_format);
            let output_dir = output_dir.unwrap_or_else(|| config.video.output_dir.clone());
            let registry = config.preset_registry();

            let check = container::validate(&container);
            if !check.valid {
                warn!("{}", check.reason);
            }

            let report = Reconstructor::from_config(&config)?
                .decode_file(&container, &preset, &registry, &output_dir, format)
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .with_context(|| format!("Decoding {} failed", container.display()))?;

            if !report.success() {
                error!("Error: output video was not created");
                bail!("no frames could be written to {}", report.output_path.display());
            }

            let size_mb = std::fs::metadata(&report.output_path)
                .map(|m| m.len() as f64 / (1024.0 * 1024.0))
                .unwrap_or(0.0);
            info!("   Frames written: {} (skipped {})", report.written, report.skipped);
            info!("   Size: {:.2} MB", size_mb);
            println!("{}", report.output_path.display());
        }

        Command::Validate { container } => {
            let check = container::validate(&container);
            println!("{}", check.reason);
            if !check.valid {
                std::process::exit(1);
            }
        }

        Command::Presets => {
            for preset in config.preset_registry().iter() {
                println!("{}", preset);
            }
        }

        Command::List { dir } => {
            let dir = dir.unwrap_or_else(|| config.video.output_dir.clone());
            let containers = container::find_containers(&dir)?;
            if containers.is_empty() {
                println!("No .ooo files found in {}", dir.display());
            }
            for (i, path) in containers.iter().enumerate() {
                let size_mb = std::fs::metadata(path)
                    .map(|m| m.len() as f64 / (1024.0 * 1024.0))
                    .unwrap_or(0.0);
                let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                println!("{:>3}. {} ({:.2} MB)", i + 1, name, size_mb);
            }
        }
    }

    Ok(())
}
