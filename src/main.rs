//! bvh-reduce - trim and decimate .bvh motion capture takes

use anyhow::{Context, Result};
use bvh_frame_reducer::decimate;
use bvh_frame_reducer::manifest::ReduceManifest;
use bvh_frame_reducer::parse::load_bvh_from_file;
use bvh_frame_reducer::types::{ReduceOptions, DEFAULT_TARGET_FPS};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bvh-reduce")]
#[command(about = "Trim and decimate the frame rate of .bvh files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce a single .bvh file
    Reduce {
        /// Input .bvh file
        input: PathBuf,

        /// Output file (default: <input>_reduced.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Frames to drop from the start
        #[arg(long, default_value_t = 0)]
        skip_start: usize,

        /// Frames to drop from the end
        #[arg(long, default_value_t = 0)]
        skip_end: usize,

        /// Frame rate of the input (default: read from `Frame Time:`)
        #[arg(long)]
        source_fps: Option<u32>,

        /// Frame rate of the output
        #[arg(long, default_value_t = DEFAULT_TARGET_FPS)]
        target_fps: u32,
    },

    /// Reduce every clip listed in a manifest
    Batch {
        /// Path to reduce.toml manifest
        #[arg(default_value = "reduce.toml")]
        manifest: PathBuf,
    },

    /// Print skeleton and motion summary of a .bvh file
    Info {
        /// Input .bvh file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Reduce {
            input,
            output,
            skip_start,
            skip_end,
            source_fps,
            target_fps,
        } => {
            let output = output.unwrap_or_else(|| decimate::default_output_path(&input));
            let options = ReduceOptions {
                skip_frames_start: skip_start,
                skip_frames_end: skip_end,
                source_fps,
                target_fps,
            };
            decimate::convert_file(&input, &output, &options)
                .with_context(|| format!("Failed to reduce {}", input.display()))?;
        }

        Commands::Batch { manifest } => {
            tracing::info!("Reducing clips from {:?}", manifest);
            let config = ReduceManifest::load(&manifest)?;
            let base_dir = manifest.parent().unwrap_or(Path::new("."));
            config.run(base_dir)?;
        }

        Commands::Info { input } => print_info(&input)?,
    }

    Ok(())
}

fn print_info(input: &Path) -> Result<()> {
    let metadata = load_bvh_from_file(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    println!("{}", input.display());
    match metadata.root() {
        Some(root) => println!("  root joint:   {}", root.name),
        None => println!("  root joint:   <none>"),
    }
    println!("  joints:       {}", metadata.joints.len());
    println!("  end sites:    {}", metadata.joints.iter().filter(|j| j.is_leaf).count());
    println!("  channels:     {}", metadata.num_channels());
    println!("  frames:       {}", metadata.num_frames);
    println!("  frame lines:  {}", metadata.num_frame_lines);
    println!("  frame time:   {}", metadata.frame_time);
    println!("  fps:          {}", metadata.fps);
    if metadata.fps > 0 {
        println!(
            "  duration:     {:.2}s",
            metadata.num_frames as f64 * metadata.frame_time
        );
    }

    if metadata.num_frame_lines != metadata.num_frames {
        tracing::warn!(
            "Header says {} frames but {} frame lines are present",
            metadata.num_frames,
            metadata.num_frame_lines
        );
    }
    if let Some(&first) = metadata.malformed_frames.first() {
        tracing::warn!(
            "{} frame line(s) don't have {} values (first: frame {})",
            metadata.malformed_frames.len(),
            metadata.num_channels(),
            first
        );
    }
    Ok(())
}
