//! The `imgsample sample` command.

use clap::Args;
use imgsample_core::{Config, ImageSampler, OutputFile};
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the `sample` command.
#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Photo to sample
    #[arg(required = true)]
    pub source: PathBuf,

    /// Directory to write the sampled JPEG to (defaults to sampler.output_dir)
    #[arg(short, long, env = "IMGSAMPLE_OUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// Bound for both width and height, in pixels
    #[arg(
        short,
        long,
        env = "IMGSAMPLE_SIZE",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub size: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Detach the listener right after submitting; the file is still written
    #[arg(long)]
    pub detach: bool,
}

/// Execute the sample command.
pub async fn execute(args: SampleArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(quality) = args.quality {
        config.output.jpeg_quality = quality;
    }
    let target = args.size.unwrap_or(config.sampler.target_dimension);
    let out_dir = match &args.out_dir {
        Some(dir) => expand(dir),
        None => config.output_dir(),
    };

    tracing::info!(
        "Sampling {} (bound {}px) into {}",
        args.source.display(),
        target,
        out_dir.display()
    );

    let sampler = ImageSampler::new(&config);
    sampler.set_listener(Arc::new(|output: &OutputFile| {
        println!("{}", output.path.display());
    }));

    let handle = sampler.sample(&args.source, &out_dir, target)?;
    if args.detach {
        sampler.clear_listener();
        tracing::debug!("Listener detached before delivery");
    }

    match handle.join().await {
        Some(output) => {
            if args.detach {
                tracing::info!("Delivery suppressed; file written to {}", output.path.display());
            }
            Ok(())
        }
        None => anyhow::bail!(
            "No sampled image produced for {} (see log for the cause)",
            args.source.display()
        ),
    }
}

fn expand(path: &std::path::Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}
