//! Scene file validation.

use anyhow::Context;
use clap::Args;
use spatia_scene::SceneConfig;
use std::path::PathBuf;

#[derive(Args)]
pub struct CheckConfigArgs {
    /// Scene file (TOML)
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

pub fn run(args: CheckConfigArgs) -> anyhow::Result<()> {
    let config = SceneConfig::load(&args.file)?;
    config
        .validate()
        .with_context(|| format!("invalid scene '{}'", args.file.display()))?;

    let env = &config.environment;
    println!("{}: ok", args.file.display());
    println!("  sample rate:   {} Hz", config.sample_rate);
    println!("  block size:    {}", config.block_size);
    println!("  strategy:      {}", env.panning_strategy.name());
    println!("  distance:      {} (max {})", env.distance_model.name(), env.max_distance);
    println!("  output:        {} channel(s)", env.output_channel_count());
    println!("  effect sends:  {}", env.effect_sends.len());
    Ok(())
}
