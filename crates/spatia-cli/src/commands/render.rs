//! Offline scene rendering.
//!
//! Moves a sine source along a path around the listener and writes the main
//! mix to a 32-bit float WAV. Reverb sends the source feeds are run through a
//! [`Diffuser`] and returned to the front pair of the mix; the result can be
//! tilted with a [`ThreeBandEq`].

use anyhow::{Context, bail};
use clap::{Args, ValueEnum};
use hound::{SampleFormat, WavSpec, WavWriter};
use spatia_core::multiplication_addition_kernel;
use spatia_effects::{Diffuser, ThreeBandEq};
use spatia_scene::{Environment, MAIN_CHANNELS, SceneConfig, SourceNode, Vec3};
use std::collections::BTreeSet;
use std::f32::consts::TAU;
use std::path::PathBuf;

/// Source trajectory
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SourcePath {
    /// One full circle around the listener
    #[default]
    Orbit,
    /// Fixed position front-right of the listener
    Static,
    /// Straight pass from far left to far right in front of the listener
    Flyby,
}

impl SourcePath {
    /// Position at progress `t` in `[0, 1]`.
    pub fn position(self, t: f32, radius: f32) -> Vec3 {
        match self {
            Self::Orbit => {
                let angle = TAU * t;
                [radius * angle.sin(), 0.0, -radius * angle.cos()]
            }
            Self::Static => {
                let d = radius * std::f32::consts::FRAC_1_SQRT_2;
                [d, 0.0, -d]
            }
            Self::Flyby => [radius * (4.0 * t - 2.0), 0.0, -radius * 0.5],
        }
    }
}

#[derive(Args)]
pub struct RenderArgs {
    /// Scene file (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Duration in seconds
    #[arg(long, default_value = "4.0")]
    seconds: f32,

    /// Source trajectory
    #[arg(long, value_enum, default_value = "orbit")]
    path: SourcePath,

    /// Distance of the path from the listener
    #[arg(long, default_value = "5.0")]
    radius: f32,

    /// Occlusion amount (0.0-1.0)
    #[arg(long, default_value = "0.0")]
    occlusion: f32,

    /// Test tone frequency in Hz
    #[arg(long, default_value = "440.0")]
    frequency: f32,

    /// Effect send to feed, 1-based (repeatable)
    #[arg(long = "feed-send", value_name = "INDEX")]
    feed_send: Vec<usize>,

    /// Diffusion applied to reverb sends (0.0-0.95)
    #[arg(long, default_value = "0.6")]
    diffusion: f32,

    /// High band gain of the output equalizer in dB
    #[arg(long, default_value = "0.0")]
    high_db: f32,

    /// Tone amplitude
    #[arg(long, default_value = "0.5")]
    amplitude: f32,
}

/// 0-based indices of the distinct reverb sends among 1-based `feed_send`.
fn reverb_send_indices(env: &Environment, feed_send: &[usize]) -> BTreeSet<usize> {
    feed_send
        .iter()
        .filter_map(|i| i.checked_sub(1))
        .filter(|&i| env.effect_send(i).is_some_and(|s| s.is_reverb))
        .collect()
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if args.seconds.is_nan() || args.seconds <= 0.0 {
        bail!("--seconds must be > 0 (got {})", args.seconds);
    }

    let config = match &args.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    let mut env = Environment::from_config(&config, None).context("failed to build environment")?;
    let output_channels = config.environment.output_channel_count().min(MAIN_CHANNELS);

    let mut source = SourceNode::new(&env);
    source.set_occlusion(args.occlusion);
    for &index in &args.feed_send {
        source
            .feed_effect_external(&env, index)
            .with_context(|| format!("cannot feed effect send {index}"))?;
    }

    let reverb_sends = reverb_send_indices(&env, &args.feed_send);

    let sample_rate = env.sample_rate();
    let block_size = env.block_size();
    let mut diffuser = Diffuser::new(sample_rate);
    diffuser.set_diffusion(args.diffusion);
    diffuser.set_spread_ms(2.0);
    let mut eq = ThreeBandEq::new(sample_rate, output_channels)?;
    eq.set_highband_db(args.high_db);

    let total = (args.seconds * sample_rate).round() as usize;
    let spec = WavSpec {
        channels: output_channels as u16,
        sample_rate: config.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&args.output, spec)
        .with_context(|| format!("failed to create '{}'", args.output.display()))?;

    tracing::info!(
        strategy = env.info().panning_strategy.name(),
        channels = output_channels,
        frames = total,
        "rendering"
    );

    let mut tone = vec![0.0f32; block_size];
    let mut mix: Vec<Vec<f32>> = vec![vec![0.0; block_size]; output_channels];
    let mut wet_l = vec![0.0f32; block_size];
    let mut wet_r = vec![0.0f32; block_size];
    let phase_step = TAU * args.frequency / sample_rate;
    let mut phase = 0.0f32;
    let mut rendered = 0;

    while rendered < total {
        let frames = block_size.min(total - rendered);
        for sample in &mut tone[..frames] {
            *sample = args.amplitude * phase.sin();
            phase = (phase + phase_step) % TAU;
        }

        let t = rendered as f32 / total as f32;
        source.set_position(args.path.position(t, args.radius));

        env.begin_block();
        source.update(&env);
        source.process(&tone[..frames], &mut env)?;

        for (ch, out) in mix.iter_mut().enumerate() {
            match env.channel(ch) {
                Some(buffer) => out[..frames].copy_from_slice(&buffer[..frames]),
                None => out[..frames].fill(0.0),
            }
        }

        if !reverb_sends.is_empty() {
            wet_l[..frames].fill(0.0);
            wet_r[..frames].fill(0.0);
            for &send in &reverb_sends {
                if let Some(buffers) = env.send_buffers(send) {
                    let right = buffers.len().min(2) - 1;
                    multiplication_addition_kernel(1.0, &buffers[0][..frames], &mut wet_l[..frames]);
                    multiplication_addition_kernel(1.0, &buffers[right][..frames], &mut wet_r[..frames]);
                }
            }
            diffuser.process_stereo(&mut wet_l[..frames], &mut wet_r[..frames]);
            multiplication_addition_kernel(1.0, &wet_l[..frames], &mut mix[0][..frames]);
            let right = output_channels.min(2) - 1;
            multiplication_addition_kernel(1.0, &wet_r[..frames], &mut mix[right][..frames]);
        }

        {
            let mut views: Vec<&mut [f32]> = mix.iter_mut().map(|b| &mut b[..frames]).collect();
            eq.process_in_place(&mut views);
        }

        for i in 0..frames {
            for ch in &mix {
                writer.write_sample(ch[i])?;
            }
        }
        rendered += frames;
    }

    writer.finalize()?;
    println!(
        "Rendered {:.2}s ({} channel(s), {}) to {}",
        args.seconds,
        output_channels,
        env.info().panning_strategy.name(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_keeps_radius() {
        for t in [0.0, 0.1, 0.5, 0.9] {
            let [x, y, z] = SourcePath::Orbit.position(t, 5.0);
            assert!(((x * x + y * y + z * z).sqrt() - 5.0).abs() < 1e-4);
        }
        let [x, _, z] = SourcePath::Orbit.position(0.0, 5.0);
        assert!(x.abs() < 1e-6 && (z + 5.0).abs() < 1e-6);
    }

    #[test]
    fn repeated_feed_send_counts_once() {
        let mut env = Environment::with_default_hrtf(48000.0, 64);
        env.add_effect_send(2, true).unwrap();
        env.add_effect_send(1, false).unwrap();
        env.add_effect_send(1, true).unwrap();
        let sends = reverb_send_indices(&env, &[1, 1, 2, 3, 1]);
        assert_eq!(sends.into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn flyby_crosses_in_front() {
        let start = SourcePath::Flyby.position(0.0, 4.0);
        let end = SourcePath::Flyby.position(1.0, 4.0);
        assert_eq!(start, [-8.0, 0.0, -2.0]);
        assert_eq!(end, [8.0, 0.0, -2.0]);
    }
}
