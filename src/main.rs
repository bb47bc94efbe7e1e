// Copyright 2020 TwoCookingMice

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use madeleine::core::error::Result;
use madeleine::core::scene_loader::load_scene;
use madeleine::core::sensor::Sensor;
use madeleine::io::image_utils::save_bitmap;
use madeleine::math::constants::PI;
use madeleine::renderers::adaptive::{ray_variance, AdaptiveRenderer, RenderSettings};
use madeleine::renderers::renderer::Renderer;

/// Adaptive path tracer for small analytic scenes.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Scene description (XML).
    scene: PathBuf,

    /// Output image; `.exr` keeps linear radiance, anything else is a gamma
    /// encoded PNG. With `--frames`, `%03d` is replaced by the frame number.
    #[arg(short, long, default_value = "output.png")]
    output: String,

    /// Render a turntable of this many frames, turning `--turntable-object`
    /// about the world z axis. Frames whose output already exists are skipped.
    #[arg(long, default_value_t = 1)]
    frames: usize,

    #[arg(long, default_value = "heart")]
    turntable_object: String,

    #[arg(long)]
    min_samples: Option<u64>,

    #[arg(long)]
    max_samples: Option<u64>,

    #[arg(long)]
    max_depth: Option<u32>,

    #[arg(long)]
    error_margin: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads, 0 for all cores.
    #[arg(short, long)]
    workers: Option<usize>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Print the mean per-pixel variance at this many rays per pixel and exit.
    #[arg(long)]
    ray_variance: Option<usize>,

    #[arg(long)]
    progress: bool,
}

impl Args {
    fn apply(&self, settings: &mut RenderSettings) {
        if let Some(v) = self.min_samples {
            settings.criterion.min_samples = v;
        }
        if let Some(v) = self.max_samples {
            settings.criterion.max_samples = v;
        }
        if let Some(v) = self.max_depth {
            settings.roulette.max_depth = v;
        }
        if let Some(v) = self.error_margin {
            settings.criterion.error_margin = v;
        }
        if let Some(v) = self.seed {
            settings.seed = v;
        }
        if let Some(v) = self.workers {
            settings.workers = v;
        }
        settings.show_progress = self.progress;
    }
}

fn frame_path(pattern: &str, frame: usize, frames: usize) -> PathBuf {
    if frames <= 1 {
        return PathBuf::from(pattern);
    }
    if pattern.contains("%03d") {
        return PathBuf::from(pattern.replace("%03d", &format!("{:03}", frame)));
    }
    let path = Path::new(pattern);
    let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}{:03}.{}", stem, frame, ext.to_string_lossy()),
        None => format!("{}{:03}", stem, frame),
    };
    path.with_file_name(name)
}

fn run(args: Args) -> Result<()> {
    let loaded = load_scene(&args.scene)?;
    let mut settings = loaded.settings;
    args.apply(&mut settings);

    let mut sensor = loaded.sensor;
    if args.width.is_some() || args.height.is_some() {
        let width = args.width.unwrap_or(sensor.width());
        let height = args.height.unwrap_or(sensor.height());
        sensor = sensor.with_film(width, height)?;
    }

    if let Some(samples) = args.ray_variance {
        let variance = ray_variance(&loaded.scene, &sensor, sensor.width(), sensor.height(), samples, &settings)?;
        println!("{}", variance);
        return Ok(());
    }

    let frames = args.frames.max(1);
    let gamma = settings.criterion.gamma;
    let renderer = AdaptiveRenderer::new(settings);
    for frame in 0..frames {
        let path = frame_path(&args.output, frame, frames);
        if frames > 1 && path.exists() {
            log::info!("Skipping frame {}: {} exists.", frame, path.display());
            continue;
        }
        let output = if frames > 1 {
            let angle = 2.0 * PI * frame as f64 / frames as f64;
            let scene = loaded.scene.with_rotated_object(&args.turntable_object, angle)?;
            renderer.render(&scene, &sensor)?
        } else {
            renderer.render(&loaded.scene, &sensor)?
        };
        log::info!("Frame {}: {} samples, {} pixels converged, {} exhausted.",
                   frame, output.outcome.total_samples, output.outcome.converged(), output.outcome.exhausted());
        save_bitmap(&output.bitmap, gamma, &path)?;
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        log::error!("{}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_path() {
        assert_eq!(frame_path("out.png", 3, 1), PathBuf::from("out.png"));
        assert_eq!(frame_path("output%03d.png", 7, 5), PathBuf::from("output007.png"));
        assert_eq!(frame_path("renders/beach.exr", 12, 20), PathBuf::from("renders/beach012.exr"));
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from(["madeleine", "scene.xml", "--max-samples", "400", "--seed", "9", "-w", "2"]);
        let mut settings = RenderSettings::default();
        args.apply(&mut settings);
        assert_eq!(settings.criterion.max_samples, 400);
        assert_eq!(settings.criterion.min_samples, 100);
        assert_eq!(settings.seed, 9);
        assert_eq!(settings.workers, 2);
        assert_eq!(args.output, "output.png");
        assert_eq!(args.turntable_object, "heart");
    }
}
