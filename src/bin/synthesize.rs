// Copyright @yucwang 2026

use std::path::PathBuf;
use std::process;

use clap::Parser;

use madeleine::core::distance::BisectionProjector;
use madeleine::core::error::Result;
use madeleine::core::outline_loader::{heart_outline, load_synthesis_job, SynthesisJob};
use madeleine::core::scheduler::SamplingScheduler;
use madeleine::integrators::solid::{synthesize_height_field, SynthesisSettings};
use madeleine::io::image_utils::write_height_map;
use madeleine::volumes::height_field::PillowSolid;

/// Fills a 2-D outline with spheres centered on its medial axis and writes
/// the resulting height map as a 16-bit PNG.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Synthesis job (XML). The built-in heart outline is used without one.
    job: Option<PathBuf>,

    #[arg(short, long, default_value = "height.png")]
    output: PathBuf,

    #[arg(long)]
    resolution: Option<usize>,

    #[arg(long)]
    iterations: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long)]
    workers: Option<usize>,

    #[arg(long)]
    progress: bool,
}

fn run(args: Args) -> Result<()> {
    let mut job = match &args.job {
        Some(path) => load_synthesis_job(path)?,
        None => SynthesisJob { outline: heart_outline()?, settings: SynthesisSettings::default() },
    };
    if let Some(v) = args.resolution {
        job.settings.resolution = v;
    }
    if let Some(v) = args.iterations {
        job.settings.iterations = v;
    }
    if let Some(v) = args.seed {
        job.settings.seed = v;
    }
    if let Some(v) = args.workers {
        job.settings.workers = v;
    }

    let scheduler = SamplingScheduler::new(job.settings.workers, job.settings.seed).with_progress(args.progress);
    let projector = BisectionProjector::new(job.outline.clone());
    let field = synthesize_height_field(projector.field(), &projector, &job.settings, &scheduler)?;

    let solid = PillowSolid::new(field, job.settings.height_scale)?.clipped_to(job.outline);
    let (lo, hi) = solid.bounds();
    log::info!("Solid spans [{:.3}, {:.3}, {:.3}] to [{:.3}, {:.3}, {:.3}].", lo.x, lo.y, lo.z, hi.x, hi.y, hi.z);
    write_height_map(solid.field(), &args.output)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        log::error!("{}", e);
        process::exit(1);
    }
}
