use std::path::PathBuf;
use std::process;

use clap::Parser;

use madeleine::core::error::Result;
use madeleine::core::scene_loader::load_scene;
use madeleine::renderers::adaptive::AdaptiveRenderer;

/// Samples one pixel of a scene under the adaptive criterion and prints its
/// estimate, standard error and final state.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    scene: PathBuf,
    x: usize,
    y: usize,

    #[arg(long)]
    max_samples: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,
}

fn run(args: Args) -> Result<()> {
    let loaded = load_scene(&args.scene)?;
    let mut settings = loaded.settings;
    if let Some(v) = args.max_samples {
        settings.criterion.max_samples = v;
    }
    if let Some(v) = args.seed {
        settings.seed = v;
    }

    let renderer = AdaptiveRenderer::new(settings);
    let (stats, state) = renderer.render_pixel(&loaded.scene, &loaded.sensor, args.x, args.y)?;
    let mean = stats.mean();
    let err = stats.std_error();
    println!("pixel ({}, {})", args.x, args.y);
    println!("  mean      = ({:.6}, {:.6}, {:.6})", mean.x, mean.y, mean.z);
    println!("  std error = ({:.6}, {:.6}, {:.6})", err.x, err.y, err.z);
    println!("  state     = {:?}", state);
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
    use madeleine::core::error::Error;

    #[test]
    fn test_missing_scene_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::parse_from(["render_pixel", dir.path().join("none.xml").to_str().unwrap(), "0", "0"]);
        assert!(matches!(run(args), Err(Error::Io(_))));
    }

    #[test]
    fn test_pixel_outside_film_is_an_error() {
        let args = Args::parse_from(["render_pixel",
                                     concat!(env!("CARGO_MANIFEST_DIR"), "/scenes/beach.xml"), "640", "0"]);
        assert!(matches!(run(args), Err(Error::InvalidConfig { name: "pixel", .. })));
    }
}
