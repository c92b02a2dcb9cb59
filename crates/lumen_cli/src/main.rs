use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_math::{Frustum, Vec3};
use lumen_renderer::{PixelBuffer, RenderConfig, Renderer};

mod scene;

#[derive(Parser)]
#[command(version, about = "Progressive path tracer for triangle scenes")]
struct Args {
    /// Width of the rendered image
    #[arg(long = "width", default_value_t = 320)]
    width: u32,

    /// Height of the rendered image
    #[arg(long = "height", default_value_t = 240)]
    height: u32,

    /// Number of progressive frames rendered from a still camera
    #[arg(short = 'f', long = "frames", default_value_t = 32)]
    frames: u32,

    /// Render configuration as JSON; missing fields take defaults
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Override the configured random seed
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Nudge the camera after this many frames, discarding the history
    #[arg(long = "move-at")]
    move_at: Option<u32>,

    /// Output PNG path
    #[arg(short = 'o', long = "output", default_value = "lumen.png")]
    output: PathBuf,
}

fn load_config(args: &Args) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => RenderConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    log::info!("Starting lumen with {:?}", config);

    let scene = scene::demo_box().context("building demo scene")?;
    log::info!(
        "Scene: {} triangles, {} lights, {} materials",
        scene.triangle_count(),
        scene.light_count(),
        scene.materials().len()
    );

    let aspect = args.width as f32 / args.height as f32;
    let target_point = Vec3::new(0.0, 2.0, 0.0);
    let frustum = Frustum::look_at(Vec3::new(0.0, 2.0, 7.5), target_point, Vec3::Y, 40.0, aspect);

    let mut renderer = Renderer::new(scene, config);
    let mut target = PixelBuffer::new(args.width, args.height)?;

    let start = Instant::now();
    let mut camera = frustum;
    let mut rays = 0;
    for frame in 0..args.frames {
        if args.move_at == Some(frame) {
            log::info!("Moving camera at frame {}", frame);
            let eye = Vec3::new(0.3, 2.1, 7.5);
            camera = Frustum::look_at(eye, target_point, Vec3::Y, 40.0, aspect);
        }
        let stats = renderer.render_frame(&camera, &mut target)?;
        rays += stats.rays;
    }
    let elapsed = start.elapsed();
    log::info!(
        "Rendered {} frames in {:.2?} ({:.2} Mrays/s)",
        args.frames,
        elapsed,
        rays as f64 / elapsed.as_secs_f64().max(1e-9) / 1e6
    );

    let image = image::RgbaImage::from_raw(args.width, args.height, target.to_rgba())
        .context("pixel buffer does not match image size")?;
    image
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    log::info!("Saved {}", args.output.display());

    Ok(())
}
