//! Texmap - Entry Point
//!
//! Builds (or loads) a texture map, ticks it for a few frames with a
//! drifting camera and writes the last frame to a PNG.
//!
//! Usage: `texmap [MAP.json] [--config FILE.ron] [--out FRAME.png] [--save MAP.json]`

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use image::Rgba;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use texmap::render::{MountProjector, SolidShape, SolidTexture};
use texmap::{Camera, FrameStats, MapConfig, MountMode, Point, RenderContext, Surface, TextureMap};

/// Target frames per second for the render loop
const TARGET_FPS: u64 = 60;
const FRAME_TIME: Duration = Duration::from_millis(1000 / TARGET_FPS);

/// Frames to render before writing the output
const DEMO_FRAMES: u32 = 90;

/// Edge length of the generated demo map in tiles
const DEMO_SIZE: i32 = 48;

#[derive(Debug, Default)]
struct Args {
    map: Option<PathBuf>,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    save: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--out" => args.out = Some(iter.next().context("--out needs a path")?.into()),
            "--save" => args.save = Some(iter.next().context("--save needs a path")?.into()),
            flag if flag.starts_with("--") => bail!("Unknown option {}", flag),
            _ => args.map = Some(arg.into()),
        }
    }

    Ok(args)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Texmap v{}", env!("CARGO_PKG_VERSION"));

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => MapConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => MapConfig::load_or_default(MapConfig::default_path()),
    };

    let mut map = TextureMap::from_config(&config);
    match &args.map {
        Some(path) => map
            .load_map_file(path)
            .with_context(|| format!("loading map {}", path.display()))?,
        None => paint_demo_map(&mut map),
    }

    let mut frame = Surface::new(config.viewport_width, config.viewport_height, config.smoothing);
    let stats = run_render_loop(&mut map, &mut frame)?;
    log::info!(
        "Last frame: {} sections drawn, {} culled, {} tiles drawn",
        stats.sections_drawn,
        stats.sections_culled,
        stats.tiles_drawn
    );

    let out = args.out.unwrap_or_else(|| PathBuf::from("frame.png"));
    frame
        .image()
        .save(&out)
        .with_context(|| format!("writing {}", out.display()))?;
    log::info!("Wrote frame to {}", out.display());

    if let Some(path) = &args.save {
        map.save_map_file(path)?;
    }

    log::info!("Texmap shut down cleanly");
    Ok(())
}

/// Fill a square of randomly chosen ground textures
fn paint_demo_map(map: &mut TextureMap) {
    let shape = match map.mount_mode() {
        MountMode::Orthogonal => SolidShape::Rect,
        MountMode::Isometric => SolidShape::Diamond,
    };
    let grass = map.add_texture(Box::new(SolidTexture::new(Rgba([74, 122, 58, 255]), shape)));
    let water = map.add_texture(Box::new(SolidTexture::new(Rgba([46, 84, 148, 255]), shape)));
    let stone = map.add_texture(Box::new(SolidTexture::new(Rgba([112, 108, 100, 255]), shape)));

    let mut rng = StdRng::seed_from_u64(7);
    for y in 0..DEMO_SIZE {
        for x in 0..DEMO_SIZE {
            let roll: f32 = rng.gen();
            let texture = if roll < 0.15 {
                water
            } else if roll < 0.3 {
                stone
            } else {
                grass
            };
            map.paint_tile(x, y, texture, None);
        }
    }

    log::info!("Painted {}x{} demo map", DEMO_SIZE, DEMO_SIZE);
}

/// Tick the map with a camera drifting across it
fn run_render_loop(map: &mut TextureMap, frame: &mut Surface) -> Result<FrameStats> {
    let tile = map.tile_size();
    let centre = map
        .mount_mode()
        .projector(tile)
        .project(DEMO_SIZE / 2, DEMO_SIZE / 2);

    let mut stats = FrameStats::default();
    let mut rebuilds = 0;
    let mut last_frame = Instant::now();

    for i in 0..DEMO_FRAMES {
        let frame_start = Instant::now();
        let delta = frame_start.duration_since(last_frame).as_secs_f32();
        last_frame = frame_start;

        let camera = Camera {
            translate: centre + Point::new(i as f32 * 2.0, i as f32),
        };
        let ctx = RenderContext::for_frame(frame, camera).with_delta(delta);

        frame.clear();
        stats = map.tick(frame, &ctx);
        if stats.rebuilt {
            rebuilds += 1;
            log::info!("Rebuilt sections on frame {} ({} tile draws)", i, stats.tiles_drawn);
        }

        let frame_time = frame_start.elapsed();
        if frame_time < FRAME_TIME {
            thread::sleep(FRAME_TIME - frame_time);
        }
    }

    if map.auto_section().is_some() && rebuilds == 0 {
        log::warn!("Textures never finished loading; frame shows no sections");
    }

    Ok(stats)
}
