use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;
use hum_common::Transform;
use hum_ecs::{ComponentStore, Kinematic};
use hum_kernel::{FixedTimestep, Plugins, World};
use hum_render::headless::{DrawLog, HeadlessSurface, Marker, RecordingProgram};
use hum_render::{FrameContext, FrameStats, RenderConfig, RenderPlugin, SharedProgram};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hum-cli", about = "Headless tools for the hummingbird render plugin")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default camera settings
    Info,
    /// Simulate frames without a GPU and print each frame's draw order
    Frames {
        /// Number of drawables to spawn
        #[arg(short, long, default_value = "5")]
        drawables: usize,
        /// Number of frames to render
        #[arg(short, long, default_value = "3")]
        frames: usize,
        /// Simulated wall time between frames, in milliseconds
        #[arg(long, default_value = "25")]
        frame_ms: u64,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct FrameReport {
    frame: usize,
    tick: u64,
    lag: f32,
    stats: FrameStats,
    order: Vec<DrawEntry>,
}

#[derive(Serialize)]
struct DrawEntry {
    label: String,
    distance: f32,
    position: [f32; 3],
}

/// Drawables spread along the view axis, drifting towards or away from the
/// camera so the order changes over time.
fn simulate(drawables: usize, frames: usize, frame_time: Duration) -> Result<Vec<FrameReport>> {
    let mut plugins = Plugins::new();
    plugins.insert(HeadlessSurface::new());
    let mut plugin: RenderPlugin<HeadlessSurface> = RenderPlugin::new(RenderConfig::default());
    plugin
        .game_start(&mut plugins)
        .context("starting render plugin")?;

    let mut world = World::new();
    let mut components = ComponentStore::new();
    let program: SharedProgram = Rc::new(RecordingProgram::new("plain"));
    let log = DrawLog::default();

    for i in 0..drawables {
        let label = format!("d{i}");
        let entity = world.spawn(Transform::from_position(Vec3::new(
            i as f32,
            0.0,
            10.0 + 20.0 * i as f32,
        )));
        let speed = if i % 2 == 0 { 150.0 } else { -150.0 };
        components.set_name(entity, label.clone());
        components.attach_kinematic(entity, Kinematic::with_velocity(Vec3::Z * speed));
        let marker = Marker::new(label, Some(Rc::clone(&program)), Rc::clone(&log));
        plugin.spawn_drawable(entity, marker, &components);
    }

    let mut clock = FixedTimestep::default();
    let mut reports = Vec::with_capacity(frames);
    for frame in 0..frames {
        let steps = clock.advance(frame_time);
        for _ in 0..steps {
            components.integrate(&mut world, clock.step().as_secs_f32());
            world.step();
        }

        let context = FrameContext::new(&world, &components).with_lag(clock.lag(), clock.step());
        log.borrow_mut().clear();
        let stats = plugin.post_update(&context)?;

        let order = plugin
            .scheduler()
            .entries()
            .iter()
            .filter_map(|entry| {
                let owner = plugin.registry().owner(entry.drawable)?;
                Some(DrawEntry {
                    label: components.get_name(owner)?.0.clone(),
                    distance: entry.order,
                    position: entry.transform.position.to_array(),
                })
            })
            .collect();
        reports.push(FrameReport {
            frame,
            tick: world.tick(),
            lag: clock.lag(),
            stats,
            order,
        });
    }

    let presented = plugin.surface().map_or(0, HeadlessSurface::frames_presented);
    tracing::debug!(presented, "simulation finished");
    Ok(reports)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            let camera = RenderConfig::default().camera;
            println!("hum-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: tick={}", World::new().tick());
            println!(
                "camera: mode={:?} near={} far={}",
                camera.projection_mode(),
                camera.z_near(),
                camera.z_far()
            );
            println!(
                "camera: position={} center={} up={}",
                camera.position(),
                camera.center(),
                camera.up()
            );
            println!("camera plane: {}", camera.view_plane());
        }
        Commands::Frames {
            drawables,
            frames,
            frame_ms,
            json,
        } => {
            let reports = simulate(drawables, frames, Duration::from_millis(frame_ms))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
                return Ok(());
            }
            for report in &reports {
                println!(
                    "frame {} (tick {}, lag {:.2}): drawn {} culled {} projection pushes {} view pushes {}",
                    report.frame,
                    report.tick,
                    report.lag,
                    report.stats.drawn,
                    report.stats.culled,
                    report.stats.projection_pushes,
                    report.stats.view_pushes
                );
                for entry in &report.order {
                    println!(
                        "  {:>4}  distance {:8.2}  z {:8.2}",
                        entry.label, entry.distance, entry.position[2]
                    );
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_ordered_farthest_first() {
        let reports = simulate(4, 2, Duration::from_millis(20)).unwrap();
        assert_eq!(reports.len(), 2);
        for report in &reports {
            let distances: Vec<f32> = report.order.iter().map(|e| e.distance).collect();
            assert!(distances.windows(2).all(|pair| pair[0] >= pair[1]));
        }
        assert_eq!(reports[0].stats.projection_pushes, 1);
        assert_eq!(reports[1].stats.projection_pushes, 0);
    }

    #[test]
    fn report_serializes() {
        let reports = simulate(1, 1, Duration::from_millis(16)).unwrap();
        let json = serde_json::to_value(&reports).unwrap();
        assert_eq!(json[0]["order"][0]["label"], "d0");
    }

    #[test]
    fn labels_come_from_entity_names() {
        let reports = simulate(3, 1, Duration::from_millis(16)).unwrap();
        let mut labels: Vec<&str> = reports[0].order.iter().map(|e| e.label.as_str()).collect();
        labels.sort_unstable();
        assert_eq!(labels, ["d0", "d1", "d2"]);
    }
}
