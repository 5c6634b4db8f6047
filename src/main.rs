//! Tilefall headless runner
//!
//! Generates a seeded demo level and simulates it without a window.
//!
//! Usage: `tilefall [settings.json] [seed] [frames]`

use tilefall::Settings;
use tilefall::demo::generate_level;
use tilefall::sim::{FrameClock, TickInput, tick};

const NOMINAL_FRAME_MS: f64 = 1000.0 / 60.0;
const DEFAULT_FRAMES: u64 = 600;

/// Scripted input: run right, jump every second, turn around at the midpoint
fn demo_input(frame: u64, frames: u64) -> TickInput {
    TickInput {
        move_axis: if frame < frames / 2 { 1 } else { -1 },
        jump: frame % 60 == 0,
    }
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) if path != "-" => Settings::load(path),
        _ => Settings::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42u64);
    let frames = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    let mut level = match generate_level(seed, 48, 14) {
        Ok(level) => level,
        Err(e) => {
            log::error!("Failed to build demo level: {e}");
            std::process::exit(1);
        }
    };

    log::info!("Tilefall running {frames} frames (seed {seed})");
    let mut clock = FrameClock::new();
    let mut swept = 0;
    let mut scripts_fired = 0;
    for frame in 0..frames {
        let elapsed = clock.advance(NOMINAL_FRAME_MS, &settings.physics);
        let report = tick(&mut level, &demo_input(frame, frames), &settings, elapsed);
        swept += report.swept_entities;
        scripts_fired += report.scripts_fired;
        for item in &report.pickups {
            log::info!("Picked up {item} on frame {frame}");
        }
        if report.player_dead {
            log::warn!("Player died on frame {frame}");
            break;
        }
    }

    let player = &level.player;
    log::info!(
        "Done: {} frames, {:.0}ms simulated, player at {:.1} ({:.0} hp), {} entities left, {} swept, {} scripts fired, {} items",
        clock.frames(),
        clock.simulated_ms(),
        player.position(),
        player.health().hp(),
        level.entities.len(),
        swept,
        scripts_fired,
        level.collected.len()
    );
}
