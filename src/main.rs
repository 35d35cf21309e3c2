use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use dyeflow::config::{self, Config};
use dyeflow::input::{GestureTracker, Stroke, Toggle};
use dyeflow::renderer::Viewport;
use dyeflow::solver::diagnostics::{compute_kinetic_energy, total_dye};
use dyeflow::FluidEngine;

/// Poll interval of the physics thread while frozen.
const FROZEN_POLL: Duration = Duration::from_millis(10);

/// Messages from the main (input) thread to the physics thread.
enum Command {
    Stroke(Stroke),
    Freeze(bool),
}

/// One composited frame plus the numbers shown in the title bar.
struct Frame {
    rgba: Vec<u8>,
    kinetic_energy: f64,
    dye: f64,
}

impl Frame {
    fn new(bytes: usize) -> Self {
        Self { rgba: vec![0; bytes], kinetic_energy: 0.0, dye: 0.0 }
    }
}

/// Per-step arguments that stay fixed for the whole run.
#[derive(Clone, Copy)]
struct StepSettings {
    viscosity: f64,
    color_spread: f64,
    max_dt: f64,
    brush_radius: f64,
}

impl StepSettings {
    fn from_config(cfg: &Config) -> Self {
        Self {
            viscosity: cfg.physics.viscosity,
            color_spread: cfg.physics.color_diffusion,
            max_dt: cfg.physics.max_dt,
            brush_radius: cfg.brush_radius_cells(),
        }
    }
}

/// Channels connecting the main (render) thread to the physics thread.
struct PhysicsChannels {
    cmd_tx: mpsc::Sender<Command>,
    frame_rx: mpsc::Receiver<Frame>,
    frame_return_tx: mpsc::Sender<Frame>,
}

/// Measured frame time in seconds, capped at `max_dt`.
fn cap_dt(elapsed: Duration, max_dt: f64) -> f64 {
    elapsed.as_secs_f64().min(max_dt)
}

fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(1)
}

fn format_title(fps: u32, kinetic_energy: f64, dye: f64, frozen: bool) -> String {
    let state = if frozen { "  [frozen]" } else { "" };
    format!("dyeflow | {fps} fps | KE {kinetic_energy:.3e} | dye {dye:.1}{state}")
}

/// Take the newest pending item, dropping older ones.
fn drain_latest<T>(rx: &mpsc::Receiver<T>, mut recycle: impl FnMut(T)) -> Option<T> {
    let mut latest = None;
    while let Ok(item) = rx.try_recv() {
        if let Some(old) = latest.replace(item) {
            recycle(old);
        }
    }
    latest
}

/// Spawn the physics thread. It owns the engine and tears it down on exit.
fn spawn_physics_thread(
    mut engine: FluidEngine,
    frame_bytes: usize,
    settings: StepSettings,
    running: Arc<AtomicBool>,
) -> (PhysicsChannels, std::thread::JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    let (frame_tx, frame_rx) = mpsc::sync_channel::<Frame>(1);
    let (frame_return_tx, frame_return_rx) = mpsc::channel::<Frame>();

    let handle = std::thread::spawn(move || {
        let mut frozen = false;
        let mut frame = Frame::new(frame_bytes);
        let mut last = Instant::now();

        while running.load(Ordering::SeqCst) {
            while let Ok(cmd) = cmd_rx.try_recv() {
                match cmd {
                    Command::Stroke(s) => {
                        let [r, g, b] = s.color;
                        let (x0, y0, x1, y1) = (s.from.0, s.from.1, s.to.0, s.to.1);
                        if let Err(e) = engine.apply_impulse(x0, y0, x1, y1, settings.brush_radius, r, g, b) {
                            log::error!("impulse failed: {e}");
                        }
                    }
                    Command::Freeze(on) => {
                        log::info!("{}", if on { "frozen" } else { "resumed" });
                        frozen = on;
                    }
                }
            }

            let now = Instant::now();
            let dt = cap_dt(now.duration_since(last), settings.max_dt);
            last = now;
            if frozen {
                std::thread::sleep(FROZEN_POLL);
                continue;
            }

            if let Err(e) = engine.step(&mut frame.rgba, dt, settings.viscosity, settings.color_spread) {
                log::error!("step failed: {e}");
                break;
            }
            if let Some(s) = engine.state() {
                frame.kinetic_energy = compute_kinetic_energy(s.vx(), s.vy());
                frame.dye = total_dye(s);
            }
            if frame_tx.send(frame).is_err() {
                break;
            }
            frame = frame_return_rx
                .try_recv()
                .ok()
                .filter(|f| f.rgba.len() == frame_bytes)
                .unwrap_or_else(|| Frame::new(frame_bytes));
        }

        if let Err(e) = engine.teardown() {
            log::warn!("teardown: {e}");
        }
    });

    let channels = PhysicsChannels { cmd_tx, frame_rx, frame_return_tx };
    (channels, handle)
}

fn run(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let viewport = Viewport::fit(cfg.display.width, cfg.display.height, cfg.display.scale);
    let (w, h) = (viewport.frame_width(), viewport.frame_height());
    log::info!(
        "window {w}x{h}, grid {}x{} (scale {})",
        viewport.grid_width,
        viewport.grid_height,
        viewport.scale
    );

    let mut engine = FluidEngine::new(cfg.solver_params());
    engine.init(viewport.grid_width, viewport.grid_height)?;
    let frame_bytes = engine.state().map(|s| s.pixel_bytes()).unwrap_or(0);

    let mut window = Window::new("dyeflow", w, h, WindowOptions::default())?;
    window.set_target_fps(cfg.display.target_fps);

    // Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))?;

    let (channels, physics_thread) =
        spawn_physics_thread(engine, frame_bytes, StepSettings::from_config(&cfg), running.clone());
    let PhysicsChannels { cmd_tx, frame_rx, frame_return_tx } = channels;

    let mut gestures = GestureTracker::new(clock_seed());
    let mut freeze = Toggle::default();
    let mut framebuf = vec![0u32; viewport.frame_len()];
    let mut frame_count = 0u32;
    let mut last_fps_time = Instant::now();
    let (mut kinetic_energy, mut dye) = (0.0, 0.0);
    let mut last_frame: Option<Frame> = None;

    while window.is_open() && running.load(Ordering::SeqCst) {
        if window.is_key_pressed(Key::Escape, KeyRepeat::No) {
            break;
        }
        if physics_thread.is_finished() {
            log::error!("physics thread stopped; closing window");
            break;
        }

        // --- Mouse ---
        let pos = window
            .get_mouse_pos(MouseMode::Discard)
            .map(|(x, y)| viewport.to_grid(x, y));
        let mut commands = Vec::new();
        if let Some(stroke) = gestures.update(window.get_mouse_down(MouseButton::Left), pos) {
            commands.push(Command::Stroke(stroke));
        }
        if freeze.update(window.get_mouse_down(MouseButton::Right)) {
            commands.push(Command::Freeze(freeze.on));
        }
        if commands.into_iter().any(|cmd| cmd_tx.send(cmd).is_err()) {
            log::error!("physics thread is gone; closing window");
            break;
        }

        // --- Non-blocking: grab latest frame if available ---
        let recycle = |f: Frame| {
            let _ = frame_return_tx.send(f);
        };
        if let Some(frame) = drain_latest(&frame_rx, recycle) {
            viewport.present(&frame.rgba, &mut framebuf);
            kinetic_energy = frame.kinetic_energy;
            dye = frame.dye;
            // Return old frame buffer to physics thread for reuse
            if let Some(old) = last_frame.replace(frame) {
                let _ = frame_return_tx.send(old);
            }
        }

        if let Err(e) = window.update_with_buffer(&framebuf, w, h) {
            log::error!("window update failed: {e}");
            break;
        }

        frame_count += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            window.set_title(&format_title(frame_count, kinetic_energy, dye, freeze.on));
            frame_count = 0;
            last_fps_time = now;
        }
    }

    // Shutdown
    running.store(false, Ordering::SeqCst);
    drop(frame_rx);
    let _ = physics_thread.join();
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cfg = config::load();
    if let Err(e) = run(cfg) {
        log::error!("{e}");
        eprintln!("dyeflow: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dyeflow::SolverParams;

    #[test]
    fn test_cap_dt() {
        assert_eq!(cap_dt(Duration::from_millis(10), 0.05), 0.01);
        assert_eq!(cap_dt(Duration::from_secs(3), 0.05), 0.05);
        assert_eq!(cap_dt(Duration::ZERO, 0.05), 0.0);
    }

    #[test]
    fn test_format_title() {
        assert_eq!(format_title(60, 0.0, 12.3, false), "dyeflow | 60 fps | KE 0.000e0 | dye 12.3");
        assert!(format_title(30, 1.5, 0.0, true).ends_with("[frozen]"));
    }

    #[test]
    fn test_drain_latest_gets_newest() {
        let (tx, rx) = mpsc::sync_channel::<i32>(10);
        for i in 0..3 {
            tx.send(i).unwrap();
        }
        let mut dropped = Vec::new();
        let latest = drain_latest(&rx, |old| dropped.push(old));
        assert_eq!(latest, Some(2), "Should get the last item sent");
        assert_eq!(dropped, vec![0, 1], "Older items are recycled");
        assert_eq!(drain_latest(&rx, |_| {}), None);
    }

    #[test]
    fn test_step_settings_from_config() {
        let cfg = Config::default();
        let s = StepSettings::from_config(&cfg);
        assert_eq!(s.viscosity, cfg.physics.viscosity);
        assert_eq!(s.color_spread, cfg.physics.color_diffusion);
        assert_eq!(s.brush_radius, 10.0, "20 px brush at scale 2");
    }

    #[test]
    fn test_pipeline_no_panic() {
        let viewport = Viewport::fit(96, 64, 4);
        let mut engine = FluidEngine::new(SolverParams::default());
        engine.init(viewport.grid_width, viewport.grid_height).unwrap();
        let mut gestures = GestureTracker::new(3);
        let mut rgba = vec![0u8; viewport.grid_width * viewport.grid_height * 4];
        let mut framebuf = vec![0u32; viewport.frame_len()];

        gestures.update(true, Some(viewport.to_grid(20.0, 20.0)));
        for i in 0..5 {
            let pos = viewport.to_grid(20.0 + 10.0 * i as f32, 30.0);
            if let Some(s) = gestures.update(true, Some(pos)) {
                let [r, g, b] = s.color;
                engine.apply_impulse(s.from.0, s.from.1, s.to.0, s.to.1, 3.0, r, g, b).unwrap();
            }
            engine.step(&mut rgba, 1.0 / 60.0, 1.0, 1.0).unwrap();
            viewport.present(&rgba, &mut framebuf);
        }
        assert!(framebuf.iter().any(|&px| px != 0), "Stroke should leave visible dye");
        engine.teardown().unwrap();
    }

    #[test]
    fn test_physics_thread_stops_and_tears_down() {
        let mut engine = FluidEngine::new(SolverParams::precise());
        engine.init(8, 8).unwrap();
        let settings = StepSettings { viscosity: 0.1, color_spread: 0.1, max_dt: 0.05, brush_radius: 2.0 };
        let running = Arc::new(AtomicBool::new(true));
        let (channels, handle) = spawn_physics_thread(engine, 8 * 8 * 4, settings, running.clone());

        let stroke = Stroke { from: (2.0, 4.0), to: (5.0, 4.0), color: [1.0, 0.0, 0.0] };
        channels.cmd_tx.send(Command::Stroke(stroke)).unwrap();
        let frame = channels.frame_rx.recv().unwrap();
        assert_eq!(frame.rgba.len(), 256);

        running.store(false, Ordering::SeqCst);
        drop(channels);
        handle.join().unwrap();
    }

    #[test]
    fn test_physics_thread_exits_on_step_error() {
        let mut engine = FluidEngine::new(SolverParams::precise());
        engine.init(8, 8).unwrap();
        let settings = StepSettings { viscosity: 0.1, color_spread: 0.1, max_dt: 0.05, brush_radius: 2.0 };
        let running = Arc::new(AtomicBool::new(true));
        // Frame buffer one pixel short: the first step fails
        let (channels, handle) = spawn_physics_thread(engine, 7 * 8 * 4, settings, running.clone());

        assert!(channels.frame_rx.recv().is_err(), "No frame is produced after a failed step");
        handle.join().unwrap();
        assert!(running.load(Ordering::SeqCst), "The thread stopped on its own, not on shutdown");
        let stroke = Stroke { from: (2.0, 4.0), to: (5.0, 4.0), color: [1.0, 0.0, 0.0] };
        assert!(
            channels.cmd_tx.send(Command::Stroke(stroke)).is_err(),
            "Sends fail once the physics thread is gone, which ends the render loop"
        );
    }
}
