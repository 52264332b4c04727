//! Demo simulation system
//!
//! Drives the demo without a window:
//! - Frame pacing against the wall clock or a simulated clock
//! - Delta time calculation
//! - Scripted input fed at its configured time
//! - World resets on request

use crate::config::{AppConfig, ScriptedInput};
use crate::demo::DemoApp;
use crate::input::InputEvent;
use crate::systems::render::HeadlessRenderer;
use fixstep_core::{Clock, ManualClock, MonotonicClock, SimulationWorld};
use std::time::{Duration, Instant};

/// Graphics delta cap after a stall; physics catches up through its own accumulator
const MAX_GRAPHICS_DELTA: f32 = 0.25;

/// Totals for a finished run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub physics_steps: u64,
    /// Simulated seconds advanced by physics
    pub simulated_seconds: f32,
    /// Objects alive when the run ended
    pub objects: usize,
    /// Objects dropped over the whole run, across resets
    pub dropped: usize,
    pub resets: u32,
    pub render_errors: usize,
    /// Overlay line of the last frame
    pub overlay: String,
}

enum RunClock {
    Realtime(MonotonicClock),
    Simulated(ManualClock),
}

impl RunClock {
    fn now_nanos(&self) -> u64 {
        match self {
            RunClock::Realtime(clock) => clock.now_nanos(),
            RunClock::Simulated(clock) => clock.now_nanos(),
        }
    }
}

/// Runs the demo for a configured duration
pub struct SimulationSystem {
    config: AppConfig,
    clock: RunClock,
    last_frame: Option<u64>,
}

impl SimulationSystem {
    /// Create a simulation system from config
    pub fn new(config: AppConfig) -> Self {
        let clock = if config.run.realtime {
            RunClock::Realtime(MonotonicClock::new())
        } else {
            RunClock::Simulated(ManualClock::new())
        };
        Self {
            config,
            clock,
            last_frame: None,
        }
    }

    /// Seconds since the previous frame, capped
    fn delta_time(&mut self) -> f32 {
        let now = self.clock.now_nanos();
        let raw_dt = match self.last_frame {
            Some(last) => now.saturating_sub(last) as f32 / 1e9,
            None => 0.0,
        };
        self.last_frame = Some(now);
        raw_dt.min(MAX_GRAPHICS_DELTA)
    }

    fn build_world(&self) -> SimulationWorld {
        let settings = self.config.physics.to_settings();
        match &self.clock {
            RunClock::Realtime(_) => SimulationWorld::new(settings),
            RunClock::Simulated(clock) => SimulationWorld::with_clock(settings, clock.clone()),
        }
    }

    fn feed(&self, app: &mut DemoApp, input: &ScriptedInput) {
        if let Some(key) = input.key {
            app.handle(InputEvent::KeyTyped(key));
        }
        if let Some(x) = input.click_x {
            app.handle(InputEvent::Click {
                x,
                width: self.config.window.width as f32,
            });
        }
    }

    /// Run the demo until the configured duration has passed
    pub fn run(&mut self) -> RunSummary {
        let run = self.config.run.clone();
        let target_fps = if run.target_fps > 0.0 { run.target_fps } else { 60.0 };
        let frame_nanos = (1e9 / f64::from(target_fps)).round() as u64;
        let duration_nanos = (f64::from(run.duration.max(0.0)) * 1e9) as u64;
        let overlay_interval = (f64::from(run.overlay_log_interval.max(0.0)) * 1e9) as u64;

        let mut script = run.script;
        script.sort_by(|a, b| a.at.total_cmp(&b.at));
        let mut next_input = 0;

        log::info!(
            "Running demo for {:.1}s at {} fps ({})",
            run.duration,
            target_fps,
            if run.realtime { "realtime" } else { "simulated clock" }
        );

        let mut renderer = HeadlessRenderer::new();
        let mut world = self.build_world();
        let mut app = DemoApp::new(self.config.demo.clone());
        world.show(&mut app);

        let mut summary = RunSummary::default();
        let started = self.clock.now_nanos();
        let wall_start = Instant::now();
        let mut next_overlay_log = overlay_interval;

        loop {
            let elapsed = self.clock.now_nanos().saturating_sub(started);
            if elapsed >= duration_nanos {
                break;
            }

            // 1. Scripted input due by now
            while let Some(input) = script.get(next_input) {
                if f64::from(input.at) * 1e9 > elapsed as f64 {
                    break;
                }
                self.feed(&mut app, input);
                next_input += 1;
            }

            // 2. Render one frame
            let dt = self.delta_time();
            renderer.begin_frame();
            let report = world.frame(&mut app, &mut renderer, dt);
            if let Err(e) = renderer.end_frame() {
                log::warn!("Frame {} failed to render: {}", summary.frames, e);
                summary.render_errors += 1;
            }
            summary.frames += 1;
            summary.physics_steps += u64::from(report.steps);
            summary.simulated_seconds += report.physics_delta;

            if self.config.debug.show_overlay && overlay_interval > 0 && elapsed >= next_overlay_log {
                log::info!("{}", renderer.overlay_text());
                next_overlay_log += overlay_interval;
            }

            // 3. Replace the world if asked
            if app.take_reset_request() {
                summary.dropped += app.dropped();
                world.shutdown();
                world = self.build_world();
                app = DemoApp::new(self.config.demo.clone());
                world.show(&mut app);
                summary.resets += 1;
            }

            // 4. Wait for the next frame
            match &self.clock {
                RunClock::Realtime(_) => {
                    let deadline = Duration::from_nanos(frame_nanos * summary.frames);
                    let wait = deadline.saturating_sub(wall_start.elapsed());
                    if !wait.is_zero() {
                        std::thread::sleep(wait);
                    }
                }
                RunClock::Simulated(clock) => clock.advance(frame_nanos),
            }
        }

        summary.dropped += app.dropped();
        summary.objects = world.object_count();
        summary.overlay = renderer.overlay_text().to_string();
        world.shutdown();

        log::info!(
            "Run finished: {} frames, {} physics steps, {} objects",
            summary.frames,
            summary.physics_steps,
            summary.objects
        );
        summary
    }
}
