use std::{path::PathBuf, sync::Arc, time::Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use pixels::{Pixels, SurfaceTexture};
use rodio::{OutputStream, OutputStreamBuilder, Sink, Source, source::SquareWave};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use chip8::{CPU_HZ, DISPLAY_X, DISPLAY_Y, Grid, Machine, Quirks, Runner};

use crate::keymap::chip8_key;

mod keymap;

/// The rate at which pixels fade out (phosphor decay).
const DISPLAY_PHOSPHOR_RATE: f32 = 10.0;

/// Longest frame the runner is asked to catch up on, e.g. after a window drag.
const MAX_FRAME_TIME: f32 = 0.25;

const BEEP_HZ: f32 = 440.0;

struct App {
    pixels: Option<Pixels<'static>>,
    window: Option<Arc<Window>>,
    scale: u32,
    /// Brightness of each pixel (0.0 to 1.0) for phosphor decay.
    brightness: Grid<f32>,

    /// Audio output stream (must be kept alive).
    _audio_stream: OutputStream,
    audio_sink: Sink,

    runner: Runner,
    /// Used for delta time calculation.
    last_frame_instant: Instant,

    /// Stores the result of the application to be returned from main.
    exit_result: anyhow::Result<()>,
}

impl App {
    fn new(runner: Runner, scale: u32) -> anyhow::Result<Self> {
        let mut _audio_stream = OutputStreamBuilder::open_default_stream()
            .context("Failed to open audio output stream")?;
        _audio_stream.log_on_drop(false);

        let audio_sink = Sink::connect_new(_audio_stream.mixer());
        audio_sink.pause();
        audio_sink.append(SquareWave::new(BEEP_HZ).amplify(0.5));

        Ok(Self {
            pixels: None,
            window: None,
            scale,
            brightness: [[0.0; DISPLAY_X]; DISPLAY_Y],

            _audio_stream,
            audio_sink,

            runner,
            last_frame_instant: Instant::now(),
            exit_result: Ok(()),
        })
    }

    fn draw_frame(&mut self, dt: f32) -> anyhow::Result<()> {
        let Some(pixels) = self.pixels.as_mut() else {
            return Ok(());
        };
        let framebuffer = self.runner.machine().framebuffer();

        for (i, pxl) in pixels.frame_mut().chunks_exact_mut(4).enumerate() {
            let x = i % DISPLAY_X;
            let y = i / DISPLAY_X;

            // Lit pixels jump to full brightness, dark ones fade out over a few frames.
            let level = &mut self.brightness[y][x];
            *level = if framebuffer[y][x] {
                1.0
            } else {
                (*level - DISPLAY_PHOSPHOR_RATE * dt).max(0.0)
            };

            pxl.copy_from_slice(&[0, 0xff, 0, (*level * 255.0) as u8]);
        }

        pixels.render().context("Pixels render error")
    }

    fn run_frame(&mut self) -> anyhow::Result<()> {
        let now = Instant::now();
        let dt = (now - self.last_frame_instant)
            .as_secs_f32()
            .min(MAX_FRAME_TIME);
        self.last_frame_instant = now;

        if let Err(fault) = self.runner.update(dt) {
            let pc = self.runner.machine().pc();
            log::error!("machine halted: {fault}");
            return Err(fault).with_context(|| format!("CHIP-8 execution error at {pc:#05X}"));
        }

        if self.runner.should_beep() {
            self.audio_sink.play();
        } else {
            self.audio_sink.pause();
        }

        self.draw_frame(dt)?;

        if let Some(window) = &self.window {
            window.request_redraw();
        }
        Ok(())
    }

    fn try_resumed(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = {
            let size = LogicalSize::new(
                DISPLAY_X as u32 * self.scale,
                DISPLAY_Y as u32 * self.scale,
            );
            let min_size = LogicalSize::new(DISPLAY_X as u32, DISPLAY_Y as u32);

            Arc::new(
                event_loop
                    .create_window(
                        Window::default_attributes()
                            .with_title("chip8")
                            .with_inner_size(size)
                            .with_min_inner_size(min_size),
                    )
                    .context("Failed to create window")?,
            )
        };

        self.window = Some(window.clone());
        self.pixels = {
            let window_size = window.inner_size();
            let surface_texture =
                SurfaceTexture::new(window_size.width, window_size.height, window.clone());

            let pixels = Pixels::new(DISPLAY_X as u32, DISPLAY_Y as u32, surface_texture)
                .context("Failed to create pixels surface")?;

            window.request_redraw();
            Some(pixels)
        };

        // Avoid large dt on first frame
        self.last_frame_instant = Instant::now();
        Ok(())
    }

    fn try_window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        event: WindowEvent,
    ) -> anyhow::Result<()> {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        ..
                    },
                ..
            } => {
                log::info!("exiting");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(pixels) = self.pixels.as_mut() {
                    pixels
                        .resize_surface(size.width, size.height)
                        .context("Failed to resize pixels surface")?;
                }
            }

            WindowEvent::RedrawRequested => self.run_frame()?,

            // Forwarded as they arrive so taps shorter than a frame still
            // reach the key wait latch.
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(key) = chip8_key(event.physical_key) {
                    let pressed = event.state == ElementState::Pressed;
                    self.runner.machine_mut().set_key(key, pressed);
                }
            }

            _ => (),
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.try_resumed(event_loop) {
            self.exit_result = Err(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Err(e) = self.try_window_event(event_loop, event) {
            self.exit_result = Err(e);
            event_loop.exit();
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum QuirkProfile {
    /// CHIP-48 / SUPER-CHIP behaviour expected by most ROMs
    Modern,
    /// Original COSMAC VIP interpreter behaviour
    Cosmac,
}

impl From<QuirkProfile> for Quirks {
    fn from(profile: QuirkProfile) -> Self {
        match profile {
            QuirkProfile::Modern => Quirks::modern(),
            QuirkProfile::Cosmac => Quirks::cosmac(),
        }
    }
}

/// CHIP-8 emulator.
///
/// Keys 1-4, Q-R, A-F, Z-V map to CHIP-8 keys.
/// Escape is used to exit the emulator.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Path to the CHIP-8 ROM file
    rom_path: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = CPU_HZ, value_parser = parse_cpu_hz)]
    cpu_hz: f32,

    /// Initial window size as a multiple of 64x32
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=64))]
    scale: u32,

    /// Seed for the random number generator, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Interpreter behaviour for the ambiguous instructions
    #[arg(long, value_enum, default_value_t = QuirkProfile::Modern)]
    quirks: QuirkProfile,
}

fn parse_cpu_hz(s: &str) -> Result<f32, String> {
    let hz: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if hz.is_finite() && hz > 0.0 {
        Ok(hz)
    } else {
        Err(format!("{s} is not a positive rate"))
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let rom = std::fs::read(&args.rom_path)
        .with_context(|| format!("Failed to read ROM file {}", args.rom_path.display()))?;

    let machine = match args.seed {
        Some(seed) => Machine::with_seed(seed),
        None => Machine::new(),
    };
    let mut machine = machine.with_quirks(args.quirks.into());
    machine
        .load(&rom)
        .context("Failed to load ROM into CHIP-8 memory")?;

    log::info!(
        "running {} ({} bytes) at {} Hz with {:?} quirks",
        args.rom_path.display(),
        rom.len(),
        args.cpu_hz,
        args.quirks
    );
    let runner = Runner::new(machine).with_cpu_hz(args.cpu_hz);

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(runner, args.scale).context("Failed to initialize application")?;
    event_loop
        .run_app(&mut app)
        .context("Error occurred during event loop execution")?;

    // Return the result captured during the event loop
    app.exit_result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["chip8-desktop", "pong.ch8"]).unwrap();
        assert_eq!(args.rom_path, PathBuf::from("pong.ch8"));
        assert_eq!(args.cpu_hz, CPU_HZ);
        assert_eq!(args.scale, 10);
        assert_eq!(args.seed, None);
        assert_eq!(Quirks::from(args.quirks), Quirks::modern());
    }

    #[test]
    fn all_flags() {
        let args = Args::try_parse_from([
            "chip8-desktop",
            "--cpu-hz",
            "1000",
            "--scale",
            "4",
            "--seed",
            "42",
            "--quirks",
            "cosmac",
            "pong.ch8",
        ])
        .unwrap();
        assert_eq!(args.cpu_hz, 1000.0);
        assert_eq!(args.scale, 4);
        assert_eq!(args.seed, Some(42));
        assert_eq!(Quirks::from(args.quirks), Quirks::cosmac());
    }

    #[test]
    fn rejects_bad_rates() {
        assert!(Args::try_parse_from(["chip8-desktop", "--cpu-hz", "0", "a.ch8"]).is_err());
        assert!(Args::try_parse_from(["chip8-desktop", "--cpu-hz", "-5", "a.ch8"]).is_err());
        assert!(Args::try_parse_from(["chip8-desktop", "--scale", "0", "a.ch8"]).is_err());
    }
}
