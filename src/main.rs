//! touchdeck-sim: runs the deck's control loop on the host.
//!
//! The data directory is laid out like the device's flash
//! (`config/*.json`, `logos/*.bmp`, `sys/ico/*.bmp`). Touches come from a
//! line script, read from `--script` or stdin:
//!
//! ```text
//! tap <slot>          press and release key 0..5
//! touch <x> <y>       put a finger down (stays down)
//! release             lift the finger
//! tilt <x> <y> <z>    gyro sample for the motion pointer
//! wait <ms>           let time pass, polling every 10 ms
//! shot <file.ppm>     dump the screen
//! disconnect|connect  host link state
//! quit
//! ```
//!
//! Anything else is handed to the deck as a console command
//! (`menu3`, `reset general`, `restart`).

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;

use touchdeck::bmp::{ImageFile, ImageStore};
use touchdeck::config::{LATCH_SLOTS, SCREEN_HEIGHT, SCREEN_WIDTH};
use touchdeck::hid::{HidReport, ReportSink, ReportTransport};
use touchdeck::loader::{GeneralRecord, HomeRecord, MenuRecord};
use touchdeck::pointer::GyroSample;
use touchdeck::system::{SystemControl, UserHook};
use touchdeck::ui::layout::key_center;
use touchdeck::{
    Command, ConfigName, ConfigSource, Deck, Error, InputSource, LatchStore, Peripherals, Tick,
};

/// Poll period while waiting.
const TICK_MS: u64 = 10;

#[derive(Parser, Debug)]
#[command(name = "touchdeck-sim", version, about = "Host simulator for the touchdeck control core")]
struct Args {
    /// Directory holding config/, logos/ and sys/
    #[arg(short, long, default_value = "data")]
    data: PathBuf,

    /// Directory for persisted latches and backlight
    #[arg(short, long, default_value = "state")]
    state: PathBuf,

    /// Script to run instead of reading stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Start with the host link down
    #[arg(long)]
    disconnected: bool,

    /// Make config mode fail, as if WiFi could not be joined
    #[arg(long)]
    no_wifi: bool,

    /// Really sleep for delays instead of skipping them
    #[arg(long)]
    realtime: bool,

    /// Write factory config files before booting
    #[arg(long)]
    init: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

// ═══════════════════════════════════════════════════════════════════════════
// Storage
// ═══════════════════════════════════════════════════════════════════════════

/// Device paths resolved under a host directory.
#[derive(Clone, Debug)]
struct DirStore {
    root: PathBuf,
}

impl DirStore {
    fn resolve(&self, device_path: &str) -> PathBuf {
        self.root.join(device_path.trim_start_matches('/'))
    }

    fn read_record<T: DeserializeOwned>(&self, name: ConfigName) -> Result<T, Error> {
        let bytes = fs::read(self.resolve(name.path())).map_err(|_| Error::Io)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("{}: {}", name.path(), e);
            Error::MalformedConfig(name)
        })
    }
}

/// A whole file read into memory.
struct HostFile(Vec<u8>);

impl ImageFile for HostFile {
    fn size(&self) -> u32 {
        self.0.len() as u32
    }

    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize, Error> {
        self.0.as_slice().read_at(offset, buf)
    }
}

impl ImageStore for DirStore {
    type File = HostFile;

    fn open(&mut self, path: &str) -> Result<Self::File, Error> {
        fs::read(self.resolve(path))
            .map(HostFile)
            .map_err(|_| Error::FileNotFound)
    }
}

impl ConfigSource for DirStore {
    fn exists(&mut self, name: ConfigName) -> bool {
        self.resolve(name.path()).is_file()
    }

    fn load_general(&mut self) -> Result<GeneralRecord, Error> {
        self.read_record(ConfigName::General)
    }

    fn load_homescreen(&mut self) -> Result<HomeRecord, Error> {
        self.read_record(ConfigName::Homescreen)
    }

    fn load_menu(&mut self, number: u8) -> Result<MenuRecord, Error> {
        self.read_record(ConfigName::Menu(number))
    }

    fn reset(&mut self, name: ConfigName) -> Result<(), Error> {
        let json = match name {
            ConfigName::General => serde_json::to_vec_pretty(&GeneralRecord::factory()),
            ConfigName::Homescreen => serde_json::to_vec_pretty(&HomeRecord::factory()),
            ConfigName::Menu(_) => serde_json::to_vec_pretty(&MenuRecord::default()),
        }
        .map_err(|_| Error::Io)?;
        let path = self.resolve(name.path());
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|_| Error::Io)?;
        }
        fs::write(&path, json).map_err(|_| Error::Io)
    }
}

/// Latch table kept as raw bytes in one file.
struct FileLatches {
    path: PathBuf,
}

impl LatchStore for FileLatches {
    fn load(&mut self, buf: &mut [u8; LATCH_SLOTS]) -> Result<bool, Error> {
        if !self.path.exists() {
            return Ok(false);
        }
        let data = fs::read(&self.path).map_err(|_| Error::Storage)?;
        let n = data.len().min(LATCH_SLOTS);
        buf[..n].copy_from_slice(&data[..n]);
        Ok(true)
    }

    fn save(&mut self, data: &[u8; LATCH_SLOTS]) -> Result<(), Error> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|_| Error::Storage)?;
        }
        fs::write(&self.path, data).map_err(|_| Error::Storage)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Peripherals
// ═══════════════════════════════════════════════════════════════════════════

struct Framebuffer {
    pixels: Vec<Rgb565>,
}

impl Framebuffer {
    fn new() -> Self {
        Self {
            pixels: vec![Rgb565::BLACK; (SCREEN_WIDTH * SCREEN_HEIGHT) as usize],
        }
    }

    fn save_ppm(&self, path: &Path) -> Result<()> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3 + 32);
        write!(out, "P6\n{} {}\n255\n", SCREEN_WIDTH, SCREEN_HEIGHT)?;
        for &pixel in &self.pixels {
            let rgb = Rgb888::from(pixel);
            out.extend_from_slice(&[rgb.r(), rgb.g(), rgb.b()]);
        }
        fs::write(path, out).with_context(|| format!("writing {}", path.display()))
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if bounds.contains(point) {
                self.pixels[(point.y as u32 * SCREEN_WIDTH + point.x as u32) as usize] = color;
            }
        }
        Ok(())
    }
}

/// Prints every report that would go to the host.
struct LogSink {
    connected: bool,
}

impl ReportSink for LogSink {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, report: &HidReport) -> Result<(), Error> {
        let mut buf = [0u8; 8];
        let n = report.serialize(&mut buf);
        let kind = match report {
            HidReport::Keyboard(_) => "keyboard",
            HidReport::Mouse(_) => "mouse",
            HidReport::Consumer(_) => "consumer",
        };
        println!("HID {kind:<8} {:02x?}", &buf[..n]);
        Ok(())
    }
}

struct SimDelay {
    realtime: bool,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        if self.realtime {
            std::thread::sleep(Duration::from_nanos(u64::from(ns)));
        }
    }
}

/// Backlight is persisted next to the latch table.
struct SimSystem {
    backlight_file: PathBuf,
    wifi_ok: bool,
}

impl SystemControl for SimSystem {
    fn enter_config_mode(&mut self) -> bool {
        if self.wifi_ok {
            info!("Config server running");
        } else {
            warn!("Could not join WiFi");
        }
        self.wifi_ok
    }

    fn set_backlight(&mut self, level: u8) {
        info!("Backlight: {}", level);
        if let Err(e) = fs::write(&self.backlight_file, [level]) {
            warn!("Backlight not saved: {}", e);
        }
    }

    fn saved_backlight(&mut self) -> Option<u8> {
        fs::read(&self.backlight_file).ok()?.first().copied()
    }

    fn restart(&mut self) {
        info!("System restart");
    }

    fn sleep(&mut self) {
        info!("Deep sleep, touch to wake");
    }

    fn beep(&mut self, frequency_hz: u16, duration_ms: u16) {
        debug!("Beep {} Hz for {} ms", frequency_hz, duration_ms);
    }

    fn user_action(&mut self, hook: UserHook) {
        info!("User action {}", hook.id());
    }
}

#[derive(Default)]
struct ScriptInput {
    touch: Option<Point>,
    motion: Option<GyroSample>,
}

impl InputSource for ScriptInput {
    fn touch(&mut self) -> Option<Point> {
        self.touch
    }

    fn motion(&mut self) -> Option<GyroSample> {
        self.motion
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Main loop
// ═══════════════════════════════════════════════════════════════════════════

type SimDeck = Deck<Framebuffer, DirStore, ReportTransport<LogSink>, SimDelay, SimSystem, FileLatches>;

struct Simulator {
    args: Args,
    config: DirStore,
    deck: SimDeck,
    input: ScriptInput,
    now_ms: u64,
}

impl Simulator {
    fn start(args: Args) -> Result<Self> {
        fs::create_dir_all(&args.state).with_context(|| format!("creating {}", args.state.display()))?;
        let mut config = DirStore { root: args.data.clone() };
        if args.init {
            for name in ConfigName::ALL {
                config
                    .reset(name)
                    .map_err(|e| anyhow!("writing {}: {e}", name.path()))?;
            }
            info!("Factory config written to {}", args.data.display());
        }
        let deck = boot(&args, &mut config, args.disconnected, false, 0)?;
        Ok(Self {
            args,
            config,
            deck,
            input: ScriptInput::default(),
            now_ms: 0,
        })
    }

    /// Bring the deck back up, keeping the host link state.
    fn reboot(&mut self, woke: bool) -> Result<()> {
        let disconnected = !self.deck.hid().sink().connected;
        self.deck = boot(&self.args, &mut self.config, disconnected, woke, self.now_ms)?;
        Ok(())
    }

    fn poll(&mut self) -> Result<()> {
        let tick = self.deck.poll(&mut self.input, self.now_ms);
        self.after(tick)
    }

    fn after(&mut self, tick: Tick) -> Result<()> {
        match tick {
            Tick::Idle => {}
            Tick::Pressed(slot) => debug!("Pressed {}", slot),
            Tick::Navigated(page) => info!("Page {:?}", page),
            Tick::Restarting => self.reboot(false)?,
            Tick::Sleeping => self.reboot(true)?,
        }
        Ok(())
    }

    /// Run one script line. `false` on `quit`.
    fn run_line(&mut self, line: &str) -> Result<bool> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(true);
        }
        let mut words = line.split_whitespace();
        let word = words.next().unwrap_or_default();
        let mut number = |what: &str| -> Result<i64> {
            words
                .next()
                .ok_or_else(|| anyhow!("{word}: missing {what}"))?
                .parse()
                .with_context(|| format!("{word}: bad {what}"))
        };

        match word {
            "tap" => {
                let slot = usize::try_from(number("slot")?)?;
                if slot > 5 {
                    bail!("tap: slot must be 0..5");
                }
                self.input.touch = Some(key_center(slot));
                self.poll()?;
                self.input.touch = None;
                self.poll()?;
            }
            "touch" => {
                let x = i32::try_from(number("x")?)?;
                let y = i32::try_from(number("y")?)?;
                self.input.touch = Some(Point::new(x, y));
                self.poll()?;
            }
            "release" => {
                self.input.touch = None;
                self.poll()?;
            }
            "tilt" => {
                let x = i16::try_from(number("x")?)?;
                let y = i16::try_from(number("y")?)?;
                let z = i16::try_from(number("z")?)?;
                self.input.motion = Some(GyroSample { x, y, z });
            }
            "wait" => {
                let end = self.now_ms + u64::try_from(number("ms")?)?;
                while self.now_ms < end {
                    self.now_ms = (self.now_ms + TICK_MS).min(end);
                    self.poll()?;
                }
            }
            "shot" => {
                let path = line
                    .split_whitespace()
                    .nth(1)
                    .ok_or_else(|| anyhow!("shot: missing file"))?;
                self.deck.display().save_ppm(Path::new(path))?;
                info!("Saved {}", path);
            }
            "disconnect" => self.deck.hid_mut().sink_mut().connected = false,
            "connect" => self.deck.hid_mut().sink_mut().connected = true,
            "quit" => return Ok(false),
            _ => {
                let tick = self.deck.handle_command(Command::parse(line), &mut self.config);
                self.after(tick)?;
            }
        }
        Ok(true)
    }
}

fn boot(args: &Args, config: &mut DirStore, disconnected: bool, woke: bool, now_ms: u64) -> Result<SimDeck> {
    let peripherals = Peripherals {
        display: Framebuffer::new(),
        images: config.clone(),
        hid: ReportTransport::new(LogSink { connected: !disconnected }),
        delay: SimDelay { realtime: args.realtime },
        system: SimSystem {
            backlight_file: args.state.join("backlight.bin"),
            wifi_ok: !args.no_wifi,
        },
        latch_store: FileLatches {
            path: args.state.join("latched.bin"),
        },
    };
    Deck::boot(peripherals, config, woke, now_ms).map_err(|e| anyhow!("boot halted: {e}"))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let reader: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            fs::File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut sim = Simulator::start(args)?;
    for line in reader.lines() {
        let line = line?;
        match sim.run_line(&line) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => warn!("{line}: {e:#}"),
        }
    }
    Ok(())
}
