//! Terminal simulator for the vacuum-rs differential vacuum gauge.
//!
//! Drives vacuum-core with synthetic transducer signals at the real 4 ms
//! sampling period and prints the 16x2 character display whenever it changes.
//! Navigation comes from stdin, one command per character, applied on Enter.
//!
//! # Commands
//!
//! | Input       | Action                              |
//! |-------------|-------------------------------------|
//! | `+` or `d`  | Rotate clockwise                    |
//! | `-` or `a`  | Rotate counter-clockwise            |
//! | `c` / empty | Click                               |
//! | `l`         | Long-click                          |
//! | `e`         | Start or stop the simulated engine  |
//! | `q`         | Quit                                |
//!
//! Pass `--oversample` to average back-to-back conversions instead of running
//! the exponential filter. Set `RUST_LOG=debug` to see state transitions and
//! redraws.

use std::convert::Infallible;
use std::f64::consts::TAU;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use vacuum_core::char_buffer::{Cell, CharFrameBuffer};
use vacuum_core::config::{ADC_OVERSAMPLE, FilterMode, GaugeConfig, SAMPLE_PERIOD};
use vacuum_core::display::{CharDisplay, GLYPH_SLOTS, GlyphPattern, LCD_COLUMNS, LCD_ROWS};
use vacuum_core::gauge::Gauge;
use vacuum_core::range::SensorRange;
use vacuum_core::sampling::{Channel, PressureInputs, SampleFilter};
use vacuum_core::shared::{NavEvent, SharedState};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared between the sampling loop, the input thread and the gauge.
static SHARED: SharedState = SharedState::new();

static ENGINE_RUNNING: AtomicBool = AtomicBool::new(false);
static QUIT: AtomicBool = AtomicBool::new(false);

// ---------------------------------------------------------------------------
// Synthetic engine
// ---------------------------------------------------------------------------

const AMBIENT_MBAR: f64 = 1013.0;
/// Manifold pressure at idle.
const IDLE_MBAR: f64 = 350.0;
/// Amplitude and frequency of the intake pulses.
const PULSE_MBAR: f64 = 40.0;
const PULSE_HZ: f64 = 12.0;
/// The reference cylinder pulls slightly less vacuum.
const CYLINDER_MISMATCH_MBAR: f64 = 25.0;
/// The reference transducer reads low at equal pressure.
const REFERENCE_BIAS_MBAR: f64 = -12.0;
/// Time for the engine to reach idle vacuum or return to ambient.
const SPOOL_SECS: f64 = 1.5;
/// Peak-to-peak ADC noise in counts.
const NOISE_COUNTS: u32 = 5;

/// Two transducers on a simulated twin-cylinder engine.
struct MockTransducers {
    sensor: SensorRange,
    start: Instant,
    last_update: Instant,
    /// 0.0 stopped, 1.0 at idle.
    engine_level: f64,
    noise_state: u32,
}

impl MockTransducers {
    fn new(sensor: SensorRange) -> Self {
        let now = Instant::now();
        Self {
            sensor,
            start: now,
            last_update: now,
            engine_level: 0.0,
            noise_state: 0x2545_f491,
        }
    }

    /// Move the engine towards its target state.
    fn spool(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;

        let target = if ENGINE_RUNNING.load(Ordering::Relaxed) {
            1.0
        } else {
            0.0
        };
        let step = dt / SPOOL_SECS;
        self.engine_level = if self.engine_level < target {
            (self.engine_level + step).min(target)
        } else {
            (self.engine_level - step).max(target)
        };
    }

    fn pressure(&self, channel: Channel) -> f64 {
        let t = self.start.elapsed().as_secs_f64();
        let level = self.engine_level;
        match channel {
            Channel::Vacuum => {
                let pulse = PULSE_MBAR * (TAU * PULSE_HZ * t).sin();
                AMBIENT_MBAR - level * (AMBIENT_MBAR - IDLE_MBAR) + level * pulse
            }
            Channel::Reference => {
                // Second cylinder fires half a cycle later.
                let pulse = PULSE_MBAR * (TAU * PULSE_HZ * t + TAU / 2.0).sin();
                let manifold = IDLE_MBAR + CYLINDER_MISMATCH_MBAR;
                AMBIENT_MBAR - level * (AMBIENT_MBAR - manifold)
                    + level * pulse
                    + REFERENCE_BIAS_MBAR
            }
        }
    }

    /// Cheap linear congruential noise in `[-NOISE_COUNTS / 2, NOISE_COUNTS / 2]`.
    fn noise(&mut self) -> f64 {
        self.noise_state = self
            .noise_state
            .wrapping_mul(1_103_515_245)
            .wrapping_add(12_345);
        ((self.noise_state >> 16) % NOISE_COUNTS) as f64 - (NOISE_COUNTS / 2) as f64
    }

    /// Inverse of the range mapper: the count a transducer produces at `mbar`.
    fn to_counts(&self, mbar: f64) -> f64 {
        let s = &self.sensor;
        let span = (s.adc_max - s.adc_min) as f64;
        let pressure_span = (s.pressure_max - s.pressure_min) as f64;
        s.adc_min as f64 + (mbar - s.pressure_min as f64) * span / pressure_span
    }
}

impl PressureInputs for MockTransducers {
    fn read(&mut self, channel: Channel) -> u16 {
        if channel == Channel::Vacuum {
            self.spool();
        }
        let counts = self.to_counts(self.pressure(channel)) + self.noise();
        counts.round().clamp(0.0, 1023.0) as u16
    }
}

// ---------------------------------------------------------------------------
// Terminal display
// ---------------------------------------------------------------------------

const COLUMNS: usize = LCD_COLUMNS as usize;
const ROWS: usize = LCD_ROWS as usize;

/// Character module memory printed to stdout.
///
/// The gauge draws into a [`CharFrameBuffer`], which flushes only changed
/// cells here, the same way it would feed an I2C backpack.
struct TerminalLcd {
    cells: [[Cell; COLUMNS]; ROWS],
    glyphs: [GlyphPattern; GLYPH_SLOTS as usize],
    cursor: (usize, usize),
    bus_writes: usize,
}

impl TerminalLcd {
    fn new() -> Self {
        Self {
            cells: [[Cell::Char(b' '); COLUMNS]; ROWS],
            glyphs: [[0; 8]; GLYPH_SLOTS as usize],
            cursor: (0, 0),
            bus_writes: 0,
        }
    }

    fn put(&mut self, cell: Cell) {
        let (col, row) = self.cursor;
        if col < COLUMNS {
            self.cells[row][col] = cell;
        }
        self.cursor.0 += 1;
        self.bus_writes += 1;
    }

    fn present(&self, out: &mut impl Write) -> io::Result<()> {
        let border = "-".repeat(COLUMNS);
        writeln!(out, "+{border}+")?;
        for row in &self.cells {
            let line: String = row
                .iter()
                .map(|cell| match *cell {
                    Cell::Char(byte) => byte as char,
                    Cell::Glyph(slot) => glyph_char(&self.glyphs[slot as usize]),
                })
                .collect();
            writeln!(out, "|{line}|")?;
        }
        writeln!(out, "+{border}+")?;
        out.flush()
    }
}

/// Closest terminal character to a programmed glyph.
fn glyph_char(pattern: &GlyphPattern) -> char {
    const FILL: [char; 6] = [' ', '▏', '▎', '▌', '▊', '█'];

    let bordered = pattern[0] == 0b11111 && pattern[7] == 0b11111;
    if bordered {
        let middle = pattern[3] & 0b11111;
        if middle == 0b00001 {
            return '▕';
        }
        return FILL[middle.count_ones() as usize];
    }
    if pattern[2] == 0b11111 {
        '▲'
    } else if pattern[5] == 0b11111 {
        '▼'
    } else {
        '?'
    }
}

impl CharDisplay for TerminalLcd {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.cells = [[Cell::Char(b' '); COLUMNS]; ROWS];
        self.cursor = (0, 0);
        self.bus_writes += 1;
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error> {
        self.cursor = ((col as usize).min(COLUMNS), (row as usize).min(ROWS - 1));
        self.bus_writes += 1;
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
        for byte in text.bytes() {
            self.put(Cell::Char(byte));
        }
        Ok(())
    }

    fn write_glyph(&mut self, slot: u8) -> Result<(), Self::Error> {
        self.put(Cell::Glyph(slot % GLYPH_SLOTS));
        Ok(())
    }

    fn program_glyph(&mut self, slot: u8, pattern: &GlyphPattern) -> Result<(), Self::Error> {
        self.glyphs[(slot % GLYPH_SLOTS) as usize] = *pattern;
        self.bus_writes += 9;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

fn command_event(command: char) -> Option<NavEvent> {
    match command {
        '+' | 'd' => Some(NavEvent::Rotate(1)),
        '-' | 'a' => Some(NavEvent::Rotate(-1)),
        'c' => Some(NavEvent::Click),
        'l' => Some(NavEvent::LongClick),
        _ => None,
    }
}

/// Read commands from stdin until `q` or end of input.
fn spawn_input_thread() -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("input".into())
        .spawn(|| {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        error!("stdin: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    SHARED.push_event(NavEvent::Click);
                    continue;
                }
                for command in line.trim().chars() {
                    match command {
                        'q' => {
                            QUIT.store(true, Ordering::Relaxed);
                            return;
                        }
                        'e' => {
                            let running = !ENGINE_RUNNING.fetch_xor(true, Ordering::Relaxed);
                            info!("Engine {}", if running { "started" } else { "stopped" });
                        }
                        other => match command_event(other) {
                            Some(event) => {
                                SHARED.push_event(event);
                            }
                            None => warn!("Unknown command {:?}", other),
                        },
                    }
                }
            }
            info!("Input closed");
        })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn show_banner(frame: &mut CharFrameBuffer, lcd: &mut TerminalLcd) -> io::Result<()> {
    let Ok(()) = frame.set_cursor(0, 0);
    let Ok(()) = frame.write_str("VacuumMeter");
    let Ok(()) = frame.set_cursor(0, 1);
    let Ok(()) = frame.write_str("   simulator");
    let Ok(()) = frame.flush(lcd);
    lcd.present(&mut io::stdout().lock())
}

fn main() {
    env_logger::init();
    info!("Starting vacuum-rs simulator");
    info!("Keys: +/d=CW  -/a=CCW  c=Click  l=LongClick  e=Engine  q=Quit (then Enter)");

    let config = if std::env::args().skip(1).any(|arg| arg == "--oversample") {
        GaugeConfig::DEFAULT.with_filter(FilterMode::Oversample {
            count: ADC_OVERSAMPLE,
        })
    } else {
        GaugeConfig::DEFAULT
    };
    info!("Sample filter: {:?}", config.filter);

    let mut gauge = match Gauge::new(config, &SHARED) {
        Ok(gauge) => gauge,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    let mut transducers = MockTransducers::new(config.sensor);
    let mut filter = SampleFilter::new(&config);
    let mut frame = CharFrameBuffer::new();
    let mut lcd = TerminalLcd::new();

    if let Err(e) = show_banner(&mut frame, &mut lcd) {
        error!("Display error: {}", e);
    }
    thread::sleep(Duration::from_secs(1));

    if let Err(e) = spawn_input_thread() {
        error!("Could not start input thread: {}", e);
        return;
    }

    // Ports are open to atmosphere at power-on.
    gauge.start_calibration();

    let period = Duration::from_micros(SAMPLE_PERIOD.as_micros());
    let mut next_tick = Instant::now();

    // -----------------------------------------------------------------------
    // Main loop: one iteration per sampling period
    // -----------------------------------------------------------------------
    while !QUIT.load(Ordering::Relaxed) {
        // Stands in for the timer interrupt.
        filter.tick(&mut transducers, &SHARED);

        let Ok(drawn) = gauge.poll(&mut frame);
        if drawn && frame.is_dirty() {
            let before = lcd.bus_writes;
            let Ok(()) = frame.flush(&mut lcd);
            debug!("{} bus writes", lcd.bus_writes - before);
            if let Err(e) = lcd.present(&mut io::stdout().lock()) {
                error!("Display error: {}", e);
            }
        }

        next_tick += period;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        } else {
            // Running late; do not try to catch up with a burst of ticks.
            next_tick = now;
        }
    }

    info!("Simulator exiting");
}
