//! Data shared between the sampling interrupt and the main loop.
//!
//! The timer interrupt is the only writer of the readings pair and the only
//! source of the refresh signal. The encoder interrupt is the only producer of
//! navigation events. The main loop reads everything. All three paths go
//! through critical-section backed primitives from `embassy-sync`, so the
//! struct can live in a `static` and be handed to both contexts by reference.
//!
//! ```rust,ignore
//! static SHARED: SharedState = SharedState::new();
//!
//! // timer interrupt, every 4 ms
//! filter.tick(&mut adc, &SHARED);
//!
//! // encoder interrupt
//! SHARED.push_event(NavEvent::Click);
//!
//! // main loop
//! loop {
//!     gauge.poll(&mut lcd)?;
//! }
//! ```

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

/// Navigation events queued between the encoder interrupt and the main loop.
pub const NAV_QUEUE_CAPACITY: usize = 8;

/// Latest filtered and clamped raw counts of both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibratedReadings {
    /// Vacuum port (channel 1).
    pub vacuum: u16,
    /// Reference port (channel 2).
    pub reference: u16,
}

impl CalibratedReadings {
    pub const fn new(vacuum: u16, reference: u16) -> Self {
        Self { vacuum, reference }
    }
}

/// Input produced by the rotary encoder driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    /// One detent; positive is clockwise.
    Rotate(i8),
    Click,
    LongClick,
}

pub struct SharedState {
    readings: Mutex<CriticalSectionRawMutex, Cell<CalibratedReadings>>,
    refresh: Signal<CriticalSectionRawMutex, ()>,
    events: Channel<CriticalSectionRawMutex, NavEvent, NAV_QUEUE_CAPACITY>,
    dropped_events: Mutex<CriticalSectionRawMutex, Cell<u16>>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            readings: Mutex::new(Cell::new(CalibratedReadings::new(0, 0))),
            refresh: Signal::new(),
            events: Channel::new(),
            dropped_events: Mutex::new(Cell::new(0)),
        }
    }

    /// Replace the readings pair. Both channels change inside one critical
    /// section.
    pub fn publish(&self, readings: CalibratedReadings) {
        self.readings.lock(|cell| cell.set(readings));
    }

    /// Copy out the most recently published pair.
    pub fn latest(&self) -> CalibratedReadings {
        self.readings.lock(|cell| cell.get())
    }

    /// Flag that a display refresh is due.
    pub fn raise_refresh(&self) {
        self.refresh.signal(());
    }

    /// Consume the refresh flag. Returns `true` at most once per raise.
    pub fn take_refresh(&self) -> bool {
        self.refresh.try_take().is_some()
    }

    /// Queue a navigation event without blocking.
    ///
    /// When the queue is full the event is dropped and counted; the main loop
    /// reports the count through [`take_dropped_events`](Self::take_dropped_events).
    pub fn push_event(&self, event: NavEvent) -> bool {
        if self.events.try_send(event).is_ok() {
            return true;
        }
        self.dropped_events
            .lock(|count| count.set(count.get().saturating_add(1)));
        false
    }

    pub fn next_event(&self) -> Option<NavEvent> {
        self.events.try_receive().ok()
    }

    /// Number of events dropped since the last call.
    pub fn take_dropped_events(&self) -> u16 {
        self.dropped_events.lock(|count| count.replace(0))
    }
}
