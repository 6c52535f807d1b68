use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::detector::Detection;

/// Bound on pending events; detector frames beyond this are dropped
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum PlankEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Presence(Detection),
}

/// Source of events (keyboard, resize, detector frames)
pub trait PlankEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<PlankEvent, RecvTimeoutError>;
}

/// Create the single event queue shared by all producers
pub fn event_queue() -> (SyncSender<PlankEvent>, ChannelEventSource) {
    let (tx, rx) = mpsc::sync_channel(EVENT_QUEUE_CAPACITY);
    (tx, ChannelEventSource::new(rx))
}

/// Forward crossterm key presses and resizes into the queue from a background thread
pub fn spawn_terminal_reader(tx: SyncSender<PlankEvent>) {
    std::thread::spawn(move || loop {
        let ev = match event::read() {
            Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => PlankEvent::Key(key),
            Ok(CtEvent::Resize(_, _)) => PlankEvent::Resize,
            Ok(_) => continue,
            Err(_) => break,
        };
        if tx.send(ev).is_err() {
            break;
        }
    });
}

/// Channel-backed event source, fed by the terminal reader, the detector, or a test
pub struct ChannelEventSource {
    rx: Receiver<PlankEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<PlankEvent>) -> Self {
        Self { rx }
    }
}

impl PlankEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PlankEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the application one event/tick at a time.
/// Ticks follow a deadline, so a steady stream of frames cannot starve them.
pub struct Runner<E: PlankEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
}

impl<E: PlankEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    /// Blocks until the next event or the tick deadline, whichever comes first
    pub fn step(&mut self) -> PlankEvent {
        let now = Instant::now();
        if now >= self.next_tick {
            return self.fire_tick(now);
        }

        match self.event_source.recv_timeout(self.next_tick - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.fire_tick(Instant::now()),
            Err(RecvTimeoutError::Disconnected) => {
                // no producers left; behave like a plain timer
                std::thread::sleep(self.next_tick.saturating_duration_since(Instant::now()));
                self.fire_tick(Instant::now())
            }
        }
    }

    fn fire_tick(&mut self, now: Instant) -> PlankEvent {
        self.next_tick += self.ticker.interval();
        if self.next_tick < now {
            // fell behind; skip missed ticks instead of bursting
            self.next_tick = now + self.ticker.interval();
        }
        PlankEvent::Tick
    }
}
