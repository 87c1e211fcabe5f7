//! Per-task control queues
//!
//! A task that needs a periodic timer, callbacks posted by other tasks and
//! plain messages waits on one [`TaskControl`]. All three arrive as
//! [`ControlEvent`]s, so a single receive serves every event source.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Ticker};

use stratum_core::{Error, Result};

/// Function to run in the receiving task's context
#[derive(Debug, Clone, Copy)]
pub struct Callback {
    pub func: fn(u32),
    pub arg: u32,
}

impl Callback {
    pub fn call(self) {
        (self.func)(self.arg)
    }
}

/// Event delivered through a [`TaskControl`]
#[derive(Debug, Clone, Copy)]
pub enum ControlEvent<T> {
    /// The task timer expired
    Timer,
    /// Another task asked for a function to be run here
    Callback(Callback),
    Message(T),
}

/// Control queue of one task
pub struct TaskControl<M: RawMutex, T, const N: usize> {
    queue: Channel<M, ControlEvent<T>, N>,
}

impl<M: RawMutex, T, const N: usize> Default for TaskControl<M, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, T, const N: usize> TaskControl<M, T, N> {
    pub const fn new() -> Self {
        Self {
            queue: Channel::new(),
        }
    }

    /// Queue a message, waiting for room
    pub async fn send(&self, msg: T) {
        self.queue.send(ControlEvent::Message(msg)).await;
    }

    /// Queue a message; `QueueWrite` when full
    pub fn try_send(&self, msg: T) -> Result<()> {
        self.push(ControlEvent::Message(msg))
    }

    /// Report a timer expiry; `QueueWrite` when full
    pub fn notify_timer(&self) -> Result<()> {
        self.push(ControlEvent::Timer)
    }

    /// Ask the receiving task to run `func(arg)`; `QueueWrite` when full
    pub fn post_callback(&self, func: fn(u32), arg: u32) -> Result<()> {
        self.push(ControlEvent::Callback(Callback { func, arg }))
    }

    /// Wait for the next queued event
    pub async fn receive(&self) -> ControlEvent<T> {
        self.queue.receive().await
    }

    /// Take the next queued event; `QueueRead` when empty
    pub fn try_receive(&self) -> Result<ControlEvent<T>> {
        self.queue.try_receive().map_err(|_| Error::QueueRead)
    }

    /// Wait for the next queued event or timer expiry, whichever comes first
    pub async fn next(&self, timer: &mut TaskTimer) -> ControlEvent<T> {
        match select(timer.tick(), self.queue.receive()).await {
            Either::First(()) => ControlEvent::Timer,
            Either::Second(event) => event,
        }
    }

    fn push(&self, event: ControlEvent<T>) -> Result<()> {
        self.queue.try_send(event).map_err(|_| Error::QueueWrite)
    }
}

/// Periodic task timer
pub struct TaskTimer {
    ticker: Ticker,
}

impl TaskTimer {
    pub fn every(period: Duration) -> Self {
        Self {
            ticker: Ticker::every(period),
        }
    }

    /// Wait for the next expiry
    pub async fn tick(&mut self) {
        self.ticker.next().await;
    }

    /// Restart the period from now
    pub fn reset(&mut self) {
        self.ticker.reset();
    }

    /// Feed expiries into a control queue forever
    ///
    /// Expiries that find the queue full are dropped.
    pub async fn run<M: RawMutex, T, const N: usize>(&mut self, control: &TaskControl<M, T, N>) -> ! {
        loop {
            self.ticker.next().await;
            if control.notify_timer().is_err() {
                trace!("timer expiry dropped, queue full");
            }
        }
    }
}
