//! Hand-off of one sample from the timer/ADC interrupt to the polling loop.

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Where the main loop gets its readings from.
pub trait SampleSource {
    fn sample_ready(&self) -> bool;

    /// Consumes the pending sample, if any.
    fn take_sample(&mut self) -> Option<u32>;

    fn poll(&mut self) -> nb::Result<u32, Infallible> {
        self.take_sample().ok_or(nb::Error::WouldBlock)
    }
}

/// Single-slot mailbox plus ready flag.
///
/// One writer (the interrupt handler) and one reader (the main loop). Only
/// plain loads and stores are used, so it also works on cores without
/// compare-and-swap. A sample posted before the previous one was taken
/// replaces it.
#[derive(Debug, Default)]
pub struct Mailbox {
    ready: AtomicBool,
    value: AtomicU32,
}

impl Mailbox {
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            value: AtomicU32::new(0),
        }
    }

    /// Interrupt side.
    pub fn post(&self, value: u32) {
        self.value.store(value, Ordering::Relaxed);
        self.ready.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Loop side. The flag is read before the value.
    pub fn take(&self) -> Option<u32> {
        if !self.is_ready() {
            return None;
        }
        let value = self.value.load(Ordering::Relaxed);
        self.ready.store(false, Ordering::Release);
        Some(value)
    }
}

impl SampleSource for Mailbox {
    fn sample_ready(&self) -> bool {
        self.is_ready()
    }

    fn take_sample(&mut self) -> Option<u32> {
        self.take()
    }
}

impl SampleSource for &Mailbox {
    fn sample_ready(&self) -> bool {
        self.is_ready()
    }

    fn take_sample(&mut self) -> Option<u32> {
        self.take()
    }
}
