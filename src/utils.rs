use fugit::{MicrosDurationU32, NanosDurationU32};

use crate::hal::blocking::delay::{DelayMs, DelayUs};
use crate::instr::CursorStyle;

pub trait DelayMicros: DelayUs<u32> {}

impl<T: DelayUs<u32>> DelayMicros for T {}

/// Fixed waits used in place of busy-flag polling, since R/W is tied low.
///
/// Defaults are worst-case values for an HD44780-compatible controller.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Timing {
    /// Register select stable before enable rises.
    pub pulse_setup: MicrosDurationU32,
    /// Enable high time.
    pub pulse_width: MicrosDurationU32,
    /// After each nibble of an instruction.
    pub command_settle: MicrosDurationU32,
    /// After each nibble of a character write.
    pub character_settle: MicrosDurationU32,
    /// After every full byte.
    pub transfer_margin: MicrosDurationU32,
    /// Before the first wake nibble.
    pub power_on: MicrosDurationU32,
    /// After the first wake nibble.
    pub wake_first: MicrosDurationU32,
    /// After the second and third wake nibbles.
    pub wake_repeat: MicrosDurationU32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            pulse_setup: MicrosDurationU32::micros(6),
            pulse_width: MicrosDurationU32::micros(6),
            command_settle: MicrosDurationU32::micros(40),
            character_settle: MicrosDurationU32::micros(1_600),
            transfer_margin: MicrosDurationU32::micros(1_000),
            power_on: MicrosDurationU32::micros(15_000),
            wake_first: MicrosDurationU32::micros(5_000),
            wake_repeat: MicrosDurationU32::micros(160),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Config {
    pub timing: Timing,
    pub cursor: CursorStyle,
}

impl Config {
    #[inline]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    #[inline]
    pub fn with_cursor(mut self, cursor: CursorStyle) -> Self {
        self.cursor = cursor;
        self
    }
}

/// Busy-wait delay built on a spin loop of known per-iteration cost.
///
/// One tick is one loop iteration: a counter increment, a
/// [`core::hint::black_box`] of the counter and a [`core::hint::spin_loop`]
/// hint. `black_box` keeps the iteration in the binary on targets where the
/// hint compiles to nothing. The cost of that iteration depends on the core
/// clock and the compiler output, so it has to be measured once per target
/// (release build) and passed to [`SpinDelay::new`]. Waits are rounded up to
/// whole ticks, never down.
#[derive(Debug, Clone, Copy)]
pub struct SpinDelay {
    tick: NanosDurationU32,
    spun: u64,
}

impl SpinDelay {
    #[inline]
    pub const fn new(tick: NanosDurationU32) -> Self {
        Self { tick, spun: 0 }
    }

    /// Total ticks spun since construction.
    #[inline]
    pub const fn ticks_spun(&self) -> u64 {
        self.spun
    }

    #[inline]
    pub const fn tick(&self) -> NanosDurationU32 {
        self.tick
    }

    pub fn ticks_for(&self, duration: MicrosDurationU32) -> u32 {
        let tick_ns = u64::from(self.tick.to_nanos().max(1));
        let wanted_ns = u64::from(duration.to_micros()) * 1_000;
        let ticks = (wanted_ns + tick_ns - 1) / tick_ns;
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    /// Spins for `ticks` loop iterations without yielding.
    pub fn delay_ticks(&mut self, ticks: u32) {
        for i in 0..ticks {
            core::hint::black_box(i);
            core::hint::spin_loop();
        }
        self.spun = self.spun.wrapping_add(u64::from(ticks));
    }
}

impl DelayUs<u32> for SpinDelay {
    fn delay_us(&mut self, us: u32) {
        let ticks = self.ticks_for(MicrosDurationU32::micros(us));
        self.delay_ticks(ticks);
    }
}

impl DelayUs<u8> for SpinDelay {
    fn delay_us(&mut self, us: u8) {
        DelayUs::<u32>::delay_us(self, u32::from(us));
    }
}

impl DelayMs<u32> for SpinDelay {
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            DelayUs::<u32>::delay_us(self, 1_000);
        }
    }
}
