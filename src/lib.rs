//! Write-only driver for an HD44780-compatible character LCD on a 4-bit bus,
//! with grouped decimal, hexadecimal and fixed-point number output.
//!
//! R/W is tied low, so the busy flag is never read: every transfer is
//! followed by the fixed waits in [`utils::Timing`].

#![no_std]

pub use bitvec;
pub use embedded_hal as hal;
pub use fugit;
pub use heapless;
pub use nb;
pub use ufmt;

pub mod digits;
pub mod instr;
pub mod mailbox;
pub mod readout;
pub mod utils;

use core::fmt;

use bitvec::prelude::*;
use hal::digital::v2::{OutputPin, PinState};
use ufmt::uWrite;

use crate::digits::{
    FormatError, Formatted, DECIMAL_CAPACITY, FIXED_POINT_CAPACITY, HEX_CAPACITY,
};
use crate::instr::*;
use crate::utils::{Config, DelayMicros, Timing};

/// Characters visible on the panel. Output is not wrapped; staying inside
/// this width is up to the caller.
pub const VISIBLE_COLUMNS: u8 = 16;

/// Register select and enable lines.
///
/// Boards that have both lines on one port should write them with a single
/// register store.
pub trait ControlBus: Sized {
    type Error;

    fn write_control_now(
        &mut self,
        register_selection: PinState,
        enable: PinState,
    ) -> Result<(), Self::Error>;
}

/// DB4..DB7. `states` yields DB4 first.
pub trait DataBus: Sized {
    type Error;

    fn write_pins_now(
        &mut self,
        states: impl ExactSizeIterator<Item = PinState>,
    ) -> Result<(), Self::Error>;
}

/// [`ControlBus`] over two independent output pins.
///
/// RS and E are written as two separate stores, RS first, so the update is
/// not atomic. Boards with both lines on one port should implement
/// [`ControlBus`] directly and write them together.
pub struct ControlPins<RS: OutputPin, E: OutputPin> {
    register_selection: RS,
    enable: E,
}

impl<RS: OutputPin, E: OutputPin> ControlPins<RS, E> {
    #[inline]
    pub fn new(register_selection: RS, enable: E) -> Self {
        Self {
            register_selection,
            enable,
        }
    }
}

impl<RS: OutputPin, E: OutputPin> From<ControlPins<RS, E>> for (RS, E) {
    #[inline]
    fn from(value: ControlPins<RS, E>) -> Self {
        (value.register_selection, value.enable)
    }
}

impl<RS, E> ControlBus for ControlPins<RS, E>
where
    RS: OutputPin,
    E: OutputPin<Error = RS::Error>,
{
    type Error = RS::Error;

    fn write_control_now(
        &mut self,
        register_selection: PinState,
        enable: PinState,
    ) -> Result<(), Self::Error> {
        self.register_selection.set_state(register_selection)?;
        self.enable.set_state(enable)
    }
}

impl<P: OutputPin> DataBus for [P; 4] {
    type Error = P::Error;

    fn write_pins_now(
        &mut self,
        states: impl ExactSizeIterator<Item = PinState>,
    ) -> Result<(), Self::Error> {
        self.iter_mut()
            .zip(states)
            .try_for_each(|(pin, state)| pin.set_state(state))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterSelection {
    Command,
    Data,
}

impl From<RegisterSelection> for PinState {
    #[inline]
    fn from(value: RegisterSelection) -> Self {
        match value {
            RegisterSelection::Command => PinState::Low,
            RegisterSelection::Data => PinState::High,
        }
    }
}

/// Last state written to the control lines.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Session {
    pub register_selection: RegisterSelection,
    pub enable: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            register_selection: RegisterSelection::Command,
            enable: false,
        }
    }
}

pub enum LcdError<CB: ControlBus, DB: DataBus> {
    ControlBusError(CB::Error),
    DataBusError(DB::Error),
    FormatError(FormatError),
}

impl<CB: ControlBus, DB: DataBus> From<FormatError> for LcdError<CB, DB> {
    #[inline]
    fn from(value: FormatError) -> Self {
        LcdError::FormatError(value)
    }
}

impl<CB: ControlBus, DB: DataBus> fmt::Debug for LcdError<CB, DB>
where
    CB::Error: fmt::Debug,
    DB::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LcdError::ControlBusError(e) => f.debug_tuple("ControlBusError").field(e).finish(),
            LcdError::DataBusError(e) => f.debug_tuple("DataBusError").field(e).finish(),
            LcdError::FormatError(e) => f.debug_tuple("FormatError").field(e).finish(),
        }
    }
}

#[cfg(feature = "defmt")]
impl<CB: ControlBus, DB: DataBus> defmt::Format for LcdError<CB, DB>
where
    CB::Error: defmt::Format,
    DB::Error: defmt::Format,
{
    fn format(&self, f: defmt::Formatter) {
        match self {
            LcdError::ControlBusError(e) => defmt::write!(f, "ControlBusError({})", e),
            LcdError::DataBusError(e) => defmt::write!(f, "DataBusError({})", e),
            LcdError::FormatError(e) => defmt::write!(f, "FormatError({})", e),
        }
    }
}

pub struct LcdPins<CB: ControlBus, DB: DataBus> {
    control: CB,
    pub(crate) data_bus: DB,
    session: Session,
}

impl<CB: ControlBus, DB: DataBus> LcdPins<CB, DB> {
    /// The pins must already be push-pull outputs.
    #[inline]
    pub fn new(control: CB, data_bus: DB) -> Self {
        Self {
            control,
            data_bus,
            session: Session::default(),
        }
    }

    #[inline]
    pub fn session(&self) -> Session {
        self.session
    }

    fn out_control(&mut self) -> Result<(), LcdError<CB, DB>> {
        self.control
            .write_control_now(
                self.session.register_selection.into(),
                PinState::from(self.session.enable),
            )
            .map_err(LcdError::ControlBusError)
    }

    /// Drives both control lines low.
    pub fn reset_session(&mut self) -> Result<(), LcdError<CB, DB>> {
        self.session = Session::default();
        self.out_control()
    }

    fn write_nibble(&mut self, nibble: &BitSlice<u8, Lsb0>) -> Result<(), LcdError<CB, DB>> {
        self.data_bus
            .write_pins_now(nibble.iter().map(|b| PinState::from(*b)))
            .map_err(LcdError::DataBusError)
    }

    /// Latches the data lines: enable low for `pulse_setup`, high for
    /// `pulse_width`, then low again.
    pub fn send_pulse(
        &mut self,
        delay: &mut impl DelayMicros,
        timing: &Timing,
    ) -> Result<(), LcdError<CB, DB>> {
        self.session.enable = false;
        self.out_control()?;
        delay.delay_us(timing.pulse_setup.to_micros());
        self.session.enable = true;
        self.out_control()?;
        delay.delay_us(timing.pulse_width.to_micros());
        self.session.enable = false;
        self.out_control()
    }

    /// A single nibble with one enable pulse. Only meaningful while the
    /// controller is still negotiating the bus width.
    pub fn write_raw_nibble(
        &mut self,
        delay: &mut impl DelayMicros,
        timing: &Timing,
        register_selection: RegisterSelection,
        nibble: u8,
    ) -> Result<(), LcdError<CB, DB>> {
        self.session.register_selection = register_selection;
        self.write_nibble(&nibble.view_bits::<Lsb0>()[..4])?;
        self.send_pulse(delay, timing)
    }

    /// High nibble then low nibble, register select held for both.
    pub fn write(
        &mut self,
        delay: &mut impl DelayMicros,
        timing: &Timing,
        deliverable: Deliverable,
    ) -> Result<(), LcdError<CB, DB>> {
        let (register_selection, datum, settle) = match deliverable {
            Deliverable::Instr(CompiledInstr(datum)) => {
                (RegisterSelection::Command, datum, timing.command_settle)
            }
            Deliverable::Data(datum) => {
                (RegisterSelection::Data, datum, timing.character_settle)
            }
        };
        self.session.register_selection = register_selection;
        let (lower_bits, upper_bits) = datum.view_bits::<Lsb0>().split_at(4);
        for nibble in [upper_bits, lower_bits] {
            self.write_nibble(nibble)?;
            self.send_pulse(delay, timing)?;
            delay.delay_us(settle.to_micros());
        }
        delay.delay_us(timing.transfer_margin.to_micros());
        Ok(())
    }
}

impl<CB: ControlBus, DB: DataBus> From<LcdPins<CB, DB>> for (CB, DB) {
    #[inline]
    fn from(value: LcdPins<CB, DB>) -> Self {
        (value.control, value.data_bus)
    }
}

pub struct Lcd<CB: ControlBus, DB: DataBus, D: DelayMicros> {
    pub(crate) pins: LcdPins<CB, DB>,
    pub(crate) delay: D,
    config: Config,
    overflowed: bool,
}

impl<CB: ControlBus, DB: DataBus> LcdPins<CB, DB> {
    #[inline]
    pub fn with_delay<D: DelayMicros>(self, delay: D) -> Lcd<CB, DB, D> {
        Lcd {
            pins: self,
            delay,
            config: Config::default(),
            overflowed: false,
        }
    }
}

impl<CB: ControlBus, DB: DataBus, D: DelayMicros> From<Lcd<CB, DB, D>>
    for (LcdPins<CB, DB>, D)
{
    fn from(value: Lcd<CB, DB, D>) -> Self {
        (value.pins, value.delay)
    }
}

impl<CB: ControlBus, DB: DataBus, D: DelayMicros> Lcd<CB, DB, D> {
    #[inline]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn session(&self) -> Session {
        self.pins.session()
    }

    /// Power-on reset by instruction, then 4-bit/2-line mode, a cleared
    /// display, the configured cursor and left-to-right entry.
    ///
    /// Running it again replays the same sequence, so it is also the
    /// recovery path after an interrupted transfer.
    ///
    /// Cursor-left (`0x10`) is not part of the sequence; display control
    /// is sent in its place so the panel turns on.
    pub fn init(&mut self) -> Result<(), LcdError<CB, DB>> {
        let timing = self.config.timing;
        self.pins.reset_session()?;
        self.delay.delay_us(timing.power_on.to_micros());

        for wait in [timing.wake_first, timing.wake_repeat, timing.wake_repeat] {
            self.pins.write_raw_nibble(
                &mut self.delay,
                &timing,
                RegisterSelection::Command,
                WAKE_NIBBLE,
            )?;
            self.delay.delay_us(wait.to_micros());
        }
        self.pins.write_raw_nibble(
            &mut self.delay,
            &timing,
            RegisterSelection::Command,
            FOUR_BIT_NIBBLE,
        )?;
        self.delay.delay_us(timing.command_settle.to_micros());

        self.execute(FunctionSet::FOUR_BIT_TWO_LINE.compile())?;
        self.clear()?;
        self.execute(
            DisplayControl {
                display_on: true,
                cursor: self.config.cursor,
            }
            .compile(),
        )?;
        self.execute(EntryMode::LEFT_TO_RIGHT.compile())?;

        #[cfg(feature = "defmt")]
        defmt::debug!("lcd initialised, cursor {}", self.config.cursor);
        Ok(())
    }

    pub fn write(&mut self, deliverable: Deliverable) -> Result<(), LcdError<CB, DB>> {
        #[cfg(feature = "defmt")]
        defmt::trace!("lcd write {}", deliverable);
        let timing = self.config.timing;
        self.pins.write(&mut self.delay, &timing, deliverable)
    }

    #[inline]
    pub fn execute(&mut self, instr: CompiledInstr) -> Result<(), LcdError<CB, DB>> {
        self.write(Deliverable::Instr(instr))
    }

    #[inline]
    pub fn transfer_command(&mut self, command: u8) -> Result<(), LcdError<CB, DB>> {
        self.execute(CompiledInstr::from_bits(command))
    }

    /// Clear display, then an explicit cursor home.
    pub fn clear(&mut self) -> Result<(), LcdError<CB, DB>> {
        self.execute(Clear::compile())?;
        self.execute(SetDdramAddress(HOME).compile())
    }

    #[inline]
    pub fn set_cursor(&mut self, address: u8) -> Result<(), LcdError<CB, DB>> {
        self.execute(SetDdramAddress(address).compile())
    }

    pub fn shift_cursor_left(&mut self, count: u8) -> Result<(), LcdError<CB, DB>> {
        (0..count).try_for_each(|_| self.execute(CursorShift::Left.compile()))
    }

    #[inline]
    pub fn output_char(&mut self, c: u8) -> Result<(), LcdError<CB, DB>> {
        self.write(Deliverable::Data(c))
    }

    /// Characters outside ASCII are sent as `?`.
    pub fn output_str(&mut self, s: &str) -> Result<(), LcdError<CB, DB>> {
        s.chars().try_for_each(|c| self.output_char(ascii_or_placeholder(c)))
    }

    fn emit<const N: usize>(&mut self, text: &Formatted<N>) -> Result<(), LcdError<CB, DB>> {
        text.as_bytes().iter().try_for_each(|&b| self.output_char(b))
    }

    pub fn output_udec(
        &mut self,
        n: u32,
    ) -> Result<Formatted<DECIMAL_CAPACITY>, LcdError<CB, DB>> {
        let text = digits::decimal(n)?;
        self.emit(&text)?;
        Ok(text)
    }

    pub fn output_uhex(
        &mut self,
        n: u32,
    ) -> Result<Formatted<HEX_CAPACITY>, LcdError<CB, DB>> {
        let text = digits::hex(n)?;
        self.emit(&text)?;
        Ok(text)
    }

    /// Thousandths as `D.DDD`. An overflow is reported both in the returned
    /// value and in the sticky [`Lcd::overflowed`] flag.
    pub fn output_ufix(
        &mut self,
        n: u32,
    ) -> Result<Formatted<FIXED_POINT_CAPACITY>, LcdError<CB, DB>> {
        let text = digits::fixed_point(n)?;
        if text.overflowed() {
            #[cfg(feature = "defmt")]
            defmt::warn!("fixed-point overflow: {=u32}", n);
            self.overflowed = true;
        }
        self.emit(&text)?;
        Ok(text)
    }

    /// Set once any fixed-point output overflowed; stays set until
    /// [`Lcd::reset_formatter_state`].
    #[inline]
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Clears all formatter state held by the driver. Digit buffers live
    /// only for the duration of a call, so this is just the overflow flag.
    #[inline]
    pub fn reset_formatter_state(&mut self) {
        self.overflowed = false;
    }
}

fn ascii_or_placeholder(c: char) -> u8 {
    if c.is_ascii() {
        c as u8
    } else {
        b'?'
    }
}

impl<CB: ControlBus, DB: DataBus, D: DelayMicros> uWrite for Lcd<CB, DB, D> {
    type Error = LcdError<CB, DB>;

    fn write_char(&mut self, c: char) -> Result<(), Self::Error> {
        self.output_char(ascii_or_placeholder(c))
    }

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.output_str(s)
    }
}
