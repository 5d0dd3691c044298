#![allow(dead_code)]

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use hd44780_readout::hal::blocking::delay::DelayUs;
use hd44780_readout::hal::digital::v2::PinState;
use hd44780_readout::{ControlBus, DataBus, Lcd, LcdPins};

/// One observable action on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Control {
        register_selection: bool,
        enable: bool,
    },
    Data(u8),
    Delay(u32),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

/// Both control lines on one port, written in a single store.
pub struct MockControl(Log);

impl ControlBus for MockControl {
    type Error = Infallible;

    fn write_control_now(
        &mut self,
        register_selection: PinState,
        enable: PinState,
    ) -> Result<(), Self::Error> {
        self.0.borrow_mut().push(Event::Control {
            register_selection: register_selection == PinState::High,
            enable: enable == PinState::High,
        });
        Ok(())
    }
}

pub struct MockData(Log);

impl DataBus for MockData {
    type Error = Infallible;

    fn write_pins_now(
        &mut self,
        states: impl ExactSizeIterator<Item = PinState>,
    ) -> Result<(), Self::Error> {
        assert_eq!(states.len(), 4);
        let nibble = states
            .enumerate()
            .fold(0u8, |acc, (i, state)| acc | (u8::from(state == PinState::High) << i));
        self.0.borrow_mut().push(Event::Data(nibble));
        Ok(())
    }
}

pub struct MockDelay(Log);

impl DelayUs<u32> for MockDelay {
    fn delay_us(&mut self, us: u32) {
        self.0.borrow_mut().push(Event::Delay(us));
    }
}

pub type MockLcd = Lcd<MockControl, MockData, MockDelay>;

pub fn mock_lcd() -> (MockLcd, Log) {
    let log = Log::default();
    let lcd = LcdPins::new(MockControl(log.clone()), MockData(log.clone()))
        .with_delay(MockDelay(log.clone()));
    (lcd, log)
}

pub fn take(log: &Log) -> Vec<Event> {
    log.borrow_mut().drain(..).collect()
}

/// `(register_selection, nibble)` as seen by the controller on each rising
/// edge of enable.
pub fn latched(events: &[Event]) -> Vec<(bool, u8)> {
    let mut out = Vec::new();
    let mut enable = false;
    let mut data = 0;
    for event in events {
        match *event {
            Event::Data(nibble) => data = nibble,
            Event::Control {
                register_selection,
                enable: now,
            } => {
                if now && !enable {
                    out.push((register_selection, data));
                }
                enable = now;
            }
            Event::Delay(_) => {}
        }
    }
    out
}

/// Pairs latched nibbles into bytes. Panics if register select changes
/// between the two halves of a byte.
pub fn bytes(nibbles: &[(bool, u8)]) -> Vec<(bool, u8)> {
    assert_eq!(nibbles.len() % 2, 0, "odd number of nibbles");
    nibbles
        .chunks(2)
        .map(|pair| {
            assert_eq!(pair[0].0, pair[1].0, "register select changed mid-byte");
            (pair[0].0, (pair[0].1 << 4) | pair[1].1)
        })
        .collect()
}

pub fn text(events: &[Event]) -> String {
    bytes(&latched(events))
        .into_iter()
        .filter(|&(data, _)| data)
        .map(|(_, b)| char::from(b))
        .collect()
}

pub fn commands(events: &[Event]) -> Vec<u8> {
    bytes(&latched(events))
        .into_iter()
        .filter(|&(data, _)| !data)
        .map(|(_, b)| b)
        .collect()
}

pub fn delays(events: &[Event]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|event| match *event {
            Event::Delay(us) => Some(us),
            _ => None,
        })
        .collect()
}
