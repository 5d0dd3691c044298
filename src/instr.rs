/// An instruction byte ready to go out on the bus with register select low.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct CompiledInstr(pub(crate) u8);

impl CompiledInstr {
    /// Wraps a raw command byte, e.g. one taken from a controller datasheet.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        CompiledInstr(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Deliverable {
    Instr(CompiledInstr),
    Data(u8),
}

/// High nibble of `0x30`, sent alone three times to force the controller
/// into a known state after power-on.
pub const WAKE_NIBBLE: u8 = 0x3;

/// High nibble of a 4-bit function set, sent alone to leave 8-bit mode.
pub const FOUR_BIT_NIBBLE: u8 = 0x2;

/// DDRAM address of the first column.
pub const HOME: u8 = 0x00;

/// DDRAM address of the second addressable row.
pub const SECOND_ROW: u8 = 0x40;

#[derive(Debug)]
pub struct Clear;

impl Clear {
    pub const fn compile() -> CompiledInstr {
        CompiledInstr(0x01)
    }
}

/// Moves the cursor to a DDRAM address. `SetDdramAddress(HOME)` is the
/// cursor-home used after a clear.
#[derive(Debug, Clone, Copy)]
pub struct SetDdramAddress(pub u8);

impl SetDdramAddress {
    pub const fn compile(self) -> CompiledInstr {
        CompiledInstr(0x80 | (self.0 & 0x7F))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FunctionSet {
    pub two_line: bool,
}

impl FunctionSet {
    /// 4-bit bus, 2-line addressing, 5x8 font.
    pub const FOUR_BIT_TWO_LINE: FunctionSet = FunctionSet { two_line: true };

    pub const fn compile(self) -> CompiledInstr {
        CompiledInstr(0x20 | if self.two_line { 0x08 } else { 0x00 })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CursorStyle {
    #[default]
    Hidden,
    Underline,
    Blinking,
}

#[derive(Debug, Clone, Copy)]
pub struct DisplayControl {
    pub display_on: bool,
    pub cursor: CursorStyle,
}

impl DisplayControl {
    pub const fn compile(self) -> CompiledInstr {
        let display = if self.display_on { 0x04 } else { 0x00 };
        let cursor = match self.cursor {
            CursorStyle::Hidden => 0x00,
            CursorStyle::Underline => 0x02,
            CursorStyle::Blinking => 0x03,
        };
        CompiledInstr(0x08 | display | cursor)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CursorShift {
    Left,
    Right,
}

impl CursorShift {
    pub const fn compile(self) -> CompiledInstr {
        match self {
            CursorShift::Left => CompiledInstr(0x10),
            CursorShift::Right => CompiledInstr(0x14),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EntryMode {
    pub increment: bool,
    pub shift_display: bool,
}

impl EntryMode {
    /// Left to right, display does not scroll.
    pub const LEFT_TO_RIGHT: EntryMode = EntryMode {
        increment: true,
        shift_display: false,
    };

    pub const fn compile(self) -> CompiledInstr {
        let increment = if self.increment { 0x02 } else { 0x00 };
        let shift = if self.shift_display { 0x01 } else { 0x00 };
        CompiledInstr(0x04 | increment | shift)
    }
}
