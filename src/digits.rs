//! Number to ASCII conversion for the character display.
//!
//! Every call works on its own fixed-capacity digit buffer: digits are
//! extracted least significant first, then drained most significant first
//! into a [`Formatted`] string. Nothing is shared between calls.

use core::fmt;

use heapless::String;
use ufmt::{uDisplay, uWrite, Formatter};

/// Digits of `u32::MAX` in base 10.
pub const DECIMAL_DIGITS: usize = 10;
/// Digits of `u32::MAX` in base 16.
pub const HEX_DIGITS: usize = 8;
/// Four digits plus the slot holding the decimal point.
pub const FIXED_POINT_SLOTS: usize = 5;

pub const DECIMAL_CAPACITY: usize = DECIMAL_DIGITS + 3;
pub const HEX_CAPACITY: usize = HEX_DIGITS + 1;
pub const FIXED_POINT_CAPACITY: usize = FIXED_POINT_OVERFLOW.len();

/// Smallest value that no longer fits `D.DDD`.
pub const FIXED_POINT_LIMIT: u32 = 10_000;

/// Shown in place of digits when a fixed-point value overflows.
pub const FIXED_POINT_OVERFLOW: &str = "*.*** ";

const POINT_SLOT: usize = 3;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// A digit buffer or the output text ran out of room.
    Capacity,
}

/// Text produced by one formatting call.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Formatted<const N: usize> {
    text: String<N>,
    overflow: bool,
}

impl<const N: usize> Formatted<N> {
    fn empty() -> Self {
        Self {
            text: String::new(),
            overflow: false,
        }
    }

    fn push(&mut self, c: char) -> Result<(), FormatError> {
        self.text.push(c).map_err(|_| FormatError::Capacity)
    }

    fn push_str(&mut self, s: &str) -> Result<(), FormatError> {
        self.text.push_str(s).map_err(|_| FormatError::Capacity)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether this value was out of range for its format. Only fixed
    /// point can overflow.
    #[inline]
    pub fn overflowed(&self) -> bool {
        self.overflow
    }
}

impl<const N: usize> fmt::Display for Formatted<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> uDisplay for Formatted<N> {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl<const N: usize> defmt::Format for Formatted<N> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str());
    }
}

struct DigitBuffer<const N: usize> {
    slots: [u8; N],
    len: usize,
}

impl<const N: usize> DigitBuffer<N> {
    const fn new() -> Self {
        Self {
            slots: [0; N],
            len: 0,
        }
    }

    fn push(&mut self, ascii: u8) -> Result<(), FormatError> {
        let slot = self.slots.get_mut(self.len).ok_or(FormatError::Capacity)?;
        *slot = ascii;
        self.len += 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.len
    }

    fn most_significant_first(&self) -> impl Iterator<Item = u8> + '_ {
        self.slots[..self.len].iter().rev().copied()
    }
}

// 10..=15 land on 'A'..='F' because '7' + 10 == 'A'.
fn ascii_digit(value: u32) -> u8 {
    let value = value as u8;
    if value >= 10 {
        value + b'7'
    } else {
        value + b'0'
    }
}

fn extract<const N: usize>(mut n: u32, radix: u32) -> Result<DigitBuffer<N>, FormatError> {
    let mut digits = DigitBuffer::new();
    loop {
        digits.push(ascii_digit(n % radix))?;
        n /= radix;
        if n == 0 {
            break;
        }
    }
    Ok(digits)
}

fn grouped<const D: usize, const N: usize>(
    digits: &DigitBuffer<D>,
    group: usize,
    separator: char,
) -> Result<Formatted<N>, FormatError> {
    let mut out = Formatted::empty();
    let count = digits.len();
    for (i, digit) in digits.most_significant_first().enumerate() {
        if i > 0 && (count - i) % group == 0 {
            out.push(separator)?;
        }
        out.push(char::from(digit))?;
    }
    Ok(out)
}

/// Unsigned decimal with a comma between groups of three: `1234567`
/// becomes `"1,234,567"`.
pub fn decimal(n: u32) -> Result<Formatted<DECIMAL_CAPACITY>, FormatError> {
    grouped(&extract::<DECIMAL_DIGITS>(n, 10)?, 3, ',')
}

/// Uppercase hexadecimal with a space between groups of four, counted from
/// the least significant end: `0x1A2B3C4D` becomes `"1A2B 3C4D"`.
pub fn hex(n: u32) -> Result<Formatted<HEX_CAPACITY>, FormatError> {
    grouped(&extract::<HEX_DIGITS>(n, 16)?, 4, ' ')
}

/// Thousandths as `D.DDD`, e.g. `89` becomes `"0.089"`.
///
/// Values of [`FIXED_POINT_LIMIT`] and above render as
/// [`FIXED_POINT_OVERFLOW`] with [`Formatted::overflowed`] set.
pub fn fixed_point(n: u32) -> Result<Formatted<FIXED_POINT_CAPACITY>, FormatError> {
    let mut out = Formatted::empty();
    if n >= FIXED_POINT_LIMIT {
        out.push_str(FIXED_POINT_OVERFLOW)?;
        out.overflow = true;
        return Ok(out);
    }

    let mut slots = DigitBuffer::<FIXED_POINT_SLOTS>::new();
    let mut rest = n;
    for slot in 0..FIXED_POINT_SLOTS {
        if slot == POINT_SLOT {
            slots.push(b'.')?;
        } else {
            slots.push(ascii_digit(rest % 10))?;
            rest /= 10;
        }
    }
    for ascii in slots.most_significant_first() {
        out.push(char::from(ascii))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_groups_thousands() {
        assert_eq!(decimal(0).unwrap().as_str(), "0");
        assert_eq!(decimal(7).unwrap().as_str(), "7");
        assert_eq!(decimal(999).unwrap().as_str(), "999");
        assert_eq!(decimal(1000).unwrap().as_str(), "1,000");
        assert_eq!(decimal(12345).unwrap().as_str(), "12,345");
        assert_eq!(decimal(123456).unwrap().as_str(), "123,456");
        assert_eq!(decimal(1234567).unwrap().as_str(), "1,234,567");
        assert_eq!(decimal(u32::MAX).unwrap().as_str(), "4,294,967,295");
    }

    #[test]
    fn hex_groups_by_four() {
        assert_eq!(hex(0).unwrap().as_str(), "0");
        assert_eq!(hex(0xF).unwrap().as_str(), "F");
        assert_eq!(hex(0xBEEF).unwrap().as_str(), "BEEF");
        assert_eq!(hex(0x1_0000).unwrap().as_str(), "1 0000");
        assert_eq!(hex(0x1A2B3C4D).unwrap().as_str(), "1A2B 3C4D");
        assert_eq!(hex(u32::MAX).unwrap().as_str(), "FFFF FFFF");
    }

    #[test]
    fn fixed_point_pads_to_three_decimals() {
        assert_eq!(fixed_point(0).unwrap().as_str(), "0.000");
        assert_eq!(fixed_point(3).unwrap().as_str(), "0.003");
        assert_eq!(fixed_point(89).unwrap().as_str(), "0.089");
        assert_eq!(fixed_point(123).unwrap().as_str(), "0.123");
        assert_eq!(fixed_point(9999).unwrap().as_str(), "9.999");
        assert!(!fixed_point(9999).unwrap().overflowed());
    }

    #[test]
    fn fixed_point_overflow_renders_asterisks() {
        for n in [10_000, 10_001, u32::MAX] {
            let out = fixed_point(n).unwrap();
            assert_eq!(out.as_str(), "*.*** ");
            assert!(out.overflowed());
        }
    }

    #[test]
    fn overflow_does_not_leak_into_the_next_call() {
        assert!(fixed_point(10_000).unwrap().overflowed());
        assert!(!fixed_point(1).unwrap().overflowed());
    }

    #[test]
    fn digit_buffer_rejects_overrun() {
        let mut buffer = DigitBuffer::<2>::new();
        assert_eq!(buffer.push(b'1'), Ok(()));
        assert_eq!(buffer.push(b'2'), Ok(()));
        assert_eq!(buffer.push(b'3'), Err(FormatError::Capacity));
        assert!(extract::<2>(100, 10).is_err());
    }

    #[test]
    fn letters_are_uppercase() {
        assert_eq!(ascii_digit(10), b'A');
        assert_eq!(ascii_digit(15), b'F');
        assert_eq!(ascii_digit(9), b'9');
    }
}
