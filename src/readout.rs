//! Distance readout: a banner on the first addressable row and a
//! `D.DDD` value with its unit on the second, refreshed in place.

use crate::instr::SECOND_ROW;
use crate::mailbox::SampleSource;
use crate::utils::DelayMicros;
use crate::{ControlBus, DataBus, Lcd, LcdError};

/// Raw readings at or below this are treated as zero.
pub const ADC_NOISE_FLOOR: u32 = 30;

/// Raw counts are scaled by `SCALE_NUMERATOR / SCALE_DENOMINATOR` into
/// thousandths of the display unit. Calibrated for a 7.3 cm slide
/// potentiometer on a 14-bit converter.
pub const SCALE_NUMERATOR: u32 = 100;
pub const SCALE_DENOMINATOR: u32 = 224;

pub const fn adc_to_distance(raw: u32) -> u32 {
    if raw <= ADC_NOISE_FLOOR {
        0
    } else {
        raw.saturating_mul(SCALE_NUMERATOR) / SCALE_DENOMINATOR
    }
}

pub struct DistanceReadout<'a> {
    banner: &'a str,
    unit: &'a str,
    width: u8,
}

impl<'a> DistanceReadout<'a> {
    pub const fn new(banner: &'a str, unit: &'a str) -> Self {
        Self {
            banner,
            unit,
            width: 0,
        }
    }

    /// Columns taken by the value and unit currently on screen.
    #[inline]
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Draws the banner and a zero reading.
    pub fn show<CB, DB, D>(&mut self, lcd: &mut Lcd<CB, DB, D>) -> Result<(), LcdError<CB, DB>>
    where
        CB: ControlBus,
        DB: DataBus,
        D: DelayMicros,
    {
        lcd.output_str(self.banner)?;
        lcd.set_cursor(SECOND_ROW)?;
        self.width = 0;
        self.render(lcd, 0)
    }

    /// Steps the cursor back over the previous reading and writes `distance`
    /// over it. Formatter state is reset afterwards, so an overflow shows
    /// for exactly one refresh.
    pub fn refresh<CB, DB, D>(
        &mut self,
        lcd: &mut Lcd<CB, DB, D>,
        distance: u32,
    ) -> Result<(), LcdError<CB, DB>>
    where
        CB: ControlBus,
        DB: DataBus,
        D: DelayMicros,
    {
        lcd.shift_cursor_left(self.width)?;
        self.render(lcd, distance)?;
        lcd.reset_formatter_state();
        Ok(())
    }

    /// Takes a pending sample, converts it and refreshes the display.
    pub fn poll<CB, DB, D, S>(
        &mut self,
        lcd: &mut Lcd<CB, DB, D>,
        source: &mut S,
    ) -> nb::Result<u32, LcdError<CB, DB>>
    where
        CB: ControlBus,
        DB: DataBus,
        D: DelayMicros,
        S: SampleSource,
    {
        let Some(raw) = source.take_sample() else {
            return Err(nb::Error::WouldBlock);
        };
        let distance = adc_to_distance(raw);
        self.refresh(lcd, distance)?;
        Ok(distance)
    }

    fn render<CB, DB, D>(
        &mut self,
        lcd: &mut Lcd<CB, DB, D>,
        distance: u32,
    ) -> Result<(), LcdError<CB, DB>>
    where
        CB: ControlBus,
        DB: DataBus,
        D: DelayMicros,
    {
        let value = lcd.output_ufix(distance)?;
        lcd.output_str(self.unit)?;
        let mut width = value.len() + self.unit.chars().count();
        // blank what is left of a wider previous reading
        while width < usize::from(self.width) {
            lcd.output_char(b' ')?;
            width += 1;
        }
        self.width = u8::try_from(width).unwrap_or(u8::MAX);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_below_noise_floor_are_zero() {
        assert_eq!(adc_to_distance(0), 0);
        assert_eq!(adc_to_distance(ADC_NOISE_FLOOR), 0);
        assert_eq!(adc_to_distance(ADC_NOISE_FLOOR + 1), 13);
    }

    #[test]
    fn full_scale_stays_in_fixed_point_range() {
        assert_eq!(adc_to_distance(2240), 1000);
        assert_eq!(adc_to_distance(16383), 7313);
        assert_eq!(adc_to_distance(u32::MAX), u32::MAX / SCALE_DENOMINATOR);
    }
}
