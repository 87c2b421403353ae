//! Bit-banged one-wire bus master.
//!
//! Single-conductor half-duplex protocol: reset/presence, then 60 µs bit
//! slots where the length of the low pulse encodes the bit value. Bytes
//! travel LSB first. The line idles high via an external pull-up; the
//! pin is driven as open-drain (write 0 = pull low, write 1 = release).
//!
//! The microsecond delays are short bounded busy-waits — the only
//! suspension points in the firmware. Do not replace them with
//! cooperative yields; the slot windows are far below scheduler
//! granularity.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Skip-ROM addressing (single device on the bus).
pub const CMD_SKIP_ROM: u8 = 0xCC;
/// Start a temperature conversion.
pub const CMD_CONVERT_T: u8 = 0x44;
/// Read the 8-byte scratchpad plus CRC byte.
pub const CMD_READ_SCRATCHPAD: u8 = 0xBE;

// Slot timing (µs), from the device datasheet with margin.
const RESET_LOW_US: u32 = 480;
const RESET_PRESENCE_WAIT_US: u32 = 60;
const RESET_RECOVERY_US: u32 = 200;
const READ_INIT_LOW_US: u32 = 2;
const READ_SAMPLE_WAIT_US: u32 = 8;
const READ_SLOT_RECOVERY_US: u32 = 50;
const WRITE_SLOT_US: u32 = 60;
const WRITE_ONE_LOW_US: u32 = 10;
const WRITE_ZERO_LOW_US: u32 = 50;

/// One-wire bus master over a single open-drain GPIO.
pub struct OneWireBus<P> {
    pin: P,
}

impl<P> OneWireBus<P>
where
    P: InputPin + OutputPin,
{
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Reset the bus and sample for a presence pulse.
    ///
    /// Returns `Ok(true)` when a device answered. `Ok(false)` means the
    /// bus is empty or the device is wedged — the caller skips the
    /// transaction this cycle.
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<bool, P::Error> {
        self.pin.set_low()?;
        delay.delay_us(RESET_LOW_US);
        self.pin.set_high()?;

        delay.delay_us(RESET_PRESENCE_WAIT_US);

        // A present device pulls the line low in answer to the reset.
        let presence = self.pin.is_low()?;
        delay.delay_us(RESET_RECOVERY_US);
        Ok(presence)
    }

    /// Read one bit slot.
    pub fn read_bit(&mut self, delay: &mut impl DelayNs) -> Result<bool, P::Error> {
        self.pin.set_low()?;
        delay.delay_us(READ_INIT_LOW_US);
        self.pin.set_high()?;
        delay.delay_us(READ_SAMPLE_WAIT_US);
        let bit = self.pin.is_high()?;
        delay.delay_us(READ_SLOT_RECOVERY_US);
        Ok(bit)
    }

    /// Write one bit slot. The low pulse is short for a 1 and long for a
    /// 0; total slot time is constant.
    pub fn write_bit(&mut self, bit: bool, delay: &mut impl DelayNs) -> Result<(), P::Error> {
        let low_us = if bit { WRITE_ONE_LOW_US } else { WRITE_ZERO_LOW_US };
        self.pin.set_low()?;
        delay.delay_us(low_us);
        self.pin.set_high()?;
        delay.delay_us(WRITE_SLOT_US - low_us);
        Ok(())
    }

    /// Read one byte, least-significant bit first.
    pub fn read_byte(&mut self, delay: &mut impl DelayNs) -> Result<u8, P::Error> {
        let mut byte = 0u8;
        for shift in 0..8 {
            if self.read_bit(delay)? {
                byte |= 1 << shift;
            }
        }
        Ok(byte)
    }

    /// Write one byte, least-significant bit first.
    pub fn write_byte(&mut self, byte: u8, delay: &mut impl DelayNs) -> Result<(), P::Error> {
        for shift in 0..8 {
            self.write_bit((byte >> shift) & 1 != 0, delay)?;
        }
        Ok(())
    }
}

#[cfg(test)]
impl OneWireBus<testutil::ScriptedPin> {
    /// Test hook for scripting the owned pin.
    pub(crate) fn pin_for_test(&mut self) -> &mut testutil::ScriptedPin {
        &mut self.pin
    }
}

/// Dallas/Maxim CRC-8: polynomial 0x31 reflected (0x8C), init 0.
/// Check value over "123456789" is 0xA1.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Scripted pin + no-op delay for driving the bus without hardware.

    use core::convert::Infallible;
    use embedded_hal::delay::DelayNs;
    use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
    use std::collections::VecDeque;

    /// Records writes; serves reads from a script. When the script runs
    /// dry the line reads idle-high.
    pub struct ScriptedPin {
        pub reads: VecDeque<bool>,
        pub writes: Vec<bool>,
    }

    impl ScriptedPin {
        pub fn new() -> Self {
            Self {
                reads: VecDeque::new(),
                writes: Vec::new(),
            }
        }

        /// Queue a raw line level for the next sample.
        pub fn push_level(&mut self, high: bool) {
            self.reads.push_back(high);
        }

        /// Queue a byte as eight LSB-first read-slot samples.
        pub fn push_byte(&mut self, byte: u8) {
            for shift in 0..8 {
                self.push_level((byte >> shift) & 1 != 0);
            }
        }
    }

    impl ErrorType for ScriptedPin {
        type Error = Infallible;
    }

    impl OutputPin for ScriptedPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.writes.push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.writes.push(true);
            Ok(())
        }
    }

    impl InputPin for ScriptedPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.reads.pop_front().unwrap_or(true))
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|h| !h)
        }
    }

    /// Delay that records requested durations instead of waiting.
    pub struct RecordingDelay {
        pub delays_us: Vec<u32>,
    }

    impl RecordingDelay {
        pub fn new() -> Self {
            Self { delays_us: Vec::new() }
        }
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.delays_us.push(ns / 1000);
        }
    }
}
