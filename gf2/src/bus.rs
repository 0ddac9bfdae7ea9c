//! Ordered bridge transactions with best-effort error handling
//!
//! A [`Bus`] runs every step it is asked to, even after one fails. Failures
//! are written to the session's [`ErrorLog`] as they happen and the first one
//! is handed back by [`Bus::finish`]. That way chip selects always get
//! released and control pins always reach their final level.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use tracing::{debug, error};

use crate::bridge::{Bridge, Channel};
use crate::bsp::{line_pin, EPOUT, SETTLE_US};
use crate::error::{Error, ErrorLog};
use crate::lines::{ControlLine, LineState};

/// Blocking delays the device sequences need
pub trait Delay: DelayUs<u32> + DelayMs<u32> {}

impl<T: DelayUs<u32> + DelayMs<u32>> Delay for T {}

/// Sleeps the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayUs<u32> for StdDelay {
    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(u64::from(us)));
    }
}

impl DelayMs<u32> for StdDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

pub(crate) struct Bus<'a, B: Bridge, D> {
    bridge: &'a mut B,
    delay: &'a mut D,
    errors: &'a mut ErrorLog,
    first: Option<B::Error>,
}

impl<'a, B, D> Bus<'a, B, D>
where
    B: Bridge,
    D: Delay,
{
    pub(crate) fn new(bridge: &'a mut B, delay: &'a mut D, errors: &'a mut ErrorLog) -> Self {
        Self {
            bridge,
            delay,
            errors,
            first: None,
        }
    }

    /// Run one bridge call, logging a failure instead of returning it
    pub(crate) fn run<T>(
        &mut self,
        what: &str,
        op: impl FnOnce(&mut B) -> Result<T, B::Error>,
    ) -> Option<T> {
        match op(&mut *self.bridge) {
            Ok(v) => Some(v),
            Err(e) => {
                error!("Failed to {what}: {e}");
                self.errors.push(format!("Failed to {what}: {e}"));
                if self.first.is_none() {
                    self.first = Some(e);
                }
                None
            }
        }
    }

    /// Write one register frame to the part on `channel`
    pub(crate) fn write_register(&mut self, channel: Channel, data: &[u8]) {
        debug!("{channel:?} <- {data:02x?}");
        self.run("select chip select", |b| b.select_cs(channel));
        self.run("write SPI frame", |b| b.spi_write(data, EPOUT));
        // The bridge can release CS before the last clock edge otherwise
        self.settle_us(SETTLE_US);
        self.run("release chip select", |b| b.disable_cs(channel));
    }

    pub(crate) fn settle_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    pub(crate) fn settle_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    pub(crate) fn drive(&mut self, line: ControlLine, state: LineState) {
        let (pin, polarity) = line_pin(line);
        let level = polarity.level(state);
        debug!("{line:?} -> {state:?} ({pin:?} {level:?})");
        self.run("set control pin", |b| b.set_gpio(pin, level));
    }

    pub(crate) fn read(&mut self, line: ControlLine) -> Option<LineState> {
        let (pin, polarity) = line_pin(line);
        self.run("read control pin", |b| b.gpio(pin))
            .map(|level| polarity.state(level))
    }

    /// First bridge failure seen, if any
    pub(crate) fn finish(self) -> Result<(), Error<B::Error>> {
        match self.first {
            Some(e) => Err(Error::Bridge(e)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Pin, PinState};
    use crate::mock::{Event, MockBridge};

    #[test]
    fn register_write_sequence() {
        let mut bridge = MockBridge::new();
        let mut delay = bridge.delay();
        let mut errors = ErrorLog::new();
        let mut bus = Bus::new(&mut bridge, &mut delay, &mut errors);
        bus.write_register(Channel::Dac, &[0x08, 0x00]);
        assert!(bus.finish().is_ok());
        assert_eq!(
            bridge.take_events(),
            vec![
                Event::SelectCs(Channel::Dac),
                Event::SpiWrite {
                    data: vec![0x08, 0x00],
                    endpoint: EPOUT
                },
                Event::DelayUs(100),
                Event::DisableCs(Channel::Dac),
            ]
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn failed_write_still_releases_chip_select() {
        let mut bridge = MockBridge::new();
        bridge.fail_spi_writes(true);
        let mut delay = bridge.delay();
        let mut errors = ErrorLog::new();
        let mut bus = Bus::new(&mut bridge, &mut delay, &mut errors);
        bus.write_register(Channel::WaveGen, &[0x22, 0x00]);
        assert!(matches!(bus.finish(), Err(Error::Bridge(_))));
        let events = bridge.take_events();
        assert_eq!(events.last(), Some(&Event::DisableCs(Channel::WaveGen)));
        assert!(events.contains(&Event::DelayUs(100)));
        assert_eq!(errors.count(), 1);
    }

    #[test]
    fn drive_applies_polarity() {
        let mut bridge = MockBridge::new();
        let mut delay = bridge.delay();
        let mut errors = ErrorLog::new();
        let mut bus = Bus::new(&mut bridge, &mut delay, &mut errors);
        bus.drive(ControlLine::WaveGenReset, LineState::Asserted);
        bus.drive(ControlLine::FreqSelect, LineState::Asserted);
        assert_eq!(bus.read(ControlLine::WaveGenReset), Some(LineState::Asserted));
        assert!(bus.finish().is_ok());
        assert_eq!(bridge.level(Pin::Gpio2), PinState::Low);
        assert_eq!(bridge.level(Pin::Gpio4), PinState::High);
    }

    #[test]
    fn every_failure_is_logged() {
        let mut bridge = MockBridge::new();
        bridge.fail_gpio(true);
        let mut delay = bridge.delay();
        let mut errors = ErrorLog::new();
        let mut bus = Bus::new(&mut bridge, &mut delay, &mut errors);
        bus.drive(ControlLine::DacSleep, LineState::Deasserted);
        assert_eq!(bus.read(ControlLine::DacSleep), None);
        assert!(bus.finish().is_err());
        assert_eq!(errors.count(), 2);
        assert!(errors.messages()[0].contains("set control pin"));
    }
}
