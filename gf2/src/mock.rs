//! In-memory bridge for exercising the driver without hardware
//!
//! [`MockBridge`] handles are cheap clones of one shared state, so a test can
//! hand one to a session and keep another to inspect what happened. Every
//! bridge call and every delay lands in one ordered journal of [`Event`]s.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use thiserror::Error;

use crate::bridge::{
    Bridge, Channel, Connector, Pin, PinState, SiliconVersion, SpiMode, UsbConfig,
};
use crate::error::ConnectError;

/// Something the driver asked the bridge (or the delay) to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SelectCs(Channel),
    DisableCs(Channel),
    SpiWrite { data: Vec<u8>, endpoint: u8 },
    SetGpio(Pin, PinState),
    Gpio(Pin),
    ConfigureSpi(Channel, SpiMode),
    DisableSpiDelays(Channel),
    Reset,
    Close,
    DelayUs(u32),
    DelayMs(u32),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    #[error("injected SPI write failure")]
    Spi,
    #[error("injected GPIO failure")]
    Gpio,
    #[error("device disconnected")]
    Disconnected,
}

#[derive(Debug)]
struct Shared {
    events: Vec<Event>,
    pins: [PinState; Pin::COUNT],
    fail_spi: bool,
    fail_gpio: bool,
    unplugged: bool,
    serial: String,
}

#[derive(Debug, Clone)]
pub struct MockBridge {
    shared: Rc<RefCell<Shared>>,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::with_serial("0000000001")
    }

    pub fn with_serial(serial: &str) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                events: Vec::new(),
                // Bridge GPIOs come up high
                pins: [PinState::High; Pin::COUNT],
                fail_spi: false,
                fail_gpio: false,
                unplugged: false,
                serial: serial.to_string(),
            })),
        }
    }

    /// A delay that records into this bridge's journal instead of sleeping
    pub fn delay(&self) -> MockDelay {
        MockDelay {
            shared: Rc::clone(&self.shared),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.shared.borrow().events.clone()
    }

    pub fn take_events(&self) -> Vec<Event> {
        std::mem::take(&mut self.shared.borrow_mut().events)
    }

    /// Current level of `pin`, without journaling a read
    pub fn level(&self, pin: Pin) -> PinState {
        self.shared.borrow().pins[pin.index()]
    }

    /// Force `pin` to `level`, without journaling a write
    pub fn set_level(&self, pin: Pin, level: PinState) {
        self.shared.borrow_mut().pins[pin.index()] = level;
    }

    pub fn fail_spi_writes(&self, fail: bool) {
        self.shared.borrow_mut().fail_spi = fail;
    }

    pub fn fail_gpio(&self, fail: bool) {
        self.shared.borrow_mut().fail_gpio = fail;
    }

    /// Make every later call fail as if the cable was pulled
    pub fn unplug(&self) {
        self.shared.borrow_mut().unplugged = true;
    }

    fn record(&mut self, event: Event) -> Result<(), MockError> {
        let mut shared = self.shared.borrow_mut();
        shared.events.push(event);
        if shared.unplugged {
            Err(MockError::Disconnected)
        } else {
            Ok(())
        }
    }

    fn attached(&self) -> Result<(), MockError> {
        if self.shared.borrow().unplugged {
            Err(MockError::Disconnected)
        } else {
            Ok(())
        }
    }

    fn gpio_ok(&self) -> Result<(), MockError> {
        if self.shared.borrow().fail_gpio {
            Err(MockError::Gpio)
        } else {
            Ok(())
        }
    }
}

impl Default for MockBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge for MockBridge {
    type Error = MockError;

    fn spi_write(&mut self, data: &[u8], endpoint: u8) -> Result<(), Self::Error> {
        self.record(Event::SpiWrite {
            data: data.to_vec(),
            endpoint,
        })?;
        if self.shared.borrow().fail_spi {
            Err(MockError::Spi)
        } else {
            Ok(())
        }
    }

    fn select_cs(&mut self, channel: Channel) -> Result<(), Self::Error> {
        self.record(Event::SelectCs(channel))
    }

    fn disable_cs(&mut self, channel: Channel) -> Result<(), Self::Error> {
        self.record(Event::DisableCs(channel))
    }

    fn gpio(&mut self, pin: Pin) -> Result<PinState, Self::Error> {
        self.record(Event::Gpio(pin))?;
        self.gpio_ok()?;
        Ok(self.level(pin))
    }

    fn set_gpio(&mut self, pin: Pin, level: PinState) -> Result<(), Self::Error> {
        self.record(Event::SetGpio(pin, level))?;
        self.gpio_ok()?;
        self.set_level(pin, level);
        Ok(())
    }

    fn configure_spi_mode(&mut self, channel: Channel, mode: &SpiMode) -> Result<(), Self::Error> {
        self.record(Event::ConfigureSpi(channel, *mode))
    }

    fn disable_spi_delays(&mut self, channel: Channel) -> Result<(), Self::Error> {
        self.record(Event::DisableSpiDelays(channel))
    }

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.record(Event::Reset)
    }

    fn disconnected(&self) -> bool {
        self.shared.borrow().unplugged
    }

    fn close(&mut self) {
        self.shared.borrow_mut().events.push(Event::Close);
    }

    fn manufacturer_desc(&mut self) -> Result<String, Self::Error> {
        self.attached()?;
        Ok("Bloguetronica".to_string())
    }

    fn product_desc(&mut self) -> Result<String, Self::Error> {
        self.attached()?;
        Ok("Function Generator (GF2)".to_string())
    }

    fn serial_desc(&mut self) -> Result<String, Self::Error> {
        self.attached()?;
        Ok(self.shared.borrow().serial.clone())
    }

    fn usb_config(&mut self) -> Result<UsbConfig, Self::Error> {
        self.attached()?;
        // Board revision A
        Ok(UsbConfig {
            vid: crate::bsp::VID,
            pid: crate::bsp::PID,
            major_release: 2,
            minor_release: 0,
            max_power: 0x32,
            power_mode: 0x01,
            transfer_priority: 0x01,
        })
    }

    fn silicon_version(&mut self) -> Result<SiliconVersion, Self::Error> {
        self.attached()?;
        Ok(SiliconVersion { major: 1, minor: 0 })
    }
}

/// Records requested delays into the journal of the bridge it came from
#[derive(Debug, Clone)]
pub struct MockDelay {
    shared: Rc<RefCell<Shared>>,
}

impl DelayUs<u32> for MockDelay {
    fn delay_us(&mut self, us: u32) {
        self.shared.borrow_mut().events.push(Event::DelayUs(us));
    }
}

impl DelayMs<u32> for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.shared.borrow_mut().events.push(Event::DelayMs(ms));
    }
}

/// A set of attached mock bridges
#[derive(Debug, Default)]
pub struct MockConnector {
    devices: Vec<MockBridge>,
    busy: Vec<String>,
    init_fails: bool,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, bridge: MockBridge) -> Self {
        self.devices.push(bridge);
        self
    }

    /// Report the device with `serial` as claimed by someone else
    pub fn with_busy(mut self, serial: &str) -> Self {
        self.busy.push(serial.to_string());
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.init_fails = true;
        self
    }

    fn serial_of(bridge: &MockBridge) -> String {
        bridge.shared.borrow().serial.clone()
    }
}

impl Connector for MockConnector {
    type Bridge = MockBridge;

    fn list_devices(&self, vid: u16, pid: u16) -> Result<Vec<String>, MockError> {
        if (vid, pid) != (crate::bsp::VID, crate::bsp::PID) {
            return Ok(Vec::new());
        }
        Ok(self.devices.iter().map(Self::serial_of).collect())
    }

    fn open(&self, vid: u16, pid: u16, serial: Option<&str>) -> Result<MockBridge, ConnectError> {
        if self.init_fails {
            return Err(ConnectError::Init);
        }
        if (vid, pid) != (crate::bsp::VID, crate::bsp::PID) {
            return Err(ConnectError::NotFound);
        }
        let found = self
            .devices
            .iter()
            .find(|b| serial.map_or(true, |s| Self::serial_of(b) == s))
            .ok_or(ConnectError::NotFound)?;
        if self.busy.contains(&Self::serial_of(found)) {
            return Err(ConnectError::Busy);
        }
        Ok(found.clone())
    }
}
